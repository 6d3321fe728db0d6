//! Turning a start command into the ordered list of pickles to run.

use std::path::Path;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::{debug, info};

use stepbridge_protocol::{OrderKind, Pickle, RuntimeConfig, SourcesConfig, StartCommand};

use crate::error::EngineError;
use crate::matching::StepMatcher;
use crate::pickles::PickleCompiler;
use crate::source::FeatureSource;
use crate::tags::TagExpression;

/// Everything needed to execute a run.
#[derive(Debug)]
pub struct RunPlan {
    /// Pickles in execution order.
    pub pickles: Vec<Pickle>,
    /// Compiled step definitions.
    pub matcher: StepMatcher,
    /// Execution switches.
    pub runtime: RuntimeConfig,
}

impl RunPlan {
    /// Load, compile, filter and order the sources named by `start`.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] for unreadable or malformed sources, an
    /// invalid tag expression or an invalid step pattern.
    pub fn prepare(start: &StartCommand) -> Result<Self, EngineError> {
        let matcher = StepMatcher::new(&start.support_code_config.step_definitions)?;
        let pickles = select(&start.sources_config, Path::new(&start.base_directory))?;
        info!(
            scenarios = pickles.len(),
            definitions = matcher.len(),
            "run planned"
        );
        Ok(Self {
            pickles,
            matcher,
            runtime: start.runtime_config,
        })
    }
}

fn select(config: &SourcesConfig, base: &Path) -> Result<Vec<Pickle>, EngineError> {
    let filter = match config.filters.tag_expression.trim() {
        "" => None,
        expr => Some(TagExpression::parse(expr)?),
    };

    let mut compiler = PickleCompiler::new(config.language.clone());
    let mut selected = Vec::new();
    for spec in &config.absolute_paths {
        let source = FeatureSource::parse(spec, base);
        let feature = source.load(&config.language)?;
        let pickles = compiler.compile(&feature, source.uri());
        let before = pickles.len();
        selected.extend(pickles.into_iter().filter(|pickle| {
            source.selects(pickle.locations.iter().map(|location| location.line))
                && filter
                    .as_ref()
                    .is_none_or(|expr| expr.matches(pickle.tags.iter().map(String::as_str)))
        }));
        debug!(uri = source.uri(), compiled = before, "feature loaded");
    }

    if config.order.kind == OrderKind::Random {
        let mut rng = StdRng::seed_from_u64(config.order.seed);
        selected.shuffle(&mut rng);
    }
    Ok(selected)
}
