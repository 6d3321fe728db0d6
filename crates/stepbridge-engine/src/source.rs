//! Feature sources named by the start command.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use gherkin::{Feature, GherkinEnv};

use crate::error::EngineError;

/// One feature file plus the lines selected on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureSource {
    path: PathBuf,
    uri: String,
    lines: BTreeSet<u32>,
}

impl FeatureSource {
    /// Split `spec` (`path[:line]*`) and compute the URI relative to `base`.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepbridge_engine::FeatureSource;
    ///
    /// let source = FeatureSource::parse("/work/features/a.feature:3:7", "/work".as_ref());
    /// assert_eq!(source.uri(), "features/a.feature");
    /// assert!(source.selects([7]));
    /// assert!(!source.selects([5]));
    /// ```
    #[must_use]
    pub fn parse(spec: &str, base: &Path) -> Self {
        let mut rest = spec;
        let mut lines = BTreeSet::new();
        while let Some((head, tail)) = rest.rsplit_once(':') {
            let Ok(line) = tail.parse::<u32>() else {
                break;
            };
            lines.insert(line);
            rest = head;
        }
        let path = PathBuf::from(rest);
        let uri = path
            .strip_prefix(base)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        Self { path, uri, lines }
    }

    /// File system path of the source.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the run's base directory, used in pickles.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Whether a pickle declared on any of `lines` is selected. Sources
    /// without line selectors select everything.
    pub fn selects(&self, lines: impl IntoIterator<Item = u32>) -> bool {
        if self.lines.is_empty() {
            return true;
        }
        lines.into_iter().any(|line| self.lines.contains(&line))
    }

    /// Read and parse the source in `language`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Source`] when the file cannot be read,
    /// [`EngineError::Language`] for an unknown dialect and
    /// [`EngineError::Parse`] for malformed Gherkin.
    pub fn load(&self, language: &str) -> Result<Feature, EngineError> {
        let text = fs::read_to_string(&self.path).map_err(|source| EngineError::Source {
            path: self.path.clone(),
            source,
        })?;
        let env =
            GherkinEnv::new(language).map_err(|_| EngineError::Language(language.to_owned()))?;
        Feature::parse(text, env).map_err(|err| EngineError::Parse {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }
}
