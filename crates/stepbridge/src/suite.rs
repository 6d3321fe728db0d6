//! Caller-facing façade tying configuration, step definitions, the
//! formatter and the engine endpoint together.

use std::ffi::OsString;
use std::sync::Arc;

use stepbridge_protocol::{BridgeEndpoint, StepDefinitionId};

use crate::{
    Config, RunConfiguration, ScenarioContext, ScenarioInitializer, StepError, StepRegistry,
    Summary,
    coordinator::Coordinator,
    error::{ConfigError, RegistryError, RunError},
    formatter::{DotFormatter, Formatter},
};

/// A configured test suite, ready to register steps and run once.
///
/// # Examples
///
/// ```no_run
/// use stepbridge::{Config, Suite};
///
/// # async fn demo(endpoint: stepbridge_protocol::BridgeEndpoint) -> Result<(), Box<dyn std::error::Error>> {
/// let mut suite = Suite::new(Config::default())?;
/// suite.define_step(r#"^you concat "([^"]*)" and "([^"]*)"$"#, |ctx, args| {
///     ctx.set("state", args.concat());
///     Ok(())
/// })?;
/// let summary = suite.run(endpoint).await?;
/// std::process::exit(i32::from(summary.exit_code));
/// # }
/// ```
pub struct Suite {
    config: RunConfiguration,
    registry: StepRegistry,
    initializer: Option<ScenarioInitializer>,
    formatter: Box<dyn Formatter>,
}

impl Suite {
    /// Resolve `config` and create an empty suite using the dot formatter
    /// on standard output.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration cannot be resolved.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Ok(Self::from_resolved(config.resolve()?))
    }

    /// Overlay `args` onto `config` before resolving it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid arguments or missing paths.
    pub fn with_args<I, T>(config: Config, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::new(config.with_args(args)?)
    }

    /// Create a suite from an already resolved configuration.
    #[must_use]
    pub fn from_resolved(config: RunConfiguration) -> Self {
        Self {
            config,
            registry: StepRegistry::new(),
            initializer: None,
            formatter: Box::new(DotFormatter::stdout()),
        }
    }

    /// Replace the formatter.
    #[must_use]
    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Register a step definition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidPattern`] for invalid regular
    /// expressions.
    pub fn define_step<F>(&mut self, pattern: &str, handler: F) -> Result<StepDefinitionId, RegistryError>
    where
        F: Fn(&mut ScenarioContext, &[String]) -> Result<(), StepError> + Send + Sync + 'static,
    {
        self.registry.register(pattern, handler)
    }

    /// Set the callback preparing each scenario context.
    pub fn define_scenario_initializer<F>(&mut self, initializer: F)
    where
        F: Fn(&mut ScenarioContext) -> Result<(), StepError> + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(initializer));
    }

    /// The resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &RunConfiguration {
        &self.config
    }

    /// The registered step definitions.
    #[must_use]
    pub const fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Run every selected scenario through the engine behind `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns a [`RunError`] when the run cannot complete.
    pub async fn run(self, endpoint: BridgeEndpoint) -> Result<Summary, RunError> {
        let Self {
            config,
            registry,
            initializer,
            mut formatter,
        } = self;
        let start = config.start_command(registry.configs());
        tracing::info!(
            steps = registry.len(),
            features = config.feature_paths.len(),
            seed = config.seed,
            "starting suite"
        );
        Coordinator::new(registry, initializer)
            .run(endpoint, start, formatter.as_mut(), config.deadline)
            .await
    }
}
