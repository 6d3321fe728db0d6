//! Run configuration and command-line overlay.
//!
//! [`Config`] carries caller-supplied defaults. [`Config::with_args`]
//! overlays command-line style arguments, and [`Config::resolve`] fixes the
//! seed, discovers feature files and produces an immutable
//! [`RunConfiguration`].

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Parser, ValueEnum};

use stepbridge_protocol::{
    OrderKind, RuntimeConfig, SourcesConfig, SourcesFilter, SourcesOrder, StartCommand,
    StepDefinitionConfig, SupportCodeConfig,
};

use crate::{discovery, error::ConfigError};

/// Environment variable selecting the log level.
pub const LOG_LEVEL_ENV: &str = "STEPBRIDGE_LOG_LEVEL";

const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_FEATURE_PATH: &str = "features/";

/// Log level enumeration matching tracing crate levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Most verbose logging, includes all trace spans.
    Trace,
    /// Debug-level information for development.
    Debug,
    /// Standard informational messages.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for failures.
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_owned())),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub const fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Read the level from `STEPBRIDGE_LOG_LEVEL`, defaulting to `Info`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLogLevel`] when the variable is set to an
    /// unrecognised value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_value(env::var(LOG_LEVEL_ENV).ok().as_deref())
    }

    /// Parse an optional raw value, defaulting to `Info` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLogLevel`] for unrecognised values.
    pub fn from_value(value: Option<&str>) -> Result<Self, ConfigError> {
        value.map_or_else(|| Ok(Self::default()), str::parse)
    }
}

/// Scenario execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Order {
    /// Shuffle scenarios with the run seed.
    #[default]
    Random,
    /// Run scenarios in the order they are defined.
    Definition,
}

impl From<Order> for OrderKind {
    fn from(order: Order) -> Self {
        match order {
            Order::Random => Self::Random,
            Order::Definition => Self::Definition,
        }
    }
}

/// Caller-facing options.
///
/// # Examples
///
/// ```
/// use stepbridge::Config;
///
/// let config = Config::default()
///     .with_args(["--seed", "123", "-c", "1", "--fast", "features/concat.feature"])
///     .unwrap();
/// assert_eq!(config.seed, 123);
/// assert_eq!(config.concurrency, 1);
/// assert!(config.fail_fast);
/// assert_eq!(config.paths, vec!["features/concat.feature".to_owned()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Gherkin dialect.
    pub language: String,
    /// Scenario execution order.
    pub order: Order,
    /// Shuffle seed; zero derives one from the clock.
    pub seed: u64,
    /// Maximum scenarios in flight; zero means unbounded.
    pub concurrency: u64,
    /// Stop after the first failing scenario.
    pub fail_fast: bool,
    /// Resolve steps without running them.
    pub dry_run: bool,
    /// Treat pending steps as failures.
    pub strict: bool,
    /// Tag expression selecting scenarios; empty selects all.
    pub tag_expression: String,
    /// Feature files or directories, optionally suffixed with `:line`.
    pub paths: Vec<String>,
    /// Upper bound on the whole run.
    pub deadline: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_owned(),
            order: Order::default(),
            seed: 0,
            concurrency: 0,
            fail_fast: false,
            dry_run: false,
            strict: false,
            tag_expression: String::new(),
            paths: vec![DEFAULT_FEATURE_PATH.to_owned()],
            deadline: None,
        }
    }
}

/// Command-line overlay. Boolean flags only ever switch options on.
#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_help_flag = true, disable_version_flag = true)]
struct Args {
    #[arg(long = "lang")]
    language: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(short = 'c', long)]
    concurrency: Option<u64>,
    #[arg(long = "fast")]
    fail_fast: bool,
    #[arg(long = "dry")]
    dry_run: bool,
    #[arg(long)]
    strict: bool,
    #[arg(long = "tags")]
    tag_expression: Option<String>,
    #[arg(long, value_enum)]
    order: Option<Order>,
    paths: Vec<String>,
}

impl Config {
    /// Overlay command-line arguments, excluding the program name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidArguments`] for unknown flags or
    /// malformed values.
    pub fn with_args<I, T>(mut self, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = Args::try_parse_from(args)?;
        if let Some(language) = args.language {
            self.language = language;
        }
        if let Some(seed) = args.seed {
            self.seed = seed;
        }
        if let Some(concurrency) = args.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(tags) = args.tag_expression {
            self.tag_expression = tags;
        }
        if let Some(order) = args.order {
            self.order = order;
        }
        self.fail_fast |= args.fail_fast;
        self.dry_run |= args.dry_run;
        self.strict |= args.strict;
        if !args.paths.is_empty() {
            self.paths = args.paths;
        }
        Ok(self)
    }

    /// Set the run deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fill in defaults, discover feature files and freeze the configuration.
    ///
    /// Relative paths are resolved against the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CurrentDir`] when the working directory is
    /// unavailable and [`ConfigError::FeaturePath`] for missing paths.
    pub fn resolve(self) -> Result<RunConfiguration, ConfigError> {
        let base_directory = env::current_dir().map_err(ConfigError::CurrentDir)?;
        self.resolve_in(base_directory)
    }

    /// [`Config::resolve`] against an explicit base directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FeaturePath`] for missing paths.
    pub fn resolve_in(self, base_directory: PathBuf) -> Result<RunConfiguration, ConfigError> {
        let language = if self.language.is_empty() {
            DEFAULT_LANGUAGE.to_owned()
        } else {
            self.language
        };
        let seed = if self.seed == 0 { clock_seed() } else { self.seed };
        let paths = if self.paths.is_empty() {
            vec![DEFAULT_FEATURE_PATH.to_owned()]
        } else {
            self.paths
        };
        let mut feature_paths = Vec::new();
        for path in &paths {
            feature_paths.extend(discovery::find_features(&base_directory, path)?);
        }
        tracing::debug!(
            seed,
            features = feature_paths.len(),
            base = %base_directory.display(),
            "resolved run configuration"
        );
        Ok(RunConfiguration {
            base_directory,
            language,
            order: self.order,
            seed,
            max_parallel: self.concurrency,
            fail_fast: self.fail_fast,
            dry_run: self.dry_run,
            strict: self.strict,
            tag_expression: self.tag_expression,
            feature_paths,
            deadline: self.deadline,
        })
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(1, |elapsed| elapsed.as_secs().max(1))
}

/// Fully resolved, immutable settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    /// Directory relative report paths are resolved against.
    pub base_directory: PathBuf,
    /// Gherkin dialect.
    pub language: String,
    /// Scenario execution order.
    pub order: Order,
    /// Non-zero shuffle seed.
    pub seed: u64,
    /// Maximum scenarios in flight; zero means unbounded.
    pub max_parallel: u64,
    /// Stop after the first failing scenario.
    pub fail_fast: bool,
    /// Resolve steps without running them.
    pub dry_run: bool,
    /// Treat pending steps as failures.
    pub strict: bool,
    /// Tag expression selecting scenarios.
    pub tag_expression: String,
    /// Absolute feature paths with any `:line` selectors re-attached.
    pub feature_paths: Vec<String>,
    /// Upper bound on the whole run.
    pub deadline: Option<Duration>,
}

impl RunConfiguration {
    /// Build the start command announcing `step_definitions`.
    #[must_use]
    pub fn start_command(&self, step_definitions: Vec<StepDefinitionConfig>) -> StartCommand {
        StartCommand {
            base_directory: self.base_directory.to_string_lossy().into_owned(),
            runtime_config: RuntimeConfig {
                fail_fast: self.fail_fast,
                dry_run: self.dry_run,
                strict: self.strict,
                max_parallel: self.max_parallel,
            },
            support_code_config: SupportCodeConfig { step_definitions },
            sources_config: SourcesConfig {
                language: self.language.clone(),
                absolute_paths: self.feature_paths.clone(),
                filters: SourcesFilter {
                    tag_expression: self.tag_expression.clone(),
                },
                order: SourcesOrder {
                    kind: self.order.into(),
                    seed: self.seed,
                },
            },
        }
    }
}
