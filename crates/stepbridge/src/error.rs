//! Error types for registration, lookup, configuration and the run itself.
//!
//! Lookup and scenario-state errors are recoverable: the coordinator turns
//! them into failed action replies. Only [`RunError`] ends a run early.

use std::path::PathBuf;

use thiserror::Error;

use stepbridge_protocol::{ScenarioId, StepDefinitionId};

/// Failure to resolve a step definition identifier sent by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The identifier is not a decimal registration index.
    #[error("malformed step definition id '{0}'")]
    MalformedStepDefinitionId(StepDefinitionId),
    /// The identifier does not name a registered definition.
    #[error("unknown step definition id '{id}' ({registered} registered)")]
    UnknownStepDefinition {
        /// Identifier received from the engine.
        id: StepDefinitionId,
        /// Number of registered definitions.
        registered: usize,
    },
}

/// Failure to access the per-scenario state registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioStateError {
    /// A context already exists for the scenario.
    #[error("scenario '{0}' is already initialized")]
    DuplicateScenario(ScenarioId),
    /// No context exists for the scenario.
    #[error("unknown scenario '{0}'")]
    UnknownScenario(ScenarioId),
}

/// Failure to register a step definition.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The pattern is not a valid regular expression.
    #[error("invalid step pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern text as supplied.
        pattern: String,
        /// Compilation error reported by `regex`.
        #[source]
        source: regex::Error,
    },
}

/// Failure to build a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line arguments could not be parsed.
    #[error(transparent)]
    InvalidArguments(#[from] clap::Error),
    /// A configured feature path does not exist.
    #[error("failed to find features in path: {}", .0.display())]
    FeaturePath(PathBuf),
    /// Relative paths could not be resolved.
    #[error("failed to determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    /// A log level value was not recognised.
    #[error("unknown log level '{0}', expected one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Fatal failure of a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// The start command could not be delivered.
    #[error("engine command channel is closed")]
    EngineClosed,
    /// The engine stream ended before the run finished.
    #[error("engine disconnected before the run finished")]
    EngineDisconnected,
    /// The engine reported an unrecoverable error.
    #[error("engine error: {0}")]
    Engine(String),
    /// The configured deadline elapsed before the run finished.
    #[error("run did not finish before its deadline")]
    DeadlineExceeded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_path_error_names_the_path() {
        let error = ConfigError::FeaturePath(PathBuf::from("missing/dir"));
        assert_eq!(
            error.to_string(),
            "failed to find features in path: missing/dir"
        );
    }

    #[test]
    fn unknown_step_definition_reports_registry_size() {
        let error = LookupError::UnknownStepDefinition {
            id: StepDefinitionId::from_index(7),
            registered: 2,
        };
        assert_eq!(
            error.to_string(),
            "unknown step definition id '7' (2 registered)"
        );
    }

    #[test]
    fn unknown_scenario_displays_identifier() {
        let error = ScenarioStateError::UnknownScenario(ScenarioId::from("pickle-3"));
        assert_eq!(error.to_string(), "unknown scenario 'pickle-3'");
    }

    #[test]
    fn invalid_pattern_keeps_regex_source() {
        let Err(source) = regex::Regex::new("(") else {
            panic!("expected invalid regex");
        };
        let error = RegistryError::InvalidPattern {
            pattern: "(".into(),
            source,
        };
        assert!(error.to_string().starts_with("invalid step pattern '('"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn engine_error_wraps_message() {
        let error = RunError::Engine("cannot parse a.feature".into());
        assert_eq!(error.to_string(), "engine error: cannot parse a.feature");
    }
}
