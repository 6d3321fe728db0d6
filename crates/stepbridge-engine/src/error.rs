//! Error types for the engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::tags::TagExpressionError;

/// Fatal engine-side failure. Reported to the core as an `EngineError`
/// message before the engine stops.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// A feature source could not be read.
    #[error("failed to read feature file {}: {source}", path.display())]
    Source {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A feature source is not valid Gherkin.
    #[error("failed to parse feature file {}: {message}", path.display())]
    Parse {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
    /// The requested Gherkin dialect is unknown.
    #[error("unsupported gherkin language '{0}'")]
    Language(String),
    /// The tag filter could not be parsed.
    #[error(transparent)]
    TagExpression(#[from] TagExpressionError),
    /// A step definition pattern is not a valid regular expression.
    #[error("invalid step definition pattern '{pattern}': {source}")]
    StepPattern {
        /// Offending pattern source.
        pattern: String,
        /// Compilation failure.
        #[source]
        source: regex::Error,
    },
    /// A scenario task ended without reporting back.
    #[error("scenario task failed: {0}")]
    Task(String),
    /// The application side went away while the engine was still running.
    #[error("bridge disconnected")]
    Disconnected,
}
