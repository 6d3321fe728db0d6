//! Protocol types shared by `stepbridge` and execution engines.
//!
//! The engine and the application side talk through two unidirectional
//! channels. [`Message`] values travel from the engine to the application and
//! [`Command`] values travel back. Every command the engine expects a reply
//! for carries an [`ActionId`]; the application answers with exactly one
//! [`Command::ActionComplete`] quoting the same identifier.
//!
//! The crate deliberately says nothing about wire encoding. All types derive
//! `serde` traits so transports and formatters may choose their own.

mod channel;
mod ids;
mod message;
mod pickle;
mod start;
mod status;

pub use channel::{BridgeEndpoint, EngineEndpoint, endpoints};
pub use ids::{ActionId, ScenarioId, StepDefinitionId};
pub use message::{ActionComplete, ActionResult, Command, Message, PatternMatch};
pub use pickle::{Location, Pickle, PickleStep};
pub use start::{
    OrderKind, PatternKind, RuntimeConfig, SourcesConfig, SourcesFilter, SourcesOrder,
    StartCommand, StepDefinitionConfig, StepDefinitionPattern, SupportCodeConfig,
};
pub use status::{TestResult, TestStatus};
