//! Application-side bridge between Gherkin step handlers and a BDD execution
//! engine.
//!
//! The engine owns parsing, filtering and ordering of scenarios. This crate
//! owns the step handlers: it announces them in a start command, executes
//! them when the engine asks, keeps per-scenario state between steps, and
//! folds the engine's reports into a [`Summary`].
//!
//! ```text
//! Suite ──start──▶ engine
//!   ▲                │ messages
//!   │ replies        ▼
//!   └──── units ◀── Coordinator ──▶ Formatter
//! ```

pub mod config;
mod context;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod execution;
pub mod formatter;
pub mod logging;
mod panic;
mod registry;
pub mod state;
mod suite;
mod summary;
mod types;

pub use config::{Config, LogLevel, Order, RunConfiguration};
pub use context::ScenarioContext;
pub use coordinator::Coordinator;
pub use error::{ConfigError, LookupError, RegistryError, RunError, ScenarioStateError};
pub use panic::panic_message;
pub use registry::{ResolvedStep, StepDefinition, StepRegistry};
pub use state::ScenarioStates;
pub use suite::Suite;
pub use summary::Summary;
pub use types::{ScenarioInitializer, StepError, StepHandler};

pub use stepbridge_protocol::{ScenarioId, StepDefinitionId, TestResult, TestStatus};
