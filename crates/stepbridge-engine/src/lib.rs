//! In-process Gherkin execution engine for `stepbridge`.
//!
//! The engine reads `.feature` files, compiles them into pickles and drives
//! the application side through the stepbridge protocol: it asks for hooks,
//! scenario initialization and step execution and waits for each reply
//! before moving on within a scenario. Scenarios themselves run concurrently
//! up to the configured bound.
//!
//! ```no_run
//! # async fn demo() {
//! use stepbridge_engine::Runner;
//!
//! let endpoint = Runner::new().command_channels();
//! # drop(endpoint);
//! # }
//! ```

mod actions;
mod error;
mod matching;
mod pickles;
mod plan;
mod run;
mod source;
pub mod tags;

pub use actions::ActionBroker;
pub use error::EngineError;
pub use matching::{StepMatch, StepMatcher};
pub use pickles::PickleCompiler;
pub use plan::RunPlan;
pub use source::FeatureSource;

use stepbridge_protocol::{BridgeEndpoint, EngineEndpoint, endpoints};

/// Entry point for starting the engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct Runner;

impl Runner {
    /// Create a runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Spawn the engine on the current Tokio runtime and return the bridge
    /// half of its channels.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn command_channels(self) -> BridgeEndpoint {
        let (bridge, engine) = endpoints();
        tokio::spawn(self.serve(engine));
        bridge
    }

    /// Serve a single run over `endpoint`, returning once the run is over.
    pub async fn serve(self, endpoint: EngineEndpoint) {
        run::serve(endpoint).await;
    }
}
