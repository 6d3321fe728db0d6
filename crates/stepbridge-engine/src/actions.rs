//! Correlation of action-bearing messages with their replies.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::{mpsc::UnboundedSender, oneshot};
use tracing::{debug, warn};

use stepbridge_protocol::{ActionComplete, ActionId, ActionResult, Message, TestResult};

use crate::error::EngineError;

/// Sends messages to the bridge and routes replies back to their requesters.
///
/// Every request registers a one-shot slot under a fresh [`ActionId`]; the
/// command pump resolves the slot when the matching `ActionComplete` arrives.
#[derive(Debug)]
pub struct ActionBroker {
    messages: UnboundedSender<Message>,
    pending: DashMap<ActionId, oneshot::Sender<ActionResult>>,
    next_id: AtomicU64,
}

impl ActionBroker {
    /// Create a broker emitting on `messages`.
    #[must_use]
    pub fn new(messages: UnboundedSender<Message>) -> Self {
        Self {
            messages,
            pending: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    fn allocate(&self) -> ActionId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        ActionId::new(format!("action-{n}"))
    }

    /// Send a message that expects no reply.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disconnected`] if the bridge dropped its receiver.
    pub fn emit(&self, message: Message) -> Result<(), EngineError> {
        self.messages
            .send(message)
            .map_err(|_| EngineError::Disconnected)
    }

    /// Send the message built by `build` under a fresh action id and wait
    /// for its reply.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disconnected`] if the message cannot be sent or
    /// the bridge goes away before replying.
    pub async fn request<F>(&self, build: F) -> Result<ActionResult, EngineError>
    where
        F: FnOnce(ActionId) -> Message,
    {
        let id = self.allocate();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);
        if let Err(err) = self.emit(build(id.clone())) {
            self.pending.remove(&id);
            return Err(err);
        }
        rx.await.map_err(|_| EngineError::Disconnected)
    }

    /// Like [`request`](Self::request) for actions answered with a test
    /// result. A snippet reply is treated as a failure.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn request_result<F>(&self, build: F) -> Result<TestResult, EngineError>
    where
        F: FnOnce(ActionId) -> Message,
    {
        Ok(match self.request(build).await? {
            ActionResult::TestResult(result) => result,
            ActionResult::Snippet(_) => TestResult::failed("expected a test result, got a snippet"),
        })
    }

    /// Resolve the request `reply` answers. Returns `false` for replies to
    /// unknown or already completed actions.
    pub fn complete(&self, reply: ActionComplete) -> bool {
        let ActionComplete {
            completed_id,
            result,
        } = reply;
        let Some((_, slot)) = self.pending.remove(&completed_id) else {
            warn!(action_id = %completed_id, "reply for unknown action");
            return false;
        };
        if slot.send(result).is_err() {
            debug!(action_id = %completed_id, "requester gave up before the reply arrived");
        }
        true
    }

    /// Drop every outstanding request so waiters observe a disconnect.
    pub fn abandon_all(&self) {
        self.pending.clear();
    }

    /// Number of requests awaiting a reply.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }
}
