//! In-memory channel pair joining the application side to an engine.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{Command, Message};

/// Application-side half: sends commands, receives messages.
#[derive(Debug)]
pub struct BridgeEndpoint {
    /// Outbound commands to the engine.
    pub commands: UnboundedSender<Command>,
    /// Inbound messages from the engine.
    pub messages: UnboundedReceiver<Message>,
}

/// Engine-side half: receives commands, sends messages.
#[derive(Debug)]
pub struct EngineEndpoint {
    /// Inbound commands from the application side.
    pub commands: UnboundedReceiver<Command>,
    /// Outbound messages to the application side.
    pub messages: UnboundedSender<Message>,
}

/// Create the two unidirectional channels and split them into endpoints.
///
/// # Examples
///
/// ```
/// use stepbridge_protocol::{Message, endpoints};
///
/// let (mut bridge, engine) = endpoints();
/// engine.messages.send(Message::RunStarted).unwrap();
/// assert_eq!(bridge.messages.try_recv().ok(), Some(Message::RunStarted));
/// ```
#[must_use]
pub fn endpoints() -> (BridgeEndpoint, EngineEndpoint) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (message_tx, message_rx) = mpsc::unbounded_channel();
    (
        BridgeEndpoint {
            commands: command_tx,
            messages: message_rx,
        },
        EngineEndpoint {
            commands: command_rx,
            messages: message_tx,
        },
    )
}
