use crate::interface_adapters::net::EncodedEvent;
use crate::use_cases::GameCommand;
use tokio::sync::{broadcast, mpsc};

#[derive(Clone)]
pub struct AppState {
    // Commands flowing from the network into the world task.
    pub command_tx: mpsc::Sender<GameCommand>,
    // Encoded room events, shared across all connections.
    pub frames_tx: broadcast::Sender<EncodedEvent>,
}
