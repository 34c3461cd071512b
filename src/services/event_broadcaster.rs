//! Event broadcaster for import notifications.
//!
//! Uses tokio::sync::broadcast to fan-out session events to every connected
//! dashboard client.

use tokio::sync::broadcast;

use crate::models::{ImportEvent, ImportEventMessage};

/// Default capacity for the broadcast channel.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Notification sink shared by the upload session and the websocket handler.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<ImportEventMessage>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ImportEventMessage> {
        self.sender.subscribe()
    }

    /// Stamp and broadcast an event. Returns the number of receivers;
    /// 0 when nobody is listening.
    pub fn publish(&self, event: ImportEvent) -> usize {
        self.sender
            .send(ImportEventMessage::new(event))
            .unwrap_or(0)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
