//! Change notifications for anything watching a player.
//!
//! Subscribers get their own `mpsc` receiver. Dropping the receiver is how a
//! subscriber unsubscribes; dead senders are pruned on the next emit.

use std::path::PathBuf;
use std::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    TrackLoaded(PathBuf),
    MarkersChanged,
    SegmentChanged,
    SliceChanged,
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<mpsc::Sender<PlayerEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<PlayerEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: PlayerEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
