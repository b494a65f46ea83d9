//! Lobby events raised toward the presentation layer
//!
//! Enum-keyed with typed channels instead of string-keyed handlers:
//! every subscriber gets its own receiver and fan-out walks subscribers
//! in subscription order. Unsubscribing is dropping the receiver.

use std::sync::mpsc;

/// What the presentation layer can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyEvent {
    /// Roster or draft state changed
    Update,
    /// This peer was dropped by the owner
    Kick,
    Start,
    Launch,
    Stop,
}

/// Multi-subscriber event fan-out with deterministic order.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<mpsc::Sender<LobbyEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    /// Register a listener. Events emitted after this call are delivered
    /// to the returned receiver.
    pub fn subscribe(&mut self) -> mpsc::Receiver<LobbyEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, oldest subscription
    /// first. Subscribers whose receiver was dropped are pruned.
    pub fn emit(&mut self, event: LobbyEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
