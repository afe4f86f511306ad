//! Event plumbing between the pipelines and whoever is watching.

use super::Event;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Handle the pipelines report through.
///
/// Cloned into the scanner thread; the transfer loop keeps the original.
/// A sender with no listener (see [`null_sender`]) drops every event.
#[derive(Clone, Default)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    /// Deliver an event. Never blocks; a vanished listener is ignored.
    pub fn send(&self, event: Event) {
        if let Some(sender) = &self.inner {
            let _ = sender.send(event);
        }
    }

    /// Whether anyone may still be listening
    pub fn is_connected(&self) -> bool {
        self.inner.is_some()
    }
}

/// Listening end; iteration ends once every [`EventSender`] is dropped
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block for the next event; `None` once all senders are gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Everything queued right now, without waiting
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Constructor for connected sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Unbounded: a slow terminal must never stall a transfer
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender {
                inner: Some(sender),
            },
            EventReceiver { inner: receiver },
        )
    }
}

/// Sender for runs nobody watches
pub fn null_sender() -> EventSender {
    EventSender::default()
}
