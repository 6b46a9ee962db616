use std::path::Path;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::program::{DirKey, Program, RunResult};

/// Lifecycle notifications published by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A non-terminal status response arrived.
    Update(Program),
    /// A terminal status was reached. `program.result` is already cleared;
    /// `result` holds the final test results.
    Finished { program: Program, result: RunResult },
    Canceled(Program),
    Removed(DirKey),
    /// Polling gave up after too many consecutive failures.
    PollFailed { dir: DirKey, message: String },
}

impl Event {
    pub fn dir(&self) -> &Path {
        match self {
            Event::Update(p) | Event::Canceled(p) => &p.dir,
            Event::Finished { program, .. } => &program.dir,
            Event::Removed(dir) | Event::PollFailed { dir, .. } => dir,
        }
    }
}

/// Typed publish/subscribe hub. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

/// A live subscription. Dropping it (or calling `unsubscribe`) detaches it from the bus.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Deliver `ev` to every current subscriber. No subscribers is not an error.
    pub fn publish(&self, ev: Event) {
        log::trace!("publish {:?}", ev);
        let _ = self.tx.send(ev);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Subscription {
    /// Next event, or `None` once the bus is gone.
    /// A subscriber that fell behind skips the events it missed.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(ev) => return Some(ev),
                Err(RecvError::Lagged(n)) => {
                    log::warn!("Event subscriber lagged behind, {} event(s) dropped", n);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-published event, without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.try_recv() {
                Ok(ev) => return Some(ev),
                Err(TryRecvError::Lagged(n)) => {
                    log::warn!("Event subscriber lagged behind, {} event(s) dropped", n);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}
