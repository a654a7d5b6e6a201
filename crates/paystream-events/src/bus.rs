#![forbid(unsafe_code)]

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

use crate::Event;

/// Broadcast channel shared by the payment flow, the scheduler and the
/// playback controller.
///
/// Clones publish into the same channel. `publish()` never blocks and never
/// awaits; with no subscribers the event is dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// `capacity` is clamped to at least one slot.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Takes any sub-enum, e.g. `bus.publish(PaymentEvent::Settled { .. })`.
    pub fn publish<E: Into<Event>>(&self, event: E) {
        let _ = self.tx.send(event.into());
    }

    /// Receiver of every event published from now on. A receiver that falls
    /// behind gets `RecvError::Lagged(n)`; producers never wait for it.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Like [`subscribe`](Self::subscribe), but skips over lag instead of
    /// surfacing it as an error.
    #[must_use]
    pub fn events(&self) -> EventSubscription {
        EventSubscription {
            rx: self.tx.subscribe(),
            missed: 0,
        }
    }
}

/// Receiver that logs and counts dropped events and keeps going.
///
/// A paid chunk publishes several payment and chunk events at once, so a
/// UI polling once per frame can fall behind a small channel.
#[derive(Debug)]
pub struct EventSubscription {
    rx: broadcast::Receiver<Event>,
    missed: u64,
}

impl EventSubscription {
    /// Next event, or `None` once every bus clone is dropped.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => self.lagged(n),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-published event without waiting.
    pub fn try_next(&mut self) -> Option<Event> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(n)) => self.lagged(n),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Every event published so far, in order.
    pub fn drain(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Events skipped because this subscriber fell behind.
    pub fn missed(&self) -> u64 {
        self.missed
    }

    fn lagged(&mut self, n: u64) {
        warn!(n, "events lagged");
        self.missed += n;
    }
}
