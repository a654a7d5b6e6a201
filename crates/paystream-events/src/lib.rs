#![forbid(unsafe_code)]

//! Unified event bus for the paystream engine.

mod bus;
mod chunk;
mod event;
mod payment;
mod playback;

pub use bus::{EventBus, EventSubscription};
pub use chunk::ChunkEvent;
pub use event::Event;
pub use payment::PaymentEvent;
pub use playback::{PlaybackEvent, PlaybackPhase};
