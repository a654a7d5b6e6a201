#![forbid(unsafe_code)]

use crate::{ChunkEvent, PaymentEvent, PlaybackEvent};

/// Unified event for the streaming engine.
///
/// Hierarchical: each subsystem has its own variant with a sub-enum.
#[derive(Clone, Debug)]
pub enum Event {
    Payment(PaymentEvent),
    Chunk(ChunkEvent),
    Playback(PlaybackEvent),
}

impl From<PaymentEvent> for Event {
    fn from(e: PaymentEvent) -> Self {
        Self::Payment(e)
    }
}

impl From<ChunkEvent> for Event {
    fn from(e: ChunkEvent) -> Self {
        Self::Chunk(e)
    }
}

impl From<PlaybackEvent> for Event {
    fn from(e: PlaybackEvent) -> Self {
        Self::Playback(e)
    }
}
