#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc)]

//! Playback session state machine for metered content.
//!
//! A [`PlaybackController`] owns one session at a time: it schedules the next
//! byte range, pays for it, appends it to the session buffer and hands the
//! regenerated buffer to a [`MediaSink`] without losing the play position.

mod config;
mod controller;
mod error;
mod sink;
mod snapshot;

pub use config::{DEFAULT_CHUNK_SIZE, PlayerConfig};
pub use controller::{ChunkOutcome, PlaybackController};
pub use error::{ErrorKind, PlaybackError, PlaybackResult};
pub use paystream_events::PlaybackPhase;
#[cfg(any(test, feature = "test-utils"))]
pub use sink::MediaSinkMock;
pub use sink::MediaSink;
pub use snapshot::PlaybackSnapshot;
