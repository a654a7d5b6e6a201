use std::time::Duration;

use paystream_events::PlaybackPhase;

/// Point-in-time view of a playback session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub loaded_bytes: u64,
    pub chunk_count: usize,
    /// Whole content is loaded; no more ranges will be fetched.
    pub complete: bool,
}
