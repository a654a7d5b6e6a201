#![forbid(unsafe_code)]

use std::{fmt, time::Duration};

/// Phase of the playback controller state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackPhase {
    Idle,
    AwaitingPayment,
    Buffering,
    Ready,
    Error,
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingPayment => "awaiting-payment",
            Self::Buffering => "buffering",
            Self::Ready => "ready",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Events emitted by the playback controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    PhaseChanged {
        from: PlaybackPhase,
        to: PlaybackPhase,
    },
    /// Media source replaced with a freshly materialized buffer.
    SourceReplaced { handle: String, len: u64 },
    /// Observable outputs recomputed after entering `Ready`.
    Snapshot {
        position: Duration,
        duration: Option<Duration>,
        loaded_bytes: u64,
        chunk_count: usize,
        complete: bool,
    },
    /// Session discarded; `generation` is the new session generation.
    Reset { generation: u64 },
}
