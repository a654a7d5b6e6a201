#![forbid(unsafe_code)]

/// Events emitted by the chunk scheduler and assembler.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkEvent {
    /// Range request issued.
    Requested { key: String, offset: u64, length: u64 },
    /// Bytes appended to the session buffer.
    Appended {
        key: String,
        offset: u64,
        len: u64,
        total_bytes: u64,
    },
    /// Server returned a short range: nothing more to fetch.
    EndOfContent { key: String, total_bytes: u64 },
    /// Result of a fetch that outlived its session was dropped.
    Discarded { key: String, generation: u64 },
    /// Fetch failed; already loaded bytes are untouched.
    Failed {
        key: String,
        offset: u64,
        error: String,
        retryable: bool,
    },
}
