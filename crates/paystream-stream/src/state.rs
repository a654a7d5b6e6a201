use bytes::Bytes;
use paystream_core::{ContentKey, CoreError, CoreResult};

/// Bytes received so far for one content in one playback session.
///
/// Values are never mutated in place; [`StreamAssembler`](crate::StreamAssembler)
/// derives a new state for every accepted chunk. Cloning is cheap since
/// chunks are reference-counted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkState {
    key: ContentKey,
    chunk_size: u64,
    chunks: Vec<Bytes>,
    total_bytes: u64,
    complete: bool,
}

impl ChunkState {
    /// Empty state at offset 0.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidInput`] if `chunk_size` is zero.
    pub fn new(key: ContentKey, chunk_size: u64) -> CoreResult<Self> {
        Ok(Self {
            key,
            chunk_size: check_chunk_size(chunk_size)?,
            chunks: Vec::new(),
            total_bytes: 0,
            complete: false,
        })
    }

    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    /// Next byte not yet fetched. Equals [`total_bytes`](Self::total_bytes).
    pub fn offset(&self) -> u64 {
        self.total_bytes
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Set once the server delivered less than asked for.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Same bytes, different size for the next range.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidInput`] if `chunk_size` is zero.
    pub fn with_chunk_size(&self, chunk_size: u64) -> CoreResult<Self> {
        Ok(Self {
            chunk_size: check_chunk_size(chunk_size)?,
            ..self.clone()
        })
    }

    pub(crate) fn pushed(&self, chunk: Bytes) -> CoreResult<Self> {
        let total_bytes = self
            .total_bytes
            .checked_add(chunk.len() as u64)
            .ok_or(CoreError::AmountOverflow)?;
        let mut next = self.clone();
        next.chunks.push(chunk);
        next.total_bytes = total_bytes;
        Ok(next)
    }

    pub(crate) fn completed(&self) -> Self {
        Self {
            complete: true,
            ..self.clone()
        }
    }
}

fn check_chunk_size(chunk_size: u64) -> CoreResult<u64> {
    if chunk_size == 0 {
        return Err(CoreError::InvalidInput(
            "chunk size must be positive".to_string(),
        ));
    }
    Ok(chunk_size)
}
