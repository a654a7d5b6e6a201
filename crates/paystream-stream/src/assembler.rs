use bytes::{Bytes, BytesMut};
use paystream_core::{ContentKey, CoreResult};
use tracing::{debug, trace};

use crate::{
    blob::{BlobHandle, BlobStore, MaterializedBuffer},
    state::ChunkState,
};

/// Folds chunks into [`ChunkState`] values and publishes the session buffer.
///
/// Holds at most one live blob: each [`materialize`](Self::materialize)
/// revokes the previous handle once the new one is registered, and dropping
/// the assembler revokes whatever is left.
#[derive(Debug)]
pub struct StreamAssembler {
    store: BlobStore,
    current: Option<BlobHandle>,
}

impl StreamAssembler {
    pub fn new(store: BlobStore) -> Self {
        Self {
            store,
            current: None,
        }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Handle most recently given out, if still held.
    pub fn current(&self) -> Option<&BlobHandle> {
        self.current.as_ref()
    }

    /// New state with `chunk` appended. `state` is left as it was.
    ///
    /// # Errors
    ///
    /// [`CoreError::AmountOverflow`](paystream_core::CoreError::AmountOverflow)
    /// if the total length no longer fits in `u64`.
    pub fn append_chunk(state: &ChunkState, chunk: Bytes) -> CoreResult<ChunkState> {
        let next = state.pushed(chunk)?;
        trace!(key = %next.key(), total = next.total_bytes(), "chunk appended");
        Ok(next)
    }

    /// New state marked as holding the whole content.
    pub fn finish(state: &ChunkState) -> ChunkState {
        state.completed()
    }

    /// Concatenate every chunk of `state` into one registered buffer.
    pub fn materialize(&mut self, state: &ChunkState, mime_type: &str) -> MaterializedBuffer {
        let bytes = concat(state.chunks(), state.total_bytes());
        let len = bytes.len() as u64;
        let handle = self.store.register(bytes);
        if let Some(previous) = self.current.replace(handle.clone()) {
            self.store.revoke(&previous);
        }
        debug!(key = %state.key(), %handle, len, "buffer materialized");
        MaterializedBuffer::new(handle, mime_type.to_string(), len)
    }

    /// Drop the held buffer and start over at offset 0.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidInput`](paystream_core::CoreError::InvalidInput)
    /// if `chunk_size` is zero.
    pub fn reset_session(&mut self, key: ContentKey, chunk_size: u64) -> CoreResult<ChunkState> {
        let state = ChunkState::new(key, chunk_size)?;
        self.release();
        Ok(state)
    }

    /// Revoke the held buffer, if any.
    pub fn release(&mut self) {
        if let Some(handle) = self.current.take() {
            self.store.revoke(&handle);
        }
    }
}

impl Drop for StreamAssembler {
    fn drop(&mut self) {
        self.release();
    }
}

fn concat(chunks: &[Bytes], total: u64) -> Bytes {
    match chunks {
        [] => Bytes::new(),
        [only] => only.clone(),
        _ => {
            let mut buf = BytesMut::with_capacity(usize::try_from(total).unwrap_or(0));
            for chunk in chunks {
                buf.extend_from_slice(chunk);
            }
            buf.freeze()
        }
    }
}
