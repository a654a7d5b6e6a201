#![forbid(unsafe_code)]

use std::{collections::HashMap, fmt, sync::Arc};

use bytes::Bytes;
use parking_lot::RwLock;
use uuid::Uuid;

/// Opaque reference to a registered buffer, `blob:paystream/<uuid>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobHandle(String);

impl BlobHandle {
    fn generate() -> Self {
        Self(format!("blob:paystream/{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared registry of materialized buffers.
///
/// Clones share the same registry. A media sink resolves the handle it was
/// given; a revoked handle resolves to `None`.
#[derive(Clone, Default)]
pub struct BlobStore {
    blobs: Arc<RwLock<HashMap<BlobHandle, Bytes>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, bytes: Bytes) -> BlobHandle {
        let handle = BlobHandle::generate();
        self.blobs.write().insert(handle.clone(), bytes);
        handle
    }

    pub fn resolve(&self, handle: &BlobHandle) -> Option<Bytes> {
        self.blobs.read().get(handle).cloned()
    }

    /// Returns `false` if the handle was already revoked.
    pub fn revoke(&self, handle: &BlobHandle) -> bool {
        self.blobs.write().remove(handle).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.blobs.read().len()
    }
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("live", &self.live_count())
            .finish()
    }
}

/// A session buffer as handed to the media sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterializedBuffer {
    handle: BlobHandle,
    mime_type: String,
    len: u64,
}

impl MaterializedBuffer {
    pub(crate) fn new(handle: BlobHandle, mime_type: String, len: u64) -> Self {
        Self {
            handle,
            mime_type,
            len,
        }
    }

    pub fn handle(&self) -> &BlobHandle {
        &self.handle
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
