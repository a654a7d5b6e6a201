#![forbid(unsafe_code)]

//! Per-session chunk bookkeeping for metered streams.
//!
//! [`ChunkScheduler`] decides which byte range comes next and fetches it
//! through the payment layer. [`StreamAssembler`] folds fetched chunks into a
//! [`ChunkState`] and materializes the whole buffer into a [`BlobStore`].

mod assembler;
mod blob;
mod error;
mod scheduler;
mod state;

pub use assembler::StreamAssembler;
pub use blob::{BlobHandle, BlobStore, MaterializedBuffer};
pub use error::{FetchError, FetchResult};
pub use scheduler::ChunkScheduler;
pub use state::ChunkState;
