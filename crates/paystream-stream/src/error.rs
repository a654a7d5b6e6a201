#![forbid(unsafe_code)]

use paystream_core::CoreError;
use paystream_pay::PayError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum FetchError {
    /// Another fetch of this session is still outstanding. Nothing was sent.
    #[error("a chunk fetch is already in progress")]
    InProgress,

    #[error(transparent)]
    Pay(#[from] PayError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// Server sent more bytes than the range asked for.
    #[error("expected at most {expected} bytes, received {received}")]
    InvalidResponse { expected: u64, received: u64 },
}

pub type FetchResult<T> = Result<T, FetchError>;
