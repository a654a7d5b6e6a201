use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("amount does not fit in 64-bit smallest currency units")]
    AmountOverflow,
}

impl CoreError {
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
