use std::fmt;

use paystream_core::CoreError;
use paystream_pay::PayError;
use paystream_stream::FetchError;
use thiserror::Error;

/// Coarse failure class callers branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    AmountOverflow,
    /// Transport failure before any payment was sent.
    Network,
    /// Wallet declined or failed.
    Signing,
    /// Server asked for more than the ceiling. Nothing was signed.
    PaymentCeilingExceeded,
    /// Server broke the payment protocol, or refused a paid request.
    PaymentProtocol,
    FetchInProgress,
}

impl ErrorKind {
    /// Whether trying the same operation again can succeed without changing
    /// any input.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Signing | Self::FetchInProgress)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidInput => "invalid input",
            Self::AmountOverflow => "amount overflow",
            Self::Network => "network",
            Self::Signing => "signing",
            Self::PaymentCeilingExceeded => "payment ceiling exceeded",
            Self::PaymentProtocol => "payment protocol",
            Self::FetchInProgress => "fetch in progress",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone)]
pub enum PlaybackError {
    #[error("no content loaded")]
    NoContent,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Price(#[from] CoreError),

    #[error(transparent)]
    Pay(#[from] PayError),
}

impl PlaybackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoContent => ErrorKind::InvalidInput,
            Self::Fetch(e) => fetch_kind(e),
            Self::Price(e) => core_kind(e),
            Self::Pay(e) => pay_kind(e),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

fn core_kind(e: &CoreError) -> ErrorKind {
    match e {
        CoreError::InvalidInput(_) => ErrorKind::InvalidInput,
        CoreError::AmountOverflow => ErrorKind::AmountOverflow,
    }
}

fn pay_kind(e: &PayError) -> ErrorKind {
    match e {
        PayError::Net(_) => ErrorKind::Network,
        PayError::Signing(_) | PayError::AuthorizationExpired { .. } => ErrorKind::Signing,
        PayError::CeilingExceeded { .. } => ErrorKind::PaymentCeilingExceeded,
        PayError::Protocol(_)
        | PayError::PaymentRejected { .. }
        | PayError::PaymentUnconfirmed { .. }
        | PayError::InvalidPriceQuote(_) => ErrorKind::PaymentProtocol,
        PayError::Core(e) => core_kind(e),
    }
}

fn fetch_kind(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::InProgress => ErrorKind::FetchInProgress,
        FetchError::Pay(e) => pay_kind(e),
        FetchError::Core(e) => core_kind(e),
        // Possibly paid for already; never worth a blind retry.
        FetchError::InvalidResponse { .. } => ErrorKind::PaymentProtocol,
    }
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
