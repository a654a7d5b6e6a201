use paystream_core::CoreError;
use paystream_net::NetError;
use thiserror::Error;

/// Failure reported by a [`PaymentSigner`](crate::PaymentSigner).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("signature request declined by the wallet")]
    Declined,
    #[error("wallet unavailable: {0}")]
    Unavailable(String),
    #[error("signing failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error, Clone)]
pub enum PayError {
    /// Transport failure before any payment was sent.
    #[error(transparent)]
    Net(#[from] NetError),

    #[error(transparent)]
    Signing(#[from] SignerError),

    /// Signed authorization is no longer valid when it is about to be sent,
    /// usually because the wallet took longer than the window. Nothing was
    /// sent; asking again yields a fresh window.
    #[error("authorization {nonce} outside its window [{valid_after}, {valid_before}) at {now}")]
    AuthorizationExpired {
        nonce: String,
        valid_after: u64,
        valid_before: u64,
        now: u64,
    },

    /// Server asks for more than the caller allowed. Nothing was signed.
    #[error("payment of {required} exceeds ceiling of {ceiling}")]
    CeilingExceeded { required: u64, ceiling: u64 },

    /// Server terms are missing, malformed or unsupported. Nothing was paid.
    #[error("payment protocol violation: {0}")]
    Protocol(String),

    /// Server refused a request that already carried a payment.
    #[error("paid request refused with HTTP {status}: {reason}")]
    PaymentRejected { status: u16, reason: String },

    /// Paid request never produced a response. The authorization may have
    /// been settled anyway.
    #[error("paid request {nonce} failed in transit: {source}")]
    PaymentUnconfirmed { nonce: String, source: NetError },

    #[error("invalid price quote: {0}")]
    InvalidPriceQuote(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl PayError {
    pub(crate) fn protocol<S: Into<String>>(msg: S) -> Self {
        Self::Protocol(msg.into())
    }

    /// True when funds may have moved for the failed request.
    pub fn funds_at_risk(&self) -> bool {
        matches!(
            self,
            Self::PaymentRejected { .. } | Self::PaymentUnconfirmed { .. }
        )
    }
}

pub type PayResult<T> = Result<T, PayError>;
