#![forbid(unsafe_code)]

/// Events emitted while negotiating a payment for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    /// Server answered 402 with these terms.
    Required {
        resource: String,
        amount: u64,
        payee: String,
        network: String,
    },
    /// Required amount is above the caller's ceiling; nothing was signed.
    CeilingExceeded {
        resource: String,
        required: u64,
        ceiling: u64,
    },
    /// Authorization signed and attached to the reissued request.
    Authorized {
        resource: String,
        value: u64,
        nonce: String,
    },
    /// Paid request succeeded.
    Settled {
        resource: String,
        value: u64,
        transaction: Option<String>,
    },
    /// Paid request was refused. Funds may have moved.
    Rejected { resource: String, status: u16 },
}
