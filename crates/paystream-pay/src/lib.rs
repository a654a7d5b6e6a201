#![forbid(unsafe_code)]

//! x402-style micropayments for HTTP range fetches.
//!
//! [`PaidNet`] wraps any [`Net`](paystream_net::Net) transport. A request is
//! sent once without payment; on `402 Payment Required` the server terms are
//! checked against the caller's ceiling, a single [`PaymentAuthorization`] is
//! signed through the external [`PaymentSigner`], and the request is reissued
//! exactly once with an `X-Payment` header. A second refusal is a protocol
//! violation and is never paid again.

mod authorization;
mod error;
mod flow;
mod options;
mod paid;
mod price;
mod requirements;
mod signer;

pub use authorization::{PaymentAuthorization, PaymentIntent, PaymentScheme, Signature};
pub use error::{PayError, PayResult, SignerError};
pub use flow::{FlowObserver, NoopObserver, PaymentPhase};
pub use options::PaymentOptions;
pub use paid::{Clock, PaidNet, PaidResponse, PayNetExt, PaymentSummary, system_clock};
pub use price::PriceClient;
pub use requirements::{PaymentReceipt, PaymentRequirements};
pub use signer::PaymentSigner;

/// Request header carrying `base64(JSON(PaymentAuthorization))`.
pub const PAYMENT_HEADER: &str = "X-Payment";
/// 402 response header carrying `base64(JSON(PaymentRequirements))`.
pub const REQUIREMENTS_HEADER: &str = "X-Payment-Required";
/// Optional success response header carrying `base64(JSON(PaymentReceipt))`.
pub const RECEIPT_HEADER: &str = "X-Payment-Response";
/// The only protocol version this crate speaks.
pub const PROTOCOL_VERSION: u8 = 1;
