use async_trait::async_trait;

use crate::{
    authorization::{PaymentIntent, Signature},
    error::SignerError,
};

/// Signing capability provided by a wallet integration.
///
/// `sign` may suspend for as long as the wallet needs (approval prompt,
/// hardware confirmation); the caller holds no locks across it.
#[async_trait]
pub trait PaymentSigner: Send + Sync {
    /// Address that funds the payment.
    fn payer(&self) -> String;

    /// Sign a transfer authorization for `intent`.
    async fn sign(&self, intent: &PaymentIntent) -> Result<Signature, SignerError>;
}
