//! Deterministic wallet stand-in.

use std::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use paystream_pay::{PaymentIntent, PaymentSigner, Signature, SignerError};
use sha2::{Digest, Sha256};

/// Signs every intent with `sha256(secret || intent fields)`.
///
/// Counts calls and keeps every intent it was shown, so tests can assert
/// how often and for how much a flow asked to pay.
pub struct StaticSigner {
    payer: String,
    secret: Vec<u8>,
    delay: Option<Duration>,
    declining: AtomicBool,
    calls: AtomicUsize,
    intents: Mutex<Vec<PaymentIntent>>,
}

impl StaticSigner {
    #[must_use]
    pub fn new(payer: &str) -> Self {
        Self {
            payer: payer.to_string(),
            secret: payer.as_bytes().to_vec(),
            delay: None,
            declining: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            intents: Mutex::new(Vec::new()),
        }
    }

    /// Wait `delay` before answering, like a wallet prompt would.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Decline every request until switched back.
    pub fn set_declining(&self, declining: bool) {
        self.declining.store(declining, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn intents(&self) -> Vec<PaymentIntent> {
        self.intents.lock().clone()
    }

    /// Signature this signer produces for `intent`.
    #[must_use]
    pub fn signature_for(&self, intent: &PaymentIntent) -> Signature {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        for field in [
            intent.network.as_str(),
            intent.payee.as_str(),
            intent.asset.as_str(),
            intent.nonce.as_str(),
        ] {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(intent.value.to_be_bytes());
        hasher.update(intent.valid_after.to_be_bytes());
        hasher.update(intent.valid_before.to_be_bytes());
        Signature(format!("0x{}", hex::encode(hasher.finalize())))
    }
}

#[async_trait]
impl PaymentSigner for StaticSigner {
    fn payer(&self) -> String {
        self.payer.clone()
    }

    async fn sign(&self, intent: &PaymentIntent) -> Result<Signature, SignerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.intents.lock().push(intent.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.declining.load(Ordering::SeqCst) {
            return Err(SignerError::Declined);
        }
        Ok(self.signature_for(intent))
    }
}
