use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    PROTOCOL_VERSION,
    error::{PayError, PayResult},
};

/// Settlement scheme. Only exact-amount transfers are supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentScheme {
    Exact,
}

/// Opaque signature produced by a wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(pub String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What the wallet is asked to sign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentIntent {
    pub payee: String,
    pub value: u64,
    pub asset: String,
    pub network: String,
    /// Unix seconds.
    pub valid_after: u64,
    /// Unix seconds.
    pub valid_before: u64,
    /// `0x` followed by 64 hex digits.
    pub nonce: String,
}

impl PaymentIntent {
    /// Nonce shape and a non-empty validity window.
    ///
    /// # Errors
    ///
    /// [`PayError::Protocol`] naming the first problem found.
    pub fn validate(&self) -> PayResult<()> {
        check_fields(&self.nonce, self.valid_after, self.valid_before)
    }
}

fn check_fields(nonce: &str, valid_after: u64, valid_before: u64) -> PayResult<()> {
    if !is_nonce(nonce) {
        return Err(PayError::protocol(format!("malformed nonce {nonce:?}")));
    }
    if valid_after >= valid_before {
        return Err(PayError::protocol("empty validity window"));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TransferFields {
    payer: String,
    payee: String,
    #[serde(with = "amount_string")]
    value: u64,
    #[serde(with = "amount_string")]
    valid_after: u64,
    #[serde(with = "amount_string")]
    valid_before: u64,
    nonce: String,
}

/// Signed, single-use payment proof attached to one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentAuthorization {
    protocol_version: u8,
    scheme: PaymentScheme,
    network: String,
    signature: Signature,
    authorization: TransferFields,
}

impl PaymentAuthorization {
    pub(crate) fn new(
        intent: &PaymentIntent,
        payer: String,
        signature: Signature,
    ) -> PayResult<Self> {
        let auth = Self {
            protocol_version: PROTOCOL_VERSION,
            scheme: PaymentScheme::Exact,
            network: intent.network.clone(),
            signature,
            authorization: TransferFields {
                payer,
                payee: intent.payee.clone(),
                value: intent.value,
                valid_after: intent.valid_after,
                valid_before: intent.valid_before,
                nonce: intent.nonce.clone(),
            },
        };
        auth.validate()?;
        Ok(auth)
    }

    fn validate(&self) -> PayResult<()> {
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(PayError::protocol(format!(
                "unsupported protocol version {}",
                self.protocol_version
            )));
        }
        if self.signature.0.trim().is_empty() {
            return Err(PayError::protocol("empty signature"));
        }
        let fields = &self.authorization;
        check_fields(&fields.nonce, fields.valid_after, fields.valid_before)
    }

    /// Encode as the `X-Payment` header value.
    #[expect(clippy::expect_used, reason = "string and integer fields always serialize")]
    pub fn to_header(&self) -> String {
        STANDARD.encode(serde_json::to_vec(self).expect("authorization serializes"))
    }

    /// Decode and validate an `X-Payment` header value.
    ///
    /// # Errors
    ///
    /// [`PayError::Protocol`] if the value is not a well-formed authorization.
    pub fn from_header(value: &str) -> PayResult<Self> {
        let raw = STANDARD
            .decode(value.trim())
            .map_err(|e| PayError::protocol(format!("authorization is not base64: {e}")))?;
        let auth: Self = serde_json::from_slice(&raw)
            .map_err(|e| PayError::protocol(format!("malformed authorization: {e}")))?;
        auth.validate()?;
        Ok(auth)
    }

    /// Whether `now` (unix seconds) falls inside the validity window.
    pub fn is_valid_at(&self, now: u64) -> bool {
        self.authorization.valid_after <= now && now < self.authorization.valid_before
    }

    pub fn scheme(&self) -> PaymentScheme {
        self.scheme
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn payer(&self) -> &str {
        &self.authorization.payer
    }

    pub fn payee(&self) -> &str {
        &self.authorization.payee
    }

    pub fn value(&self) -> u64 {
        self.authorization.value
    }

    pub fn valid_after(&self) -> u64 {
        self.authorization.valid_after
    }

    pub fn valid_before(&self) -> u64 {
        self.authorization.valid_before
    }

    pub fn nonce(&self) -> &str {
        &self.authorization.nonce
    }
}

fn is_nonce(s: &str) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Integers travel as decimal strings so 64-bit values survive JSON parsers
/// that only have doubles.
mod amount_string {
    use super::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(v: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(v)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
