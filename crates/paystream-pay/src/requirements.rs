use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use paystream_net::Response;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    RECEIPT_HEADER, REQUIREMENTS_HEADER,
    authorization::PaymentScheme,
    error::{PayError, PayResult},
};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequirementsWire {
    scheme: PaymentScheme,
    network: String,
    max_amount_required: String,
    pay_to: String,
    asset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource: Option<String>,
    max_timeout_seconds: u64,
}

/// Payment terms a server attaches to a `402` response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentRequirements {
    pub scheme: PaymentScheme,
    pub network: String,
    /// Amount in the asset's smallest unit.
    pub amount: u64,
    pub pay_to: String,
    pub asset: String,
    pub resource: Option<String>,
    pub max_timeout: Duration,
}

impl PaymentRequirements {
    /// Decode terms from the `X-Payment-Required` header of a 402 response.
    ///
    /// # Errors
    ///
    /// [`PayError::Protocol`] if the header is absent or its content is not
    /// valid base64 JSON describing supported terms.
    pub fn from_response(resp: &Response) -> PayResult<Self> {
        let header = resp.header(REQUIREMENTS_HEADER).ok_or_else(|| {
            PayError::protocol(format!("402 from {} without {REQUIREMENTS_HEADER}", resp.url))
        })?;
        Self::from_header(header)
    }

    /// # Errors
    ///
    /// [`PayError::Protocol`] on malformed or unsupported terms.
    pub fn from_header(value: &str) -> PayResult<Self> {
        let raw = STANDARD
            .decode(value.trim())
            .map_err(|e| PayError::protocol(format!("requirements are not base64: {e}")))?;
        let wire: RequirementsWire = serde_json::from_slice(&raw)
            .map_err(|e| PayError::protocol(format!("malformed requirements: {e}")))?;

        let amount = wire.max_amount_required.parse::<u64>().map_err(|e| {
            PayError::protocol(format!(
                "maxAmountRequired {:?}: {e}",
                wire.max_amount_required
            ))
        })?;
        if wire.pay_to.is_empty() {
            return Err(PayError::protocol("requirements name no payee"));
        }
        if wire.max_timeout_seconds == 0 {
            return Err(PayError::protocol("maxTimeoutSeconds must be positive"));
        }

        Ok(Self {
            scheme: wire.scheme,
            network: wire.network,
            amount,
            pay_to: wire.pay_to,
            asset: wire.asset,
            resource: wire.resource,
            max_timeout: Duration::from_secs(wire.max_timeout_seconds),
        })
    }

    /// Encode as the header value a server would send.
    #[expect(clippy::expect_used, reason = "string and integer fields always serialize")]
    pub fn to_header(&self) -> String {
        let wire = RequirementsWire {
            scheme: self.scheme,
            network: self.network.clone(),
            max_amount_required: self.amount.to_string(),
            pay_to: self.pay_to.clone(),
            asset: self.asset.clone(),
            resource: self.resource.clone(),
            max_timeout_seconds: self.max_timeout.as_secs(),
        };
        let json = serde_json::to_vec(&wire).expect("payment requirements serialize");
        STANDARD.encode(json)
    }
}

/// Settlement receipt optionally returned with a paid response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub success: bool,
    #[serde(default)]
    pub transaction: Option<String>,
    pub network: String,
    #[serde(default)]
    pub payer: Option<String>,
}

impl PaymentReceipt {
    /// Parse the receipt header, if present. A malformed receipt is logged
    /// and ignored: the content was delivered either way.
    pub fn from_response(resp: &Response) -> Option<Self> {
        let value = resp.header(RECEIPT_HEADER)?;
        let parsed = STANDARD
            .decode(value.trim())
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_slice::<Self>(&raw).map_err(|e| e.to_string()));
        match parsed {
            Ok(receipt) => Some(receipt),
            Err(error) => {
                warn!(url = %resp.url, %error, "ignoring malformed payment receipt");
                None
            }
        }
    }

    #[expect(clippy::expect_used, reason = "string and integer fields always serialize")]
    pub fn to_header(&self) -> String {
        STANDARD.encode(serde_json::to_vec(self).expect("payment receipt serializes"))
    }
}
