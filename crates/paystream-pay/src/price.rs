use std::sync::Arc;

use paystream_core::{ContentKey, MIB, UnitPrice, parse_decimal};
use paystream_net::{Net, endpoint};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{PayError, PayResult};

const DEFAULT_DECIMALS: u8 = 6;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuotedAmount {
    /// Smallest units.
    Raw(u64),
    /// Whole tokens, e.g. `"0.001"`.
    Decimal(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceQuote {
    price: QuotedAmount,
    #[serde(default)]
    unit_size: Option<u64>,
    #[serde(default)]
    decimals: Option<u8>,
}

/// Looks up per-unit prices from `GET {base}/price/{key}`.
///
/// Price quotes carry no payment, so `net` may retry freely.
#[derive(Clone)]
pub struct PriceClient {
    net: Arc<dyn Net>,
    base: Url,
}

impl PriceClient {
    pub fn new(net: Arc<dyn Net>, base: Url) -> Self {
        Self { net, base }
    }

    /// # Errors
    ///
    /// - [`PayError::Net`] on transport failure or a non-2xx status.
    /// - [`PayError::InvalidPriceQuote`] if the body is not a price quote.
    /// - [`PayError::Core`] if the quoted amount or unit is unusable.
    pub async fn lookup(&self, key: &ContentKey) -> PayResult<UnitPrice> {
        let url = endpoint(&self.base, &["price", key.as_str()])?;
        let resp = self.net.get(url, None).await?.error_for_status()?;
        let quote: PriceQuote = serde_json::from_slice(&resp.body)
            .map_err(|e| PayError::InvalidPriceQuote(e.to_string()))?;

        let decimals = quote.decimals.unwrap_or(DEFAULT_DECIMALS);
        let amount = match quote.price {
            QuotedAmount::Raw(raw) => raw,
            QuotedAmount::Decimal(text) => parse_decimal(&text, decimals)?,
        };
        let price = UnitPrice::new(amount, quote.unit_size.unwrap_or(MIB), decimals)?;
        debug!(%key, amount, unit_size = price.unit_size(), "price quote");
        Ok(price)
    }
}
