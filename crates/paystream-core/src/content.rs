use std::fmt;

use crate::{
    MIB,
    error::{CoreError, CoreResult},
    price,
};

/// Opaque identifier of a payable object.
///
/// Used verbatim as a path segment of the content endpoint, so it may not
/// contain `/`, `?` or `#`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentKey(String);

impl ContentKey {
    /// # Errors
    ///
    /// [`CoreError::InvalidInput`] for an empty key or one containing a
    /// path, query or fragment delimiter.
    pub fn new<S: Into<String>>(key: S) -> CoreResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(CoreError::invalid("content key is empty"));
        }
        if key.contains(['/', '?', '#']) {
            return Err(CoreError::invalid(format!(
                "content key {key:?} contains a URL delimiter"
            )));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Price of `unit_size` bytes in the smallest currency unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitPrice {
    amount: u64,
    unit_size: u64,
    decimals: u8,
}

impl UnitPrice {
    /// # Errors
    ///
    /// [`CoreError::InvalidInput`] if `unit_size` is zero.
    pub fn new(amount: u64, unit_size: u64, decimals: u8) -> CoreResult<Self> {
        if unit_size == 0 {
            return Err(CoreError::invalid("unit size must be positive"));
        }
        Ok(Self {
            amount,
            unit_size,
            decimals,
        })
    }

    /// Price per mebibyte with 6 decimals, the common stablecoin setup.
    pub fn per_mib(amount: u64) -> Self {
        Self {
            amount,
            unit_size: MIB,
            decimals: 6,
        }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn unit_size(&self) -> u64 {
        self.unit_size
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Zero-priced content is served without payment.
    pub fn is_unmetered(&self) -> bool {
        self.amount == 0
    }

    /// # Errors
    ///
    /// See [`price::amount_for_range`].
    pub fn amount_for(&self, range_len: u64) -> CoreResult<u64> {
        price::amount_for_range(self.amount, range_len, self.unit_size)
    }

    /// # Errors
    ///
    /// See [`price::chunk_size_for_amount`].
    pub fn chunk_size_for(&self, amount: u64) -> CoreResult<u64> {
        price::chunk_size_for_amount(self.amount, amount, self.unit_size)
    }

    /// Human-readable amount, e.g. `"0.001"`.
    pub fn display_amount(&self, raw: u64) -> String {
        price::format_decimal(raw, self.decimals)
    }
}

/// A payable content object. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentRef {
    key: ContentKey,
    mime_type: String,
    price: UnitPrice,
}

impl ContentRef {
    /// # Errors
    ///
    /// [`CoreError::InvalidInput`] if `mime_type` is not of the form
    /// `type/subtype`.
    pub fn new<M: Into<String>>(key: ContentKey, mime_type: M, price: UnitPrice) -> CoreResult<Self> {
        let mime_type = mime_type.into();
        match mime_type.split_once('/') {
            Some((ty, sub)) if !ty.is_empty() && !sub.is_empty() => {}
            _ => {
                return Err(CoreError::invalid(format!(
                    "invalid media type {mime_type:?}"
                )));
            }
        }
        Ok(Self {
            key,
            mime_type,
            price,
        })
    }

    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn price(&self) -> &UnitPrice {
        &self.price
    }
}
