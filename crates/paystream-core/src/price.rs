//! Fixed-point price arithmetic.
//!
//! Prices are integers in the smallest currency unit (for a 6-decimal asset,
//! `1_000_000` is one whole unit) charged per `unit_size` bytes. All math runs
//! in `u128` and rounds half-up, so results are reproducible across platforms.

use crate::error::{CoreError, CoreResult};

/// Highest decimal scale that still fits `10^decimals` in a `u128`.
const MAX_DECIMALS: u8 = 38;

fn div_round_half_up(n: u128, d: u128) -> u128 {
    let q = n / d;
    let r = n % d;
    if r * 2 >= d { q + 1 } else { q }
}

fn to_u64(value: u128) -> CoreResult<u64> {
    u64::try_from(value).map_err(|_| CoreError::AmountOverflow)
}

/// Amount owed for `range_len` bytes at `unit_price` per `unit_size` bytes.
///
/// # Errors
///
/// [`CoreError::InvalidInput`] if `unit_size` is zero,
/// [`CoreError::AmountOverflow`] if the amount does not fit in `u64`.
pub fn amount_for_range(unit_price: u64, range_len: u64, unit_size: u64) -> CoreResult<u64> {
    if unit_size == 0 {
        return Err(CoreError::invalid("unit size must be positive"));
    }
    let owed = u128::from(unit_price) * u128::from(range_len);
    to_u64(div_round_half_up(owed, u128::from(unit_size)))
}

/// Chunk size in bytes that `amount` buys at `unit_price` per `unit_size`.
///
/// Inverse of [`amount_for_range`], same rounding.
///
/// # Errors
///
/// [`CoreError::InvalidInput`] if `unit_price` is zero (unmetered content has
/// no meaningful size-for-amount) or `unit_size` is zero;
/// [`CoreError::AmountOverflow`] if the size does not fit in `u64`.
pub fn chunk_size_for_amount(unit_price: u64, amount: u64, unit_size: u64) -> CoreResult<u64> {
    if unit_price == 0 {
        return Err(CoreError::invalid("unit price is zero: content is unmetered"));
    }
    if unit_size == 0 {
        return Err(CoreError::invalid("unit size must be positive"));
    }
    let bytes = u128::from(amount) * u128::from(unit_size);
    to_u64(div_round_half_up(bytes, u128::from(unit_price)))
}

/// Render a smallest-unit integer as a decimal string.
///
/// Trailing zero fraction digits are trimmed, as is a bare trailing dot:
/// `format_decimal(1_500_000, 6) == "1.5"`, `format_decimal(2_000_000, 6) == "2"`.
pub fn format_decimal(raw: u64, decimals: u8) -> String {
    let digits = raw.to_string();
    let scale = usize::from(decimals);
    if scale == 0 {
        return digits;
    }

    let padded = format!("{digits:0>width$}", width = scale + 1);
    let (int, frac) = padded.split_at(padded.len() - scale);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        int.to_string()
    } else {
        format!("{int}.{frac}")
    }
}

fn parse_digits(digits: &str) -> CoreResult<u128> {
    digits.bytes().try_fold(0_u128, |acc, b| {
        let digit = u128::from(b - b'0');
        acc.checked_mul(10)
            .and_then(|v| v.checked_add(digit))
            .ok_or(CoreError::AmountOverflow)
    })
}

/// Parse a decimal string into smallest units. Inverse of [`format_decimal`].
///
/// # Errors
///
/// [`CoreError::InvalidInput`] for empty, negative, non-numeric or
/// non-finite text, and for more fraction digits than `decimals`;
/// [`CoreError::AmountOverflow`] if the value does not fit in `u64`.
pub fn parse_decimal(text: &str, decimals: u8) -> CoreResult<u64> {
    if decimals > MAX_DECIMALS {
        return Err(CoreError::invalid(format!(
            "decimals {decimals} exceeds {MAX_DECIMALS}"
        )));
    }
    let text = text.trim();
    if text.starts_with('-') {
        return Err(CoreError::invalid(format!("negative amount: {text}")));
    }

    let (int, frac) = match text.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (text, ""),
    };
    let well_formed = !int.is_empty()
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
        && !text.ends_with('.');
    if !well_formed {
        return Err(CoreError::invalid(format!("not a decimal number: {text:?}")));
    }
    if frac.len() > usize::from(decimals) {
        return Err(CoreError::invalid(format!(
            "{text} has more than {decimals} fractional digits"
        )));
    }

    let scale = 10_u128.pow(u32::from(decimals));
    let frac_scale = 10_u128.pow(u32::from(decimals) - frac.len() as u32);
    let frac_value = if frac.is_empty() { 0 } else { parse_digits(frac)? };

    let value = parse_digits(int)?
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value * frac_scale))
        .ok_or(CoreError::AmountOverflow)?;
    to_u64(value)
}
