#![forbid(unsafe_code)]

//! Core types shared by every paystream crate: content identity, byte
//! ranges and the fixed-point price arithmetic used to meter them.

mod content;
mod error;
pub mod price;
mod range;

pub use content::{ContentKey, ContentRef, UnitPrice};
pub use error::{CoreError, CoreResult};
pub use price::{amount_for_range, chunk_size_for_amount, format_decimal, parse_decimal};
pub use range::ByteRange;

/// One mebibyte, the default pricing unit.
pub const MIB: u64 = 1024 * 1024;
