use std::{fmt, num::NonZeroU64};

use crate::error::{CoreError, CoreResult};

/// A non-empty, half-open byte range `[offset, offset + length)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ByteRange {
    offset: u64,
    length: NonZeroU64,
}

impl ByteRange {
    /// # Errors
    ///
    /// [`CoreError::InvalidInput`] for a zero length,
    /// [`CoreError::AmountOverflow`] if the end does not fit in `u64`.
    pub fn new(offset: u64, length: u64) -> CoreResult<Self> {
        let length = NonZeroU64::new(length)
            .ok_or_else(|| CoreError::invalid("byte range length must be positive"))?;
        offset
            .checked_add(length.get())
            .ok_or(CoreError::AmountOverflow)?;
        Ok(Self { offset, length })
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u64 {
        self.length.get()
    }

    /// Exclusive end. Never overflows; checked at construction.
    pub fn end(&self) -> u64 {
        self.offset + self.length.get()
    }

    /// True when `next` starts exactly where `self` ends.
    pub fn is_followed_by(&self, next: &ByteRange) -> bool {
        self.end() == next.offset
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.offset, self.end())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 1024, 1024)]
    #[case(1024, 1024, 2048)]
    #[case(u64::MAX - 1, 1, u64::MAX)]
    fn range_end(#[case] offset: u64, #[case] length: u64, #[case] end: u64) {
        let range = ByteRange::new(offset, length).unwrap();
        assert_eq!(range.end(), end);
        assert_eq!(range.length(), length);
    }

    #[rstest]
    fn zero_length_is_invalid() {
        assert!(matches!(
            ByteRange::new(10, 0),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[rstest]
    fn end_overflow_is_rejected() {
        assert_eq!(ByteRange::new(u64::MAX, 1), Err(CoreError::AmountOverflow));
    }

    #[rstest]
    fn contiguity() {
        let first = ByteRange::new(0, 1024).unwrap();
        let second = ByteRange::new(1024, 1024).unwrap();
        let gap = ByteRange::new(2049, 10).unwrap();
        assert!(first.is_followed_by(&second));
        assert!(!second.is_followed_by(&gap));
    }

    #[rstest]
    fn display() {
        assert_eq!(ByteRange::new(0, 1024).unwrap().to_string(), "[0, 1024)");
    }
}
