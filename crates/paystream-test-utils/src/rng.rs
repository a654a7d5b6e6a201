//! Deterministic PRNG for reproducible fixture content.

use bytes::Bytes;

/// Minimal xorshift64 PRNG.
///
/// A fixed seed gives identical content across runs, so byte-for-byte
/// comparisons stay meaningful.
pub struct Xorshift64(u64);

impl Xorshift64 {
    /// `seed` must be non-zero; zero is replaced by a fixed constant.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    pub fn fill(&mut self, buf: &mut [u8]) {
        for chunk in buf.chunks_mut(8) {
            let word = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }
}

/// `len` reproducible pseudo-random bytes.
#[must_use]
pub fn pseudo_random_bytes(len: usize, seed: u64) -> Bytes {
    let mut buf = vec![0u8; len];
    Xorshift64::new(seed).fill(&mut buf);
    Bytes::from(buf)
}
