//! Bloom filter used as a negative pre-check for permission lookups.
//!
//! DESIGN
//! ======
//! Standard double hashing: `h1 = murmur3(key, 0)`, `h2 = murmur3(key, h1)`,
//! probe `i` sets bit `(h1 + i * h2) mod m` with 32-bit wrapping arithmetic.
//! Bits are stored LSB-first within each byte so the server-issued base64 blob
//! maps directly onto the backing buffer.
//!
//! The filter never decides an allow. A miss proves the key was never added;
//! a hit only means "maybe" and the caller must consult the manifest.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::murmur::murmur3_32;

/// Upper bound on probes per key. A 1e-9 false-positive target needs 30.
pub const MAX_HASH_COUNT: u32 = 32;

/// Error returned when a filter cannot be built from its wire form.
#[derive(Debug, thiserror::Error)]
pub enum BloomError {
    #[error("bloom filter blob is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("bloom filter has no bits")]
    Empty,
    #[error("bloom filter hash count must be positive")]
    ZeroHashes,
    #[error("bloom filter hash count {0} exceeds {max}", max = MAX_HASH_COUNT)]
    TooManyHashes(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BloomFilter {
    bits: Vec<u8>,
    hash_count: u32,
}

impl BloomFilter {
    /// Create an empty filter with `num_bytes * 8` bits.
    ///
    /// # Errors
    ///
    /// Fails when either dimension is zero.
    pub fn new(num_bytes: usize, hash_count: u32) -> Result<Self, BloomError> {
        Self::from_bytes(vec![0; num_bytes], hash_count)
    }

    /// Wrap an existing bit buffer.
    ///
    /// # Errors
    ///
    /// Fails when the buffer is empty or `hash_count` is zero or above
    /// [`MAX_HASH_COUNT`].
    pub fn from_bytes(bits: Vec<u8>, hash_count: u32) -> Result<Self, BloomError> {
        if bits.is_empty() {
            return Err(BloomError::Empty);
        }
        match hash_count {
            0 => return Err(BloomError::ZeroHashes),
            n if n > MAX_HASH_COUNT => return Err(BloomError::TooManyHashes(n)),
            _ => {}
        }
        Ok(Self { bits, hash_count })
    }

    /// Decode the base64 blob shipped inside a permission manifest.
    ///
    /// # Errors
    ///
    /// Returns [`BloomError::Base64`] for malformed input, plus the
    /// dimension errors of [`BloomFilter::from_bytes`].
    pub fn from_base64(blob: &str, hash_count: u32) -> Result<Self, BloomError> {
        let bits = STANDARD.decode(blob.trim())?;
        Self::from_bytes(bits, hash_count)
    }

    /// Size a filter for `capacity` keys at the target false-positive rate.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn optimal(capacity: usize, fp_rate: f64) -> Self {
        let n = capacity.max(1) as f64;
        let p = fp_rate.clamp(1e-9, 0.5);
        let ln2 = std::f64::consts::LN_2;

        let m_bits = (-(n * p.ln()) / (ln2 * ln2)).ceil().max(8.0);
        let k = ((m_bits / n) * ln2).round().clamp(1.0, f64::from(MAX_HASH_COUNT));

        let num_bytes = (m_bits / 8.0).ceil() as usize;
        Self { bits: vec![0; num_bytes], hash_count: k as u32 }
    }

    #[must_use]
    pub fn hash_count(&self) -> u32 {
        self.hash_count
    }

    /// Total number of addressable bits.
    #[must_use]
    pub fn num_bits(&self) -> usize {
        self.bits.len() * 8
    }

    pub fn add(&mut self, key: &str) {
        let probes: Vec<usize> = self.probe(key).collect();
        for idx in probes {
            self.bits[idx / 8] |= 1 << (idx % 8);
        }
    }

    /// `false` means `key` was definitely never added.
    #[must_use]
    pub fn test(&self, key: &str) -> bool {
        self.probe(key)
            .all(|idx| self.bits[idx / 8] & (1 << (idx % 8)) != 0)
    }

    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bits)
    }

    fn probe(&self, key: &str) -> impl Iterator<Item = usize> + use<> {
        let h1 = murmur3_32(key.as_bytes(), 0);
        let h2 = murmur3_32(key.as_bytes(), h1);
        // num_bits fits in u32 for any realistic manifest; saturate otherwise.
        let m = u32::try_from(self.num_bits()).unwrap_or(u32::MAX);

        (0..self.hash_count)
            .map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % m)
            .map(|idx| idx as usize)
    }
}

#[cfg(test)]
#[path = "bloom_test.rs"]
mod tests;
