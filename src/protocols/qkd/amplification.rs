//! Privacy amplification by hashing the reconciled key.

use crate::core::Bit;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Width of the amplified key in bytes.
pub const AMPLIFIED_KEY_BYTES: usize = 32;

/// Fixed-width key produced by [`amplify`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AmplifiedKey([u8; AMPLIFIED_KEY_BYTES]);

impl AmplifiedKey {
    pub fn as_bytes(&self) -> &[u8; AMPLIFIED_KEY_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The key as individual bits, most significant bit of each byte first.
    pub fn bits(&self) -> Vec<Bit> {
        self.0
            .iter()
            .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1 == 1))
            .collect()
    }
}

impl fmt::Debug for AmplifiedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AmplifiedKey({})", self.to_hex())
    }
}

/// Packs bits MSB-first behind a little-endian u64 bit count, so keys that
/// differ only in trailing zero bits serialize differently.
pub fn serialize_bits(bits: &[Bit]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + bits.len().div_ceil(8));
    out.extend_from_slice(&(bits.len() as u64).to_le_bytes());
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            if bit {
                byte |= 0x80 >> i;
            }
        }
        out.push(byte);
    }
    out
}

/// Compresses `key` into a SHA-256 digest.
///
/// Pure and deterministic: it draws no randomness, and identical bit
/// sequences always give identical keys.
pub fn amplify(key: &[Bit]) -> AmplifiedKey {
    let digest = Sha256::digest(serialize_bits(key));
    let mut out = [0u8; AMPLIFIED_KEY_BYTES];
    out.copy_from_slice(&digest);
    AmplifiedKey(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let key = [true, false, true, true, false, false, true, false, true];
        assert_eq!(amplify(&key), amplify(&key));
    }

    #[test]
    fn trailing_zeros_change_the_digest() {
        assert_ne!(amplify(&[true]), amplify(&[true, false]));
        assert_ne!(amplify(&[]), amplify(&[false]));
    }

    #[test]
    fn serialization_layout() {
        let bytes = serialize_bits(&[true, false, false, false, false, false, false, true, true]);
        assert_eq!(&bytes[..8], &9u64.to_le_bytes());
        assert_eq!(&bytes[8..], &[0b1000_0001, 0b1000_0000]);
    }

    #[test]
    fn digest_of_empty_key_is_known() {
        // SHA-256 of eight zero bytes (the length prefix alone)
        assert_eq!(
            amplify(&[]).to_hex(),
            "af5570f5a1810b7af78caf4bc70a660f0df51e42baf91d4de5b2328de0e83dfc"
        );
    }

    #[test]
    fn bits_round_out_to_256() {
        let key = amplify(&[true; 40]);
        assert_eq!(key.bits().len(), 256);
        assert_eq!(key.to_hex().len(), 64);
    }
}
