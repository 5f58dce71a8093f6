//! Hash provider seam and the FNV mixing primitive
//!
//! The core never implements a hash itself. Everything it needs from the
//! environment is behind [`HashProvider`]: one 512-bit and one 256-bit
//! fixed-output hash of the same permutation family. [`Keccak`] is the
//! provider Ethash is defined over.

use sha3::{Digest, Keccak256, Keccak512};

use crate::params::{FNV_PRIME, HASH_BYTES, HASH_WORDS, WORD_BYTES};

/// The two hash operations consumed by the core.
///
/// Implementations must be pure: identical input always yields identical
/// output, from any thread.
pub trait HashProvider: Send + Sync {
    /// 512-bit hash of `data`
    fn hash512(&self, data: &[u8]) -> [u8; 64];

    /// 256-bit hash of `data`
    fn hash256(&self, data: &[u8]) -> [u8; 32];
}

/// Legacy Keccak (pre-FIPS padding), as used by Ethash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keccak;

impl HashProvider for Keccak {
    #[inline]
    fn hash512(&self, data: &[u8]) -> [u8; 64] {
        let mut out = [0u8; 64];
        out.copy_from_slice(&Keccak512::digest(data));
        out
    }

    #[inline]
    fn hash256(&self, data: &[u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&Keccak256::digest(data));
        out
    }
}

impl<H: HashProvider + ?Sized> HashProvider for &H {
    #[inline]
    fn hash512(&self, data: &[u8]) -> [u8; 64] {
        (**self).hash512(data)
    }

    #[inline]
    fn hash256(&self, data: &[u8]) -> [u8; 32] {
        (**self).hash256(data)
    }
}

/// FNV combine: `(a * 0x01000193) ^ b` with 32-bit wraparound.
///
/// Not a hash on its own, only the cheap mixing step used throughout.
#[inline(always)]
pub fn fnv(a: u32, b: u32) -> u32 {
    a.wrapping_mul(FNV_PRIME) ^ b
}

/// Element-wise [`fnv`] of `mix` with `data`.
#[inline(always)]
pub fn fnv_mix(mix: &mut [u32], data: &[u32]) {
    debug_assert_eq!(mix.len(), data.len());
    for (m, d) in mix.iter_mut().zip(data) {
        *m = fnv(*m, *d);
    }
}

/// Read a 64-byte digest as 16 little-endian words
#[inline(always)]
pub fn words_from_hash(bytes: &[u8; HASH_BYTES]) -> [u32; HASH_WORDS] {
    let mut words = [0u32; HASH_WORDS];
    read_words(bytes, &mut words);
    words
}

/// Serialize 16 words into a 64-byte little-endian buffer
#[inline(always)]
pub fn hash_from_words(words: &[u32; HASH_WORDS]) -> [u8; HASH_BYTES] {
    let mut bytes = [0u8; HASH_BYTES];
    write_words(words, &mut bytes);
    bytes
}

/// Decode little-endian words from `bytes` into `words`.
///
/// `bytes` must hold exactly `words.len() * 4` bytes.
#[inline(always)]
pub fn read_words(bytes: &[u8], words: &mut [u32]) {
    debug_assert_eq!(bytes.len(), words.len() * WORD_BYTES);
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(WORD_BYTES)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
}

/// Encode `words` little-endian into `bytes`.
#[inline(always)]
pub fn write_words(words: &[u32], bytes: &mut [u8]) {
    debug_assert_eq!(bytes.len(), words.len() * WORD_BYTES);
    for (word, chunk) in words.iter().zip(bytes.chunks_exact_mut(WORD_BYTES)) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_wraps_at_32_bits() {
        assert_eq!(fnv(0, 0), 0);
        assert_eq!(fnv(1, 0), FNV_PRIME);
        assert_eq!(fnv(1, 1), FNV_PRIME ^ 1);
        assert_eq!(
            fnv(u32::MAX, 0),
            ((u32::MAX as u64 * FNV_PRIME as u64) % (1u64 << 32)) as u32
        );
        for &(a, b) in &[(0xdead_beef_u32, 0x1234_5678_u32), (0x8000_0000, 7), (3, u32::MAX)] {
            let wide = ((a as u64 * FNV_PRIME as u64) & 0xffff_ffff) as u32;
            assert_eq!(fnv(a, b), wide ^ b);
        }
    }

    #[test]
    fn words_are_little_endian() {
        let mut bytes = [0u8; HASH_BYTES];
        bytes[0] = 0x01;
        bytes[1] = 0x02;
        bytes[63] = 0xff;
        let words = words_from_hash(&bytes);
        assert_eq!(words[0], 0x0201);
        assert_eq!(words[15], 0xff00_0000);
        assert_eq!(hash_from_words(&words), bytes);
    }

    #[test]
    fn keccak_matches_known_digests() {
        // Keccak-256 of 32 zero bytes is the epoch 1 seed.
        assert_eq!(
            hex::encode(Keccak.hash256(&[0u8; 32])),
            "290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"
        );
        // Legacy padding, not FIPS SHA3.
        assert_eq!(
            hex::encode(Keccak.hash256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}
