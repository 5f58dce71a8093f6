//! Epoch parameters and seed derivation
//!
//! Cache and dataset sizes grow linearly with the epoch and are then
//! trimmed down until the row count is prime, which breaks any regular
//! stride through the tables.

use crate::error::{Error, Result};
use crate::params::*;
use crate::primitives::{HashProvider, Keccak};

/// Sizes that hold for every block of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpochParameters {
    /// `block_number / EPOCH_LENGTH`
    pub epoch: u64,
    /// Cache size in bytes; `cache_size / 64` is prime
    pub cache_size: u64,
    /// Full dataset size in bytes; `dataset_size / 128` is prime
    pub dataset_size: u64,
}

impl EpochParameters {
    /// Derive the parameters for the epoch containing `block_number`.
    pub fn for_block(block_number: u64) -> Result<Self> {
        Self::for_epoch(epoch(block_number))
    }

    /// Derive the parameters for an epoch index.
    pub fn for_epoch(epoch: u64) -> Result<Self> {
        let cache_size = cache_size_for_epoch(epoch)?;
        let dataset_size = dataset_size_for_epoch(epoch)?;

        // Dataset items are addressed with 32-bit indices.
        if dataset_size / HASH_BYTES as u64 > u32::MAX as u64 {
            return Err(Error::Overflow {
                what: "dataset item index",
                epoch,
            });
        }
        if usize::try_from(cache_size).is_err() {
            return Err(Error::Overflow {
                what: "cache size",
                epoch,
            });
        }

        Ok(Self {
            epoch,
            cache_size,
            dataset_size,
        })
    }

    /// Number of 64-byte rows in the cache
    pub fn cache_rows(&self) -> u64 {
        self.cache_size / HASH_BYTES as u64
    }

    /// Number of 128-byte pages hashimoto indexes into
    pub fn dataset_pages(&self) -> u64 {
        self.dataset_size / MIX_BYTES as u64
    }

    /// Seed for this epoch
    pub fn seed(&self) -> [u8; 32] {
        seed_hash(self.epoch)
    }
}

/// Epoch index of a block
#[inline]
pub fn epoch(block_number: u64) -> u64 {
    block_number / EPOCH_LENGTH
}

/// Cache size in bytes for the epoch containing `block_number`
pub fn cache_size(block_number: u64) -> Result<u64> {
    cache_size_for_epoch(epoch(block_number))
}

/// Dataset size in bytes for the epoch containing `block_number`
pub fn dataset_size(block_number: u64) -> Result<u64> {
    dataset_size_for_epoch(epoch(block_number))
}

fn cache_size_for_epoch(epoch: u64) -> Result<u64> {
    let row = HASH_BYTES as u64;
    let mut size = grown_size(CACHE_BYTES_INIT, CACHE_BYTES_GROWTH, epoch, "cache size")? - row;
    while !is_prime(size / row) {
        size -= 2 * row;
    }
    Ok(size)
}

fn dataset_size_for_epoch(epoch: u64) -> Result<u64> {
    let page = MIX_BYTES as u64;
    let mut size =
        grown_size(DATASET_BYTES_INIT, DATASET_BYTES_GROWTH, epoch, "dataset size")? - page;
    while !is_prime(size / page) {
        size -= 2 * page;
    }
    Ok(size)
}

fn grown_size(init: u64, growth: u64, epoch: u64, what: &'static str) -> Result<u64> {
    growth
        .checked_mul(epoch)
        .and_then(|grown| grown.checked_add(init))
        .ok_or(Error::Overflow { what, epoch })
}

/// Trial division up to and including the integer square root.
pub(crate) fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut divisor = 3u64;
    // `divisor <= n / divisor` is `divisor * divisor <= n` without overflow
    while divisor <= n / divisor {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// Seed of an epoch: 32 zero bytes hashed `epoch` times with Keccak-256.
pub fn seed_hash(epoch: u64) -> [u8; 32] {
    seed_hash_with(&Keccak, epoch)
}

/// [`seed_hash`] over an arbitrary hash provider.
pub fn seed_hash_with<H: HashProvider>(hasher: &H, epoch: u64) -> [u8; 32] {
    let mut seed = [0u8; 32];
    for _ in 0..epoch {
        seed = hasher.hash256(&seed);
    }
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primality_includes_square_root() {
        for square in [4u64, 9, 25, 49, 121, 169, 289, 361, 529, 841] {
            assert!(!is_prime(square), "{square} is a perfect square");
        }
        for prime in [2u64, 3, 5, 7, 11, 13, 8191, 131_071, 524_287] {
            assert!(is_prime(prime), "{prime} is prime");
        }
        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(!is_prime(524_287 * 3));
    }

    #[test]
    fn epoch_boundaries() {
        assert_eq!(epoch(0), 0);
        assert_eq!(epoch(EPOCH_LENGTH - 1), 0);
        assert_eq!(epoch(EPOCH_LENGTH), 1);
        assert_eq!(epoch(300_005), 10);
    }

    #[test]
    fn growth_overflow_is_reported() {
        let err = cache_size_for_epoch(u64::MAX / CACHE_BYTES_GROWTH + 1).unwrap_err();
        assert!(matches!(err, Error::Overflow { what: "cache size", .. }));

        let err = EpochParameters::for_epoch(40_000).unwrap_err();
        assert!(matches!(err, Error::Overflow { what: "dataset item index", .. }));
    }
}
