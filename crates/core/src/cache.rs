//! Per-epoch cache construction
//!
//! The cache is a chain of 512-bit hashes seeded from the epoch seed,
//! followed by [`CACHE_ROUNDS`] passes of RandMemoHash. It is built once per
//! epoch and read concurrently by every dataset and hashimoto evaluation.

use std::time::Instant;

use log::debug;

use crate::epoch::{EpochParameters, epoch, seed_hash_with};
use crate::error::{Error, Result};
use crate::params::*;
use crate::primitives::{HashProvider, Keccak, read_words, write_words};

/// Immutable cache of one epoch, stored as little-endian decoded words.
#[derive(Clone, PartialEq, Eq)]
pub struct Cache {
    epoch: u64,
    words: Vec<u32>,
}

impl Cache {
    /// Build the cache for the epoch described by `params`.
    pub fn for_epoch(params: &EpochParameters) -> Result<Self> {
        Self::build_epoch_with(&Keccak, params.cache_size, params.epoch)
    }

    /// Build a cache of `cache_size` bytes for the epoch of `block_number`.
    pub fn build(cache_size: u64, block_number: u64) -> Result<Self> {
        Self::build_with(&Keccak, cache_size, block_number)
    }

    /// [`Cache::build`] over an arbitrary hash provider.
    ///
    /// `cache_size` must be a non-zero multiple of 64.
    pub fn build_with<H: HashProvider>(
        hasher: &H,
        cache_size: u64,
        block_number: u64,
    ) -> Result<Self> {
        Self::build_epoch_with(hasher, cache_size, epoch(block_number))
    }

    /// Build a cache of `cache_size` bytes for an epoch index.
    pub fn build_epoch_with<H: HashProvider>(
        hasher: &H,
        cache_size: u64,
        epoch: u64,
    ) -> Result<Self> {
        let row_bytes = HASH_BYTES as u64;
        if cache_size == 0 || cache_size % row_bytes != 0 {
            return Err(Error::InvalidArgument(format!(
                "cache size {cache_size} is not a positive multiple of {row_bytes}"
            )));
        }
        if cache_size / row_bytes > u32::MAX as u64 {
            return Err(Error::InvalidArgument(format!(
                "cache size {cache_size} has more rows than a 32-bit index can address"
            )));
        }
        let len = usize::try_from(cache_size / WORD_BYTES as u64).map_err(|_| {
            Error::Allocation {
                bytes: cache_size,
            }
        })?;

        let start = Instant::now();
        debug!("building cache: epoch={epoch} size={cache_size}");

        let mut words = Vec::new();
        words
            .try_reserve_exact(len)
            .map_err(|_| Error::Allocation { bytes: cache_size })?;
        words.resize(len, 0);

        let seed = seed_hash_with(hasher, epoch);
        fill_sequential(hasher, &seed, &mut words);
        for _ in 0..CACHE_ROUNDS {
            rand_memo_hash(hasher, &mut words);
        }

        debug!(
            "cache built: epoch={epoch} rows={} in {:.2?}",
            len / HASH_WORDS,
            start.elapsed()
        );
        Ok(Self { epoch, words })
    }

    /// Epoch this cache belongs to
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Cache contents as little-endian words
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Number of 64-byte rows
    pub fn rows(&self) -> u32 {
        (self.words.len() / HASH_WORDS) as u32
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        (self.words.len() * WORD_BYTES) as u64
    }

    /// One 16-word row
    #[inline(always)]
    pub(crate) fn row(&self, index: u32) -> &[u32] {
        let offset = index as usize * HASH_WORDS;
        &self.words[offset..offset + HASH_WORDS]
    }
}

impl AsRef<[u32]> for Cache {
    fn as_ref(&self) -> &[u32] {
        &self.words
    }
}

impl core::fmt::Debug for Cache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cache")
            .field("epoch", &self.epoch)
            .field("size", &self.size())
            .finish()
    }
}

/// `row[0] = H512(seed)`, `row[i] = H512(row[i - 1])`
fn fill_sequential<H: HashProvider>(hasher: &H, seed: &[u8; 32], words: &mut [u32]) {
    let mut row = hasher.hash512(seed);
    let mut rows = words.chunks_exact_mut(HASH_WORDS);
    if let Some(first) = rows.next() {
        read_words(&row, first);
    }
    for dst in rows {
        row = hasher.hash512(&row);
        read_words(&row, dst);
    }
}

/// One in-place RandMemoHash pass.
///
/// Rows are rewritten in increasing order, so both the left neighbour and
/// the parent may already hold this pass's value.
fn rand_memo_hash<H: HashProvider>(hasher: &H, words: &mut [u32]) {
    let rows = words.len() / HASH_WORDS;
    let mut xored = [0u32; HASH_WORDS];
    let mut buf = [0u8; HASH_BYTES];

    for j in 0..rows {
        let offset = j * HASH_WORDS;
        let left = ((j + rows - 1) % rows) * HASH_WORDS;
        let parent = (words[offset] as usize % rows) * HASH_WORDS;

        for (k, x) in xored.iter_mut().enumerate() {
            *x = words[left + k] ^ words[parent + k];
        }
        write_words(&xored, &mut buf);
        let digest = hasher.hash512(&buf);
        read_words(&digest, &mut words[offset..offset + HASH_WORDS]);
    }
}
