//! Dataset items and the two lookup strategies
//!
//! Every dataset item is a pure function of `(cache, index)`. Light clients
//! derive items on demand from the cache; miners materialize the whole
//! [`Dataset`] once per epoch and index into it.

use std::time::Instant;

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::params::*;
use crate::primitives::{HashProvider, Keccak, fnv, fnv_mix, read_words, write_words};

/// One 64-byte dataset entry
pub type DatasetItem = [u8; HASH_BYTES];

/// Source of dataset items for hashimoto.
///
/// Implementations are shared read-only between search workers.
pub trait DatasetLookup: Sync {
    /// Size in bytes of the full dataset this lookup represents
    fn dataset_size(&self) -> u64;

    /// Write item `index` as 16 little-endian words into `out`.
    fn item_words(&self, index: u32, out: &mut [u32]);
}

/// Derive dataset item `index` from the cache.
pub fn calc_dataset_item(cache: &Cache, index: u32) -> DatasetItem {
    calc_dataset_item_with(&Keccak, cache, index)
}

/// [`calc_dataset_item`] over an arbitrary hash provider.
///
/// Touches 256 pseudo-randomly chosen cache rows; this is the
/// bandwidth-bound step that makes small-memory shortcuts expensive.
pub fn calc_dataset_item_with<H: HashProvider>(
    hasher: &H,
    cache: &Cache,
    index: u32,
) -> DatasetItem {
    let rows = cache.rows();
    let mut mix = [0u32; HASH_WORDS];
    let mut buf = [0u8; HASH_BYTES];

    mix.copy_from_slice(cache.row(index % rows));
    mix[0] ^= index;
    write_words(&mix, &mut buf);
    read_words(&hasher.hash512(&buf), &mut mix);

    for p in 0..DATASET_PARENTS {
        let parent = fnv(index ^ p, mix[p as usize % HASH_WORDS]) % rows;
        fnv_mix(&mut mix, cache.row(parent));
    }

    write_words(&mix, &mut buf);
    hasher.hash512(&buf)
}

/// Check that `dataset_size` is usable as a hashimoto dataset size.
pub(crate) fn check_dataset_size(dataset_size: u64) -> Result<()> {
    let page = MIX_BYTES as u64;
    if dataset_size == 0 || dataset_size % page != 0 {
        return Err(Error::InvalidArgument(format!(
            "dataset size {dataset_size} is not a positive multiple of {page}"
        )));
    }
    if dataset_size / HASH_BYTES as u64 > u32::MAX as u64 {
        return Err(Error::InvalidArgument(format!(
            "dataset size {dataset_size} has more items than a 32-bit index can address"
        )));
    }
    Ok(())
}

/// Light strategy: items are recomputed from the cache on every lookup.
#[derive(Debug, Clone, Copy)]
pub struct Light<'a, H = Keccak> {
    hasher: H,
    cache: &'a Cache,
    dataset_size: u64,
}

impl<'a> Light<'a, Keccak> {
    pub fn new(cache: &'a Cache, dataset_size: u64) -> Result<Self> {
        Self::with_hasher(Keccak, cache, dataset_size)
    }
}

impl<'a, H: HashProvider> Light<'a, H> {
    pub fn with_hasher(hasher: H, cache: &'a Cache, dataset_size: u64) -> Result<Self> {
        check_dataset_size(dataset_size)?;
        Ok(Self {
            hasher,
            cache,
            dataset_size,
        })
    }

    /// Skip validation for sizes that already came from [`crate::EpochParameters`].
    pub(crate) fn from_parts(hasher: H, cache: &'a Cache, dataset_size: u64) -> Self {
        debug_assert!(check_dataset_size(dataset_size).is_ok());
        Self {
            hasher,
            cache,
            dataset_size,
        }
    }

    pub fn cache(&self) -> &'a Cache {
        self.cache
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}

impl<H: HashProvider> DatasetLookup for Light<'_, H> {
    fn dataset_size(&self) -> u64 {
        self.dataset_size
    }

    #[inline]
    fn item_words(&self, index: u32, out: &mut [u32]) {
        let item = calc_dataset_item_with(&self.hasher, self.cache, index);
        read_words(&item, out);
    }
}

/// Full strategy: every item precomputed, immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Dataset {
    words: Vec<u32>,
}

impl Dataset {
    /// Materialize `dataset_size` bytes of items from `cache`.
    pub fn generate(cache: &Cache, dataset_size: u64) -> Result<Self> {
        Self::generate_with(&Keccak, cache, dataset_size)
    }

    /// [`Dataset::generate`] over an arbitrary hash provider.
    pub fn generate_with<H: HashProvider>(
        hasher: &H,
        cache: &Cache,
        dataset_size: u64,
    ) -> Result<Self> {
        check_dataset_size(dataset_size)?;
        let len = usize::try_from(dataset_size / WORD_BYTES as u64).map_err(|_| {
            Error::Allocation {
                bytes: dataset_size,
            }
        })?;

        let start = Instant::now();
        debug!(
            "generating dataset: epoch={} size={dataset_size}",
            cache.epoch()
        );

        let mut words = Vec::new();
        words
            .try_reserve_exact(len)
            .map_err(|_| Error::Allocation {
                bytes: dataset_size,
            })?;
        words.resize(len, 0);
        fill_items(hasher, cache, &mut words);

        debug!(
            "dataset generated: items={} in {:.2?}",
            len / HASH_WORDS,
            start.elapsed()
        );
        Ok(Self { words })
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        (self.words.len() * WORD_BYTES) as u64
    }

    /// Number of 64-byte items
    pub fn items(&self) -> u32 {
        (self.words.len() / HASH_WORDS) as u32
    }

    /// Item `index` as bytes
    pub fn item(&self, index: u32) -> DatasetItem {
        let mut bytes = [0u8; HASH_BYTES];
        write_words(self.row(index), &mut bytes);
        bytes
    }

    #[inline(always)]
    fn row(&self, index: u32) -> &[u32] {
        let offset = index as usize * HASH_WORDS;
        &self.words[offset..offset + HASH_WORDS]
    }
}

impl DatasetLookup for Dataset {
    fn dataset_size(&self) -> u64 {
        self.size()
    }

    #[inline]
    fn item_words(&self, index: u32, out: &mut [u32]) {
        out.copy_from_slice(self.row(index));
    }
}

impl core::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dataset")
            .field("size", &self.size())
            .finish()
    }
}

/// Compute every item (parallel)
#[cfg(feature = "parallel")]
fn fill_items<H: HashProvider>(hasher: &H, cache: &Cache, words: &mut [u32]) {
    words
        .par_chunks_mut(HASH_WORDS)
        .enumerate()
        .for_each(|(index, dst)| {
            let item = calc_dataset_item_with(hasher, cache, index as u32);
            read_words(&item, dst);
        });
}

/// Compute every item (sequential fallback)
#[cfg(not(feature = "parallel"))]
fn fill_items<H: HashProvider>(hasher: &H, cache: &Cache, words: &mut [u32]) {
    for (index, dst) in words.chunks_mut(HASH_WORDS).enumerate() {
        let item = calc_dataset_item_with(hasher, cache, index as u32);
        read_words(&item, dst);
    }
}
