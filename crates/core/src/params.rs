//! Ethash Algorithm Parameters
//!
//! Sizes are in bytes unless the name says otherwise. These values are
//! consensus-critical: changing any of them changes every hash.

/// Blocks per epoch
pub const EPOCH_LENGTH: u64 = 30_000;

/// Cache size at genesis (16 MB)
pub const CACHE_BYTES_INIT: u64 = 1 << 24;

/// Cache growth per epoch (128 KB)
pub const CACHE_BYTES_GROWTH: u64 = 1 << 17;

/// Dataset size at genesis (1 GB)
pub const DATASET_BYTES_INIT: u64 = 1 << 30;

/// Dataset growth per epoch (8 MB)
pub const DATASET_BYTES_GROWTH: u64 = 1 << 23;

/// Bytes per word
pub const WORD_BYTES: usize = 4;

/// Output of the 512-bit hash, also the size of a cache row and a dataset item
pub const HASH_BYTES: usize = 64;

/// Words per cache row / dataset item
pub const HASH_WORDS: usize = HASH_BYTES / WORD_BYTES;

/// Width of the hashimoto mix
pub const MIX_BYTES: usize = 128;

/// Words in the hashimoto mix
pub const MIX_WORDS: usize = MIX_BYTES / WORD_BYTES;

/// Dataset items fetched per hashimoto access
pub const MIX_HASHES: usize = MIX_BYTES / HASH_BYTES;

/// Number of parents of each dataset item
pub const DATASET_PARENTS: u32 = 256;

/// Number of RandMemoHash passes in cache production
pub const CACHE_ROUNDS: usize = 3;

/// Number of dataset accesses in the hashimoto loop
pub const ACCESSES: usize = 64;

/// FNV multiplier
pub const FNV_PRIME: u32 = 0x0100_0193;
