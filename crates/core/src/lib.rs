//! # Ethash Core Algorithm
//!
//! The memory-hard proof-of-work used by Ethereum 1.x, split into the
//! pieces a miner or a light verifier actually needs.
//!
//! ## Algorithm Parameters
//!
//! - Epochs of 30,000 blocks
//! - Cache of ~16 MiB at epoch 0, growing 128 KiB per epoch
//! - Dataset of ~1 GiB at epoch 0, growing 8 MiB per epoch
//! - 256 parents per dataset item, 64 dataset accesses per hash
//! - Keccak-256/512 (legacy padding) and FNV-1 style mixing
//!
//! ## Pipeline
//!
//! ```text
//! block -> EpochParameters -> seed -> Cache -> (Light | Dataset) -> hashimoto
//!                                                                -> NonceSearch
//!                                                                -> Verifier
//! ```
//!
//! Sizes are always byte counts; every multi-byte value that enters or
//! leaves a hash is little-endian.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ethash_core::{EpochContext, Target, Verdict};
//!
//! // Builds the ~16 MiB cache for epoch 0
//! let context = EpochContext::new(0)?;
//!
//! let header = [0u8; 32];
//! let result = context.hashimoto(&header, 42);
//!
//! let verdict = context.verifier().verify(&header, 42, &result, &Target::MAX);
//! assert_eq!(verdict, Verdict::Valid);
//! # Ok::<(), ethash_core::Error>(())
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): generate full datasets with rayon
//!
//! Nonce search always runs on scoped std threads; see [`NonceSearch`].

mod cache;
mod context;
mod dataset;
mod epoch;
mod error;
mod hashimoto;
mod params;
mod primitives;
mod search;
mod target;
mod verify;

pub use cache::Cache;
pub use context::{ContextCache, EpochContext};
pub use dataset::{
    Dataset, DatasetItem, DatasetLookup, Light, calc_dataset_item, calc_dataset_item_with,
};
pub use epoch::{EpochParameters, cache_size, dataset_size, epoch, seed_hash, seed_hash_with};
pub use error::{Error, Result};
pub use hashimoto::{
    HashResult, hashimoto, hashimoto_with, header_from_slice, quick_final_hash,
    quick_final_hash_with,
};
pub use params::*;
pub use primitives::{HashProvider, Keccak, fnv, fnv_mix, hash_from_words, words_from_hash};
pub use search::{
    CpuEvaluator, Evaluator, NonceSearch, Scan, SearchConfig, SearchControl, SearchOutcome,
    SearchState, Solution, StopHandle, partition,
};
pub use target::{Target, compare_le};
pub use verify::{Verdict, Verifier};

/// Re-exported so callers can build difficulties without a direct dependency.
pub use ethereum_types::U256;
