//! Per-epoch context and the epoch-keyed context cache
//!
//! Building a cache costs millions of hash calls, so callers keep one
//! [`EpochContext`] per epoch and only rebuild when the epoch changes.
//! [`ContextCache`] does that bookkeeping.

use std::sync::{Arc, Mutex, PoisonError};

use log::info;

use crate::cache::Cache;
use crate::dataset::{Dataset, Light};
use crate::epoch::{EpochParameters, epoch};
use crate::error::Result;
use crate::hashimoto::{HashResult, hashimoto};
use crate::primitives::Keccak;
use crate::search::{CpuEvaluator, NonceSearch, SearchOutcome};
use crate::target::Target;
use crate::verify::Verifier;

/// Parameters and cache of one epoch
#[derive(Debug)]
pub struct EpochContext {
    params: EpochParameters,
    cache: Cache,
}

impl EpochContext {
    /// Build the context for the epoch containing `block_number`.
    pub fn new(block_number: u64) -> Result<Self> {
        Self::for_epoch(epoch(block_number))
    }

    pub fn for_epoch(epoch: u64) -> Result<Self> {
        let params = EpochParameters::for_epoch(epoch)?;
        let cache = Cache::for_epoch(&params)?;
        Ok(Self { params, cache })
    }

    pub fn params(&self) -> &EpochParameters {
        &self.params
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn is_valid_for(&self, block_number: u64) -> bool {
        epoch(block_number) == self.params.epoch
    }

    /// Light lookup sized for this epoch's dataset
    pub fn light(&self) -> Light<'_, Keccak> {
        Light::from_parts(Keccak, &self.cache, self.params.dataset_size)
    }

    /// Materialize the full dataset of this epoch.
    pub fn dataset(&self) -> Result<Dataset> {
        Dataset::generate(&self.cache, self.params.dataset_size)
    }

    /// Light hashimoto
    pub fn hashimoto(&self, header: &[u8; 32], nonce: u64) -> HashResult {
        hashimoto(&self.light(), header, nonce)
    }

    pub fn verifier(&self) -> Verifier<'_, Keccak> {
        Verifier::from_light(self.light())
    }

    /// Run `search` over `[start, start + count)` in light mode.
    pub fn search_light(
        &self,
        search: &NonceSearch,
        header: [u8; 32],
        target: Target,
        start: u64,
        count: u64,
    ) -> Result<SearchOutcome> {
        let light = self.light();
        let evaluator = CpuEvaluator::new(&light, header, target);
        search.run(&evaluator, start, count)
    }
}

/// Holds the most recent epoch context, rebuilding it on epoch change.
#[derive(Debug, Default)]
pub struct ContextCache {
    current: Mutex<Option<Arc<EpochContext>>>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for `block_number`, built on first use of each epoch.
    ///
    /// Concurrent callers for a new epoch wait for a single build.
    pub fn get(&self, block_number: u64) -> Result<Arc<EpochContext>> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(context) = current.as_ref() {
            if context.is_valid_for(block_number) {
                return Ok(Arc::clone(context));
            }
        }

        let context = Arc::new(EpochContext::new(block_number)?);
        info!(
            "epoch {} context ready: cache={} dataset={}",
            context.params.epoch, context.params.cache_size, context.params.dataset_size
        );
        *current = Some(Arc::clone(&context));
        Ok(context)
    }

    /// Epoch of the held context, if any
    pub fn epoch(&self) -> Option<u64> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|context| context.params.epoch)
    }

    /// True when [`ContextCache::get`] would return the held context as is.
    pub fn is_valid_for(&self, block_number: u64) -> bool {
        self.epoch() == Some(epoch(block_number))
    }

    pub fn clear(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
