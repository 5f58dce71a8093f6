//! Light verification of claimed solutions

use crate::cache::Cache;
use crate::dataset::Light;
use crate::error::Result;
use crate::hashimoto::{HashResult, hashimoto_with, quick_final_hash_with};
use crate::primitives::{HashProvider, Keccak};
use crate::target::Target;

/// Result of checking a `(header, nonce, result)` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Valid,
    /// The claimed mix digest or final hash is not what the nonce produces
    MixMismatch,
    /// The claim is genuine but the final hash is not below the target
    DifficultyNotMet,
}

impl Verdict {
    pub fn is_valid(self) -> bool {
        self == Verdict::Valid
    }
}

/// Re-evaluates claims from the cache alone; never builds a full dataset.
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'a, H = Keccak> {
    light: Light<'a, H>,
}

impl<'a> Verifier<'a, Keccak> {
    pub fn new(cache: &'a Cache, dataset_size: u64) -> Result<Self> {
        Ok(Self {
            light: Light::new(cache, dataset_size)?,
        })
    }
}

impl<'a, H: HashProvider> Verifier<'a, H> {
    pub fn with_hasher(hasher: H, cache: &'a Cache, dataset_size: u64) -> Result<Self> {
        Ok(Self {
            light: Light::with_hasher(hasher, cache, dataset_size)?,
        })
    }

    pub(crate) fn from_light(light: Light<'a, H>) -> Self {
        Self { light }
    }

    /// Full check: recompute, compare both halves, then test the target.
    pub fn verify(
        &self,
        header: &[u8; 32],
        nonce: u64,
        claimed: &HashResult,
        target: &Target,
    ) -> Verdict {
        let recomputed = hashimoto_with(self.light.hasher(), &self.light, header, nonce);
        if recomputed != *claimed {
            return Verdict::MixMismatch;
        }
        if !target.is_met_by(&recomputed.final_hash) {
            return Verdict::DifficultyNotMet;
        }
        Verdict::Valid
    }

    /// Cheap pre-filter using only two hash calls.
    ///
    /// Rejects claims whose final hash does not follow from the claimed mix
    /// digest, or does not meet the target. `Valid` here only means the
    /// claim is worth a full [`Verifier::verify`].
    pub fn quick_check(
        &self,
        header: &[u8; 32],
        nonce: u64,
        claimed: &HashResult,
        target: &Target,
    ) -> Verdict {
        let final_hash =
            quick_final_hash_with(self.light.hasher(), header, nonce, &claimed.mix_digest);
        if final_hash != claimed.final_hash {
            return Verdict::MixMismatch;
        }
        if !target.is_met_by(&final_hash) {
            return Verdict::DifficultyNotMet;
        }
        Verdict::Valid
    }
}
