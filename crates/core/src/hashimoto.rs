//! Hashimoto: binding header and nonce to 64 dataset accesses

use crate::dataset::{DatasetLookup, check_dataset_size};
use crate::error::{Error, Result};
use crate::params::*;
use crate::primitives::{HashProvider, Keccak, fnv, fnv_mix, read_words, write_words};

/// Output of one hashimoto evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashResult {
    /// Compressed mix, attests which dataset entries were visited
    pub mix_digest: [u8; 32],
    /// Value compared against the target
    pub final_hash: [u8; 32],
}

impl HashResult {
    /// Wire form: `mix_digest || final_hash`
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.mix_digest);
        out[32..].copy_from_slice(&self.final_hash);
        out
    }

    /// Parse the 64-byte wire form.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 64 {
            return Err(Error::InvalidArgument(format!(
                "hash result must be 64 bytes, got {}",
                bytes.len()
            )));
        }
        let mut result = Self {
            mix_digest: [0u8; 32],
            final_hash: [0u8; 32],
        };
        result.mix_digest.copy_from_slice(&bytes[..32]);
        result.final_hash.copy_from_slice(&bytes[32..]);
        Ok(result)
    }
}

/// Validate a caller-supplied header digest.
pub fn header_from_slice(bytes: &[u8]) -> Result<[u8; 32]> {
    bytes.try_into().map_err(|_| {
        Error::InvalidArgument(format!("header must be 32 bytes, got {}", bytes.len()))
    })
}

/// Run hashimoto with Keccak against any lookup strategy.
pub fn hashimoto<L: DatasetLookup + ?Sized>(
    lookup: &L,
    header: &[u8; 32],
    nonce: u64,
) -> HashResult {
    hashimoto_with(&Keccak, lookup, header, nonce)
}

/// Hashimoto over an arbitrary hash provider.
///
/// All scratch state lives on the stack; concurrent calls share nothing but
/// the read-only lookup.
pub fn hashimoto_with<H: HashProvider, L: DatasetLookup + ?Sized>(
    hasher: &H,
    lookup: &L,
    header: &[u8; 32],
    nonce: u64,
) -> HashResult {
    debug_assert!(check_dataset_size(lookup.dataset_size()).is_ok());
    let pages = (lookup.dataset_size() / MIX_BYTES as u64) as u32;

    let seed = seed_of(hasher, header, nonce);

    // Seed replicated to fill the 128-byte mix
    let mut mix = [0u32; MIX_WORDS];
    for half in mix.chunks_exact_mut(HASH_WORDS) {
        read_words(&seed, half);
    }
    let seed_head = mix[0];

    let mut fetched = [0u32; MIX_WORDS];
    for i in 0..ACCESSES as u32 {
        let page = fnv(i ^ seed_head, mix[i as usize % MIX_WORDS]) % pages;
        for (j, dst) in fetched.chunks_exact_mut(HASH_WORDS).enumerate() {
            lookup.item_words(MIX_HASHES as u32 * page + j as u32, dst);
        }
        fnv_mix(&mut mix, &fetched);
    }

    let mut cmix = [0u32; MIX_WORDS / 4];
    for (c, lane) in cmix.iter_mut().zip(mix.chunks_exact(4)) {
        *c = fnv(fnv(fnv(lane[0], lane[1]), lane[2]), lane[3]);
    }
    let mut mix_digest = [0u8; 32];
    write_words(&cmix, &mut mix_digest);

    HashResult {
        mix_digest,
        final_hash: final_hash(hasher, &seed, &mix_digest),
    }
}

/// Recompute the final hash from a claimed mix digest without touching
/// any cache or dataset.
///
/// Cheap enough to run on every incoming claim before full verification.
pub fn quick_final_hash(header: &[u8; 32], nonce: u64, mix_digest: &[u8; 32]) -> [u8; 32] {
    quick_final_hash_with(&Keccak, header, nonce, mix_digest)
}

/// [`quick_final_hash`] over an arbitrary hash provider.
pub fn quick_final_hash_with<H: HashProvider>(
    hasher: &H,
    header: &[u8; 32],
    nonce: u64,
    mix_digest: &[u8; 32],
) -> [u8; 32] {
    let seed = seed_of(hasher, header, nonce);
    final_hash(hasher, &seed, mix_digest)
}

/// `H512(header || le(nonce))`
#[inline(always)]
fn seed_of<H: HashProvider>(hasher: &H, header: &[u8; 32], nonce: u64) -> [u8; 64] {
    let mut buf = [0u8; 40];
    buf[..32].copy_from_slice(header);
    buf[32..].copy_from_slice(&nonce.to_le_bytes());
    hasher.hash512(&buf)
}

/// `H256(seed || mix_digest)`
#[inline(always)]
fn final_hash<H: HashProvider>(hasher: &H, seed: &[u8; 64], mix_digest: &[u8; 32]) -> [u8; 32] {
    let mut buf = [0u8; 96];
    buf[..64].copy_from_slice(seed);
    buf[64..].copy_from_slice(mix_digest);
    hasher.hash256(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_is_mix_then_final() {
        let result = HashResult {
            mix_digest: [1u8; 32],
            final_hash: [2u8; 32],
        };
        let bytes = result.to_bytes();
        assert_eq!(&bytes[..32], &[1u8; 32]);
        assert_eq!(&bytes[32..], &[2u8; 32]);
        assert_eq!(HashResult::from_slice(&bytes).unwrap(), result);
        assert!(HashResult::from_slice(&bytes[..63]).is_err());
    }

    #[test]
    fn header_length_is_checked() {
        assert!(header_from_slice(&[0u8; 32]).is_ok());
        assert!(matches!(
            header_from_slice(&[0u8; 31]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(header_from_slice(&[0u8; 40]).is_err());
    }
}
