//! Difficulty target
//!
//! A target is a 256-bit unsigned magnitude carried in little-endian byte
//! order. A final hash, read the same way, meets the target when it is
//! strictly smaller.

use core::cmp::Ordering;
use core::fmt;

use ethereum_types::{U256, U512};

use crate::error::{Error, Result};

/// Little-endian 256-bit difficulty threshold
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target([u8; 32]);

impl Target {
    /// Largest target; every hash except all-ones meets it
    pub const MAX: Target = Target([0xff; 32]);

    pub const fn from_le_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 32-byte little-endian target.
    pub fn from_le_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            Error::InvalidArgument(format!("target must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_le_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_u256(&self) -> U256 {
        U256::from_little_endian(&self.0)
    }

    pub fn from_u256(value: U256) -> Self {
        let mut bytes = [0u8; 32];
        value.to_little_endian(&mut bytes);
        Self(bytes)
    }

    /// `2^256 / difficulty`; difficulty 1 maps to [`Target::MAX`].
    pub fn from_difficulty(difficulty: U256) -> Result<Self> {
        if difficulty.is_zero() {
            return Err(Error::InvalidArgument("difficulty must be non-zero".into()));
        }
        Ok(Self::from_u256(invert(difficulty)))
    }

    /// Inverse of [`Target::from_difficulty`]; zero and one map to `U256::MAX`.
    pub fn to_difficulty(&self) -> U256 {
        let target = self.to_u256();
        if target.is_zero() {
            U256::max_value()
        } else {
            invert(target)
        }
    }

    /// True when `final_hash`, read little-endian, is strictly below the target.
    #[inline]
    pub fn is_met_by(&self, final_hash: &[u8; 32]) -> bool {
        compare_le(final_hash, &self.0) == Ordering::Less
    }
}

/// `2^256 / value`, saturating at `U256::MAX`
fn invert(value: U256) -> U256 {
    if value == U256::one() {
        return U256::max_value();
    }
    let quotient = (U512::one() << 256) / U512::from(value);
    U256::try_from(quotient).unwrap_or_else(|_| U256::max_value())
}

/// Compare two little-endian 256-bit magnitudes.
pub fn compare_le(a: &[u8; 32], b: &[u8; 32]) -> Ordering {
    a.iter().rev().cmp(b.iter().rev())
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

impl From<[u8; 32]> for Target {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top_byte(value: u8) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[31] = value;
        bytes
    }

    #[test]
    fn comparison_starts_at_the_last_byte() {
        let target = Target::from_le_bytes(top_byte(0xff));

        let mut below = [0xffu8; 32];
        below[31] = 0xfe;
        assert!(target.is_met_by(&below));

        let mut above = [0u8; 32];
        above[31] = 0xff;
        above[0] = 1;
        assert!(!target.is_met_by(&above));
    }

    #[test]
    fn equality_does_not_meet_target() {
        let target = Target::from_le_bytes(top_byte(0x10));
        assert!(!target.is_met_by(&top_byte(0x10)));
        assert!(!Target::MAX.is_met_by(&[0xff; 32]));
        assert!(!Target::from_le_bytes([0u8; 32]).is_met_by(&[0u8; 32]));
    }

    #[test]
    fn difficulty_round_trip() {
        assert_eq!(Target::from_difficulty(U256::one()).unwrap(), Target::MAX);
        assert!(Target::from_difficulty(U256::zero()).is_err());

        let target = Target::from_difficulty(U256::from(2u64)).unwrap();
        assert_eq!(target, Target::from_le_bytes(top_byte(0x80)));
        assert_eq!(target.to_difficulty(), U256::from(2u64));

        let hard = Target::from_difficulty(U256::from(1_000_000u64)).unwrap();
        assert_eq!(hard.to_difficulty(), U256::from(1_000_000u64));
    }

    #[test]
    fn slice_length_is_checked() {
        assert!(Target::from_le_slice(&[0u8; 31]).is_err());
        assert!(Target::from_le_slice(&[0u8; 33]).is_err());
        assert_eq!(
            Target::from_le_slice(&top_byte(1)).unwrap(),
            Target::from_le_bytes(top_byte(1))
        );
    }
}
