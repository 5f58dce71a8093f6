//! Error types

use thiserror::Error;

/// Errors reported by the Ethash core.
///
/// Verification failures and search terminal states are ordinary outcomes
/// ([`crate::Verdict`], [`crate::SearchOutcome`]) and never show up here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed input, rejected before any hashing work
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Size arithmetic left the supported integer domain
    #[error("{what} overflows at epoch {epoch}")]
    Overflow { what: &'static str, epoch: u64 },

    /// Not enough memory for the requested table
    #[error("failed to allocate {bytes} bytes")]
    Allocation { bytes: u64 },
}

pub type Result<T> = core::result::Result<T, Error>;
