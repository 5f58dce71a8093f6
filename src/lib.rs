//! Ethash Miner Library
//!
//! Configuration and reporting for the `ethash` command-line miner.
//!
//! # Overview
//!
//! The proof-of-work itself lives in `ethash-core`, re-exported here as
//! [`algorithm`]. This crate adds what a standalone miner needs around it:
//! a JSON configuration file and serializable reports of parameters,
//! hashes, search outcomes and verdicts.
//!
//! # Example
//!
//! ```rust,no_run
//! use ethash_miner::algorithm::EpochContext;
//! use ethash_miner::report::HashReport;
//!
//! let context = EpochContext::new(300_005)?;
//! let header = [0u8; 32];
//! let result = context.hashimoto(&header, 7);
//!
//! let report = HashReport::new(300_005, &header, 7, &result);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export the core algorithm
pub use ethash_core as algorithm;

pub mod config;
pub mod report;

// Convenience re-exports
pub use algorithm::{EpochContext, Target, Verdict};
