//! Serializable command reports
//!
//! Hashes are hex strings; sizes are bytes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::algorithm::{EpochParameters, HashResult, SearchOutcome, Target, Verdict};

/// Epoch parameters for a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsReport {
    pub block: u64,
    pub epoch: u64,
    pub cache_size: u64,
    pub dataset_size: u64,
    pub seed: String,
}

impl ParamsReport {
    pub fn new(block: u64, params: &EpochParameters) -> Self {
        Self {
            block,
            epoch: params.epoch,
            cache_size: params.cache_size,
            dataset_size: params.dataset_size,
            seed: hex::encode(params.seed()),
        }
    }
}

/// One hashimoto evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashReport {
    pub block: u64,
    pub header: String,
    pub nonce: u64,
    pub mix_digest: String,
    pub final_hash: String,
    /// `mix_digest || final_hash`
    pub result: String,
}

impl HashReport {
    pub fn new(block: u64, header: &[u8; 32], nonce: u64, result: &HashResult) -> Self {
        Self {
            block,
            header: hex::encode(header),
            nonce,
            mix_digest: hex::encode(result.mix_digest),
            final_hash: hex::encode(result.final_hash),
            result: hex::encode(result.to_bytes()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Found,
    Exhausted,
    Cancelled,
}

/// Outcome of a nonce search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub block: u64,
    pub header: String,
    /// Little-endian target bytes
    pub target: String,
    pub start: u64,
    pub count: u64,
    pub threads: usize,
    pub full_dataset: bool,
    pub status: SearchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<HashReport>,
    pub hashes: u64,
    pub elapsed_secs: f64,
    pub hashrate: f64,
}

/// Inputs of a search, echoed back in its report
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub block: u64,
    pub header: &'a [u8; 32],
    pub target: &'a Target,
    pub start: u64,
    pub count: u64,
    pub threads: usize,
    pub full_dataset: bool,
}

impl SearchReport {
    pub fn new(
        request: SearchRequest<'_>,
        outcome: &SearchOutcome,
        hashes: u64,
        elapsed: Duration,
    ) -> Self {
        let (status, solution) = match outcome {
            SearchOutcome::Found(solution) => (
                SearchStatus::Found,
                Some(HashReport::new(
                    request.block,
                    request.header,
                    solution.nonce,
                    &solution.result,
                )),
            ),
            SearchOutcome::Exhausted => (SearchStatus::Exhausted, None),
            SearchOutcome::Cancelled => (SearchStatus::Cancelled, None),
        };

        Self {
            block: request.block,
            header: hex::encode(request.header),
            target: hex::encode(request.target.as_le_bytes()),
            start: request.start,
            count: request.count,
            threads: request.threads,
            full_dataset: request.full_dataset,
            status,
            solution,
            hashes,
            elapsed_secs: elapsed.as_secs_f64(),
            hashrate: rate(hashes, elapsed),
        }
    }
}

/// Verifier verdict for a claimed solution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    pub block: u64,
    pub nonce: u64,
    pub verdict: String,
    pub valid: bool,
}

impl VerifyReport {
    pub fn new(block: u64, nonce: u64, verdict: Verdict) -> Self {
        Self {
            block,
            nonce,
            verdict: verdict_name(verdict).to_string(),
            valid: verdict.is_valid(),
        }
    }
}

/// Light hashing throughput
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub block: u64,
    pub epoch: u64,
    pub cache_build_secs: f64,
    pub hashes: u64,
    pub elapsed_secs: f64,
    pub hashrate: f64,
}

impl BenchmarkReport {
    pub fn new(
        block: u64,
        epoch: u64,
        cache_build: Duration,
        hashes: u64,
        elapsed: Duration,
    ) -> Self {
        Self {
            block,
            epoch,
            cache_build_secs: cache_build.as_secs_f64(),
            hashes,
            elapsed_secs: elapsed.as_secs_f64(),
            hashrate: rate(hashes, elapsed),
        }
    }
}

pub fn verdict_name(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Valid => "valid",
        Verdict::MixMismatch => "mix_mismatch",
        Verdict::DifficultyNotMet => "difficulty_not_met",
    }
}

/// Hashes per second; zero for an instant run
pub fn rate(hashes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        hashes as f64 / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Solution;

    fn sample_result() -> HashResult {
        HashResult {
            mix_digest: [0x11; 32],
            final_hash: [0x22; 32],
        }
    }

    #[test]
    fn test_hash_report_hex_fields() {
        let report = HashReport::new(5, &[0xab; 32], 9, &sample_result());
        assert_eq!(report.header, "ab".repeat(32));
        assert_eq!(report.mix_digest, "11".repeat(32));
        assert_eq!(report.final_hash, "22".repeat(32));
        assert_eq!(report.result, format!("{}{}", "11".repeat(32), "22".repeat(32)));
    }

    #[test]
    fn test_search_report_found() {
        let header = [0u8; 32];
        let request = SearchRequest {
            block: 1,
            header: &header,
            target: &Target::MAX,
            start: 100,
            count: 10,
            threads: 2,
            full_dataset: false,
        };
        let outcome = SearchOutcome::Found(Solution {
            nonce: 104,
            result: sample_result(),
        });
        let report = SearchReport::new(request, &outcome, 5, Duration::from_secs(1));

        assert_eq!(report.status, SearchStatus::Found);
        assert_eq!(report.solution.as_ref().map(|s| s.nonce), Some(104));
        assert_eq!(report.hashrate, 5.0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["solution"]["nonce"], 104);
    }

    #[test]
    fn test_exhausted_report_omits_solution() {
        let header = [0u8; 32];
        let request = SearchRequest {
            block: 1,
            header: &header,
            target: &Target::MAX,
            start: 0,
            count: 0,
            threads: 1,
            full_dataset: true,
        };
        let report = SearchReport::new(request, &SearchOutcome::Exhausted, 0, Duration::ZERO);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "exhausted");
        assert!(json.get("solution").is_none());
        assert_eq!(report.hashrate, 0.0);
    }

    #[test]
    fn test_verify_report() {
        let report = VerifyReport::new(0, 1, Verdict::DifficultyNotMet);
        assert_eq!(report.verdict, "difficulty_not_met");
        assert!(!report.valid);
        assert!(VerifyReport::new(0, 1, Verdict::Valid).valid);
    }
}
