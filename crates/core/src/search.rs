//! Parallel nonce search
//!
//! A search scans `[start, start + count)` by splitting it into contiguous
//! subranges, one per worker. Workers only share the read-only lookup and a
//! [`SearchControl`]; the first worker to publish a solution wins and every
//! other worker stops before its next nonce.
//!
//! When several workers find valid nonces at nearly the same time, which one
//! is reported depends on scheduling. Callers that need the lowest valid
//! nonce must rescan below the reported one themselves.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Instant;

use log::{info, trace};

use crate::dataset::DatasetLookup;
use crate::error::{Error, Result};
use crate::hashimoto::{HashResult, hashimoto_with};
use crate::primitives::{HashProvider, Keccak};
use crate::target::Target;

/// A nonce together with the hash that proves it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    pub result: HashResult,
}

/// Terminal state of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A nonce meeting the target
    Found(Solution),
    /// Every nonce in the range was tried; ask for the next range
    Exhausted,
    /// Stopped through a [`StopHandle`] before any solution was found
    Cancelled,
}

/// Observable lifecycle of a [`NonceSearch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SearchState {
    Idle = 0,
    Searching = 1,
    Found = 2,
    Exhausted = 3,
    Cancelled = 4,
}

impl SearchState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Searching,
            2 => Self::Found,
            3 => Self::Exhausted,
            4 => Self::Cancelled,
            _ => Self::Idle,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Found | Self::Exhausted | Self::Cancelled)
    }
}

/// Shared signals between a search and its workers.
#[derive(Debug, Default)]
pub struct SearchControl {
    stop: AtomicBool,
    cancelled: AtomicBool,
    hashes: AtomicU64,
}

impl SearchControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checked by workers once per nonce
    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Stop workers because a solution has been published
    pub fn force_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Stop workers on behalf of the caller
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn record_hash(&self) {
        self.hashes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hashes(&self) -> u64 {
        self.hashes.load(Ordering::Relaxed)
    }
}

/// Cloneable handle for cancelling a search from another thread
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<SearchControl>);

impl StopHandle {
    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Hashes computed so far
    pub fn hashes(&self) -> u64 {
        self.0.hashes()
    }
}

/// How one worker's scan of its subrange ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    Found(Solution),
    /// Every nonce of the subrange was tried
    Finished,
    /// Left early because `should_stop()` was set
    Stopped,
}

/// Hardware-agnostic unit of search work.
///
/// A CPU thread, a SIMD batch or an accelerator queue all fit behind this
/// contract: scan `nonces`, honour `control.should_stop()` between nonces,
/// and report the first solution or how the scan ended.
pub trait Evaluator: Sync {
    fn evaluate(&self, nonces: Range<u64>, control: &SearchControl) -> Scan;
}

/// Evaluator running hashimoto on the calling thread.
pub struct CpuEvaluator<'a, L: ?Sized, H = Keccak> {
    hasher: H,
    lookup: &'a L,
    header: [u8; 32],
    target: Target,
}

impl<'a, L: DatasetLookup + ?Sized> CpuEvaluator<'a, L, Keccak> {
    pub fn new(lookup: &'a L, header: [u8; 32], target: Target) -> Self {
        Self::with_hasher(Keccak, lookup, header, target)
    }
}

impl<'a, L: DatasetLookup + ?Sized, H: HashProvider> CpuEvaluator<'a, L, H> {
    pub fn with_hasher(hasher: H, lookup: &'a L, header: [u8; 32], target: Target) -> Self {
        Self {
            hasher,
            lookup,
            header,
            target,
        }
    }
}

impl<L: DatasetLookup + ?Sized, H: HashProvider> Evaluator for CpuEvaluator<'_, L, H> {
    fn evaluate(&self, nonces: Range<u64>, control: &SearchControl) -> Scan {
        for nonce in nonces {
            if control.should_stop() {
                return Scan::Stopped;
            }
            let result = hashimoto_with(&self.hasher, self.lookup, &self.header, nonce);
            control.record_hash();
            if self.target.is_met_by(&result.final_hash) {
                return Scan::Found(Solution { nonce, result });
            }
        }
        Scan::Finished
    }
}

/// Search tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Number of workers
    pub threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl SearchConfig {
    pub fn with_threads(threads: usize) -> Self {
        Self { threads }
    }
}

/// One-shot nonce search: `Idle -> Searching -> {Found | Exhausted | Cancelled}`.
#[derive(Debug)]
pub struct NonceSearch {
    config: SearchConfig,
    control: Arc<SearchControl>,
    state: AtomicU8,
}

impl NonceSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            control: Arc::new(SearchControl::new()),
            state: AtomicU8::new(SearchState::Idle as u8),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.control))
    }

    pub fn state(&self) -> SearchState {
        SearchState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Hashes computed so far
    pub fn hashes(&self) -> u64 {
        self.control.hashes()
    }

    /// Scan `[start, start + count)` with `evaluator` on scoped worker threads.
    ///
    /// The outcome is `Cancelled` only when a cancel made some worker skip
    /// nonces; a cancel that lands after the whole range was tried still
    /// reports `Exhausted`.
    pub fn run<E: Evaluator>(
        &self,
        evaluator: &E,
        start: u64,
        count: u64,
    ) -> Result<SearchOutcome> {
        if self.config.threads == 0 {
            return Err(Error::InvalidArgument("threads must be >= 1".into()));
        }
        let end = start.checked_add(count).ok_or_else(|| {
            Error::InvalidArgument(format!("nonce range {start}+{count} exceeds u64"))
        })?;
        self.state
            .compare_exchange(
                SearchState::Idle as u8,
                SearchState::Searching as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map_err(|_| Error::InvalidArgument("search has already been run".into()))?;

        let started = Instant::now();
        let winner: OnceLock<Solution> = OnceLock::new();
        let stopped_early = AtomicBool::new(false);
        let control: &SearchControl = &self.control;

        thread::scope(|scope| {
            for (worker, nonces) in partition(start..end, self.config.threads)
                .into_iter()
                .enumerate()
            {
                let winner = &winner;
                let stopped_early = &stopped_early;
                scope.spawn(move || {
                    trace!("worker {worker}: nonces {}..{}", nonces.start, nonces.end);
                    match evaluator.evaluate(nonces, control) {
                        Scan::Found(solution) => {
                            if winner.set(solution).is_ok() {
                                control.force_stop();
                            }
                        }
                        Scan::Stopped => stopped_early.store(true, Ordering::Relaxed),
                        Scan::Finished => {}
                    }
                });
            }
        });

        let stopped_early = stopped_early.load(Ordering::Relaxed);
        let outcome = match winner.into_inner() {
            Some(solution) => SearchOutcome::Found(solution),
            None if stopped_early && control.is_cancelled() => SearchOutcome::Cancelled,
            None => SearchOutcome::Exhausted,
        };
        let state = match outcome {
            SearchOutcome::Found(_) => SearchState::Found,
            SearchOutcome::Exhausted => SearchState::Exhausted,
            SearchOutcome::Cancelled => SearchState::Cancelled,
        };
        self.state.store(state as u8, Ordering::SeqCst);

        info!(
            "search {state:?}: {} hashes over {}..{end} in {:.2?}",
            control.hashes(),
            start,
            started.elapsed()
        );
        Ok(outcome)
    }
}

/// Split `range` into at most `parts` contiguous, non-empty subranges.
pub fn partition(range: Range<u64>, parts: usize) -> Vec<Range<u64>> {
    let len = range.end.saturating_sub(range.start);
    let parts = (parts.max(1) as u64).min(len);
    if parts == 0 {
        return Vec::new();
    }
    let base = len / parts;
    let extra = len % parts;

    let mut out = Vec::with_capacity(parts as usize);
    let mut next = range.start;
    for i in 0..parts {
        let size = base + u64::from(i < extra);
        out.push(next..next + size);
        next += size;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Always(u64);

    impl Evaluator for Always {
        fn evaluate(&self, nonces: Range<u64>, control: &SearchControl) -> Scan {
            for nonce in nonces {
                if control.should_stop() {
                    return Scan::Stopped;
                }
                control.record_hash();
                if nonce == self.0 {
                    return Scan::Found(Solution {
                        nonce,
                        result: HashResult {
                            mix_digest: [0u8; 32],
                            final_hash: [0u8; 32],
                        },
                    });
                }
            }
            Scan::Finished
        }
    }

    struct Never(AtomicUsize);

    impl Evaluator for Never {
        fn evaluate(&self, nonces: Range<u64>, control: &SearchControl) -> Scan {
            for _ in nonces {
                if control.should_stop() {
                    return Scan::Stopped;
                }
                self.0.fetch_add(1, Ordering::Relaxed);
            }
            Scan::Finished
        }
    }

    /// Tries every nonce, then cancels as if a `StopHandle` fired too late.
    struct CancelAfterScan(AtomicUsize);

    impl Evaluator for CancelAfterScan {
        fn evaluate(&self, nonces: Range<u64>, control: &SearchControl) -> Scan {
            for _ in nonces {
                if control.should_stop() {
                    return Scan::Stopped;
                }
                self.0.fetch_add(1, Ordering::Relaxed);
            }
            control.cancel();
            Scan::Finished
        }
    }

    #[test]
    fn partition_covers_range_exactly() {
        let parts = partition(10..21, 4);
        assert_eq!(parts, vec![10..13, 13..16, 16..19, 19..21]);
        assert_eq!(partition(0..2, 8), vec![0..1, 1..2]);
        assert!(partition(5..5, 3).is_empty());
        assert_eq!(partition(0..7, 0), vec![0..7]);
    }

    #[test]
    fn found_stops_the_search() {
        let search = NonceSearch::new(SearchConfig::with_threads(4));
        assert_eq!(search.state(), SearchState::Idle);
        let outcome = search.run(&Always(42), 0, 1_000).unwrap();
        match outcome {
            SearchOutcome::Found(solution) => assert_eq!(solution.nonce, 42),
            other => panic!("expected a solution, got {other:?}"),
        }
        assert_eq!(search.state(), SearchState::Found);
    }

    #[test]
    fn empty_handed_search_is_exhausted() {
        let evaluator = Never(AtomicUsize::new(0));
        let search = NonceSearch::new(SearchConfig::with_threads(3));
        assert_eq!(search.run(&evaluator, 100, 50).unwrap(), SearchOutcome::Exhausted);
        assert_eq!(evaluator.0.load(Ordering::Relaxed), 50);
        assert_eq!(search.state(), SearchState::Exhausted);
    }

    #[test]
    fn cancel_before_run_reports_cancelled() {
        let evaluator = Never(AtomicUsize::new(0));
        let search = NonceSearch::new(SearchConfig::with_threads(2));
        search.stop_handle().cancel();
        assert_eq!(search.run(&evaluator, 0, 10).unwrap(), SearchOutcome::Cancelled);
        assert_eq!(evaluator.0.load(Ordering::Relaxed), 0);
        assert_eq!(search.state(), SearchState::Cancelled);
    }

    #[test]
    fn cancel_after_full_scan_is_exhausted() {
        let evaluator = CancelAfterScan(AtomicUsize::new(0));
        let search = NonceSearch::new(SearchConfig::with_threads(1));
        assert_eq!(search.run(&evaluator, 0, 10).unwrap(), SearchOutcome::Exhausted);
        assert_eq!(evaluator.0.load(Ordering::Relaxed), 10);
        assert_eq!(search.state(), SearchState::Exhausted);
    }

    #[test]
    fn rejects_bad_arguments() {
        let search = NonceSearch::new(SearchConfig::with_threads(0));
        assert!(search.run(&Always(0), 0, 1).is_err());

        let search = NonceSearch::new(SearchConfig::with_threads(1));
        assert!(search.run(&Always(0), u64::MAX, 2).is_err());
        assert_eq!(search.state(), SearchState::Idle);
    }

    #[test]
    fn search_runs_once() {
        let search = NonceSearch::new(SearchConfig::with_threads(1));
        assert_eq!(
            search.run(&Never(AtomicUsize::new(0)), 0, 0).unwrap(),
            SearchOutcome::Exhausted
        );
        assert!(search.run(&Always(0), 0, 1).is_err());
    }
}
