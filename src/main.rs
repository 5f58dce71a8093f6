//! Ethash Miner CLI
//!
//! A command-line tool for computing, searching and verifying Ethash
//! proofs of work on the CPU.
//!
//! # Commands
//!
//! - `params` - Show epoch parameters for a block
//! - `hash` - Evaluate hashimoto for one nonce
//! - `search` - Search a nonce range for a solution
//! - `verify` - Check a claimed solution
//! - `benchmark` - Measure light hashing throughput

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use std::hint::black_box;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use ethash_miner::algorithm::{
    CpuEvaluator, EpochContext, EpochParameters, HashResult, NonceSearch, SearchOutcome, Target,
    U256, header_from_slice,
};
use ethash_miner::config::MinerConfig;
use ethash_miner::report::{
    BenchmarkReport, HashReport, ParamsReport, SearchReport, SearchRequest, VerifyReport, rate,
    verdict_name,
};

#[derive(Parser)]
#[command(name = "ethash")]
#[command(author = "Cyberia")]
#[command(version = "0.1.0")]
#[command(about = "Ethash proof-of-work CPU miner and light verifier")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: <config dir>/ethash/config.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON reports
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Difficulty threshold, either raw or as a difficulty
#[derive(Args)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    /// Target as a big-endian hex number (up to 64 digits)
    #[arg(long)]
    target: Option<String>,

    /// Difficulty as a decimal number; target = 2^256 / difficulty
    #[arg(long)]
    difficulty: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show epoch parameters for a block
    Params {
        #[arg(long)]
        block: u64,
    },

    /// Evaluate hashimoto for one nonce (light mode)
    Hash {
        #[arg(long)]
        block: u64,

        /// 32-byte header digest in hex
        #[arg(long)]
        header: String,

        #[arg(long)]
        nonce: u64,
    },

    /// Search a nonce range for a solution
    Search {
        #[arg(long)]
        block: u64,

        /// 32-byte header digest in hex
        #[arg(long)]
        header: String,

        /// First nonce (default: random)
        #[arg(long)]
        start: Option<u64>,

        /// Number of nonces to try
        #[arg(long, default_value = "1000000")]
        count: u64,

        #[command(flatten)]
        target: TargetArgs,

        /// Number of threads to use (default: number of CPU cores)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Generate the full dataset before searching
        #[arg(long)]
        full: bool,
    },

    /// Check a claimed solution; exits non-zero unless valid
    Verify {
        #[arg(long)]
        block: u64,

        /// 32-byte header digest in hex
        #[arg(long)]
        header: String,

        #[arg(long)]
        nonce: u64,

        /// Claimed mix digest in hex
        #[arg(long)]
        mix: String,

        /// Claimed final hash in hex
        #[arg(long = "final")]
        final_hash: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Measure light hashing throughput
    Benchmark {
        #[arg(long, default_value = "0")]
        block: u64,

        /// Number of hashes to compute
        #[arg(short, long, default_value = "100")]
        count: u32,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = MinerConfig::load_or_default(cli.config.as_deref())
        .map_err(anyhow::Error::from)
        .and_then(|mut config| {
            config.json |= cli.json;
            run(cli.command, config)
        });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run(command: Commands, config: MinerConfig) -> anyhow::Result<()> {
    match command {
        Commands::Params { block } => cmd_params(block, &config),
        Commands::Hash {
            block,
            header,
            nonce,
        } => cmd_hash(block, &header, nonce, &config),
        Commands::Search {
            block,
            header,
            start,
            count,
            target,
            threads,
            full,
        } => {
            let mut config = config;
            if threads.is_some() {
                config.threads = threads;
            }
            config.full_dataset |= full;
            config.validate()?;
            cmd_search(block, &header, start, count, &target, &config)
        }
        Commands::Verify {
            block,
            header,
            nonce,
            mix,
            final_hash,
            target,
        } => cmd_verify(block, &header, nonce, &mix, &final_hash, &target, &config),
        Commands::Benchmark { block, count } => cmd_benchmark(block, count, &config),
    }
}

fn cmd_params(block: u64, config: &MinerConfig) -> anyhow::Result<()> {
    let params = EpochParameters::for_block(block)?;
    let report = ParamsReport::new(block, &params);

    if config.json {
        return print_json(&report);
    }
    println!("Block:        {}", report.block);
    println!("Epoch:        {}", report.epoch);
    println!("Cache size:   {} bytes ({} rows)", report.cache_size, params.cache_rows());
    println!(
        "Dataset size: {} bytes ({} pages)",
        report.dataset_size,
        params.dataset_pages()
    );
    println!("Seed:         {}", report.seed);
    Ok(())
}

fn cmd_hash(block: u64, header_hex: &str, nonce: u64, config: &MinerConfig) -> anyhow::Result<()> {
    let header = parse_header(header_hex)?;
    let context = build_context(block)?;
    let result = context.hashimoto(&header, nonce);
    let report = HashReport::new(block, &header, nonce, &result);

    if config.json {
        return print_json(&report);
    }
    println!("Mix digest: {}", report.mix_digest);
    println!("Final hash: {}", report.final_hash);
    println!("Result:     {}", report.result);
    Ok(())
}

fn cmd_search(
    block: u64,
    header_hex: &str,
    start: Option<u64>,
    count: u64,
    target_args: &TargetArgs,
    config: &MinerConfig,
) -> anyhow::Result<()> {
    let header = parse_header(header_hex)?;
    let target = parse_target(target_args)?;
    let (start, count) = search_range(start, count, random_nonce)?;

    let search_config = config.search_config();
    let context = build_context(block)?;

    if !config.json {
        println!("\n=== Ethash Search ===");
        println!("Block:   {} (epoch {})", block, context.params().epoch);
        println!("Header:  {}", hex::encode(header));
        println!("Target:  {:?}", target);
        println!("Range:   {}..+{}", start, count);
        println!("Threads: {}", search_config.threads);
        println!("Mode:    {}", if config.full_dataset { "full" } else { "light" });
        println!("=====================\n");
    }

    let search = NonceSearch::new(search_config);
    let started = Instant::now();

    let outcome = if config.full_dataset {
        info!("Generating dataset ({} bytes)...", context.params().dataset_size);
        let dataset = context.dataset().context("dataset generation failed")?;
        info!("Dataset ready in {:.1}s", started.elapsed().as_secs_f64());
        let evaluator = CpuEvaluator::new(&dataset, header, target);
        run_with_progress(&search, config.report_interval_secs, || {
            search.run(&evaluator, start, count)
        })?
    } else {
        let light = context.light();
        let evaluator = CpuEvaluator::new(&light, header, target);
        run_with_progress(&search, config.report_interval_secs, || {
            search.run(&evaluator, start, count)
        })?
    };

    let request = SearchRequest {
        block,
        header: &header,
        target: &target,
        start,
        count,
        threads: search_config.threads,
        full_dataset: config.full_dataset,
    };
    let report = SearchReport::new(request, &outcome, search.hashes(), started.elapsed());

    if config.json {
        return print_json(&report);
    }
    match (&outcome, &report.solution) {
        (SearchOutcome::Found(_), Some(solution)) => {
            println!("Found valid nonce!");
            println!("  Nonce:      {}", solution.nonce);
            println!("  Mix digest: {}", solution.mix_digest);
            println!("  Final hash: {}", solution.final_hash);
        }
        (SearchOutcome::Cancelled, _) => println!("Search cancelled."),
        _ => {
            println!(
                "No solution in range; try the next one from {}.",
                start.saturating_add(count)
            );
        }
    }
    println!(
        "  Hashes:     {} ({:.0} H/s)",
        report.hashes, report.hashrate
    );
    Ok(())
}

/// Run `job` while logging the hash rate every `interval_secs` seconds.
fn run_with_progress<T>(search: &NonceSearch, interval_secs: u64, job: impl FnOnce() -> T) -> T {
    if interval_secs == 0 {
        return job();
    }

    let handle = search.stop_handle();
    let done = AtomicBool::new(false);
    let started = Instant::now();
    let interval = Duration::from_secs(interval_secs);

    thread::scope(|scope| {
        scope.spawn(|| {
            let mut next = interval;
            while !done.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(100));
                let elapsed = started.elapsed();
                if elapsed >= next {
                    let hashes = handle.hashes();
                    info!(
                        "Hashrate: {:.0} H/s | Hashes: {} | Time: {:.0}s",
                        rate(hashes, elapsed),
                        hashes,
                        elapsed.as_secs_f64()
                    );
                    next += interval;
                }
            }
        });

        let result = job();
        done.store(true, Ordering::Relaxed);
        result
    })
}

#[allow(clippy::too_many_arguments)]
fn cmd_verify(
    block: u64,
    header_hex: &str,
    nonce: u64,
    mix_hex: &str,
    final_hex: &str,
    target_args: &TargetArgs,
    config: &MinerConfig,
) -> anyhow::Result<()> {
    let header = parse_header(header_hex)?;
    let target = parse_target(target_args)?;
    let claimed = HashResult {
        mix_digest: parse_hash("mix digest", mix_hex)?,
        final_hash: parse_hash("final hash", final_hex)?,
    };

    let context = build_context(block)?;
    let verifier = context.verifier();

    let quick = verifier.quick_check(&header, nonce, &claimed, &target);
    debug!("quick check: {}", verdict_name(quick));
    let verdict = if quick.is_valid() {
        verifier.verify(&header, nonce, &claimed, &target)
    } else {
        quick
    };
    let report = VerifyReport::new(block, nonce, verdict);

    if config.json {
        print_json(&report)?;
    } else {
        println!("Verdict: {}", report.verdict);
    }

    if !verdict.is_valid() {
        anyhow::bail!("solution rejected: {}", report.verdict);
    }
    Ok(())
}

fn cmd_benchmark(block: u64, count: u32, config: &MinerConfig) -> anyhow::Result<()> {
    if !config.json {
        println!("Running benchmark with {} hashes...", count);
    }

    let build_start = Instant::now();
    let context = build_context(block)?;
    let cache_build = build_start.elapsed();

    let header = [0u8; 32];
    let start = Instant::now();
    for nonce in 0..u64::from(count) {
        black_box(context.hashimoto(&header, black_box(nonce)));
    }
    let elapsed = start.elapsed();

    let report = BenchmarkReport::new(
        block,
        context.params().epoch,
        cache_build,
        u64::from(count),
        elapsed,
    );

    if config.json {
        return print_json(&report);
    }
    println!("\nResults:");
    println!("  Cache build:  {:.2}s", report.cache_build_secs);
    println!("  Total hashes: {}", report.hashes);
    println!("  Time elapsed: {:.2}s", report.elapsed_secs);
    println!("  Hashrate:     {:.2} H/s", report.hashrate);

    let params = context.params();
    println!("\nEpoch parameters:");
    println!("  Epoch:   {}", params.epoch);
    println!("  Cache:   {} MB", params.cache_size / (1024 * 1024));
    println!("  Dataset: {} MB", params.dataset_size / (1024 * 1024));

    Ok(())
}

fn build_context(block: u64) -> anyhow::Result<EpochContext> {
    info!("Building cache for block {}...", block);
    let start = Instant::now();
    let context = EpochContext::new(block)
        .with_context(|| format!("failed to build epoch context for block {}", block))?;
    info!(
        "Cache for epoch {} ready in {:.1}s",
        context.params().epoch,
        start.elapsed().as_secs_f64()
    );
    Ok(context)
}

fn decode_hex(what: &str, text: &str) -> anyhow::Result<Vec<u8>> {
    let text = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(text).with_context(|| format!("invalid {} hex", what))
}

fn parse_header(text: &str) -> anyhow::Result<[u8; 32]> {
    Ok(header_from_slice(&decode_hex("header", text)?)?)
}

fn parse_hash(what: &str, text: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = decode_hex(what, text)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("{} must be 32 bytes, got {}", what, bytes.len()))
}

fn parse_target(args: &TargetArgs) -> anyhow::Result<Target> {
    match (&args.target, &args.difficulty) {
        (Some(text), _) => {
            let text = text.strip_prefix("0x").unwrap_or(text);
            let value = U256::from_str_radix(text, 16)
                .map_err(|e| anyhow::anyhow!("invalid target {}: {}", text, e))?;
            Ok(Target::from_u256(value))
        }
        (None, Some(text)) => {
            let value = U256::from_dec_str(text)
                .map_err(|e| anyhow::anyhow!("invalid difficulty {}: {:?}", text, e))?;
            Ok(Target::from_difficulty(value)?)
        }
        (None, None) => anyhow::bail!("either --target or --difficulty is required"),
    }
}

/// Resolve the nonce range to scan. An explicit start must fit `count`
/// nonces below `u64::MAX`; a random start is clamped instead.
fn search_range(
    start: Option<u64>,
    count: u64,
    random: impl FnOnce() -> anyhow::Result<u64>,
) -> anyhow::Result<(u64, u64)> {
    match start {
        Some(start) => {
            if start.checked_add(count).is_none() {
                anyhow::bail!(
                    "range of {} nonces from {} overflows u64; lower --count or --start",
                    count,
                    start
                );
            }
            Ok((start, count))
        }
        None => {
            let start = random()?;
            Ok((start, count.min(u64::MAX - start)))
        }
    }
}

fn random_nonce() -> anyhow::Result<u64> {
    let mut bytes = [0u8; 8];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| anyhow::anyhow!("failed to draw a random start nonce: {}", e))?;
    Ok(u64::from_le_bytes(bytes))
}

fn print_json<T: serde::Serialize>(report: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_range_is_kept() {
        let range = search_range(Some(10), 5, || unreachable!()).unwrap();
        assert_eq!(range, (10, 5));
        assert_eq!(search_range(Some(u64::MAX - 5), 5, || unreachable!()).unwrap().1, 5);
    }

    #[test]
    fn test_explicit_range_overflow_is_rejected() {
        let err = search_range(Some(u64::MAX - 2), 10, || unreachable!()).unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_random_start_is_clamped() {
        let range = search_range(None, 10, || Ok(u64::MAX - 3)).unwrap();
        assert_eq!(range, (u64::MAX - 3, 3));
        assert_eq!(search_range(None, 10, || Ok(7)).unwrap(), (7, 10));
    }
}
