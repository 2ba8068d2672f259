//! msgsim - hit-rate simulator for the message cache

mod report;
mod simulate;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use msgcache::{
    CacheConfig, MessageCache, PolicyKind, Sampling, DEFAULT_BUCKET_COUNT, DEFAULT_CAPACITY,
};
use msglog::{MessageLog, LOG_FILE_NAME};
use tracing::{info, warn};

use crate::simulate::Simulation;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Replacement policy: 0 (LRU) or 1 (Random)
    policy: PolicyKind,

    /// Directory holding the message log
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Directory for report files
    #[arg(short, long, default_value = "./reports")]
    reports: PathBuf,

    /// Cache capacity (number of messages)
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Hash table bucket count
    #[arg(short, long, default_value_t = DEFAULT_BUCKET_COUNT)]
    buckets: usize,

    /// Number of messages to generate
    #[arg(short, long, default_value_t = 100)]
    messages: u64,

    /// Random lookups in the warm-up phase
    #[arg(long, default_value_t = 100)]
    warmup: usize,

    /// Random lookups in the simulation phase
    #[arg(short, long, default_value_t = 1000)]
    lookups: usize,

    /// Seed for content, lookup keys and random eviction
    #[arg(long)]
    seed: Option<u64>,

    /// Random policy sampling: uniform or bucket-walk
    #[arg(long, default_value = "uniform")]
    sampling: Sampling,

    /// Delete an existing message log before seeding
    #[arg(long)]
    fresh: bool,

    /// Also write a JSON summary to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.messages > 0, "--messages must be greater than 0");

    info!("Starting msgsim v{}", env!("CARGO_PKG_VERSION"));
    info!("Policy: {} (sampling: {})", args.policy, args.sampling);
    info!("Data directory: {}", args.data.display());
    info!("Cache capacity: {}", args.capacity);

    std::fs::create_dir_all(&args.reports)
        .with_context(|| format!("creating {}", args.reports.display()))?;

    let log_path = args.data.join(LOG_FILE_NAME);
    if args.fresh && log_path.exists() {
        warn!("Removing existing log {}", log_path.display());
        std::fs::remove_file(&log_path)
            .with_context(|| format!("removing {}", log_path.display()))?;
    }

    let log = MessageLog::open(&args.data)
        .with_context(|| format!("opening message log in {}", args.data.display()))?;

    let mut config = CacheConfig::new(args.capacity)
        .with_bucket_count(args.buckets)
        .with_policy(args.policy)
        .with_sampling(args.sampling);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let cache = MessageCache::new(log, config)?;
    let mut sim = Simulation::new(cache, args.seed);
    let policy = sim.cache().policy_name();
    let started = Instant::now();

    let seeded = sim.seed_messages(args.messages)?;
    report::write_seed_file(&args.reports.join("seed_messages.txt"), &seeded)?;

    let warmup = sim.run_phase("warm-up", args.warmup, args.messages)?;
    report::write_phase_report(&args.reports.join("warmup_report.txt"), policy, &warmup)?;

    let simulation = sim.run_phase("simulation", args.lookups, args.messages)?;
    report::write_phase_report(&args.reports.join("lookups.txt"), policy, &simulation)?;
    report::write_phase_totals(
        &args.reports.join("simulation_report.txt"),
        policy,
        &simulation,
    )?;

    let summary = sim.summary(args.messages, &warmup, &simulation);
    if let Some(path) = &args.json {
        report::write_summary(path, &summary)?;
        info!("Summary written to {}", path.display());
    }

    info!(
        evictions = summary.evictions,
        store_hits = summary.store_hits,
        write_through_failures = summary.write_through_failures,
        "{} policy: {:.2}% hit rate over {} lookups in {:?}",
        policy,
        simulation.hit_rate_percent(),
        simulation.accesses.len(),
        started.elapsed()
    );
    info!("Reports written to {}", args.reports.display());

    Ok(())
}
