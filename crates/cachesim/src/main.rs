//! cachesim - replay memory access traces through a set-associative cache model

mod config;
mod report;
mod tracegen;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::path::PathBuf;
use tracing::info;
use wordcache::Simulation;

use crate::config::{BackingStoreConfig, SimConfig};
use crate::report::Report;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a random R/W trace
    Gen(GenArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Cache name
    #[arg(short = 'n', long, default_value = "C0")]
    cache_name: String,

    /// Cache size in bytes (power of 2, 64 to 67108864)
    #[arg(short = 's', long, default_value_t = 64)]
    cache_size: u32,

    /// Cache associativity (power of 2, 1 to 16; 1 is direct-mapped)
    #[arg(short = 'a', long, default_value_t = 4)]
    assoc: u32,

    /// Write policy: write back ("wb") or write through ("wt")
    #[arg(short = 'w', long, default_value = "wb")]
    write_policy: String,

    /// Replacement policy
    #[arg(short = 'p', long, default_value = "lru")]
    policy: String,

    /// Backing store name
    #[arg(long, default_value = "M0")]
    mem_name: String,

    /// Backing store depth in words (0 = unbounded)
    #[arg(short = 'm', long, default_value_t = 128)]
    mem_size: u32,

    /// JSON configuration file (replaces the cache and memory flags)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this JSON file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Trace file with one "R <addr>" or "W <addr> <data>" per line (stdin if omitted)
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Write back all dirty lines after the trace completes
    #[arg(long)]
    flush: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Print statistics only, without cache and memory dumps
    #[arg(long)]
    no_dump: bool,
}

#[derive(Args, Debug)]
struct GenArgs {
    /// Number of operations
    #[arg(short, long, default_value_t = tracegen::DEFAULT_COUNT)]
    count: usize,

    /// Addresses are drawn from 0..ADDR_RANGE
    #[arg(short, long, default_value_t = tracegen::DEFAULT_ADDR_RANGE)]
    addr_range: u32,

    /// Seed for a reproducible trace
    #[arg(long)]
    seed: Option<u64>,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

impl RunArgs {
    fn sim_config(&self) -> SimConfig {
        SimConfig {
            name: self.cache_name.clone(),
            size_bytes: self.cache_size,
            associativity: self.assoc,
            write_policy: self.write_policy.clone(),
            replacement_policy: self.policy.clone(),
            backing_store: BackingStoreConfig {
                name: self.mem_name.clone(),
                depth_words: self.mem_size,
            },
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing; logs go to stderr so reports stay clean on stdout
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Gen(args)) => generate(args),
        None => simulate(cli.run),
    }
}

fn simulate(args: RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => args.sim_config(),
    };

    info!(
        "Cache {}: {} bytes, {}-way, {}, {} policy",
        config.name,
        config.size_bytes,
        config.associativity,
        config.write_policy,
        config.replacement_policy
    );
    info!(
        "Backing store {}: {} words",
        config.backing_store.name, config.backing_store.depth_words
    );

    let (cache, _mem) = config.build().context("Invalid cache configuration")?;

    if let Some(path) = &args.save_config {
        config.save(path)?;
        info!("Saved configuration to {:?}", path);
    }

    let input = match &args.trace {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace file {:?}", path))?,
        None => {
            info!("Reading trace from stdin");
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read trace from stdin")?;
            buf
        }
    };

    let mut sim = Simulation::new(cache);
    let summary = sim.replay_str(&input).context("Simulation aborted")?;
    info!("Replayed {} operations", summary.operations);

    if args.flush {
        let flushed = sim.cache_mut().flush().context("Flush failed")?;
        info!("Flushed {} dirty lines", flushed);
    }

    let report = Report::collect(sim.cache(), &summary, !args.no_dump);
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report);
    }

    Ok(())
}

fn generate(args: GenArgs) -> Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let ops = tracegen::generate(&mut rng, args.count, args.addr_range)?;

    match &args.out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create trace file {:?}", path))?;
            tracegen::write_trace(BufWriter::new(file), &ops).context("Failed to write trace")?;
            info!("Wrote {} operations to {:?}", ops.len(), path);
        }
        None => {
            tracegen::write_trace(io::stdout().lock(), &ops).context("Failed to write trace")?;
        }
    }

    Ok(())
}
