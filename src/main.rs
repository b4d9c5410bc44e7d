//! PDWA - CLI Entry Point
//!
//! Runs the spatial Prisoner's Dilemma and prints one tab-separated record
//! per round.

use clap::{Parser, Subcommand};
use pdwa::observer::{StatsSink, TsvSink};
use pdwa::{benchmark, Config, World};
use rand::Rng;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "pdwa")]
#[command(version)]
#[command(about = "Spatial Prisoner's Dilemma with mobile, stationary and walk-away strategies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a new simulation
    Run {
        /// Configuration file (YAML); defaults are used if it does not exist
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Maximum number of rounds to simulate
        #[arg(short, long, default_value = "1000")]
        rounds: u64,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Write records to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override an initial count, e.g. --count tft_mobile=50 (repeatable)
        #[arg(long = "count", value_name = "STRATEGY=N")]
        counts: Vec<String>,

        /// Quiet mode (no progress logging)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of rounds
        #[arg(short, long, default_value = "1000")]
        rounds: u64,

        /// Population size
        #[arg(short, long, default_value = "1000")]
        population: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn init_logging(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            rounds,
            seed,
            output,
            counts,
            quiet,
        } => run_simulation(config, rounds, seed, output, counts, quiet),

        Commands::Benchmark { rounds, population } => {
            init_logging("info");
            run_benchmark(rounds, population)
        }

        Commands::Init { output } => {
            init_logging("info");
            generate_config(output)
        }
    }
}

fn run_simulation(
    config_path: PathBuf,
    rounds: u64,
    seed: Option<u64>,
    output: Option<PathBuf>,
    counts: Vec<String>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Load or create config
    let (mut config, loaded) = if config_path.exists() {
        (Config::from_file(&config_path)?, true)
    } else {
        (Config::default(), false)
    };
    for assignment in &counts {
        config.apply_count_override(assignment)?;
    }
    config.validate()?;

    init_logging(&config.logging.log_level);
    if loaded {
        log::info!("Loaded config from {:?}", config_path);
    } else {
        log::info!("Using default configuration");
    }

    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut world = World::new_with_seed(config.clone(), seed)?;

    log::info!("Starting simulation");
    log::info!("  Seed: {}", seed);
    log::info!("  Initial population: {} (cap {})", world.population(), world.population.cap());
    log::info!("  Grid size: {}x{}", config.world.width, config.world.height);
    log::info!("  Rounds: {}", rounds);

    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = TsvSink::new(writer);
    sink.write_header()?;

    let start = Instant::now();
    let progress_interval = config.logging.progress_interval;

    let completed = world.run_with_callback(rounds, |world, record| {
        sink.write_record(record)?;
        if !quiet && record.round % progress_interval == 0 {
            log::info!("Round {:6} | Pop: {:5}", record.round, world.population());
        }
        Ok(())
    })?;
    sink.flush()?;

    let elapsed = start.elapsed();
    if world.is_extinct() {
        log::info!("Population extinct after {} rounds", completed);
    }
    log::info!("=== Simulation Complete ===");
    log::info!("Time: {:.2}s", elapsed.as_secs_f64());
    log::info!("Rounds: {}", completed);
    log::info!("Final population: {}", world.population());
    if let Some(path) = output {
        log::info!("Records written to {:?}", path);
    }

    Ok(())
}

fn run_benchmark(rounds: u64, population: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== PDWA Benchmark ===");
    println!("Rounds: {}", rounds);
    println!("Population: {}", population);
    println!();

    let result = benchmark(rounds, population)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
