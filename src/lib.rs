//! # PDWA
//!
//! Spatial Prisoner's Dilemma with walk-away strategies.
//!
//! Agents live on a toroidal grid, play one round of the Prisoner's Dilemma
//! per tick with a random unresolved neighbor, move according to their
//! strategy, and reproduce or die as their resources cross fixed thresholds.
//!
//! ## Features
//!
//! - **Ten strategies**: naive, Pavlov, tit-for-tat (mobile and stationary),
//!   walk-away, realistic tit-for-tat and retreat
//! - **Reproducible**: one seeded random source drives every decision
//! - **Configurable**: YAML configuration files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdwa::{Config, World};
//! use pdwa::observer::TsvSink;
//!
//! let config = Config::default();
//! let mut world = World::new_with_seed(config, 42).unwrap();
//!
//! // Header plus one tab-separated line per round
//! world.run(1000, TsvSink::new(std::io::stdout())).unwrap();
//!
//! println!("Population: {}", world.population());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use pdwa::Config;
//! use pdwa::strategy::Strategy;
//!
//! let mut config = Config::default();
//! config.population.set(Strategy::Retreat, 50);
//! config.game.error_rate = 0.01;
//! assert!(config.validate().is_ok());
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod grid;
pub mod interaction;
pub mod observer;
pub mod population;
pub mod render;
pub mod strategy;
pub mod world;

// Re-export main types
pub use agent::Agent;
pub use config::Config;
pub use error::{ConfigError, SimError};
pub use strategy::Strategy;
pub use world::World;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark with `population` agents spread evenly over the
/// strategies
pub fn benchmark(rounds: u64, population: usize) -> Result<BenchmarkResult, ConfigError> {
    use std::time::Instant;

    let mut config = Config::default();
    for (i, strategy) in Strategy::ALL.into_iter().enumerate() {
        let share = population / Strategy::COUNT + usize::from(i < population % Strategy::COUNT);
        config.population.set(strategy, share);
    }
    // Keep the grid at least four times the population
    let side = ((population * 4) as f64).sqrt().ceil() as usize;
    config.world.width = config.world.width.max(side);
    config.world.height = config.world.height.max(side);

    let mut world = World::new_with_seed(config, 42)?;

    let start = Instant::now();
    let mut completed = 0;
    while completed < rounds && !world.is_extinct() {
        world.step();
        completed += 1;
    }
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        rounds: completed,
        initial_population: population,
        final_population: world.population(),
        elapsed_secs: elapsed.as_secs_f64(),
        rounds_per_second: completed as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub rounds: u64,
    pub initial_population: usize,
    pub final_population: usize,
    pub elapsed_secs: f64,
    pub rounds_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Rounds: {}", self.rounds)?;
        writeln!(f, "Population: {} -> {}", self.initial_population, self.final_population)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} rounds/s", self.rounds_per_second)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_simulation() {
        let mut world = World::new_with_seed(Config::default(), 7).unwrap();
        for _ in 0..20 {
            world.step();
        }
        assert_eq!(world.round(), 20);
    }

    #[test]
    fn test_benchmark() {
        let result = benchmark(20, 95).unwrap();

        assert_eq!(result.initial_population, 95);
        assert!(result.rounds <= 20);
        assert!(result.rounds_per_second > 0.0);
    }
}
