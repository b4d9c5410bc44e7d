//! Simulation driver - advances the world one round at a time.

use crate::agent::Agent;
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::grid::{Position, SpatialGrid};
use crate::interaction::InteractionEngine;
use crate::observer::{self, RoundRecord, StatsSink};
use crate::population::PopulationManager;
use crate::render::{NullRenderer, Renderer};
use crate::strategy::Strategy;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// The simulation world
pub struct World {
    pub config: Config,

    // Space and agents
    pub grid: SpatialGrid,
    pub population: PopulationManager,

    pub engine: InteractionEngine,

    // State
    round: u64,
    extinct: bool,

    // Single random source for every stochastic decision
    rng: ChaCha8Rng,
    seed: u64,
}

/// Where the initial agents go
enum Seeding<'a> {
    /// Counts from the config, on random empty cells
    Random,
    /// Explicit cells
    Layout(&'a [(Strategy, Position)]),
}

impl World {
    /// Create a new world with a random seed
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create a new world with a specific seed for reproducibility
    pub fn new_with_seed(config: Config, seed: u64) -> Result<Self, ConfigError> {
        Self::build(config, seed, Box::new(NullRenderer), Seeding::Random)
    }

    /// Create a seeded world that reports agent creation to `renderer`
    pub fn with_renderer(
        config: Config,
        seed: u64,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, seed, renderer, Seeding::Random)
    }

    /// Create a seeded world with agents on chosen cells instead of the
    /// configured random seeding. The population cap still comes from the
    /// configured counts.
    pub fn with_layout(
        config: Config,
        seed: u64,
        layout: &[(Strategy, Position)],
    ) -> Result<Self, ConfigError> {
        Self::build(config, seed, Box::new(NullRenderer), Seeding::Layout(layout))
    }

    fn build(
        config: Config,
        seed: u64,
        renderer: Box<dyn Renderer>,
        seeding: Seeding<'_>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut grid = SpatialGrid::new(config.world.width, config.world.height);

        // The cap is frozen here and never recomputed
        let mut population =
            PopulationManager::new(config.population_cap(), config.reproduction.clone());
        population.set_renderer(renderer);

        match seeding {
            Seeding::Random => {
                population.seed(&config.population, &mut grid, &mut rng);
            }
            Seeding::Layout(layout) => {
                for &(strategy, position) in layout {
                    if position.x >= grid.width() || position.y >= grid.height() {
                        return Err(ConfigError::Invalid(format!(
                            "layout cell {} lies outside the {}x{} grid",
                            position,
                            grid.width(),
                            grid.height()
                        )));
                    }
                    if population.spawn_at(strategy, position, &mut grid, &mut rng).is_none() {
                        return Err(ConfigError::Invalid(format!(
                            "layout places two agents on {}",
                            position
                        )));
                    }
                }
            }
        }

        log::debug!(
            "World created: {}x{} grid, {} agents, cap {}, seed {}",
            grid.width(),
            grid.height(),
            population.len(),
            population.cap(),
            seed
        );

        Ok(Self {
            engine: InteractionEngine::from_config(&config),
            config,
            grid,
            population,
            round: 0,
            extinct: false,
            rng,
            seed,
        })
    }

    /// Advance one round: resolve every live agent in a freshly shuffled
    /// order, then observe
    pub fn step(&mut self) -> RoundRecord {
        // Agents born during this round wait for the next one
        let mut order = self.population.ids();
        order.shuffle(&mut self.rng);

        for id in order {
            self.engine
                .resolve(id, &mut self.population, &mut self.grid, &mut self.rng);
        }

        let record = observer::observe(&mut self.population, self.round);
        self.round += 1;

        if record.extinct && !self.extinct {
            log::info!("Population extinct at round {}", record.round);
        }
        self.extinct = record.extinct;
        record
    }

    /// Run up to `rounds` rounds, writing the header and one record per
    /// round to `sink`. Stops after the first extinct round. Returns the
    /// number of rounds run.
    pub fn run<S: StatsSink>(&mut self, rounds: u64, mut sink: S) -> Result<u64> {
        sink.write_header()?;
        let completed = self.run_with_callback(rounds, |_, record| sink.write_record(record))?;
        sink.flush()?;
        Ok(completed)
    }

    /// Run up to `rounds` rounds, handing each record to `callback`.
    /// Stops after the first extinct round or the first callback error.
    pub fn run_with_callback<F>(&mut self, rounds: u64, mut callback: F) -> Result<u64>
    where
        F: FnMut(&World, &RoundRecord) -> std::io::Result<()>,
    {
        let mut completed = 0;
        while completed < rounds && !self.extinct {
            let record = self.step();
            completed += 1;
            callback(self, &record)?;
        }
        Ok(completed)
    }

    /// Number of completed rounds
    #[inline]
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Current live population
    #[inline]
    pub fn population(&self) -> usize {
        self.population.len()
    }

    /// True once an observed round ended with no agents
    #[inline]
    pub fn is_extinct(&self) -> bool {
        self.extinct
    }

    /// Get seed for reproducibility
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Live agents in id order
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.population.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::MemorySink;
    use crate::strategy::StrategyCounts;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.world.width = 40;
        config.world.height = 40;
        config.population = StrategyCounts::new();
        for strategy in Strategy::ALL {
            config.population.set(strategy, 10);
        }
        config
    }

    #[test]
    fn test_world_creation() {
        let config = test_config();
        let world = World::new_with_seed(config, 1).unwrap();

        assert_eq!(world.population(), 100);
        assert_eq!(world.population.cap(), 100);
        assert_eq!(world.round(), 0);
        assert_eq!(world.grid.len(), 100);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = test_config();
        config.game.error_rate = 2.0;
        assert!(World::new_with_seed(config, 1).is_err());
    }

    #[test]
    fn test_world_step() {
        let mut world = World::new_with_seed(test_config(), 5).unwrap();
        let record = world.step();

        assert_eq!(record.round, 0);
        assert_eq!(world.round(), 1);
        assert_eq!(record.population(), world.population());
        assert!(world.agents().all(|a| !a.resolved));
    }

    #[test]
    fn test_reproducibility() {
        let mut world1 = World::new_with_seed(test_config(), 42).unwrap();
        let mut world2 = World::new_with_seed(test_config(), 42).unwrap();

        for _ in 0..50 {
            assert_eq!(world1.step(), world2.step());
        }
        let snapshot1: Vec<_> = world1.agents().cloned().collect();
        let snapshot2: Vec<_> = world2.agents().cloned().collect();
        assert_eq!(snapshot1, snapshot2);
    }

    #[test]
    fn test_extinct_world_halts() {
        let mut config = test_config();
        config.population = StrategyCounts::new();
        let mut world = World::new_with_seed(config, 3).unwrap();

        let mut sink = MemorySink::new();
        let rounds = world.run(100, &mut sink).unwrap();

        assert_eq!(rounds, 1);
        assert!(sink.header_written);
        assert_eq!(sink.records.len(), 1);
        assert!(sink.records[0].extinct);
        assert!(world.is_extinct());
    }

    #[test]
    fn test_layout_rejects_collisions() {
        let mut config = test_config();
        config.world.width = 10;
        config.world.height = 10;
        config.population = StrategyCounts::new();
        config.population.set(Strategy::NaiveC, 2);

        let same = [
            (Strategy::NaiveC, Position::new(1, 1)),
            (Strategy::NaiveC, Position::new(1, 1)),
        ];
        assert!(World::with_layout(config.clone(), 0, &same).is_err());

        let outside = [(Strategy::NaiveC, Position::new(10, 0))];
        assert!(World::with_layout(config, 0, &outside).is_err());
    }
}
