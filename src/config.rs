//! Configuration for a simulation run.
//!
//! Loaded from YAML; every section and key is optional and falls back to the
//! defaults below. Unrecognised keys are rejected.

use crate::error::ConfigError;
use crate::strategy::{Strategy, StrategyCounts};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest grid accepted, in cells (4096 x 4096)
pub const MAX_GRID_CELLS: usize = 1 << 24;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub world: WorldConfig,
    /// Initial agents per strategy. The total fixes the population cap.
    pub population: StrategyCounts,
    pub game: GameConfig,
    pub reproduction: ReproductionConfig,
    pub logging: LoggingConfig,
}

/// Grid extent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    pub width: usize,
    pub height: usize,
}

/// Pairing and movement parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Neighbor search radius for partner selection
    pub play_radius: usize,
    /// Probability that a played action is flipped (0.0 - 1.0)
    pub error_rate: f64,
    /// Probability of redrawing the heading before a move (0.0 - 1.0)
    pub prob_random_move: f64,
}

/// Birth placement and cap handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReproductionConfig {
    /// Place offspring near the parent instead of anywhere on the grid
    pub local: bool,
    /// Search radius for local placement
    pub radius: usize,
    /// At the cap, reproduce anyway and cull a random agent
    pub enforce_cap: bool,
    /// Run death/reproduction checks for responders right after their pairing
    /// instead of waiting for their own unresolved turn
    pub responder_life_events: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Rounds between progress log lines
    pub progress_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            population: default_population(),
            game: GameConfig::default(),
            reproduction: ReproductionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            play_radius: 1,
            error_rate: 0.001,
            prob_random_move: 1.0,
        }
    }
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            local: false,
            radius: 1,
            enforce_cap: false,
            responder_life_events: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            progress_interval: 100,
        }
    }
}

/// Default request: 100 each of the naive and walk-away strategies
pub fn default_population() -> StrategyCounts {
    let mut counts = StrategyCounts::new();
    for strategy in [
        Strategy::NaiveC,
        Strategy::NaiveD,
        Strategy::WalkawayC,
        Strategy::WalkawayD,
    ] {
        counts.set(strategy, 100);
    }
    counts
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Population cap implied by the initial request
    pub fn population_cap(&self) -> usize {
        self.population.total()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

        if self.world.width == 0 || self.world.height == 0 {
            return invalid("world width and height must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.game.error_rate) {
            return invalid(format!("error_rate must be within [0, 1], got {}", self.game.error_rate));
        }
        if !(0.0..=1.0).contains(&self.game.prob_random_move) {
            return invalid(format!(
                "prob_random_move must be within [0, 1], got {}",
                self.game.prob_random_move
            ));
        }
        if self.game.play_radius == 0 {
            return invalid("play_radius must be >= 1".to_string());
        }
        if self.reproduction.radius == 0 {
            return invalid("reproduction radius must be >= 1".to_string());
        }
        let area = match self.world.width.checked_mul(self.world.height) {
            Some(area) if area <= MAX_GRID_CELLS => area,
            _ => {
                return invalid(format!(
                    "grid {}x{} exceeds the maximum of {} cells",
                    self.world.width, self.world.height, MAX_GRID_CELLS
                ))
            }
        };
        if self.population_cap() >= area {
            return invalid(format!(
                "initial population ({}) must be smaller than the grid area ({})",
                self.population_cap(),
                area
            ));
        }
        if self.logging.progress_interval == 0 {
            return invalid("progress_interval must be > 0".to_string());
        }
        Ok(())
    }

    /// Apply a `strategy=count` override such as `tft_mobile=50`
    pub fn apply_count_override(&mut self, assignment: &str) -> Result<(), ConfigError> {
        let (name, count) = assignment
            .split_once('=')
            .ok_or_else(|| ConfigError::Invalid(format!("expected STRATEGY=COUNT, got '{assignment}'")))?;
        let strategy: Strategy = name.parse()?;
        let count = count
            .trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::Invalid(format!("bad count for {strategy}: {e}")))?;
        self.population.set(strategy, count);
        Ok(())
    }
}
