//! Agent state.

use crate::grid::{Direction, Position};
use crate::strategy::{Decision, GameMemory, Strategy};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique agent identifier, never reused
pub type AgentId = u64;

/// Resources at or below this level kill the agent
pub const DEATH_THRESHOLD: f64 = 0.0;

/// Resources at or above this level trigger a reproduction attempt
pub const REPRODUCTION_THRESHOLD: f64 = 100.0;

/// A player on the grid
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    // Identity
    pub id: AgentId,
    pub strategy: Strategy,

    // Spatial state
    pub position: Position,
    pub direction: Direction,

    pub resources: f64,

    // Game state
    pub last_game: GameMemory,
    /// Set once the agent has taken part in a pairing this round
    pub resolved: bool,
    /// Retreat's irreversible switch to permanent defection
    pub has_defected_once: bool,
}

impl Agent {
    pub fn new(
        id: AgentId,
        strategy: Strategy,
        position: Position,
        direction: Direction,
        resources: f64,
    ) -> Self {
        Self {
            id,
            strategy,
            position,
            direction,
            resources,
            last_game: GameMemory::NONE,
            resolved: false,
            has_defected_once: false,
        }
    }

    /// Fresh agent with a random heading and starting resources uniform in
    /// [10, 49]. The heading is drawn before the resources.
    pub fn spawn<R: Rng + ?Sized>(
        id: AgentId,
        strategy: Strategy,
        position: Position,
        rng: &mut R,
    ) -> Self {
        let direction = Direction::random(rng);
        let resources = rng.gen_range(10..50) as f64;
        Self::new(id, strategy, position, direction, resources)
    }

    /// Strategy choice for this round, based on the agent's own memory
    #[inline]
    pub fn decide(&mut self) -> Decision {
        self.strategy.decide(self.last_game, &mut self.has_defected_once)
    }

    /// Redraw the heading
    pub fn randomize_direction<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.direction = Direction::random(rng);
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.resources <= DEATH_THRESHOLD
    }

    #[inline]
    pub fn can_reproduce(&self) -> bool {
        self.resources >= REPRODUCTION_THRESHOLD
    }

    /// Halve resources, returning the offspring's share
    pub fn split_resources(&mut self) -> f64 {
        let kept = self.resources / 2.0;
        let given = self.resources - kept;
        self.resources = kept;
        given
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "agent {} at {}: strategy={} resources={:.1} resolved={} heading=({}, {}) memory={}",
            self.id,
            self.position,
            self.strategy,
            self.resources,
            self.resolved,
            self.direction.dx,
            self.direction.dy,
            self.last_game,
        )
    }
}
