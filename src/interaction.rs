//! Per-agent round resolution: partner search, the two-sided game, and the
//! movement that follows it.
//!
//! Resolving an initiator may mutate its partner (resources, memory, resolved
//! flag, and position) before the partner's own turn in the round comes up.
//! The order of these side effects is part of the model, so resolution must
//! stay strictly sequential.

use crate::agent::AgentId;
use crate::config::Config;
use crate::grid::{Position, SpatialGrid};
use crate::population::{LifeEvent, PopulationManager};
use crate::strategy::{Action, GameMemory};
use rand::Rng;

/// Resource change for (actor, partner) given both scored actions
pub fn payoff(actor: Action, partner: Action) -> (f64, f64) {
    use Action::{Cooperate as C, Defect as D};
    match (actor, partner) {
        (C, C) => (3.0, 3.0),
        (C, D) => (-1.0, 5.0),
        (D, C) => (5.0, -1.0),
        _ => (0.0, 0.0),
    }
}

/// Result of one scored pairing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pairing {
    pub initiator: AgentId,
    pub responder: AgentId,
    /// Actions after error injection, as scored
    pub initiator_action: Action,
    pub responder_action: Action,
    pub initiator_moved: bool,
    pub responder_moved: bool,
}

/// What happened when an agent's turn came up
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Already resolved this round, or no longer alive
    Skipped,
    /// No unresolved neighbor was available
    Alone { moved: bool, life: LifeEvent },
    Played { pairing: Pairing, life: LifeEvent },
}

/// Game and movement parameters for resolving turns
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEngine {
    pub play_radius: usize,
    pub error_rate: f64,
    pub prob_random_move: f64,
    /// Also run life events for the responder right after a pairing
    pub responder_life_events: bool,
}

impl InteractionEngine {
    pub fn from_config(config: &Config) -> Self {
        Self {
            play_radius: config.game.play_radius,
            error_rate: config.game.error_rate,
            prob_random_move: config.game.prob_random_move,
            responder_life_events: config.reproduction.responder_life_events,
        }
    }

    /// Resolve one agent's turn.
    ///
    /// Life events run for the initiator only; a responder's are deferred to
    /// its next unresolved turn unless `responder_life_events` is set.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        id: AgentId,
        population: &mut PopulationManager,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) -> Resolution {
        let Some(agent) = population.get(id) else {
            return Resolution::Skipped;
        };
        if agent.resolved {
            return Resolution::Skipped;
        }
        let position = agent.position;

        match self.pick_partner(id, position, population, grid, rng) {
            None => {
                let moved = self.play_alone(id, population, grid, rng);
                let life = population.update_life_events(id, grid, rng);
                Resolution::Alone { moved, life }
            }
            Some(partner) => {
                let Some(pairing) = self.play(id, partner, population, grid, rng) else {
                    return Resolution::Skipped;
                };
                let life = population.update_life_events(id, grid, rng);
                if self.responder_life_events {
                    population.update_life_events(partner, grid, rng);
                }
                Resolution::Played { pairing, life }
            }
        }
    }

    /// Random unresolved neighbor within the play radius.
    ///
    /// Scans the neighbor list from a random start index, wrapping once.
    pub fn pick_partner<R: Rng + ?Sized>(
        &self,
        id: AgentId,
        position: Position,
        population: &PopulationManager,
        grid: &SpatialGrid,
        rng: &mut R,
    ) -> Option<AgentId> {
        let candidates = grid.neighbors(position, self.play_radius);
        if candidates.is_empty() {
            return None;
        }
        let start = rng.gen_range(0..candidates.len());
        candidates[start..]
            .iter()
            .chain(&candidates[..start])
            .copied()
            .find(|&other| other != id && population.get(other).is_some_and(|a| !a.resolved))
    }

    /// Flip a cooperate/defect action with probability `error_rate`.
    /// One draw is taken per call.
    pub fn introduce_error<R: Rng + ?Sized>(&self, action: Action, rng: &mut R) -> Action {
        if rng.gen_bool(self.error_rate) {
            action.flipped()
        } else {
            action
        }
    }

    /// Turn without a partner: forget the last game and move if the strategy
    /// roams when alone
    fn play_alone<R: Rng + ?Sized>(
        &self,
        id: AgentId,
        population: &mut PopulationManager,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) -> bool {
        let Some(agent) = population.get_mut(id) else {
            return false;
        };
        agent.last_game = GameMemory::NONE;
        if !agent.strategy.moves_without_partner() {
            return false;
        }
        self.move_agent(id, population, grid, rng);
        true
    }

    /// Score one pairing and apply both sides' movement, responder first
    fn play<R: Rng + ?Sized>(
        &self,
        id: AgentId,
        partner: AgentId,
        population: &mut PopulationManager,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) -> Option<Pairing> {
        let mine = population.get_mut(id)?.decide();
        let theirs = population.get_mut(partner)?.decide();

        let own_action = self.introduce_error(mine.action, rng);
        let partner_action = self.introduce_error(theirs.action, rng);
        let (own_delta, partner_delta) = payoff(own_action, partner_action);

        if let Some(agent) = population.get_mut(id) {
            agent.resources += own_delta;
            agent.resolved = true;
            agent.last_game = GameMemory::new(own_action, partner_action);
        }
        if let Some(agent) = population.get_mut(partner) {
            agent.resources += partner_delta;
            agent.resolved = true;
            agent.last_game = GameMemory::new(partner_action, own_action);
        }
        log::trace!(
            "Pairing {} vs {}: {:?}/{:?}",
            id,
            partner,
            own_action,
            partner_action
        );

        let responder_moved = theirs.moves_against(own_action);
        if responder_moved {
            self.move_agent(partner, population, grid, rng);
        }
        let initiator_moved = mine.moves_against(partner_action);
        if initiator_moved {
            self.move_agent(id, population, grid, rng);
        }

        Some(Pairing {
            initiator: id,
            responder: partner,
            initiator_action: own_action,
            responder_action: partner_action,
            initiator_moved,
            responder_moved,
        })
    }

    /// Possibly redraw the heading, then step along it
    fn move_agent<R: Rng + ?Sized>(
        &self,
        id: AgentId,
        population: &mut PopulationManager,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) {
        if let Some(agent) = population.get_mut(id) {
            if rng.gen_bool(self.prob_random_move) {
                agent.randomize_direction(rng);
            }
            grid.move_or_stay(agent);
        }
    }
}
