//! Population bookkeeping: creation, reproduction, culling and death.

use crate::agent::{Agent, AgentId};
use crate::config::ReproductionConfig;
use crate::grid::{Position, SpatialGrid};
use crate::render::{NullRenderer, Renderer};
use crate::strategy::{Strategy, StrategyCounts};
use rand::Rng;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of a life-event check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeEvent {
    /// Resources between the death and reproduction thresholds
    Nothing,
    /// Resources at or below zero; the agent was removed
    Died,
    /// Offspring created. At the cap with enforcement on, `culled` names the
    /// agent removed to restore the cap.
    Reproduced {
        child: AgentId,
        culled: Option<AgentId>,
    },
    /// Population at the cap and enforcement off; no birth
    CapReached,
    /// No empty cell for the offspring; parent unaffected
    ReproductionBlocked,
}

/// Owner of every live agent.
///
/// Agents are kept ordered by id so that iteration, and therefore every RNG
/// draw that depends on it, is reproducible.
pub struct PopulationManager {
    agents: BTreeMap<AgentId, Agent>,
    cap: usize,
    next_id: AgentId,
    reproduction: ReproductionConfig,
    renderer: Box<dyn Renderer>,
}

impl PopulationManager {
    /// Create an empty population with a fixed cap
    pub fn new(cap: usize, reproduction: ReproductionConfig) -> Self {
        Self {
            agents: BTreeMap::new(),
            cap,
            next_id: 0,
            reproduction,
            renderer: Box::new(NullRenderer),
        }
    }

    /// Replace the renderer receiving creation/removal notices
    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = renderer;
    }

    #[inline]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[inline]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    #[inline]
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Live agents in id order
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.values_mut()
    }

    /// Ids of all live agents in ascending order
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    /// Id the next created agent will receive
    #[inline]
    pub fn peek_next_id(&self) -> AgentId {
        self.next_id
    }

    fn allocate_id(&mut self) -> AgentId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Create an agent on a specific empty cell
    pub fn spawn_at<R: Rng + ?Sized>(
        &mut self,
        strategy: Strategy,
        position: Position,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) -> Option<AgentId> {
        if grid.is_occupied(position) {
            return None;
        }
        let id = self.allocate_id();
        let agent = Agent::spawn(id, strategy, position, rng);
        grid.place(id, position);
        self.renderer.agent_created(id, strategy, strategy.color());
        self.agents.insert(id, agent);
        Some(id)
    }

    /// Create an agent on a random empty cell anywhere on the grid
    pub fn spawn_random<R: Rng + ?Sized>(
        &mut self,
        strategy: Strategy,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) -> Option<AgentId> {
        let position = grid.random_empty(rng)?;
        self.spawn_at(strategy, position, grid, rng)
    }

    /// Create an agent on a random empty cell within `radius` of `center`
    pub fn spawn_near<R: Rng + ?Sized>(
        &mut self,
        strategy: Strategy,
        center: Position,
        radius: usize,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) -> Option<AgentId> {
        let position = grid.empty_neighbor(center, radius, rng)?;
        self.spawn_at(strategy, position, grid, rng)
    }

    /// Create the initial population, strategy by strategy in column order
    pub fn seed<R: Rng + ?Sized>(
        &mut self,
        counts: &StrategyCounts,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) -> usize {
        let mut created = 0;
        for (strategy, count) in counts.iter() {
            for _ in 0..count {
                match self.spawn_random(strategy, grid, rng) {
                    Some(_) => created += 1,
                    None => {
                        log::warn!("Grid full while seeding {}; placed {} agents", strategy, created);
                        return created;
                    }
                }
            }
        }
        created
    }

    /// Remove an agent from the grid and from future scheduling
    pub fn kill(&mut self, id: AgentId, grid: &mut SpatialGrid) -> Option<Agent> {
        let agent = self.agents.remove(&id)?;
        grid.remove(agent.position);
        self.renderer.agent_removed(id);
        Some(agent)
    }

    /// Attempt one birth from `parent_id`, splitting its resources with the
    /// offspring
    pub fn reproduce<R: Rng + ?Sized>(
        &mut self,
        parent_id: AgentId,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) -> LifeEvent {
        let Some(parent) = self.agents.get(&parent_id) else {
            return LifeEvent::Nothing;
        };
        let (strategy, origin) = (parent.strategy, parent.position);

        let at_cap = self.len() >= self.cap;
        if at_cap && !self.reproduction.enforce_cap {
            return LifeEvent::CapReached;
        }

        let child = if self.reproduction.local {
            self.spawn_near(strategy, origin, self.reproduction.radius, grid, rng)
        } else {
            self.spawn_random(strategy, grid, rng)
        };
        let Some(child) = child else {
            log::debug!("Agent {} found no room to reproduce near {}", parent_id, origin);
            return LifeEvent::ReproductionBlocked;
        };

        let share = self
            .agents
            .get_mut(&parent_id)
            .map(Agent::split_resources)
            .unwrap_or_default();
        if let Some(offspring) = self.agents.get_mut(&child) {
            offspring.resources = share;
        }
        log::debug!("Agent {} ({}) produced offspring {}", parent_id, strategy, child);

        let culled = if at_cap { self.cull_random(grid, rng) } else { None };
        LifeEvent::Reproduced { child, culled }
    }

    /// Remove one uniformly chosen live agent
    fn cull_random<R: Rng + ?Sized>(&mut self, grid: &mut SpatialGrid, rng: &mut R) -> Option<AgentId> {
        if self.is_empty() {
            return None;
        }
        let pick = rng.gen_range(0..self.len());
        let victim = self.agents.keys().nth(pick).copied()?;
        self.kill(victim, grid);
        log::debug!("Culled agent {} to hold population at {}", victim, self.cap);
        Some(victim)
    }

    /// Death when resources are exhausted, otherwise reproduction once the
    /// threshold is reached
    pub fn update_life_events<R: Rng + ?Sized>(
        &mut self,
        id: AgentId,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) -> LifeEvent {
        let Some(agent) = self.agents.get(&id) else {
            return LifeEvent::Nothing;
        };
        if agent.is_dead() {
            log::debug!("Agent {} ({}) died", id, agent.strategy);
            self.kill(id, grid);
            LifeEvent::Died
        } else if agent.can_reproduce() {
            self.reproduce(id, grid, rng)
        } else {
            LifeEvent::Nothing
        }
    }
}

impl fmt::Debug for PopulationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopulationManager")
            .field("live", &self.agents.len())
            .field("cap", &self.cap)
            .field("next_id", &self.next_id)
            .field("reproduction", &self.reproduction)
            .finish()
    }
}
