//! Toroidal occupancy grid with at most one agent per cell.

use crate::agent::{Agent, AgentId};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cell coordinates, always within the grid extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Heading used for straight-line movement; each component in {-1, 0, 1}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Direction {
    pub dx: i8,
    pub dy: i8,
}

impl Direction {
    pub const fn new(dx: i8, dy: i8) -> Self {
        Self { dx, dy }
    }

    /// Uniform draw from {-1,0,1} x {-1,0,1}, x component first
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let dx = rng.gen_range(-1..=1);
        let dy = rng.gen_range(-1..=1);
        Self { dx, dy }
    }

    #[inline]
    pub fn inverted(self) -> Self {
        Self {
            dx: -self.dx,
            dy: -self.dy,
        }
    }
}

/// Spatial index mapping each cell to the agent occupying it
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    width: usize,
    height: usize,
    /// cells[y * width + x]
    cells: Vec<Option<AgentId>>,
    occupied: usize,
}

impl SpatialGrid {
    /// Create an empty grid. Both dimensions must be non-zero.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be non-zero");
        Self {
            width,
            height,
            cells: vec![None; width * height],
            occupied: 0,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells
    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Number of occupied cells
    #[inline]
    pub fn len(&self) -> usize {
        self.occupied
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.occupied == self.area()
    }

    #[inline]
    fn index(&self, pos: Position) -> usize {
        debug_assert!(pos.x < self.width && pos.y < self.height);
        pos.y * self.width + pos.x
    }

    /// Wrap signed coordinates onto the torus
    #[inline]
    pub fn wrap(&self, x: i64, y: i64) -> Position {
        Position {
            x: x.rem_euclid(self.width as i64) as usize,
            y: y.rem_euclid(self.height as i64) as usize,
        }
    }

    /// Cell reached from `pos` by an offset, wrapping at the edges
    #[inline]
    pub fn offset(&self, pos: Position, dx: i64, dy: i64) -> Position {
        self.wrap(pos.x as i64 + dx, pos.y as i64 + dy)
    }

    /// Agent at a cell, if any
    #[inline]
    pub fn get(&self, pos: Position) -> Option<AgentId> {
        self.cells[self.index(pos)]
    }

    #[inline]
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.get(pos).is_some()
    }

    /// Put an agent on an empty cell. Returns false if the cell is taken.
    pub fn place(&mut self, id: AgentId, pos: Position) -> bool {
        let idx = self.index(pos);
        if self.cells[idx].is_some() {
            return false;
        }
        self.cells[idx] = Some(id);
        self.occupied += 1;
        true
    }

    /// Clear a cell, returning its previous occupant
    pub fn remove(&mut self, pos: Position) -> Option<AgentId> {
        let idx = self.index(pos);
        let previous = self.cells[idx].take();
        if previous.is_some() {
            self.occupied -= 1;
        }
        previous
    }

    /// Move whatever occupies `from` onto the empty cell `to`
    pub fn relocate(&mut self, from: Position, to: Position) -> bool {
        if from == to || self.is_occupied(to) {
            return false;
        }
        match self.remove(from) {
            Some(id) => self.place(id, to),
            None => false,
        }
    }

    /// Offsets along one axis covering a Moore radius, each wrapped cell once
    fn axis_offsets(radius: usize, extent: usize) -> Vec<i64> {
        if 2 * radius + 1 >= extent {
            (0..extent as i64).collect()
        } else {
            let r = radius as i64;
            (-r..=r).collect()
        }
    }

    /// Cells within Chebyshev distance `radius` of `center` in row-major
    /// order, toroidally wrapped, optionally including the center
    pub fn moore_cells(&self, center: Position, radius: usize, include_center: bool) -> Vec<Position> {
        let xs = Self::axis_offsets(radius, self.width);
        let ys = Self::axis_offsets(radius, self.height);

        let mut cells = Vec::with_capacity(xs.len() * ys.len());
        for &dy in &ys {
            for &dx in &xs {
                if dx == 0 && dy == 0 && !include_center {
                    continue;
                }
                cells.push(self.offset(center, dx, dy));
            }
        }
        cells
    }

    /// Agents within `radius` of `center`, excluding the center cell
    pub fn neighbors(&self, center: Position, radius: usize) -> Vec<AgentId> {
        self.moore_cells(center, radius, false)
            .into_iter()
            .filter_map(|pos| self.get(pos))
            .collect()
    }

    /// Uniformly random empty cell within `radius` of `center`, or `None`
    /// when every cell in range is occupied
    pub fn empty_neighbor<R: Rng + ?Sized>(
        &self,
        center: Position,
        radius: usize,
        rng: &mut R,
    ) -> Option<Position> {
        let empty: Vec<Position> = self
            .moore_cells(center, radius, true)
            .into_iter()
            .filter(|&pos| !self.is_occupied(pos))
            .collect();
        empty.choose(rng).copied()
    }

    /// Uniformly random empty cell anywhere on the grid, retrying until one
    /// is found. `None` only when the grid is full.
    pub fn random_empty<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        if self.is_full() {
            return None;
        }
        loop {
            let x = rng.gen_range(0..self.width);
            let y = rng.gen_range(0..self.height);
            let pos = Position { x, y };
            if !self.is_occupied(pos) {
                return Some(pos);
            }
        }
    }

    /// Step an agent one cell along its heading.
    ///
    /// If the target is occupied the agent stays put and its heading is
    /// inverted for the next attempt. An agent the grid does not hold at its
    /// recorded cell is left where it is. Returns the agent's resulting cell.
    pub fn move_or_stay(&mut self, agent: &mut Agent) -> Position {
        let dir = agent.direction;
        let target = self.offset(agent.position, dir.dx as i64, dir.dy as i64);

        if self.get(agent.position) != Some(agent.id) {
            log::warn!("Agent {} is not on its recorded cell {}", agent.id, agent.position);
        } else if self.is_occupied(target) {
            agent.direction = dir.inverted();
        } else if self.relocate(agent.position, target) {
            agent.position = target;
        }
        agent.position
    }

    /// Every occupied cell with its agent, row-major
    pub fn occupants(&self) -> impl Iterator<Item = (Position, AgentId)> + '_ {
        let width = self.width;
        self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
            cell.map(|id| (Position::new(idx % width, idx / width), id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Strategy;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_place_and_remove() {
        let mut grid = SpatialGrid::new(10, 8);
        assert!(grid.place(1, Position::new(3, 4)));
        assert!(!grid.place(2, Position::new(3, 4)));
        assert_eq!(grid.get(Position::new(3, 4)), Some(1));
        assert_eq!(grid.len(), 1);

        assert_eq!(grid.remove(Position::new(3, 4)), Some(1));
        assert_eq!(grid.remove(Position::new(3, 4)), None);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_wrap() {
        let grid = SpatialGrid::new(10, 8);
        assert_eq!(grid.wrap(-1, -1), Position::new(9, 7));
        assert_eq!(grid.wrap(10, 8), Position::new(0, 0));
        assert_eq!(grid.offset(Position::new(9, 0), 1, -1), Position::new(0, 7));
    }

    #[test]
    fn test_neighbors_wrap_and_exclude_center() {
        let mut grid = SpatialGrid::new(10, 10);
        grid.place(0, Position::new(0, 0));
        grid.place(1, Position::new(9, 9)); // diagonal across both edges
        grid.place(2, Position::new(1, 0));
        grid.place(3, Position::new(5, 5)); // far away

        let mut found = grid.neighbors(Position::new(0, 0), 1);
        found.sort();
        assert_eq!(found, vec![1, 2]);
    }

    #[test]
    fn test_moore_cells_no_duplicates_on_small_grid() {
        let grid = SpatialGrid::new(3, 2);
        let cells = grid.moore_cells(Position::new(1, 1), 5, true);
        assert_eq!(cells.len(), 6);

        let without_center = grid.moore_cells(Position::new(1, 1), 5, false);
        assert_eq!(without_center.len(), 5);
        assert!(!without_center.contains(&Position::new(1, 1)));
    }

    #[test]
    fn test_empty_neighbor() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut grid = SpatialGrid::new(3, 3);
        for (i, pos) in grid.moore_cells(Position::new(1, 1), 1, true).into_iter().enumerate() {
            if pos != Position::new(2, 2) {
                grid.place(i as AgentId, pos);
            }
        }
        assert_eq!(
            grid.empty_neighbor(Position::new(1, 1), 1, &mut rng),
            Some(Position::new(2, 2))
        );

        grid.place(99, Position::new(2, 2));
        assert!(grid.is_full());
        assert_eq!(grid.empty_neighbor(Position::new(1, 1), 1, &mut rng), None);
        assert_eq!(grid.random_empty(&mut rng), None);
    }

    #[test]
    fn test_empty_neighbor_covers_all_candidates() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut grid = SpatialGrid::new(20, 20);
        grid.place(0, Position::new(10, 10));

        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let pos = grid.empty_neighbor(Position::new(10, 10), 1, &mut rng).unwrap();
            assert_ne!(pos, Position::new(10, 10));
            seen.insert(pos);
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_move_or_stay() {
        let mut grid = SpatialGrid::new(5, 5);
        let mut agent = Agent::new(0, Strategy::NaiveC, Position::new(4, 0), Direction::new(1, -1), 20.0);
        grid.place(agent.id, agent.position);

        let pos = grid.move_or_stay(&mut agent);
        assert_eq!(pos, Position::new(0, 4));
        assert_eq!(grid.get(Position::new(0, 4)), Some(0));
        assert!(!grid.is_occupied(Position::new(4, 0)));

        // Blocked: stay and invert heading
        grid.place(1, Position::new(1, 3));
        let pos = grid.move_or_stay(&mut agent);
        assert_eq!(pos, Position::new(0, 4));
        assert_eq!(agent.direction, Direction::new(-1, 1));
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_move_keeps_position_when_grid_disagrees() {
        let mut grid = SpatialGrid::new(5, 5);
        let mut agent = Agent::new(0, Strategy::NaiveC, Position::new(2, 2), Direction::new(1, 0), 20.0);

        // Never placed, so there is nothing to relocate
        assert_eq!(grid.move_or_stay(&mut agent), Position::new(2, 2));
        assert_eq!(agent.position, Position::new(2, 2));
        assert!(grid.is_empty());

        // Another agent holds the recorded cell
        grid.place(7, Position::new(2, 2));
        assert_eq!(grid.move_or_stay(&mut agent), Position::new(2, 2));
        assert_eq!(grid.get(Position::new(2, 2)), Some(7));
        assert!(!grid.is_occupied(Position::new(3, 2)));
    }

    #[test]
    fn test_stationary_heading_stays_in_place() {
        let mut grid = SpatialGrid::new(5, 5);
        let mut agent = Agent::new(0, Strategy::NaiveD, Position::new(2, 2), Direction::new(0, 0), 20.0);
        grid.place(agent.id, agent.position);
        assert_eq!(grid.move_or_stay(&mut agent), Position::new(2, 2));
        assert_eq!(grid.get(Position::new(2, 2)), Some(0));
    }

    #[test]
    fn test_random_direction_components() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            let d = Direction::random(&mut rng);
            assert!((-1..=1).contains(&d.dx));
            assert!((-1..=1).contains(&d.dy));
        }
    }
}
