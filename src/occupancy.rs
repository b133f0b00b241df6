//! An index from occupied cells to the agents standing on them.
//!
//! Neighbor and movement queries walk the handful of cells around a position and look each one
//! up here instead of scanning the whole population.

use indexmap::IndexMap;

use crate::agent::Agent;
use crate::grid::{Grid, Position};

#[derive(Debug, Default, Clone)]
pub struct Occupancy {
    cells: IndexMap<Position, usize>,
}

impl Occupancy {
    #[must_use]
    pub fn new() -> Self {
        Occupancy::default()
    }

    /// Indexes every placed agent by position. Unplaced agents are skipped.
    #[must_use]
    pub fn from_agents(agents: &[Agent]) -> Self {
        let cells = agents
            .iter()
            .enumerate()
            .filter_map(|(index, agent)| agent.position().map(|position| (position, index)))
            .collect();
        Occupancy { cells }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Index of the agent standing on `position`, if any.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<usize> {
        self.cells.get(&position).copied()
    }

    pub fn insert(&mut self, position: Position, index: usize) {
        self.cells.insert(position, index);
    }

    pub fn relocate(&mut self, from: Position, to: Position) {
        if let Some(index) = self.cells.swap_remove(&from) {
            self.cells.insert(to, index);
        }
    }

    /// Indexes of agents within Chebyshev distance `radius` of `position`, not counting an
    /// agent standing on `position` itself.
    pub fn nearby<'a>(
        &'a self,
        grid: &Grid,
        position: Position,
        radius: usize,
    ) -> impl Iterator<Item = usize> + 'a {
        grid.search_space(position, radius)
            .into_iter()
            .filter_map(move |cell| self.get(cell))
    }
}
