//! Moving every agent one cell per step.
//!
//! An agent may step onto any of its eight neighboring cells that
//! * is not occupied,
//! * is not next to a distancing agent, and
//! * if the mover itself distances, is not next to anybody.
//!
//! One of the legal cells is picked uniformly at random. An agent with no legal cell stays
//! where it is; on a crowded grid this is expected and not an error.
//!
//! Only agents inside the [`SEARCH_RADIUS`] square around the mover can rule out one of its
//! cells, so candidates are looked up through an [`Occupancy`] index instead of scanning the
//! whole population.

use indexmap::IndexSet;
use log::{debug, trace};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::grid::{Grid, Position, SEARCH_RADIUS};
use crate::occupancy::Occupancy;

/// How the moves of one pass see each other.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MovementStrategy {
    /// Every agent proposes a move against the layout at the start of the pass. Proposals
    /// are then committed in population order; a proposal that collides with an
    /// already-committed position is dropped and that agent stays put. The proposals do not
    /// depend on the order agents are processed in.
    #[default]
    TwoPhase,
    /// Agents move one after another, each seeing where earlier agents have already moved.
    Sequential,
}

/// The cells `mover` may step onto, given the agents that could interfere with it.
/// `nearby` must not contain the mover itself.
pub fn available_positions<'a, I>(grid: &Grid, mover: &Agent, nearby: I) -> Vec<Position>
where
    I: IntoIterator<Item = &'a Agent>,
{
    let Some(position) = mover.position() else {
        return Vec::new();
    };
    let mut available: IndexSet<Position> = grid.adjacent(position);
    for other in nearby {
        let Some(other_position) = other.position() else {
            continue;
        };
        available.shift_remove(&other_position);
        if other.distancing() || mover.distancing() {
            for cell in grid.adjacent(other_position) {
                available.shift_remove(&cell);
            }
        }
    }
    available.into_iter().collect()
}

/// Picks one of `candidates` uniformly, or `None` when there is nowhere to go.
pub fn choose_position<R: Rng>(rng: &mut R, candidates: &[Position]) -> Option<Position> {
    candidates.choose(rng).copied()
}

#[derive(Debug, Clone, Copy)]
pub struct MovementResolver {
    grid: Grid,
    strategy: MovementStrategy,
}

impl MovementResolver {
    #[must_use]
    pub fn new(grid: Grid, strategy: MovementStrategy) -> Self {
        MovementResolver { grid, strategy }
    }

    #[must_use]
    pub fn strategy(&self) -> MovementStrategy {
        self.strategy
    }

    /// Moves every placed agent at most one cell. Unplaced agents are left alone.
    pub fn move_all<R: Rng>(&self, agents: &mut [Agent], rng: &mut R) {
        match self.strategy {
            MovementStrategy::TwoPhase => self.move_two_phase(agents, rng),
            MovementStrategy::Sequential => self.move_sequential(agents, rng),
        }
    }

    fn propose<R: Rng>(
        &self,
        agents: &[Agent],
        occupancy: &Occupancy,
        index: usize,
        rng: &mut R,
    ) -> Option<Position> {
        let mover = &agents[index];
        let position = mover.position()?;
        let nearby = occupancy
            .nearby(&self.grid, position, SEARCH_RADIUS)
            .map(|other| &agents[other]);
        let candidates = available_positions(&self.grid, mover, nearby);
        choose_position(rng, &candidates)
    }

    fn move_sequential<R: Rng>(&self, agents: &mut [Agent], rng: &mut R) {
        let mut occupancy = Occupancy::from_agents(agents);
        let mut moved = 0;
        for index in 0..agents.len() {
            let Some(current) = agents[index].position() else {
                continue;
            };
            if let Some(next) = self.propose(agents, &occupancy, index, rng) {
                occupancy.relocate(current, next);
                agents[index].set_position(next);
                moved += 1;
            }
        }
        trace!("sequential pass moved {moved} of {} agents", agents.len());
    }

    /// True if `index` can stand on `next` given the positions committed so far.
    fn is_compatible(
        &self,
        agents: &[Agent],
        committed: &Occupancy,
        index: usize,
        next: Position,
    ) -> bool {
        if committed.get(next).is_some() {
            return false;
        }
        let distancing = agents[index].distancing();
        committed
            .nearby(&self.grid, next, 1)
            .all(|other| !(distancing || agents[other].distancing()))
    }

    fn move_two_phase<R: Rng>(&self, agents: &mut [Agent], rng: &mut R) {
        let snapshot = Occupancy::from_agents(agents);
        let proposals: Vec<Option<Position>> = (0..agents.len())
            .map(|index| self.propose(agents, &snapshot, index, rng))
            .collect();

        // Every proposal already avoids everybody's starting cell, so an agent whose proposal
        // is dropped can always fall back to where it stood.
        let mut committed = Occupancy::new();
        let mut moved = 0;
        let mut dropped = 0;
        for (index, proposal) in proposals.into_iter().enumerate() {
            let Some(current) = agents[index].position() else {
                continue;
            };
            let next = match proposal {
                Some(next) if self.is_compatible(agents, &committed, index, next) => {
                    moved += 1;
                    next
                }
                Some(_) => {
                    dropped += 1;
                    current
                }
                None => current,
            };
            agents[index].set_position(next);
            committed.insert(next, index);
        }
        if dropped > 0 {
            debug!("two-phase pass dropped {dropped} conflicting moves");
        }
        trace!("two-phase pass moved {moved} of {} agents", agents.len());
    }
}

/// Moves every agent once using the default [`MovementStrategy`].
pub fn move_all_agents<R: Rng>(agents: &mut [Agent], grid: &Grid, rng: &mut R) {
    MovementResolver::new(*grid, MovementStrategy::default()).move_all(agents, rng);
}
