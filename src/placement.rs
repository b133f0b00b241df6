//! Initial placement of the population on the grid.
//!
//! Every agent needs its own cell, and every distancing agent needs its eight neighboring cells
//! empty. Distancing agents are the binding constraint, so they are placed first: each one
//! takes a random free cell and reserves that cell plus its neighbors. The remaining agents then
//! fill random cells that are still free.
//!
//! How free cells are found depends on how much of the grid the population can block:
//!
//! * on a sparse grid, where at most half the cells can ever be reserved, random coordinates
//!   are drawn and rejected while they hit a reserved cell. Work and memory grow with the
//!   population, not with the grid.
//! * otherwise every free cell is listed and drawn from directly, so running out of room is
//!   noticed exactly.
//!
//! On a dense grid the search is a bounded two-level retry rather than a backtracking search:
//!
//! * the distancing phase is retried up to [`PlacementConfig::distancing_attempts`] times; if
//!   no attempt fits every distancing agent the configuration is treated as unsatisfiable.
//! * a distancing layout can still leave too few cells for everybody else, in which case the
//!   whole placement starts over, up to [`PlacementConfig::placement_attempts`] times.

use indexmap::IndexSet;
use log::{debug, trace, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::error::SimulationError;
use crate::grid::{Grid, Position};

pub const DEFAULT_DISTANCING_ATTEMPTS: usize = 10;
pub const DEFAULT_PLACEMENT_ATTEMPTS: usize = 100;

/// Cells a distancing agent reserves: its own and the eight around it.
const DISTANCING_FOOTPRINT: usize = 9;

/// Draws per agent on a sparse grid. Each draw hits a free cell with probability at least 1/2.
const MAX_DRAWS_PER_AGENT: usize = 64;

/// Retry budgets for [`place_agents_with_config`]. Dense grids may need larger values.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct PlacementConfig {
    /// Attempts at fitting the distancing agents, within one placement attempt.
    pub distancing_attempts: usize,
    /// Attempts at placing the whole population.
    pub placement_attempts: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        PlacementConfig {
            distancing_attempts: DEFAULT_DISTANCING_ATTEMPTS,
            placement_attempts: DEFAULT_PLACEMENT_ATTEMPTS,
        }
    }
}

/// Splits the population into the indexes of distancing agents and of everybody else,
/// preserving population order within each group.
#[must_use]
pub fn split_agents(agents: &[Agent]) -> (Vec<usize>, Vec<usize>) {
    (0..agents.len()).partition(|&index| agents[index].distancing())
}

/// True if the agents can reserve at most half of the grid, whatever the layout.
#[must_use]
pub fn is_sparse(grid: &Grid, distancing: usize, others: usize) -> bool {
    distancing
        .saturating_mul(DISTANCING_FOOTPRINT)
        .saturating_add(others)
        <= grid.capacity() / 2
}

/// Draws random cells until one is not in `reserved`, giving up after [`MAX_DRAWS_PER_AGENT`].
fn draw_unreserved<R: Rng>(
    grid: &Grid,
    reserved: &IndexSet<Position>,
    rng: &mut R,
) -> Option<Position> {
    (0..MAX_DRAWS_PER_AGENT)
        .map(|_| {
            Position::new(
                rng.random_range(0..grid.size()),
                rng.random_range(0..grid.size()),
            )
        })
        .find(|position| !reserved.contains(position))
}

/// One placement attempt on a sparse grid. On failure returns how many agents got no cell.
fn sample_sparse_layout<R: Rng>(
    grid: &Grid,
    distancing: usize,
    others: usize,
    rng: &mut R,
) -> Result<(Vec<Position>, Vec<Position>), usize> {
    let mut reserved = IndexSet::new();
    let mut distancing_positions = Vec::with_capacity(distancing);
    for placed in 0..distancing {
        // A cell outside every reservation has no distancing agent next to it, and only
        // distancing agents have been placed so far.
        let position =
            draw_unreserved(grid, &reserved, rng).ok_or(distancing + others - placed)?;
        reserved.insert(position);
        reserved.extend(grid.adjacent(position));
        distancing_positions.push(position);
    }
    let mut other_positions = Vec::with_capacity(others);
    for placed in 0..others {
        let position = draw_unreserved(grid, &reserved, rng).ok_or(others - placed)?;
        reserved.insert(position);
        other_positions.push(position);
    }
    Ok((distancing_positions, other_positions))
}

/// Removes and returns a uniformly chosen cell from `free`.
fn take_random_position<R: Rng>(rng: &mut R, free: &mut IndexSet<Position>) -> Option<Position> {
    if free.is_empty() {
        return None;
    }
    let index = rng.random_range(0..free.len());
    free.swap_remove_index(index)
}

/// One attempt at placing `count` distancing agents on an empty grid. On success returns their
/// positions and the cells still free for anybody else.
fn place_distancing_agents<R: Rng>(
    grid: &Grid,
    count: usize,
    rng: &mut R,
) -> Option<(Vec<Position>, IndexSet<Position>)> {
    let mut free: IndexSet<Position> = grid.cells().collect();
    let mut placed = Vec::with_capacity(count);
    while placed.len() < count {
        if free.len() < count - placed.len() {
            return None;
        }
        let position = take_random_position(rng, &mut free)?;
        for neighbor in grid.adjacent(position) {
            free.swap_remove(&neighbor);
        }
        placed.push(position);
    }
    Some((placed, free))
}

fn place_distancing_with_retry<R: Rng>(
    grid: &Grid,
    count: usize,
    rng: &mut R,
    attempts: usize,
) -> Result<(Vec<Position>, IndexSet<Position>), SimulationError> {
    if count == 0 {
        return Ok((Vec::new(), grid.cells().collect()));
    }
    for attempt in 1..=attempts {
        if let Some(result) = place_distancing_agents(grid, count, rng) {
            return Ok(result);
        }
        trace!("distancing placement attempt {attempt} of {attempts} failed");
    }
    warn!("could not fit {count} distancing agents after {attempts} attempts");
    Err(SimulationError::PlacementError(format!(
        "could not fit {count} distancing agents on a {n} x {n} grid in {attempts} attempts",
        n = grid.size()
    )))
}

/// Draws `count` cells from `free`. On failure returns how many cells were missing.
fn place_remaining_agents<R: Rng>(
    count: usize,
    free: &mut IndexSet<Position>,
    rng: &mut R,
) -> Result<Vec<Position>, usize> {
    let mut placed = Vec::with_capacity(count);
    while placed.len() < count {
        match take_random_position(rng, free) {
            Some(position) => placed.push(position),
            None => return Err(count - placed.len()),
        }
    }
    Ok(placed)
}

/// Places every agent with the default retry budgets.
///
/// # Errors
///
/// See [`place_agents_with_config`].
pub fn place_agents<R: Rng>(
    agents: &mut [Agent],
    grid: &Grid,
    rng: &mut R,
) -> Result<(), SimulationError> {
    place_agents_with_config(agents, grid, rng, &PlacementConfig::default())
}

/// Gives every agent a distinct cell such that no agent is adjacent to a distancing agent.
/// Positions are only written once a complete layout has been found.
///
/// # Errors
///
/// * `SimulationError::InvalidConfiguration` if the grid has fewer cells than agents.
/// * `SimulationError::PlacementError` if either retry budget runs out.
pub fn place_agents_with_config<R: Rng>(
    agents: &mut [Agent],
    grid: &Grid,
    rng: &mut R,
    config: &PlacementConfig,
) -> Result<(), SimulationError> {
    grid.ensure_capacity(agents.len())?;
    let (distancing, others) = split_agents(agents);
    let sparse = is_sparse(grid, distancing.len(), others.len());

    let mut shortfall = 0;
    for attempt in 1..=config.placement_attempts {
        let layout = if sparse {
            sample_sparse_layout(grid, distancing.len(), others.len(), rng)
        } else {
            let (distancing_positions, mut free) = place_distancing_with_retry(
                grid,
                distancing.len(),
                rng,
                config.distancing_attempts,
            )?;
            place_remaining_agents(others.len(), &mut free, rng)
                .map(|other_positions| (distancing_positions, other_positions))
        };

        match layout {
            Ok((distancing_positions, other_positions)) => {
                let placements = distancing
                    .iter()
                    .zip(distancing_positions)
                    .chain(others.iter().zip(other_positions));
                for (&index, position) in placements {
                    agents[index].set_position(position);
                }
                debug!(
                    "placed {} agents ({} distancing) on attempt {attempt}, sparse={sparse}",
                    agents.len(),
                    distancing.len()
                );
                return Ok(());
            }
            Err(missing) => {
                trace!("placement attempt {attempt} was {missing} positions short");
                shortfall = missing;
            }
        }
    }

    warn!(
        "giving up on placement after {} attempts",
        config.placement_attempts
    );
    Err(SimulationError::PlacementError(format!(
        "could not place {} agents in {} attempts, {shortfall} positions short",
        agents.len(),
        config.placement_attempts
    )))
}
