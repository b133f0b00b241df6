//! Checks for the two spatial invariants: one agent per cell, and nobody next to a distancing
//! agent. Both return the offending positions, so an empty result means the layout is valid.

use indexmap::{IndexMap, IndexSet};

use crate::agent::Agent;
use crate::grid::{Grid, Position};

/// Positions occupied by more than one agent, each reported once.
#[must_use]
pub fn check_position_conflicts(agents: &[Agent]) -> Vec<Position> {
    let mut counts: IndexMap<Position, usize> = IndexMap::new();
    for position in agents.iter().filter_map(Agent::position) {
        *counts.entry(position).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(position, _)| position)
        .collect()
}

/// Positions of every agent involved in a distancing breach: a distancing agent with another
/// agent in one of its eight neighboring cells. Both agents of a breaching pair are reported.
#[must_use]
pub fn check_distancing_conflicts(agents: &[Agent], grid: &Grid) -> Vec<Position> {
    let occupied: IndexSet<Position> = agents.iter().filter_map(Agent::position).collect();
    let mut conflicts = IndexSet::new();
    for agent in agents.iter().filter(|agent| agent.distancing()) {
        let Some(position) = agent.position() else {
            continue;
        };
        for neighbor in grid.adjacent(position) {
            if occupied.contains(&neighbor) {
                conflicts.insert(position);
                conflicts.insert(neighbor);
            }
        }
    }
    conflicts.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::InfectionStatus;

    fn distancing_at(x: usize, y: usize) -> Agent {
        Agent::new(InfectionStatus::Infected, true, true).at((x, y))
    }

    #[test]
    fn position_conflicts() {
        let agents = [distancing_at(5, 5), distancing_at(0, 0)];
        assert!(check_position_conflicts(&agents).is_empty());

        let agents = [distancing_at(5, 5), distancing_at(5, 5), distancing_at(5, 5)];
        assert_eq!(check_position_conflicts(&agents), vec![Position::new(5, 5)]);
    }

    #[test]
    fn distancing_conflicts() {
        let grid = Grid::new(25).unwrap();
        let agents = [distancing_at(1, 1), distancing_at(5, 5)];
        assert!(check_distancing_conflicts(&agents, &grid).is_empty());

        let agents = [distancing_at(4, 4), distancing_at(5, 5)];
        let conflicts = check_distancing_conflicts(&agents, &grid);
        assert!(conflicts.contains(&Position::new(4, 4)));
        assert!(conflicts.contains(&Position::new(5, 5)));
        assert_eq!(conflicts.len(), 2);
    }

    #[test]
    fn distancing_conflicts_wrap_and_ignore_non_distancing_pairs() {
        let grid = Grid::new(25).unwrap();
        let plain =
            |x: usize, y: usize| Agent::new(InfectionStatus::Susceptible, false, false).at((x, y));

        let agents = [plain(0, 0), plain(24, 24)];
        assert!(check_distancing_conflicts(&agents, &grid).is_empty());

        let agents = [distancing_at(0, 0), plain(24, 24)];
        assert_eq!(check_distancing_conflicts(&agents, &grid).len(), 2);
    }
}
