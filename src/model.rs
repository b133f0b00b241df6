//! The step loop: set up a population, then alternate status updates and movement, recording
//! how many agents are in each state after every step.

use std::time::Instant;

use log::{debug, error, info, log_enabled, trace, Level};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::agent::{Agent, InfectionStatus, UpdateOutcome};
use crate::conflicts::{check_distancing_conflicts, check_position_conflicts};
use crate::error::SimulationError;
use crate::grid::{Grid, Position};
use crate::movement::MovementResolver;
use crate::occupancy::Occupancy;
use crate::parameters::Parameters;
use crate::placement::place_agents_with_config;
use crate::population::generate_agents;

/// Head counts per status after a step. Step 0 is the population before the first step.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub step: usize,
    pub susceptible: usize,
    pub infected: usize,
    pub quarantined: usize,
    pub recovered: usize,
    pub dead: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn tally(step: usize, agents: &[Agent], dead: usize) -> Self {
        let mut counts = StatusCounts {
            step,
            dead,
            ..StatusCounts::default()
        };
        for agent in agents {
            *counts.count_mut(agent.status()) += 1;
        }
        counts
    }

    fn count_mut(&mut self, status: InfectionStatus) -> &mut usize {
        match status {
            InfectionStatus::Susceptible => &mut self.susceptible,
            InfectionStatus::Infected => &mut self.infected,
            InfectionStatus::Quarantined => &mut self.quarantined,
            InfectionStatus::Recovered => &mut self.recovered,
        }
    }

    /// Number of living agents with `status`.
    #[must_use]
    pub fn get(&self, status: InfectionStatus) -> usize {
        match status {
            InfectionStatus::Susceptible => self.susceptible,
            InfectionStatus::Infected => self.infected,
            InfectionStatus::Quarantined => self.quarantined,
            InfectionStatus::Recovered => self.recovered,
        }
    }

    #[must_use]
    pub fn living(&self) -> usize {
        InfectionStatus::iter().map(|status| self.get(status)).sum()
    }
}

/// Indexes of the agents in the eight cells around `position`.
fn adjacent_indexes<'a>(
    occupancy: &'a Occupancy,
    grid: &Grid,
    position: Position,
) -> impl Iterator<Item = usize> + 'a {
    occupancy.nearby(grid, position, 1)
}

/// Agents in the eight cells around `agent`.
#[must_use]
pub fn adjacent_agents<'a>(agent: &Agent, population: &'a [Agent], grid: &Grid) -> Vec<&'a Agent> {
    let Some(position) = agent.position() else {
        return Vec::new();
    };
    let occupancy = Occupancy::from_agents(population);
    adjacent_indexes(&occupancy, grid, position)
        .map(|index| &population[index])
        .collect()
}

pub struct Model {
    parameters: Parameters,
    grid: Grid,
    rng: SmallRng,
    agents: Vec<Agent>,
    resolver: MovementResolver,
    num_dead: usize,
    step: usize,
    counts: Vec<StatusCounts>,
}

impl Model {
    /// Generates and places a population according to `parameters`.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::InvalidConfiguration` if the parameters do not validate and
    /// `SimulationError::PlacementError` if no layout could be found.
    pub fn new(parameters: Parameters) -> Result<Self, SimulationError> {
        parameters.validate()?;
        let mut rng = SmallRng::seed_from_u64(parameters.seed);
        let agents = generate_agents(
            &parameters.population_parameters(),
            &mut rng,
            &parameters.disease,
        )?;
        Model::with_rng(parameters, agents, rng)
    }

    /// Places a ready-made population. The population fields of `parameters` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::InvalidConfiguration` if the agents do not fit on the grid or
    /// the disease parameters do not validate, and `SimulationError::PlacementError` if no
    /// layout could be found.
    pub fn from_agents(parameters: Parameters, agents: Vec<Agent>) -> Result<Self, SimulationError> {
        parameters.disease.validate()?;
        let rng = SmallRng::seed_from_u64(parameters.seed);
        Model::with_rng(parameters, agents, rng)
    }

    fn with_rng(
        parameters: Parameters,
        mut agents: Vec<Agent>,
        mut rng: SmallRng,
    ) -> Result<Self, SimulationError> {
        let grid = Grid::new(parameters.grid_size)?;
        place_agents_with_config(&mut agents, &grid, &mut rng, &parameters.placement)?;
        info!(
            "Set up {} agents on a {n} x {n} grid (seed={}, movement={:?})",
            agents.len(),
            parameters.seed,
            parameters.movement,
            n = grid.size()
        );
        Ok(Model {
            resolver: MovementResolver::new(grid, parameters.movement),
            parameters,
            grid,
            rng,
            agents,
            num_dead: 0,
            step: 0,
            counts: Vec::new(),
        })
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The living population, in population order.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn num_dead(&self) -> usize {
        self.num_dead
    }

    /// Counts recorded so far, one per completed step plus the baseline.
    #[must_use]
    pub fn counts(&self) -> &[StatusCounts] {
        &self.counts
    }

    #[must_use]
    pub fn current_counts(&self) -> StatusCounts {
        StatusCounts::tally(self.step, &self.agents, self.num_dead)
    }

    /// Updates the status of every agent in population order. Agents that die are removed
    /// and are no longer neighbors of the agents updated after them. Returns the number of
    /// deaths.
    pub fn update_agents(&mut self) -> usize {
        let occupancy = Occupancy::from_agents(&self.agents);
        let mut dead = vec![false; self.agents.len()];
        for index in 0..self.agents.len() {
            let Some(position) = self.agents[index].position() else {
                continue;
            };
            let neighbors: Vec<Agent> = adjacent_indexes(&occupancy, &self.grid, position)
                .filter(|&other| !dead[other])
                .map(|other| self.agents[other])
                .collect();
            match self.agents[index].update(&neighbors, &mut self.rng, &self.parameters.disease)
            {
                UpdateOutcome::Died => {
                    trace!("agent at {position} died");
                    dead[index] = true;
                }
                UpdateOutcome::Transitioned { previous, current } if previous != current => {
                    trace!("agent at {position} went from {previous} to {current}");
                }
                UpdateOutcome::Transitioned { .. } => {}
            }
        }

        let deaths = dead.iter().filter(|&&d| d).count();
        if deaths > 0 {
            self.agents = self
                .agents
                .iter()
                .zip(&dead)
                .filter(|&(_, &d)| !d)
                .map(|(agent, _)| *agent)
                .collect();
            self.num_dead += deaths;
        }
        deaths
    }

    /// Moves every agent once.
    pub fn move_agents(&mut self) {
        self.resolver.move_all(&mut self.agents, &mut self.rng);
        if log_enabled!(Level::Debug) {
            let overlapping = check_position_conflicts(&self.agents);
            let crowded = check_distancing_conflicts(&self.agents, &self.grid);
            if !overlapping.is_empty() || !crowded.is_empty() {
                error!(
                    "step {}: agents share cells {:?}, distancing breached at {:?}",
                    self.step, overlapping, crowded
                );
            }
        }
    }

    /// Runs one step and records its counts.
    pub fn step(&mut self) -> StatusCounts {
        if self.counts.is_empty() {
            self.counts.push(self.current_counts());
        }
        self.update_agents();
        self.move_agents();
        self.step += 1;
        let counts = self.current_counts();
        debug!("{counts:?}");
        self.counts.push(counts);
        counts
    }

    /// Runs the configured number of steps and returns every recorded count, baseline first.
    pub fn run(&mut self) -> &[StatusCounts] {
        let start = Instant::now();
        for _ in 0..self.parameters.num_steps {
            self.step();
        }
        if self.counts.is_empty() {
            self.counts.push(self.current_counts());
        }
        let last = self.current_counts();
        info!(
            "Ran {} steps in {}: {} dead, {} recovered, {} still infected",
            self.parameters.num_steps,
            humantime::format_duration(start.elapsed()),
            last.dead,
            last.recovered,
            last.infected + last.quarantined
        );
        &self.counts
    }
}
