//! An agent-based SIR epidemic on a toroidal grid
//!
//! A fixed population of agents lives on an `n x n` grid whose edges wrap. Every agent
//! occupies its own cell, and agents that practice distancing never have another agent in the
//! eight cells around them. Each step has two phases:
//! * Status update: agents die, catch the disease from their neighbors, go into quarantine
//!   or recover, with probabilities taken from [`agent::DiseaseParameters`].
//! * Movement: every agent tries to step to one of its neighboring cells without breaking
//!   the occupancy and distancing rules (see [`movement`]).
//!
//! A run is set up and driven by [`model::Model`]:
//! * [`population::generate_agents`] creates the agents from target proportions.
//! * [`placement::place_agents`] lays them out on the grid.
//! * [`model::Model::run`] alternates status updates and movement, recording
//!   [`model::StatusCounts`] after every step, which [`report::write_counts`] writes as CSV.
//!
//! The `gridsir` binary wraps all of this in a small command line interface
//! ([`runner`]).
pub mod agent;
pub mod conflicts;
pub mod error;
pub mod grid;
pub mod log;
pub mod model;
pub mod movement;
pub mod occupancy;
pub mod parameters;
pub mod placement;
pub mod population;
pub mod report;
pub mod runner;

pub use agent::{Agent, DiseaseParameters, InfectionStatus, UpdateOutcome};
pub use error::SimulationError;
pub use grid::{Grid, Position};
pub use model::{Model, StatusCounts};
pub use movement::{move_all_agents, MovementResolver, MovementStrategy};
pub use parameters::{Parameters, ParametersBuilder};
pub use placement::{place_agents, PlacementConfig};

// Re-exported for seeding and passing generators to the free functions.
pub use rand;
