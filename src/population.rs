//! Builds the initial, unplaced population from target proportions.

use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, DiseaseParameters, InfectionStatus};
use crate::error::SimulationError;

// Absorbs float noise such as `0.29 * 100.0 == 28.999999999999996` before truncating.
const COUNT_TOLERANCE: f64 = 1e-9;

/// Converts a fraction of the population to a head count, truncating.
#[must_use]
pub fn proportion_count(fraction: f64, population: usize) -> usize {
    (fraction * population as f64 + COUNT_TOLERANCE).floor() as usize
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PopulationParameters {
    pub population: usize,
    /// An exact head count, not a fraction.
    pub initial_infections: usize,
    pub percent_distancing: f64,
    pub percent_mask: f64,
    /// Vaccinated agents start out recovered.
    pub percent_vaccinated: f64,
}

impl PopulationParameters {
    #[must_use]
    pub fn num_distancing(&self) -> usize {
        proportion_count(self.percent_distancing, self.population)
    }

    #[must_use]
    pub fn num_mask(&self) -> usize {
        proportion_count(self.percent_mask, self.population)
    }

    #[must_use]
    pub fn num_vaccinated(&self) -> usize {
        proportion_count(self.percent_vaccinated, self.population)
    }

    /// # Errors
    ///
    /// Returns `SimulationError::InvalidConfiguration` if a fraction lies outside `[0, 1]` or
    /// the infected and vaccinated agents together outnumber the population.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let fractions = [
            ("percent_distancing", self.percent_distancing),
            ("percent_mask", self.percent_mask),
            ("percent_vaccinated", self.percent_vaccinated),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimulationError::InvalidConfiguration(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        let assigned = self.initial_infections.checked_add(self.num_vaccinated());
        if assigned.is_none_or(|assigned| assigned > self.population) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "{} infected and {} vaccinated agents do not fit in a population of {}",
                self.initial_infections,
                self.num_vaccinated(),
                self.population
            )));
        }
        Ok(())
    }
}

/// Creates `params.population` unplaced agents.
///
/// Infected agents are drawn first; vaccinated agents are drawn from the rest and start out
/// recovered. Masks and distancing are assigned independently of status. Agents that start
/// out infected get the same asymptomatic draw as a new infection.
///
/// # Errors
///
/// Returns `SimulationError::InvalidConfiguration` if `params` does not validate.
pub fn generate_agents<R: Rng>(
    params: &PopulationParameters,
    rng: &mut R,
    disease: &DiseaseParameters,
) -> Result<Vec<Agent>, SimulationError> {
    params.validate()?;
    let m = params.population;

    let mut statuses = vec![InfectionStatus::Susceptible; m];
    for index in sample(rng, m, params.initial_infections) {
        statuses[index] = InfectionStatus::Infected;
    }
    let not_infected: Vec<usize> = (0..m)
        .filter(|&index| statuses[index] != InfectionStatus::Infected)
        .collect();
    for pick in sample(rng, not_infected.len(), params.num_vaccinated()) {
        statuses[not_infected[pick]] = InfectionStatus::Recovered;
    }

    let mut masked = vec![false; m];
    for index in sample(rng, m, params.num_mask()) {
        masked[index] = true;
    }
    let mut distancing = vec![false; m];
    for index in sample(rng, m, params.num_distancing()) {
        distancing[index] = true;
    }

    let agents = (0..m)
        .map(|index| {
            let agent = Agent::new(statuses[index], masked[index], distancing[index]);
            if statuses[index] == InfectionStatus::Infected {
                agent.with_asymptomatic(rng.random_bool(disease.asymptomatic_probability))
            } else {
                agent
            }
        })
        .collect();
    Ok(agents)
}
