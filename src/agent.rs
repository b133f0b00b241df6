//! A single agent and the rules that advance its health status from one step to the next.
//!
//! Status moves `S -> I`, `I -> Q`, `I -> R` and `Q -> R`. Death is not a status: an agent that
//! dies is removed from the population by the caller, which learns about it from
//! [`UpdateOutcome::Died`].

use std::fmt::{self, Display};
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::error::SimulationError;
use crate::grid::Position;

pub const DEATH_PROBABILITY: f64 = 0.002;
pub const BOTH_MASKED_TRANSMISSION: f64 = 0.0001;
pub const ONE_MASKED_TRANSMISSION: f64 = 0.01;
pub const UNMASKED_TRANSMISSION: f64 = 0.25;
pub const ASYMPTOMATIC_PROBABILITY: f64 = 0.2;
/// Symptomatic agents quarantine once they have been infected for more than this many steps.
pub const QUARANTINE_AFTER_DAYS: u32 = 2;
/// Infections end once they have lasted more than this many steps.
pub const RECOVERY_AFTER_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum InfectionStatus {
    Susceptible,
    Infected,
    Quarantined,
    Recovered,
}

impl InfectionStatus {
    /// The one letter code used in reports and parameter files.
    #[must_use]
    pub fn code(self) -> char {
        match self {
            InfectionStatus::Susceptible => 'S',
            InfectionStatus::Infected => 'I',
            InfectionStatus::Quarantined => 'Q',
            InfectionStatus::Recovered => 'R',
        }
    }

    /// Infected or quarantined: the agent carries the disease and can die of it.
    #[must_use]
    pub fn is_infected(self) -> bool {
        matches!(
            self,
            InfectionStatus::Infected | InfectionStatus::Quarantined
        )
    }
}

impl Display for InfectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for InfectionStatus {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(code), None) => code,
            _ => return Err(SimulationError::InvalidStatus(s.to_string())),
        };
        InfectionStatus::iter()
            .find(|status| status.code() == code)
            .ok_or_else(|| SimulationError::InvalidStatus(s.to_string()))
    }
}

/// Probabilities and durations of the disease. `Default` gives the model's standard values.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct DiseaseParameters {
    /// Per-step chance that an infected or quarantined agent dies.
    pub death_probability: f64,
    pub both_masked_transmission: f64,
    pub one_masked_transmission: f64,
    pub unmasked_transmission: f64,
    /// Chance that a new infection never shows symptoms.
    pub asymptomatic_probability: f64,
    pub quarantine_after_days: u32,
    pub recovery_after_days: u32,
}

impl Default for DiseaseParameters {
    fn default() -> Self {
        DiseaseParameters {
            death_probability: DEATH_PROBABILITY,
            both_masked_transmission: BOTH_MASKED_TRANSMISSION,
            one_masked_transmission: ONE_MASKED_TRANSMISSION,
            unmasked_transmission: UNMASKED_TRANSMISSION,
            asymptomatic_probability: ASYMPTOMATIC_PROBABILITY,
            quarantine_after_days: QUARANTINE_AFTER_DAYS,
            recovery_after_days: RECOVERY_AFTER_DAYS,
        }
    }
}

impl DiseaseParameters {
    /// Chance that one infected contact passes the disease on, given who wears a mask.
    #[must_use]
    pub fn transmission_probability(&self, masked: bool, contact_masked: bool) -> f64 {
        match (masked, contact_masked) {
            (true, true) => self.both_masked_transmission,
            (false, false) => self.unmasked_transmission,
            _ => self.one_masked_transmission,
        }
    }

    /// # Errors
    ///
    /// Returns `SimulationError::InvalidConfiguration` if any probability lies outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let probabilities = [
            ("death_probability", self.death_probability),
            ("both_masked_transmission", self.both_masked_transmission),
            ("one_masked_transmission", self.one_masked_transmission),
            ("unmasked_transmission", self.unmasked_transmission),
            ("asymptomatic_probability", self.asymptomatic_probability),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimulationError::InvalidConfiguration(format!(
                    "{name} must be a probability, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// What happened to an agent during one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The agent died and must be removed from the population.
    Died,
    /// The agent survived. `previous` and `current` are equal when nothing changed.
    Transitioned {
        previous: InfectionStatus,
        current: InfectionStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    position: Option<Position>,
    status: InfectionStatus,
    days_infected: u32,
    asymptomatic: bool,
    mask: bool,
    distancing: bool,
}

impl Agent {
    /// Creates an unplaced, symptomatic agent.
    #[must_use]
    pub fn new(status: InfectionStatus, mask: bool, distancing: bool) -> Self {
        Agent {
            position: None,
            status,
            days_infected: 0,
            asymptomatic: false,
            mask,
            distancing,
        }
    }

    /// Creates an agent from a status code.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::InvalidStatus` unless `status` is one of `S`, `I`, `Q`, `R`.
    pub fn from_code(status: &str, mask: bool, distancing: bool) -> Result<Self, SimulationError> {
        Ok(Agent::new(status.parse()?, mask, distancing))
    }

    #[must_use]
    pub fn at(mut self, position: impl Into<Position>) -> Self {
        self.position = Some(position.into());
        self
    }

    /// Only meaningful for infected agents; ignored otherwise.
    #[must_use]
    pub fn with_asymptomatic(mut self, asymptomatic: bool) -> Self {
        self.asymptomatic = asymptomatic && self.status == InfectionStatus::Infected;
        self
    }

    /// Only meaningful for infected or quarantined agents; ignored otherwise.
    #[must_use]
    pub fn with_days_infected(mut self, days: u32) -> Self {
        if self.status.is_infected() {
            self.days_infected = days;
        }
        self
    }

    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    #[must_use]
    pub fn status(&self) -> InfectionStatus {
        self.status
    }

    #[must_use]
    pub fn days_infected(&self) -> u32 {
        self.days_infected
    }

    #[must_use]
    pub fn is_asymptomatic(&self) -> bool {
        self.asymptomatic
    }

    #[must_use]
    pub fn mask(&self) -> bool {
        self.mask
    }

    #[must_use]
    pub fn distancing(&self) -> bool {
        self.distancing
    }

    /// Draws whether the agent dies this step. Only infected and quarantined agents can die.
    pub fn has_died<R: Rng>(&self, rng: &mut R, disease: &DiseaseParameters) -> bool {
        self.status.is_infected() && rng.random_bool(disease.death_probability)
    }

    /// Runs one independent trial per infected neighbor; any success infects.
    fn is_exposed<'a, R, I>(&self, neighbors: I, rng: &mut R, disease: &DiseaseParameters) -> bool
    where
        R: Rng,
        I: IntoIterator<Item = &'a Agent>,
    {
        let mut infected = false;
        for neighbor in neighbors {
            if neighbor.status != InfectionStatus::Infected {
                continue;
            }
            let p = disease.transmission_probability(self.mask, neighbor.mask);
            // Every trial is drawn so the number of draws does not depend on earlier outcomes.
            infected |= rng.random_bool(p);
        }
        infected
    }

    fn will_quarantine(&self, disease: &DiseaseParameters) -> bool {
        self.days_infected > disease.quarantine_after_days && !self.asymptomatic
    }

    fn infection_over(&self, disease: &DiseaseParameters) -> bool {
        self.days_infected > disease.recovery_after_days
    }

    /// Advances the agent by one step given the agents currently adjacent to it.
    ///
    /// The death check comes first; a dead agent is left untouched. Otherwise the infection
    /// clock ticks, then the status rules for the current status are applied.
    pub fn update<'a, R, I>(
        &mut self,
        neighbors: I,
        rng: &mut R,
        disease: &DiseaseParameters,
    ) -> UpdateOutcome
    where
        R: Rng,
        I: IntoIterator<Item = &'a Agent>,
    {
        if self.has_died(rng, disease) {
            return UpdateOutcome::Died;
        }

        let previous = self.status;
        if self.status.is_infected() {
            self.days_infected += 1;
        }

        match self.status {
            InfectionStatus::Susceptible => {
                if self.is_exposed(neighbors, rng, disease) {
                    self.status = InfectionStatus::Infected;
                    self.asymptomatic = rng.random_bool(disease.asymptomatic_probability);
                }
            }
            InfectionStatus::Infected => {
                if self.will_quarantine(disease) {
                    self.status = InfectionStatus::Quarantined;
                }
                if self.infection_over(disease) {
                    self.status = InfectionStatus::Recovered;
                }
            }
            InfectionStatus::Quarantined => {
                if self.infection_over(disease) {
                    self.status = InfectionStatus::Recovered;
                }
            }
            InfectionStatus::Recovered => {}
        }

        if previous != InfectionStatus::Recovered && self.status == InfectionStatus::Recovered {
            self.days_infected = 0;
            self.asymptomatic = false;
        }

        UpdateOutcome::Transitioned {
            previous,
            current: self.status,
        }
    }
}

impl Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let position = self
            .position
            .map_or_else(|| "unplaced".to_string(), |p| p.to_string());
        write!(
            f,
            "Agent{{position: {}, status: {}, mask: {}, distancing: {}, days_infected: {}, asymptomatic: {}}}",
            position, self.status, self.mask, self.distancing, self.days_infected, self.asymptomatic
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use InfectionStatus::{Infected, Quarantined, Recovered, Susceptible};

    const TRIALS: usize = 100_000;
    const NONE: [&Agent; 0] = [];

    fn no_death() -> DiseaseParameters {
        DiseaseParameters {
            death_probability: 0.0,
            ..DiseaseParameters::default()
        }
    }

    fn infection_rate(masked: bool, contact_masked: bool, seed: u64) -> f64 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let disease = DiseaseParameters::default();
        let contact = Agent::new(Infected, contact_masked, false);
        let mut infections = 0;
        for _ in 0..TRIALS {
            let mut agent = Agent::new(Susceptible, masked, false);
            agent.update([&contact], &mut rng, &disease);
            if agent.status() == Infected {
                infections += 1;
            }
        }
        infections as f64 / TRIALS as f64
    }

    #[test]
    fn status_codes_parse() {
        for status in InfectionStatus::iter() {
            let parsed: InfectionStatus = status.code().to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!(
            InfectionStatus::iter().collect::<Vec<_>>(),
            vec![Susceptible, Infected, Quarantined, Recovered]
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = Agent::from_code("D", true, false);
        assert!(matches!(result, Err(SimulationError::InvalidStatus(s)) if s == "D"));
        assert!(Agent::from_code("", true, false).is_err());
        assert!(Agent::from_code("s", true, false).is_err());
        assert!(Agent::from_code("SI", true, false).is_err());
    }

    #[test]
    fn new_agents_are_unplaced() {
        let agent = Agent::from_code("I", true, true).unwrap();
        assert_eq!(agent.position(), None);
        assert_eq!(agent.days_infected(), 0);
        assert!(agent.mask());
        assert!(agent.distancing());
    }

    #[test]
    fn builders_keep_days_and_asymptomatic_consistent() {
        let agent = Agent::new(Susceptible, false, false)
            .with_days_infected(5)
            .with_asymptomatic(true);
        assert_eq!(agent.days_infected(), 0);
        assert!(!agent.is_asymptomatic());
    }

    #[test]
    fn both_masked_infection_rate() {
        assert_abs_diff_eq!(infection_rate(true, true, 1), 0.0001, epsilon = 0.0001);
    }

    #[test]
    fn one_masked_infection_rate() {
        assert_abs_diff_eq!(infection_rate(true, false, 2), 0.01, epsilon = 0.002);
        assert_abs_diff_eq!(infection_rate(false, true, 3), 0.01, epsilon = 0.002);
    }

    #[test]
    fn unmasked_infection_rate() {
        assert_abs_diff_eq!(infection_rate(false, false, 4), 0.25, epsilon = 0.01);
    }

    #[test]
    fn infected_neighbors_compound() {
        let mut rng = SmallRng::seed_from_u64(5);
        let disease = DiseaseParameters::default();
        let contacts = [
            Agent::new(Infected, false, false),
            Agent::new(Infected, false, false),
        ];
        let mut infections = 0;
        for _ in 0..TRIALS {
            let mut agent = Agent::new(Susceptible, false, false);
            agent.update(&contacts, &mut rng, &disease);
            if agent.status() == Infected {
                infections += 1;
            }
        }
        // 1 - 0.75^2
        assert_abs_diff_eq!(infections as f64 / TRIALS as f64, 0.4375, epsilon = 0.01);
    }

    #[test]
    fn only_infected_neighbors_transmit() {
        let mut rng = SmallRng::seed_from_u64(6);
        let disease = DiseaseParameters {
            unmasked_transmission: 1.0,
            ..DiseaseParameters::default()
        };
        let contacts = [
            Agent::new(Susceptible, false, false),
            Agent::new(Quarantined, false, false),
            Agent::new(Recovered, false, false),
        ];
        for _ in 0..1000 {
            let mut agent = Agent::new(Susceptible, false, false);
            agent.update(&contacts, &mut rng, &disease);
            assert_eq!(agent.status(), Susceptible);
        }
    }

    #[test]
    fn asymptomatic_draw_on_infection() {
        let mut rng = SmallRng::seed_from_u64(7);
        let disease = DiseaseParameters {
            unmasked_transmission: 1.0,
            ..DiseaseParameters::default()
        };
        let contact = Agent::new(Infected, false, false);
        let mut asymptomatic = 0;
        for _ in 0..TRIALS {
            let mut agent = Agent::new(Susceptible, false, false);
            let outcome = agent.update([&contact], &mut rng, &disease);
            assert_eq!(
                outcome,
                UpdateOutcome::Transitioned {
                    previous: Susceptible,
                    current: Infected
                }
            );
            assert_eq!(agent.days_infected(), 0);
            if agent.is_asymptomatic() {
                asymptomatic += 1;
            }
        }
        assert_abs_diff_eq!(asymptomatic as f64 / TRIALS as f64, 0.2, epsilon = 0.01);
    }

    #[test]
    fn symptomatic_agent_quarantines_on_third_day() {
        let mut rng = SmallRng::seed_from_u64(8);
        let disease = no_death();
        let mut agent = Agent::new(Infected, false, false).with_days_infected(1);
        agent.update(NONE, &mut rng, &disease);
        assert_eq!(agent.status(), Infected);
        assert_eq!(agent.days_infected(), 2);

        let outcome = agent.update(NONE, &mut rng, &disease);
        assert_eq!(
            outcome,
            UpdateOutcome::Transitioned {
                previous: Infected,
                current: Quarantined
            }
        );
        assert_eq!(agent.days_infected(), 3);
    }

    #[test]
    fn asymptomatic_agent_never_quarantines() {
        let mut rng = SmallRng::seed_from_u64(9);
        let disease = no_death();
        let mut agent = Agent::new(Infected, false, false).with_asymptomatic(true);
        for day in 1..=14 {
            agent.update(NONE, &mut rng, &disease);
            assert_eq!(agent.status(), Infected, "day {day}");
        }
        agent.update(NONE, &mut rng, &disease);
        assert_eq!(agent.status(), Recovered);
        assert_eq!(agent.days_infected(), 0);
        assert!(!agent.is_asymptomatic());
    }

    #[test]
    fn recovery_on_fifteenth_day() {
        let mut rng = SmallRng::seed_from_u64(10);
        let disease = no_death();
        for status in [Infected, Quarantined] {
            let mut agent = Agent::new(status, true, true)
                .with_days_infected(14)
                .with_asymptomatic(true);
            let outcome = agent.update(NONE, &mut rng, &disease);
            assert_eq!(
                outcome,
                UpdateOutcome::Transitioned {
                    previous: status,
                    current: Recovered
                }
            );
            assert_eq!(agent.days_infected(), 0);
            assert!(!agent.is_asymptomatic());
        }
    }

    #[test]
    fn quarantined_agent_stays_until_recovery() {
        let mut rng = SmallRng::seed_from_u64(11);
        let disease = no_death();
        let mut agent = Agent::new(Quarantined, false, false).with_days_infected(3);
        for _ in 4..=14 {
            agent.update(NONE, &mut rng, &disease);
            assert_eq!(agent.status(), Quarantined);
        }
        agent.update(NONE, &mut rng, &disease);
        assert_eq!(agent.status(), Recovered);
    }

    #[test]
    fn recovered_is_absorbing() {
        let mut rng = SmallRng::seed_from_u64(12);
        let disease = DiseaseParameters {
            unmasked_transmission: 1.0,
            death_probability: 1.0,
            ..DiseaseParameters::default()
        };
        let contact = Agent::new(Infected, false, false);
        let mut agent = Agent::new(Recovered, false, false);
        for _ in 0..100 {
            let outcome = agent.update([&contact], &mut rng, &disease);
            assert_eq!(
                outcome,
                UpdateOutcome::Transitioned {
                    previous: Recovered,
                    current: Recovered
                }
            );
        }
    }

    #[test]
    fn death_rate_of_infected_agents() {
        let mut rng = SmallRng::seed_from_u64(13);
        let disease = DiseaseParameters::default();
        for status in [Infected, Quarantined] {
            let agent = Agent::new(status, false, false);
            let deaths = (0..TRIALS)
                .filter(|_| {
                    let mut trial = agent;
                    trial.update(NONE, &mut rng, &disease) == UpdateOutcome::Died
                })
                .count();
            assert_abs_diff_eq!(deaths as f64 / TRIALS as f64, 0.002, epsilon = 0.001);
        }
    }

    #[test]
    fn susceptible_agents_never_die() {
        let mut rng = SmallRng::seed_from_u64(14);
        let disease = DiseaseParameters {
            death_probability: 1.0,
            ..DiseaseParameters::default()
        };
        let agent = Agent::new(Susceptible, false, false);
        for _ in 0..TRIALS {
            assert!(!agent.has_died(&mut rng, &disease));
        }
    }

    #[test]
    fn dead_agent_is_not_advanced() {
        let mut rng = SmallRng::seed_from_u64(15);
        let disease = DiseaseParameters {
            death_probability: 1.0,
            ..DiseaseParameters::default()
        };
        let mut agent = Agent::new(Infected, false, false).with_days_infected(4);
        assert_eq!(agent.update(NONE, &mut rng, &disease), UpdateOutcome::Died);
        assert_eq!(agent.days_infected(), 4);
        assert_eq!(agent.status(), Infected);
    }

    #[test]
    fn out_of_range_probabilities_are_rejected() {
        let disease = DiseaseParameters {
            unmasked_transmission: 1.5,
            ..DiseaseParameters::default()
        };
        assert!(matches!(
            disease.validate(),
            Err(SimulationError::InvalidConfiguration(_))
        ));
        assert!(DiseaseParameters::default().validate().is_ok());
    }
}
