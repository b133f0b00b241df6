use std::fs;
use std::path::Path;

use derive_builder::Builder;
use log::info;
use serde::{Deserialize, Serialize};

use crate::agent::DiseaseParameters;
use crate::error::SimulationError;
use crate::grid::Grid;
use crate::movement::MovementStrategy;
use crate::placement::PlacementConfig;
use crate::population::PopulationParameters;

/// Everything needed to set up and run a model. Fields missing from a parameters file take
/// the builder defaults.
#[derive(Serialize, Deserialize, Clone, Debug, Builder, PartialEq)]
#[serde(default)]
pub struct Parameters {
    /// Side length of the square torus.
    #[builder(default = "25")]
    pub grid_size: usize,

    #[builder(default = "250")]
    pub population: usize,

    #[builder(default = "10")]
    pub initial_infections: usize,

    #[builder(default = "0.1")]
    pub percent_distancing: f64,

    #[builder(default = "0.35")]
    pub percent_mask: f64,

    #[builder(default = "0.0")]
    pub percent_vaccinated: f64,

    #[builder(default = "100")]
    pub num_steps: usize,

    #[builder(default = "0")]
    pub seed: u64,

    #[builder(default)]
    pub disease: DiseaseParameters,

    #[builder(default)]
    pub placement: PlacementConfig,

    #[builder(default)]
    pub movement: MovementStrategy,
}

impl Default for Parameters {
    fn default() -> Self {
        ParametersBuilder::default()
            .build()
            .expect("every parameter has a default")
    }
}

impl Parameters {
    /// Reads parameters from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON for `Parameters`.
    pub fn from_json_file(path: &Path) -> Result<Self, SimulationError> {
        info!("Loading parameters from: {}", path.display());
        let data = fs::read_to_string(path)?;
        let parameters: Parameters = serde_json::from_str(&data)?;
        Ok(parameters)
    }

    #[must_use]
    pub fn population_parameters(&self) -> PopulationParameters {
        PopulationParameters {
            population: self.population,
            initial_infections: self.initial_infections,
            percent_distancing: self.percent_distancing,
            percent_mask: self.percent_mask,
            percent_vaccinated: self.percent_vaccinated,
        }
    }

    /// Checks everything that can be checked before any random draw.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::InvalidConfiguration` describing the first problem found.
    pub fn validate(&self) -> Result<(), SimulationError> {
        Grid::new(self.grid_size)?.ensure_capacity(self.population)?;
        self.population_parameters().validate()?;
        self.disease.validate()
    }
}
