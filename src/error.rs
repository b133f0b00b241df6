use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `SimulationError` and maps to other errors to
/// convert to a `SimulationError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SimulationError {
    /// The requested setup can never run, e.g. the grid cannot hold the population.
    InvalidConfiguration(String),
    /// The bounded placement search gave up.
    PlacementError(String),
    /// A status code outside `S`, `I`, `Q`, `R`.
    InvalidStatus(String),
    ReportError(String),
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
}

impl From<io::Error> for SimulationError {
    fn from(error: io::Error) -> Self {
        SimulationError::IoError(error)
    }
}

impl From<serde_json::Error> for SimulationError {
    fn from(error: serde_json::Error) -> Self {
        SimulationError::JsonError(error)
    }
}

impl From<csv::Error> for SimulationError {
    fn from(error: csv::Error) -> Self {
        SimulationError::CsvError(error)
    }
}

impl std::error::Error for SimulationError {}

impl Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimulationError::InvalidConfiguration(msg) => {
                write!(f, "invalid configuration: {msg}")
            }
            SimulationError::PlacementError(msg) => write!(f, "placement failed: {msg}"),
            SimulationError::InvalidStatus(status) => write!(f, "status: {status} is not valid"),
            SimulationError::ReportError(msg) => write!(f, "report error: {msg}"),
            SimulationError::IoError(error) => write!(f, "I/O error: {error}"),
            SimulationError::JsonError(error) => write!(f, "JSON error: {error}"),
            SimulationError::CsvError(error) => write!(f, "CSV error: {error}"),
        }
    }
}
