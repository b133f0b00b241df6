use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::Path;

use csv::Writer;
use log::info;

use crate::error::SimulationError;
use crate::model::StatusCounts;

/// File name of the per-step counts written into an output directory.
pub const COUNTS_FILE_NAME: &str = "counts.csv";

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist.
fn generate_validate_filepath(path: &Path) -> Result<File, SimulationError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Ok(file)
        }
        _ => Err(SimulationError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

/// Writes one row per recorded step, with a header.
///
/// # Errors
///
/// Returns a `SimulationError` if `path` is not a `.csv` path or the file cannot be written.
pub fn write_counts(path: &Path, counts: &[StatusCounts]) -> Result<(), SimulationError> {
    let file = generate_validate_filepath(path)?;
    let mut writer = Writer::from_writer(file);
    for row in counts {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {}", counts.len(), path.display());
    Ok(())
}
