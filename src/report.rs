//! CSV output of a trajectory, one row per time step.
use csv::Writer;
use log::info;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;

use crate::error::SirError;
use crate::output::write_atomically;
use crate::trajectory::Trajectory;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryRow {
    pub step: usize,
    pub time: f64,
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
    pub total: f64,
}

// Report output files must be CSVs.
fn validate_filepath(path: &Path) -> Result<(), SirError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => Ok(()),
        _ => Err(SirError::SirError(
            "Report output files must be CSVs".to_string(),
        )),
    }
}

// Writes a CSV to a temporary file next to `path` and moves it into place once `write_rows`
// and the final flush succeeded.
fn write_csv<F>(path: &Path, write_rows: F) -> Result<(), SirError>
where
    F: FnOnce(&mut Writer<File>) -> Result<(), SirError>,
{
    validate_filepath(path)?;
    write_atomically(path, |temp_path| {
        let mut writer = Writer::from_path(temp_path)?;
        write_rows(&mut writer)?;
        writer.flush()?;
        Ok(())
    })
}

/// Writes every state of `trajectory` to the CSV file at `path`, creating parent directories.
/// On failure no file is left at `path`.
///
/// # Errors
///
/// Returns a `SirError` if the path is not a `.csv` file, cannot be created, or a row fails to
/// serialize.
pub fn write_trajectory_report(trajectory: &Trajectory, path: &Path) -> Result<(), SirError> {
    write_csv(path, |writer| {
        for (step, state) in trajectory.states().iter().enumerate() {
            writer.serialize(TrajectoryRow {
                step,
                time: trajectory.time_at(step),
                susceptible: state.susceptible,
                infected: state.infected,
                recovered: state.recovered,
                total: state.total(),
            })?;
        }
        Ok(())
    })?;
    info!("wrote {} rows to {}", trajectory.len(), path.display());
    Ok(())
}
