use std::fmt::{self, Display};
use std::io;

/// Provides `SirError` and maps to other errors to
/// convert to a `SirError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SirError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// A parameter failed validation; integration never started.
    InvalidParameter(String),
    /// `S + I + R` drifted away from `N` beyond the relative tolerance.
    ConservationViolation {
        step: usize,
        total: f64,
        expected: f64,
    },
    RenderError(String),
    SirError(String),
}

impl From<io::Error> for SirError {
    fn from(error: io::Error) -> Self {
        SirError::IoError(error)
    }
}

impl From<serde_json::Error> for SirError {
    fn from(error: serde_json::Error) -> Self {
        SirError::JsonError(error)
    }
}

impl From<csv::Error> for SirError {
    fn from(error: csv::Error) -> Self {
        SirError::CSVError(error)
    }
}

impl From<String> for SirError {
    fn from(error: String) -> Self {
        SirError::SirError(error)
    }
}

impl From<&str> for SirError {
    fn from(error: &str) -> Self {
        SirError::SirError(error.to_string())
    }
}

impl std::error::Error for SirError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SirError::IoError(error) => Some(error),
            SirError::JsonError(error) => Some(error),
            SirError::CSVError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for SirError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SirError::IoError(error) => write!(f, "Error: I/O failure: {error}"),
            SirError::JsonError(error) => write!(f, "Error: invalid configuration: {error}"),
            SirError::CSVError(error) => write!(f, "Error: report failure: {error}"),
            SirError::InvalidParameter(message) => write!(f, "Error: invalid parameter: {message}"),
            SirError::ConservationViolation {
                step,
                total,
                expected,
            } => write!(
                f,
                "Error: population not conserved at step {step}: S+I+R = {total}, expected {expected}"
            ),
            SirError::RenderError(message) => write!(f, "Error: rendering failed: {message}"),
            SirError::SirError(message) => write!(f, "Error: {message}"),
        }
    }
}
