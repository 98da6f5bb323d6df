//! JSON configuration of a run.
//!
//! Every field is optional. Model parameters sit at the top level, rendering settings in the
//! `animation` and `chart` objects:
//!
//! ```json
//! {
//!     "initial_susceptible": 990,
//!     "initial_infected": 10,
//!     "beta": 0.3,
//!     "gamma": 0.1,
//!     "dt": 0.1,
//!     "steps": 600,
//!     "negativity": "clamp_to_zero",
//!     "animation": { "fps": 20, "frame_skip": 3, "output_file": "sir.gif" },
//!     "chart": { "width": 1000, "height": 600 }
//! }
//! ```
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::SirError;
use crate::parameters::{Parameters, ParametersValues};
use crate::render::{AnimationOptions, ChartOptions};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    #[serde(flatten)]
    pub parameters: ParametersValues,
    pub animation: AnimationOptions,
    pub chart: ChartOptions,
}

impl SimulationConfig {
    /// Reads a configuration file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a `SirError` if the file cannot be opened or is not valid JSON for this schema.
    pub fn load(path: &Path) -> Result<Self, SirError> {
        info!("loading configuration from {}", path.display());
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Validates the model parameters.
    ///
    /// # Errors
    ///
    /// Returns `SirError::InvalidParameter` describing the first invalid value.
    pub fn parameters(&self) -> Result<Parameters, SirError> {
        Parameters::try_from(self.parameters.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::NegativityPolicy;
    use approx::assert_relative_eq;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_object_gives_defaults() {
        let file = config_file("{}");
        let config = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.animation.fps, 20);
        assert_eq!(config.animation.frame_skip, 3);
        assert_eq!(config.animation.output_file, PathBuf::from("sir.gif"));
        assert_eq!(config.chart.width, 1000);
        assert_eq!(config.chart.height, 600);
    }

    #[test]
    fn partial_config_overrides_defaults() {
        let file = config_file(
            r#"{
                "beta": 0.08,
                "population": 1000,
                "negativity": "clamp_to_zero",
                "animation": { "fps": 10 },
                "chart": { "output_file": "out/sir.svg" }
            }"#,
        );
        let config = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(config.animation.fps, 10);
        assert_eq!(config.animation.frame_skip, 3);
        assert_eq!(config.chart.output_file, Some(PathBuf::from("out/sir.svg")));

        let parameters = config.parameters().unwrap();
        assert_relative_eq!(parameters.beta(), 0.08);
        assert_relative_eq!(parameters.gamma(), 0.10);
        assert_relative_eq!(parameters.initial_state().recovered, 0.0);
        assert_eq!(parameters.negativity(), NegativityPolicy::ClampToZero);
        assert!(parameters.basic_reproduction_number() < 1.0);
    }

    #[test]
    fn invalid_json_reported() {
        let file = config_file("{ \"beta\": ");
        assert!(matches!(
            SimulationConfig::load(file.path()),
            Err(SirError::JsonError(_))
        ));
    }

    #[test]
    fn wrong_type_reported() {
        let file = config_file(r#"{ "steps": "many" }"#);
        assert!(matches!(
            SimulationConfig::load(file.path()),
            Err(SirError::JsonError(_))
        ));
    }

    #[test]
    fn missing_file_reported() {
        let result = SimulationConfig::load(Path::new("does/not/exist.json"));
        assert!(matches!(result, Err(SirError::IoError(_))));
    }

    #[test]
    fn invalid_parameters_reported_on_resolution() {
        let file = config_file(r#"{ "gamma": -0.1 }"#);
        let config = SimulationConfig::load(file.path()).unwrap();
        assert!(matches!(
            config.parameters(),
            Err(SirError::InvalidParameter(_))
        ));
    }
}
