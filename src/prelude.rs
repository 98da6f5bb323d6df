pub use crate::config::SimulationConfig;
pub use crate::error::SirError;
pub use crate::integrator::{integrate, PopulationState};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::parameters::{NegativityPolicy, Parameters, ParametersValues, ParametersValuesBuilder};
pub use crate::render::{Animation, AnimationOptions, ChartOptions, Renderer, StaticChart};
pub use crate::report::write_trajectory_report;
pub use crate::trajectory::{Trajectory, TrajectorySummary};
