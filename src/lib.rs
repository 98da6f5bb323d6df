//! A deterministic SIR epidemic simulator
//!
//! `sirsim` integrates the classic susceptible-infected-recovered compartment model with a
//! fixed-step forward Euler scheme and renders the result, either as a static chart or as an
//! animated GIF that reveals the curves step by step.
//!
//! A run is assembled from a few pieces:
//! * [`Parameters`](parameters::Parameters): the validated model (initial compartments, rates,
//!   step size and step count), built from [`ParametersValues`](parameters::ParametersValues)
//!   or loaded through a JSON [`SimulationConfig`](config::SimulationConfig).
//! * [`integrate`](integrator::integrate): produces a [`Trajectory`](trajectory::Trajectory),
//!   the ordered sequence of states with one entry per step, checked for population
//!   conservation.
//! * Outputs: a CSV report ([`report`]), a PNG or SVG chart
//!   ([`StaticChart`](render::StaticChart)) and a looping GIF ([`Animation`](render::Animation)).
//!
//! The `sir` and `sir_animation` binaries wire these together; see [`runner`].
//!
//! ```rust
//! use sirsim::prelude::*;
//!
//! let values = ParametersValuesBuilder::default().dt(1.0).steps(100).build().unwrap();
//! let parameters = Parameters::try_from(values).unwrap();
//! let trajectory = integrate(&parameters).unwrap();
//! assert_eq!(trajectory.len(), 101);
//! ```
pub mod config;
pub mod error;
pub mod integrator;
pub mod log;
pub mod output;
pub mod parameters;
pub mod prelude;
pub mod render;
pub mod report;
pub mod runner;
pub mod trajectory;
