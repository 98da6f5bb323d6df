//! Model parameters.
//!
//! Configuration arrives as a [`ParametersValues`] record: every field has a default and the
//! recovered compartment and total population may be left out. [`Parameters`] is the validated,
//! immutable form the integrator consumes. Converting between the two is the only place where
//! parameter errors are raised, so a `Parameters` value is always safe to integrate.
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::SirError;
use crate::integrator::PopulationState;

/// Relative tolerance used when a configured population must agree with the sum of the
/// initial compartments.
const POPULATION_TOLERANCE: f64 = 1e-6;

/// Upper bound on `steps`. Every step stores one state, so this caps a trajectory at a few
/// hundred megabytes.
pub const MAX_STEPS: usize = 10_000_000;

/// What the integrator does with a compartment that an overly large step pushed below zero.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NegativityPolicy {
    /// Keep the raw Euler update. Choosing a stable `dt` is the caller's responsibility.
    #[default]
    Allow,
    /// Clamp every compartment to zero after each step. Population is no longer conserved
    /// exactly once a clamp fires.
    ClampToZero,
}

/// Raw parameter values as read from a config file or the command line.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder)]
#[serde(default)]
pub struct ParametersValues {
    #[builder(default = "990.0")]
    pub initial_susceptible: f64,

    #[builder(default = "10.0")]
    pub initial_infected: f64,

    /// Implied as `population - S0 - I0` when omitted and `population` is given, zero otherwise.
    #[builder(default, setter(strip_option))]
    pub initial_recovered: Option<f64>,

    /// Implied as `S0 + I0 + R0` when omitted.
    #[builder(default, setter(strip_option))]
    pub population: Option<f64>,

    #[builder(default = "0.30")]
    pub beta: f64,

    #[builder(default = "0.10")]
    pub gamma: f64,

    #[builder(default = "0.1")]
    pub dt: f64,

    #[builder(default = "600")]
    pub steps: usize,

    #[builder(default)]
    pub negativity: NegativityPolicy,
}

impl Default for ParametersValues {
    fn default() -> Self {
        ParametersValuesBuilder::default()
            .build()
            .expect("every parameter field has a default")
    }
}

/// Validated, immutable simulation parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    population: f64,
    initial_state: PopulationState,
    beta: f64,
    gamma: f64,
    dt: f64,
    steps: usize,
    negativity: NegativityPolicy,
}

fn check_positive(name: &str, value: f64) -> Result<(), SirError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SirError::InvalidParameter(format!(
            "{name} must be a positive finite number, got {value}"
        )))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<(), SirError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SirError::InvalidParameter(format!(
            "{name} must be a non-negative finite number, got {value}"
        )))
    }
}

impl TryFrom<ParametersValues> for Parameters {
    type Error = SirError;

    fn try_from(values: ParametersValues) -> Result<Self, SirError> {
        let ParametersValues {
            initial_susceptible: s0,
            initial_infected: i0,
            initial_recovered,
            population,
            beta,
            gamma,
            dt,
            steps,
            negativity,
        } = values;

        check_positive("beta", beta)?;
        check_positive("gamma", gamma)?;
        check_positive("dt", dt)?;
        if steps == 0 || steps > MAX_STEPS {
            return Err(SirError::InvalidParameter(format!(
                "steps must be between 1 and {MAX_STEPS}, got {steps}"
            )));
        }
        check_non_negative("initial_susceptible", s0)?;
        check_non_negative("initial_infected", i0)?;

        let (r0, population) = match (initial_recovered, population) {
            (Some(r0), Some(n)) => {
                check_non_negative("initial_recovered", r0)?;
                check_positive("population", n)?;
                let total = s0 + i0 + r0;
                if (total - n).abs() > POPULATION_TOLERANCE * n {
                    return Err(SirError::InvalidParameter(format!(
                        "population {n} does not match S0 + I0 + R0 = {total}"
                    )));
                }
                (r0, n)
            }
            (Some(r0), None) => {
                check_non_negative("initial_recovered", r0)?;
                (r0, s0 + i0 + r0)
            }
            (None, Some(n)) => {
                check_positive("population", n)?;
                let r0 = n - s0 - i0;
                if r0 < 0.0 {
                    return Err(SirError::InvalidParameter(format!(
                        "S0 + I0 = {} exceeds population {n}",
                        s0 + i0
                    )));
                }
                (r0, n)
            }
            (None, None) => (0.0, s0 + i0),
        };
        if population <= 0.0 {
            return Err(SirError::InvalidParameter(
                "population must be positive".to_string(),
            ));
        }

        Ok(Parameters {
            population,
            initial_state: PopulationState::new(s0, i0, r0),
            beta,
            gamma,
            dt,
            steps,
            negativity,
        })
    }
}

impl Parameters {
    /// Total population `N`.
    #[must_use]
    pub fn population(&self) -> f64 {
        self.population
    }

    /// `(S0, I0, R0)`
    #[must_use]
    pub fn initial_state(&self) -> PopulationState {
        self.initial_state
    }

    #[must_use]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[must_use]
    pub fn negativity(&self) -> NegativityPolicy {
        self.negativity
    }

    /// R₀ = β/γ. Above 1 the outbreak grows, below 1 it dies out.
    #[must_use]
    pub fn basic_reproduction_number(&self) -> f64 {
        self.beta / self.gamma
    }

    /// Fraction of the population that must be immune for the outbreak to stop growing.
    /// Zero when R₀ ≤ 1.
    #[must_use]
    pub fn herd_immunity_threshold(&self) -> f64 {
        (1.0 - self.gamma / self.beta).max(0.0)
    }

    /// Simulated time covered by the run, `steps * dt`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time_horizon(&self) -> f64 {
        self.steps as f64 * self.dt
    }

    /// True when the step size is large enough that the explicit Euler update can overshoot.
    #[must_use]
    pub fn is_step_unstable(&self) -> bool {
        self.dt * self.beta.max(self.gamma) > 1.0
    }
}
