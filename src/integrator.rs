//! Fixed-step forward-Euler integration of the SIR equations.
//!
//! ```text
//! dS/dt = -β S I / N
//! dI/dt =  β S I / N - γ I
//! dR/dt =  γ I
//! ```
//!
//! The explicit Euler update is only stable when `dt` is small compared to `1/β` and `1/γ`.
//! Under the default [`NegativityPolicy::Allow`] an unstable step is not corrected: compartments
//! may go negative and a warning is logged.
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::error::SirError;
use crate::parameters::{NegativityPolicy, Parameters};
use crate::trajectory::Trajectory;

/// Maximum relative deviation of `S + I + R` from `N` accepted by the conservation check.
pub const CONSERVATION_TOLERANCE: f64 = 1e-6;

/// Relative drift above which a (still accepted) deviation is logged.
const DRIFT_REPORT_THRESHOLD: f64 = 1e-12;

/// Sizes of the three compartments at one time step.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PopulationState {
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
}

impl PopulationState {
    #[must_use]
    pub fn new(susceptible: f64, infected: f64, recovered: f64) -> Self {
        PopulationState {
            susceptible,
            infected,
            recovered,
        }
    }

    /// `S + I + R`
    #[must_use]
    pub fn total(&self) -> f64 {
        self.susceptible + self.infected + self.recovered
    }

    #[must_use]
    pub fn has_negative_compartment(&self) -> bool {
        self.susceptible < 0.0 || self.infected < 0.0 || self.recovered < 0.0
    }

    #[must_use]
    pub fn clamped(self) -> Self {
        PopulationState {
            susceptible: self.susceptible.max(0.0),
            infected: self.infected.max(0.0),
            recovered: self.recovered.max(0.0),
        }
    }
}

/// Rates of change `(dS/dt, dI/dt, dR/dt)` at `state`.
#[must_use]
pub fn derivatives(
    state: &PopulationState,
    beta: f64,
    gamma: f64,
    population: f64,
) -> (f64, f64, f64) {
    let new_infections = beta * state.susceptible * state.infected / population;
    let recoveries = gamma * state.infected;
    (-new_infections, new_infections - recoveries, recoveries)
}

/// Advances `state` by one step of size `parameters.dt()`. No clamping is applied here.
#[must_use]
pub fn euler_step(state: &PopulationState, parameters: &Parameters) -> PopulationState {
    let dt = parameters.dt();
    let (d_s, d_i, d_r) = derivatives(
        state,
        parameters.beta(),
        parameters.gamma(),
        parameters.population(),
    );
    PopulationState {
        susceptible: state.susceptible + d_s * dt,
        infected: state.infected + d_i * dt,
        recovered: state.recovered + d_r * dt,
    }
}

/// Integrates the model for `parameters.steps()` steps and returns the trajectory of
/// `steps + 1` states, starting with the initial state.
///
/// # Errors
///
/// Returns `SirError::ConservationViolation` if `S + I + R` departs from `N` by more than
/// [`CONSERVATION_TOLERANCE`] (relative) without a clamp having caused it.
pub fn integrate(parameters: &Parameters) -> Result<Trajectory, SirError> {
    info!(
        "integrating {} steps of dt={} with beta={}, gamma={}, R0={:.2}",
        parameters.steps(),
        parameters.dt(),
        parameters.beta(),
        parameters.gamma(),
        parameters.basic_reproduction_number()
    );
    if parameters.is_step_unstable() {
        warn!(
            "dt={} is large relative to 1/beta and 1/gamma; the Euler update may overshoot",
            parameters.dt()
        );
    }

    let mut states = Vec::with_capacity(parameters.steps() + 1);
    let mut state = parameters.initial_state();
    states.push(state);

    let mut clamped = false;
    let mut negative_reported = false;
    for step in 1..=parameters.steps() {
        let next = euler_step(&state, parameters);
        state = if next.has_negative_compartment() {
            match parameters.negativity() {
                NegativityPolicy::Allow => {
                    if !negative_reported {
                        warn!("negative compartment at step {step}: {next:?}");
                        negative_reported = true;
                    }
                    next
                }
                NegativityPolicy::ClampToZero => {
                    trace!("clamping {next:?} at step {step}");
                    clamped = true;
                    next.clamped()
                }
            }
        } else {
            next
        };
        states.push(state);
    }

    let trajectory = Trajectory::new(states, parameters.dt());
    match check_conservation(&trajectory, parameters.population()) {
        Err(SirError::ConservationViolation {
            step,
            total,
            expected,
        }) if clamped => {
            warn!(
                "clamping broke conservation at step {step}: S+I+R = {total}, expected {expected}"
            );
        }
        result => result?,
    }
    Ok(trajectory)
}

/// Verifies `S + I + R ≈ expected` at every step of `trajectory`.
///
/// # Errors
///
/// Returns `SirError::ConservationViolation` for the first step whose relative error exceeds
/// [`CONSERVATION_TOLERANCE`].
pub fn check_conservation(trajectory: &Trajectory, expected: f64) -> Result<(), SirError> {
    let mut max_drift: f64 = 0.0;
    for (step, state) in trajectory.states().iter().enumerate() {
        let total = state.total();
        let drift = (total - expected).abs() / expected;
        if drift.is_nan() || drift > CONSERVATION_TOLERANCE {
            return Err(SirError::ConservationViolation {
                step,
                total,
                expected,
            });
        }
        max_drift = max_drift.max(drift);
    }
    if max_drift > DRIFT_REPORT_THRESHOLD {
        debug!("population drift within tolerance, max relative error {max_drift:e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{ParametersValues, ParametersValuesBuilder};
    use approx::assert_relative_eq;

    fn parameters(beta: f64, gamma: f64, dt: f64, steps: usize) -> Parameters {
        ParametersValuesBuilder::default()
            .initial_susceptible(990.0)
            .initial_infected(10.0)
            .initial_recovered(0.0)
            .beta(beta)
            .gamma(gamma)
            .dt(dt)
            .steps(steps)
            .build()
            .unwrap()
            .try_into()
            .unwrap()
    }

    #[test]
    fn derivatives_sum_to_zero() {
        let state = PopulationState::new(700.0, 200.0, 100.0);
        let (d_s, d_i, d_r) = derivatives(&state, 0.3, 0.1, 1000.0);
        assert_relative_eq!(d_s, -42.0, max_relative = 1e-12);
        assert_relative_eq!(d_i, 22.0, max_relative = 1e-12);
        assert_relative_eq!(d_r, 20.0, max_relative = 1e-12);
        assert_relative_eq!(d_s + d_i + d_r, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn single_step_matches_hand_computation() {
        let parameters = parameters(0.3, 0.1, 1.0, 1);
        let next = euler_step(&parameters.initial_state(), &parameters);
        assert_relative_eq!(next.susceptible, 987.03, max_relative = 1e-12);
        assert_relative_eq!(next.infected, 11.97, max_relative = 1e-12);
        assert_relative_eq!(next.recovered, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn outbreak_scenario() {
        let parameters = parameters(0.30, 0.10, 1.0, 100);
        let trajectory = integrate(&parameters).unwrap();
        assert_eq!(trajectory.len(), 101);
        assert_eq!(
            *trajectory.initial(),
            PopulationState::new(990.0, 10.0, 0.0)
        );
        for state in trajectory.states() {
            assert_relative_eq!(state.total(), 1000.0, max_relative = 1e-9);
        }

        let infected: Vec<f64> = trajectory.infected().collect();
        let (peak_step, peak) = infected
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::MIN), |best, (k, i)| if i > best.1 { (k, i) } else { best });
        assert!(peak > 10.0);
        assert!(peak_step > 0 && peak_step < 100);
        assert!(infected[100] < peak);
        assert!(infected[100] < 10.0);
    }

    #[test]
    fn subcritical_scenario_dies_out() {
        let parameters = parameters(0.08, 0.10, 1.0, 100);
        let trajectory = integrate(&parameters).unwrap();
        let infected: Vec<f64> = trajectory.infected().collect();
        for window in infected.windows(2) {
            assert!(window[1] <= window[0]);
        }
    }

    #[test]
    fn susceptible_never_increases() {
        let parameters = Parameters::try_from(ParametersValues::default()).unwrap();
        let trajectory = integrate(&parameters).unwrap();
        let susceptible: Vec<f64> = trajectory.susceptible().collect();
        for window in susceptible.windows(2) {
            assert!(window[1] <= window[0]);
        }
    }

    #[test]
    fn stable_step_keeps_compartments_non_negative() {
        for (beta, gamma) in [(0.3, 0.1), (2.0, 0.5), (0.05, 1.5)] {
            let dt = 0.1 / f64::max(beta, gamma);
            let trajectory = integrate(&parameters(beta, gamma, dt, 2000)).unwrap();
            assert!(trajectory
                .states()
                .iter()
                .all(|state| !state.has_negative_compartment()));
        }
    }

    #[test]
    fn runs_are_bit_identical() {
        let parameters = parameters(0.3, 0.1, 0.1, 600);
        let first = integrate(&parameters).unwrap();
        let second = integrate(&parameters).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unstable_step_goes_negative_without_clamping() {
        // S drops to about -244.2 on the fourth step.
        let parameters = parameters(3.0, 0.1, 1.0, 4);
        assert!(parameters.is_step_unstable());
        let trajectory = integrate(&parameters).unwrap();
        let last = trajectory.last();
        assert_relative_eq!(last.susceptible, -244.227_382_292, max_relative = 1e-9);
        assert_relative_eq!(last.total(), 1000.0, max_relative = 1e-9);
    }

    #[test]
    fn clamp_policy_keeps_compartments_non_negative() {
        let values = ParametersValuesBuilder::default()
            .beta(3.0)
            .dt(1.0)
            .steps(4)
            .negativity(NegativityPolicy::ClampToZero)
            .build()
            .unwrap();
        let parameters = Parameters::try_from(values).unwrap();
        let trajectory = integrate(&parameters).unwrap();
        assert!(trajectory
            .states()
            .iter()
            .all(|state| !state.has_negative_compartment()));
        assert_relative_eq!(trajectory.last().susceptible, 0.0);
    }

    #[test]
    fn conservation_check_reports_first_bad_step() {
        let states = vec![
            PopulationState::new(990.0, 10.0, 0.0),
            PopulationState::new(980.0, 15.0, 5.0),
            PopulationState::new(970.0, 20.0, 20.0),
        ];
        let trajectory = Trajectory::new(states, 1.0);
        match check_conservation(&trajectory, 1000.0) {
            Err(SirError::ConservationViolation { step, total, .. }) => {
                assert_eq!(step, 2);
                assert_relative_eq!(total, 1010.0);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn conservation_check_rejects_nan() {
        let states = vec![
            PopulationState::new(990.0, 10.0, 0.0),
            PopulationState::new(f64::NAN, 10.0, 0.0),
        ];
        let trajectory = Trajectory::new(states, 1.0);
        assert!(check_conservation(&trajectory, 1000.0).is_err());
    }
}
