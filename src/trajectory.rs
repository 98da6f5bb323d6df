use serde::Serialize;

use crate::integrator::PopulationState;

/// The states produced by one run, one per time step, starting with the initial state.
///
/// A trajectory is never empty: the integrator always stores the initial state.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    states: Vec<PopulationState>,
    dt: f64,
}

/// Headline numbers of a run.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct TrajectorySummary {
    pub peak_infected: f64,
    pub peak_step: usize,
    pub peak_time: f64,
    pub final_susceptible: f64,
    pub final_recovered: f64,
    /// Final recovered as a fraction of the initial total population.
    pub attack_rate: f64,
    pub min_total: f64,
    pub max_total: f64,
}

impl Trajectory {
    pub(crate) fn new(states: Vec<PopulationState>, dt: f64) -> Self {
        assert!(!states.is_empty(), "a trajectory holds at least the initial state");
        Trajectory { states, dt }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    #[must_use]
    pub fn states(&self) -> &[PopulationState] {
        &self.states
    }

    #[must_use]
    pub fn get(&self, step: usize) -> Option<&PopulationState> {
        self.states.get(step)
    }

    #[must_use]
    pub fn initial(&self) -> &PopulationState {
        &self.states[0]
    }

    #[must_use]
    pub fn last(&self) -> &PopulationState {
        &self.states[self.states.len() - 1]
    }

    /// Simulated time of `step`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time_at(&self, step: usize) -> f64 {
        step as f64 * self.dt
    }

    /// Time of the last state.
    #[must_use]
    pub fn time_horizon(&self) -> f64 {
        self.time_at(self.states.len() - 1)
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.states.len()).map(|step| self.time_at(step))
    }

    pub fn susceptible(&self) -> impl Iterator<Item = f64> + '_ {
        self.states.iter().map(|state| state.susceptible)
    }

    pub fn infected(&self) -> impl Iterator<Item = f64> + '_ {
        self.states.iter().map(|state| state.infected)
    }

    pub fn recovered(&self) -> impl Iterator<Item = f64> + '_ {
        self.states.iter().map(|state| state.recovered)
    }

    #[must_use]
    pub fn summary(&self) -> TrajectorySummary {
        let (peak_step, peak_infected) = self
            .infected()
            .enumerate()
            .fold((0, self.initial().infected), |peak, (step, infected)| {
                if infected > peak.1 {
                    (step, infected)
                } else {
                    peak
                }
            });
        let (min_total, max_total) = self
            .states
            .iter()
            .map(PopulationState::total)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), total| {
                (min.min(total), max.max(total))
            });
        let last = self.last();

        TrajectorySummary {
            peak_infected,
            peak_step,
            peak_time: self.time_at(peak_step),
            final_susceptible: last.susceptible,
            final_recovered: last.recovered,
            attack_rate: last.recovered / self.initial().total(),
            min_total,
            max_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Trajectory {
        Trajectory::new(
            vec![
                PopulationState::new(90.0, 10.0, 0.0),
                PopulationState::new(80.0, 15.0, 5.0),
                PopulationState::new(75.0, 12.0, 13.0),
                PopulationState::new(73.0, 7.0, 20.0),
            ],
            0.5,
        )
    }

    #[test]
    fn accessors() {
        let trajectory = sample();
        assert_eq!(trajectory.len(), 4);
        assert!(!trajectory.is_empty());
        assert_eq!(trajectory.get(1).unwrap().infected, 15.0);
        assert!(trajectory.get(4).is_none());
        assert_eq!(trajectory.times().collect::<Vec<_>>(), vec![0.0, 0.5, 1.0, 1.5]);
        assert_relative_eq!(trajectory.time_horizon(), 1.5);
        assert_eq!(
            trajectory.recovered().collect::<Vec<_>>(),
            vec![0.0, 5.0, 13.0, 20.0]
        );
    }

    #[test]
    fn summary_finds_peak() {
        let summary = sample().summary();
        assert_eq!(summary.peak_step, 1);
        assert_relative_eq!(summary.peak_infected, 15.0);
        assert_relative_eq!(summary.peak_time, 0.5);
        assert_relative_eq!(summary.final_susceptible, 73.0);
        assert_relative_eq!(summary.final_recovered, 20.0);
        assert_relative_eq!(summary.attack_rate, 0.2);
        assert_relative_eq!(summary.min_total, 100.0);
        assert_relative_eq!(summary.max_total, 100.0);
    }

    #[test]
    fn declining_outbreak_peaks_at_start() {
        let trajectory = Trajectory::new(
            vec![
                PopulationState::new(90.0, 10.0, 0.0),
                PopulationState::new(90.0, 8.0, 2.0),
            ],
            1.0,
        );
        let summary = trajectory.summary();
        assert_eq!(summary.peak_step, 0);
        assert_relative_eq!(summary.peak_infected, 10.0);
    }

    #[test]
    #[should_panic(expected = "a trajectory holds at least the initial state")]
    fn empty_trajectory_rejected() {
        let _ = Trajectory::new(Vec::new(), 1.0);
    }
}
