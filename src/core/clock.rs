//! Module implementing the simulation clock.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Whether the dynamics of a rule (or a network) are conceived in discrete steps or as a continuous integration.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Default)]
pub enum TimeType {
    #[default]
    Discrete,
    Continuous,
}

/// Holds the current simulation time and the fixed time step.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SimulationClock {
    /// The current simulation time.
    time: f64,
    /// The fixed time step (must be positive).
    time_step: f64,
    /// The time type of the owning network.
    time_type: TimeType,
    /// The number of completed ticks.
    ticks: u64,
}

impl SimulationClock {
    /// Create a clock starting at time zero.
    /// Returns an error if the time step is not positive.
    pub fn build(time_step: f64) -> Result<Self, SimError> {
        Self::build_from(0.0, time_step)
    }

    /// Create a clock starting at the provided time.
    /// Returns an error if the time step is not positive.
    pub fn build_from(start: f64, time_step: f64) -> Result<Self, SimError> {
        if !(time_step > 0.0 && time_step.is_finite()) {
            return Err(SimError::InvalidTimeStep(time_step));
        }
        if !start.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "start time must be finite, got {}",
                start
            )));
        }
        Ok(SimulationClock {
            time: start,
            time_step,
            time_type: TimeType::Discrete,
            ticks: 0,
        })
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Returns the time step.
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Set the time step.
    /// Returns an error if the time step is not positive.
    pub fn set_time_step(&mut self, time_step: f64) -> Result<(), SimError> {
        if !(time_step > 0.0 && time_step.is_finite()) {
            return Err(SimError::InvalidTimeStep(time_step));
        }
        self.time_step = time_step;
        Ok(())
    }

    /// Returns the time type.
    pub fn time_type(&self) -> TimeType {
        self.time_type
    }

    pub fn set_time_type(&mut self, time_type: TimeType) {
        self.time_type = time_type;
    }

    /// Returns the number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance the clock by one time step.
    pub fn advance(&mut self) {
        self.ticks += 1;
        self.time += self.time_step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clock_build() {
        let clock = SimulationClock::build(0.5).unwrap();
        assert_eq!(clock.time(), 0.0);
        assert_eq!(clock.time_step(), 0.5);
        assert_eq!(clock.time_type(), TimeType::Discrete);
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn test_clock_build_invalid_time_step() {
        assert_eq!(
            SimulationClock::build(0.0),
            Err(SimError::InvalidTimeStep(0.0))
        );
        assert_eq!(
            SimulationClock::build(-0.1),
            Err(SimError::InvalidTimeStep(-0.1))
        );
        assert!(SimulationClock::build(f64::NAN).is_err());
        assert!(SimulationClock::build(f64::INFINITY).is_err());
    }

    #[test]
    fn test_clock_advance() {
        let mut clock = SimulationClock::build_from(2.0, 0.25).unwrap();
        clock.advance();
        clock.advance();
        assert_relative_eq!(clock.time(), 2.5);
        assert_eq!(clock.ticks(), 2);

        assert!(clock.set_time_step(0.0).is_err());
        assert_eq!(clock.time_step(), 0.25);
    }
}
