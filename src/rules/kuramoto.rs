//! Kuramoto phase oscillators.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::core::aux_state::AuxiliaryState;
use crate::core::bounds::BoundedRange;
use crate::core::clock::SimulationClock;
use crate::core::noise::RandomVariate;
use crate::core::synapse::Afferent;
use crate::core::unit::UnitState;
use crate::core::utils::wrap_phase;
use crate::error::SimError;
use crate::rules::UpdateRule;

/// A phase oscillator coupled to its fan-in through the sine of the phase differences.
/// The activation is the phase, always kept in [0, 2π).
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct KuramotoRule {
    /// The natural frequency ω, in radians per unit of time.
    natural_frequency: f64,
    /// Bounds used by the derivative and by editors; the phase itself is never clipped.
    bounds: BoundedRange,
    /// Kept for configuration round trips; noise is never added to the phase.
    add_noise: bool,
    noise_generator: RandomVariate,
}

impl KuramotoRule {
    /// Create a Kuramoto rule with the given natural frequency.
    /// Returns an error for a non-finite frequency.
    pub fn build(natural_frequency: f64) -> Result<Self, SimError> {
        let mut rule = KuramotoRule::default();
        rule.set_natural_frequency(natural_frequency)?;
        Ok(rule)
    }

    pub fn natural_frequency(&self) -> f64 {
        self.natural_frequency
    }

    /// Set the natural frequency. Returns an error for a non-finite frequency.
    pub fn set_natural_frequency(&mut self, natural_frequency: f64) -> Result<(), SimError> {
        check_natural_frequency(natural_frequency)?;
        self.natural_frequency = natural_frequency;
        Ok(())
    }

    pub fn add_noise(&self) -> bool {
        self.add_noise
    }

    pub fn set_add_noise(&mut self, add_noise: bool) {
        self.add_noise = add_noise;
    }

    pub fn set_noise_generator(&mut self, noise_generator: RandomVariate) {
        self.noise_generator = noise_generator;
    }

    /// The mean coupling term; a unit without fan-in divides by one.
    pub fn coupling(phase: f64, fan_in: &[Afferent]) -> f64 {
        let sum: f64 = fan_in
            .iter()
            .map(|afferent| afferent.strength * (afferent.source_activation - phase).sin())
            .sum();
        sum / fan_in.len().max(1) as f64
    }
}

impl Default for KuramotoRule {
    fn default() -> Self {
        KuramotoRule {
            natural_frequency: 1.0,
            bounds: BoundedRange::new_unchecked(-1.0, 1.0, true),
            add_noise: false,
            noise_generator: RandomVariate::default(),
        }
    }
}

fn check_natural_frequency(natural_frequency: f64) -> Result<(), SimError> {
    if !natural_frequency.is_finite() {
        return Err(SimError::InvalidParameter(format!(
            "natural frequency must be finite, got {}",
            natural_frequency
        )));
    }
    Ok(())
}

impl UpdateRule for KuramotoRule {
    fn name(&self) -> &'static str {
        "Kuramoto"
    }

    fn validate(&self) -> Result<(), SimError> {
        check_natural_frequency(self.natural_frequency)
    }

    fn apply(
        &mut self,
        unit: &mut UnitState,
        fan_in: &mut [Afferent],
        _aux: &mut AuxiliaryState,
        clock: &SimulationClock,
    ) -> Result<(), SimError> {
        let phase = unit.activation();
        let phase_velocity = self.natural_frequency + Self::coupling(phase, fan_in);
        unit.set_activation(wrap_phase(phase + clock.time_step() * phase_velocity));
        Ok(())
    }

    fn bounds(&self) -> BoundedRange {
        self.bounds
    }

    fn set_bounds(&mut self, lower: f64, upper: f64) -> Result<(), SimError> {
        self.bounds.set_bounds(lower, upper)
    }

    fn set_clipped(&mut self, clipped: bool) {
        self.bounds.set_clipped(clipped);
    }

    /// A phase drawn uniformly from [0, 2π).
    fn random_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(0.0..TAU)
    }

    /// ω strictly inside the bounds, zero at or beyond them.
    fn derivative(&self, input: f64) -> Option<f64> {
        if input >= self.bounds.upper() || input <= self.bounds.lower() {
            Some(0.0)
        } else {
            Some(self.natural_frequency)
        }
    }

    fn contextual_increment(&self, unit: &mut UnitState) {
        unit.set_activation(wrap_phase(unit.activation() + crate::DEFAULT_INCREMENT));
    }

    fn contextual_decrement(&self, unit: &mut UnitState) {
        unit.set_activation(wrap_phase(unit.activation() - crate::DEFAULT_INCREMENT));
    }

    fn noise_generator(&self) -> Option<&RandomVariate> {
        Some(&self.noise_generator)
    }

    fn noise_generator_mut(&mut self) -> Option<&mut RandomVariate> {
        Some(&mut self.noise_generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use std::f64::consts::PI;

    fn step(rule: &mut KuramotoRule, unit: &mut UnitState, fan_in: &mut [Afferent], clock: &SimulationClock) {
        rule.apply(unit, fan_in, &mut AuxiliaryState::None, clock)
            .unwrap();
    }

    #[test]
    fn test_kuramoto_free_running() {
        let clock = SimulationClock::build(0.1).unwrap();
        let mut rule = KuramotoRule::default();
        let mut unit = UnitState::new(0.0);

        step(&mut rule, &mut unit, &mut [], &clock);
        assert_eq!(unit.activation(), 0.1);

        let mut expected = 0.1;
        for _ in 0..200 {
            let before = unit.activation();
            step(&mut rule, &mut unit, &mut [], &clock);
            expected = wrap_phase(expected + 0.1);
            assert_relative_eq!(unit.activation(), expected, epsilon = 1e-9);
            assert_relative_eq!(wrap_phase(unit.activation() - before), 0.1, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_kuramoto_coupling() {
        let clock = SimulationClock::build(0.1).unwrap();
        let mut rule = KuramotoRule::build(0.0).unwrap();
        let mut unit = UnitState::new(0.0);
        let mut fan_in = [Afferent::new(PI / 2.0, 1.0), Afferent::new(0.0, 5.0)];
        step(&mut rule, &mut unit, &mut fan_in, &clock);
        // (1 * sin(π/2) + 5 * sin(0)) / 2
        assert_relative_eq!(unit.activation(), 0.1 * 0.5);
    }

    #[test]
    fn test_kuramoto_negative_wraps_up() {
        let clock = SimulationClock::build(0.1).unwrap();
        let mut rule = KuramotoRule::build(-1.0).unwrap();
        let mut unit = UnitState::new(0.0);
        step(&mut rule, &mut unit, &mut [], &clock);
        assert_relative_eq!(unit.activation(), TAU - 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_kuramoto_phase_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let clock = SimulationClock::build(rng.gen_range(0.001..2.0)).unwrap();
            let mut rule = KuramotoRule::build(rng.gen_range(-10.0..10.0)).unwrap();
            let mut unit = UnitState::new(rng.gen_range(-20.0..20.0));
            let mut fan_in: Vec<Afferent> = (0..rng.gen_range(0..5))
                .map(|_| Afferent::new(rng.gen_range(-10.0..10.0), rng.gen_range(-5.0..5.0)))
                .collect();
            step(&mut rule, &mut unit, &mut fan_in, &clock);
            assert!(unit.activation() >= 0.0 && unit.activation() < TAU);
        }
    }

    #[test]
    fn test_kuramoto_derivative() {
        let rule = KuramotoRule::build(2.0).unwrap();
        assert_eq!(rule.derivative(0.0), Some(2.0));
        assert_eq!(rule.derivative(1.0), Some(0.0));
        assert_eq!(rule.derivative(-3.0), Some(0.0));
    }

    #[test]
    fn test_kuramoto_invalid_frequency() {
        assert!(KuramotoRule::build(f64::NAN).is_err());
    }
}
