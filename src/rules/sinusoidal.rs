//! Autonomous sinusoidal activity generators.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::core::aux_state::AuxiliaryState;
use crate::core::bounds::BoundedRange;
use crate::core::clock::SimulationClock;
use crate::core::layer::LayerState;
use crate::core::noise::RandomVariate;
use crate::core::synapse::Afferent;
use crate::core::unit::UnitState;
use crate::error::SimError;
use crate::rules::UpdateRule;

/// A sine wave of the global time spanning the bounds. The input is never read.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SinusoidalRule {
    /// Where the oscillation starts within its period, in radians.
    phase: f64,
    /// The angular frequency, in radians per unit of time.
    frequency: f64,
    bounds: BoundedRange,
    add_noise: bool,
    noise_generator: RandomVariate,
}

impl SinusoidalRule {
    /// Create a sinusoidal rule. Returns an error for a negative frequency.
    pub fn build(phase: f64, frequency: f64) -> Result<Self, SimError> {
        let mut rule = SinusoidalRule::default();
        rule.set_phase(phase);
        rule.set_frequency(frequency)?;
        Ok(rule)
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn set_phase(&mut self, phase: f64) {
        self.phase = phase;
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Set the frequency. Returns an error for a negative (or NaN) frequency.
    pub fn set_frequency(&mut self, frequency: f64) -> Result<(), SimError> {
        check_frequency(frequency)?;
        self.frequency = frequency;
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

    /// The noise-free value at the given time.
    pub fn value_at(&self, time: f64) -> f64 {
        self.bounds.width() / 2.0 * (self.frequency * time + self.phase).sin() + self.bounds.midpoint()
    }

    fn sample(&mut self, time: f64) -> f64 {
        let mut value = self.value_at(time);
        if self.add_noise {
            value += self.noise_generator.sample();
        }
        self.bounds.clip(value)
    }
}

impl Default for SinusoidalRule {
    fn default() -> Self {
        SinusoidalRule {
            phase: 1.0,
            frequency: 0.1,
            bounds: BoundedRange::new_unchecked(-1.0, 1.0, false),
            add_noise: false,
            noise_generator: RandomVariate::default(),
        }
    }
}

fn check_frequency(frequency: f64) -> Result<(), SimError> {
    if !(frequency >= 0.0) {
        return Err(SimError::InvalidParameter(format!(
            "sinusoidal frequency must be non-negative, got {}",
            frequency
        )));
    }
    Ok(())
}

impl UpdateRule for SinusoidalRule {
    fn name(&self) -> &'static str {
        "Sinusoidal"
    }

    fn validate(&self) -> Result<(), SimError> {
        check_frequency(self.frequency)
    }

    fn supports_layer(&self) -> bool {
        true
    }

    fn apply(
        &mut self,
        unit: &mut UnitState,
        _fan_in: &mut [Afferent],
        _aux: &mut AuxiliaryState,
        clock: &SimulationClock,
    ) -> Result<(), SimError> {
        let value = self.sample(clock.time());
        unit.set_activation(value);
        Ok(())
    }

    /// Every element follows the same wave; noise is drawn per element.
    fn apply_layer(
        &mut self,
        layer: &mut LayerState,
        _aux: &mut AuxiliaryState,
        clock: &SimulationClock,
    ) -> Result<(), SimError> {
        let time = clock.time();
        layer.write_activations(|_, _| self.sample(time));
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

    /// The wave evaluated at a random time in [0, 2π).
    fn random_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.value_at(rng.gen_range(0.0..TAU))
    }

    fn noise_generator(&self) -> Option<&RandomVariate> {
        Some(&self.noise_generator)
    }

    fn noise_generator_mut(&mut self) -> Option<&mut RandomVariate> {
        Some(&mut self.noise_generator)
    }
}
