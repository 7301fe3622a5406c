//! Discrete sigmoidal (squashing) units.
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::core::aux_state::{AuxiliaryState, DataKind};
use crate::core::bounds::BoundedRange;
use crate::core::clock::SimulationClock;
use crate::core::layer::LayerState;
use crate::core::noise::RandomVariate;
use crate::core::synapse::Afferent;
use crate::core::unit::UnitState;
use crate::error::SimError;
use crate::rules::UpdateRule;

/// The family of squashing functions. Each maps the real line onto (lower, upper),
/// crosses the midpoint at zero, and has the configured slope there.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Default)]
pub enum SquashingFunction {
    #[default]
    Logistic,
    Tanh,
    Arctan,
}

impl SquashingFunction {
    /// Evaluate the function on `x` for the given range and slope at the midpoint.
    pub fn value(&self, x: f64, lower: f64, upper: f64, slope: f64) -> f64 {
        let diff = upper - lower;
        if diff == 0.0 {
            return lower;
        }
        let midpoint = (upper + lower) / 2.0;
        match self {
            SquashingFunction::Logistic => {
                let a = 4.0 * slope / diff;
                diff / (1.0 + (-a * x).exp()) + lower
            }
            SquashingFunction::Tanh => {
                let a = 2.0 * slope / diff;
                diff / 2.0 * (a * x).tanh() + midpoint
            }
            SquashingFunction::Arctan => {
                let a = PI * slope / diff;
                diff / PI * (a * x).atan() + midpoint
            }
        }
    }

    /// The derivative of [`SquashingFunction::value`] with respect to `x`.
    pub fn derivative(&self, x: f64, lower: f64, upper: f64, slope: f64) -> f64 {
        let diff = upper - lower;
        if diff == 0.0 {
            return 0.0;
        }
        match self {
            SquashingFunction::Logistic => {
                let a = 4.0 * slope / diff;
                let s = 1.0 / (1.0 + (-a * x).exp());
                diff * a * s * (1.0 - s)
            }
            SquashingFunction::Tanh => {
                let a = 2.0 * slope / diff;
                let t = (a * x).tanh();
                diff / 2.0 * a * (1.0 - t * t)
            }
            SquashingFunction::Arctan => {
                let a = PI * slope / diff;
                diff / PI * a / (1.0 + (a * x).powi(2))
            }
        }
    }
}

/// Squashes the biased input into the bounds.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SigmoidalRule {
    function: SquashingFunction,
    /// The slope at the midpoint.
    slope: f64,
    bounds: BoundedRange,
    /// Whether to add noise to the weighted input before squashing.
    add_noise: bool,
    noise_generator: RandomVariate,
}

impl SigmoidalRule {
    /// Create a sigmoidal rule. Returns an error unless `floor <= ceiling`.
    pub fn build(
        function: SquashingFunction,
        floor: f64,
        ceiling: f64,
        slope: f64,
    ) -> Result<Self, SimError> {
        let mut rule = SigmoidalRule {
            function,
            bounds: BoundedRange::build(floor, ceiling, false)?,
            ..Default::default()
        };
        rule.set_slope(slope)?;
        Ok(rule)
    }

    pub fn function(&self) -> SquashingFunction {
        self.function
    }

    pub fn set_function(&mut self, function: SquashingFunction) {
        self.function = function;
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Set the slope at the midpoint. Returns an error for a non-finite slope.
    pub fn set_slope(&mut self, slope: f64) -> Result<(), SimError> {
        check_slope(slope)?;
        self.slope = slope;
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

    fn squash(&self, x: f64) -> f64 {
        let value = self
            .function
            .value(x, self.bounds.lower(), self.bounds.upper(), self.slope);
        self.bounds.clip(value)
    }
}

fn check_slope(slope: f64) -> Result<(), SimError> {
    if !slope.is_finite() {
        return Err(SimError::InvalidParameter(format!(
            "sigmoid slope must be finite, got {}",
            slope
        )));
    }
    Ok(())
}

impl Default for SigmoidalRule {
    fn default() -> Self {
        SigmoidalRule {
            function: SquashingFunction::Logistic,
            slope: 1.0,
            bounds: BoundedRange::new_unchecked(0.0, 1.0, false),
            add_noise: false,
            noise_generator: RandomVariate::default(),
        }
    }
}

impl UpdateRule for SigmoidalRule {
    fn name(&self) -> &'static str {
        "Sigmoidal (Discrete)"
    }

    fn data_kind(&self) -> DataKind {
        DataKind::Biased
    }

    fn supports_layer(&self) -> bool {
        true
    }

    fn validate(&self) -> Result<(), SimError> {
        check_slope(self.slope)
    }

    fn apply(
        &mut self,
        unit: &mut UnitState,
        _fan_in: &mut [Afferent],
        aux: &mut AuxiliaryState,
        _clock: &SimulationClock,
    ) -> Result<(), SimError> {
        let mut weighted_input = unit.input() + aux.require_scalar_bias(self.name())?;
        if self.add_noise {
            weighted_input += self.noise_generator.sample();
        }
        unit.set_activation(self.squash(weighted_input));
        Ok(())
    }

    fn apply_layer(
        &mut self,
        layer: &mut LayerState,
        aux: &mut AuxiliaryState,
        _clock: &SimulationClock,
    ) -> Result<(), SimError> {
        let biases = aux.require_vector_bias(self.name(), layer.len())?;
        let noise = if self.add_noise {
            self.noise_generator.sample_vector(layer.len())
        } else {
            DVector::zeros(layer.len())
        };
        layer.write_activations(|i, input| self.squash(input + biases[i] + noise[i]));
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

    fn derivative(&self, input: f64) -> Option<f64> {
        Some(
            self.function
                .derivative(input, self.bounds.lower(), self.bounds.upper(), self.slope),
        )
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

    const FUNCTIONS: [SquashingFunction; 3] = [
        SquashingFunction::Logistic,
        SquashingFunction::Tanh,
        SquashingFunction::Arctan,
    ];

    #[test]
    fn test_squashing_midpoint_and_slope() {
        for function in FUNCTIONS {
            assert_relative_eq!(function.value(0.0, -1.0, 3.0, 2.0), 1.0, epsilon = 1e-12);
            assert_relative_eq!(function.derivative(0.0, -1.0, 3.0, 2.0), 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_squashing_saturates() {
        for function in FUNCTIONS {
            let high = function.value(1e6, 0.0, 1.0, 1.0);
            let low = function.value(-1e6, 0.0, 1.0, 1.0);
            assert!(high <= 1.0 && high > 0.99, "{:?} high {}", function, high);
            assert!(low >= 0.0 && low < 0.01, "{:?} low {}", function, low);
        }
    }

    #[test]
    fn test_squashing_derivative_matches_finite_difference() {
        let h = 1e-6;
        for function in FUNCTIONS {
            for x in [-2.0, -0.3, 0.0, 0.7, 1.5] {
                let numeric = (function.value(x + h, -0.5, 2.0, 1.3)
                    - function.value(x - h, -0.5, 2.0, 1.3))
                    / (2.0 * h);
                assert_relative_eq!(
                    function.derivative(x, -0.5, 2.0, 1.3),
                    numeric,
                    epsilon = 1e-6
                );
            }
        }
    }

    #[test]
    fn test_sigmoidal_apply_uses_bias() {
        let clock = SimulationClock::build(0.1).unwrap();
        let mut rule = SigmoidalRule::default();
        let mut unit = UnitState::new(0.0);
        unit.set_input(0.5);
        rule.apply(&mut unit, &mut [], &mut AuxiliaryState::ScalarBias(-0.5), &clock)
            .unwrap();
        assert_relative_eq!(unit.activation(), 0.5);

        unit.set_input(1.0);
        rule.apply(&mut unit, &mut [], &mut AuxiliaryState::ScalarBias(0.0), &clock)
            .unwrap();
        assert_relative_eq!(unit.activation(), 1.0 / (1.0 + (-4.0_f64).exp()));
    }

    #[test]
    fn test_sigmoidal_layer_matches_scalar() {
        let clock = SimulationClock::build(0.1).unwrap();
        let mut rule =
            SigmoidalRule::build(SquashingFunction::Tanh, -1.0, 1.0, 0.5).unwrap();
        let inputs = vec![-2.0, -0.1, 0.0, 0.4, 3.0];
        let biases = vec![0.1, 0.2, -0.3, 0.0, -1.0];

        let mut layer = LayerState::new(inputs.len());
        layer.set_inputs(DVector::from_vec(inputs.clone())).unwrap();
        let mut aux = AuxiliaryState::VectorBias(DVector::from_vec(biases.clone()));
        rule.apply_layer(&mut layer, &mut aux, &clock).unwrap();

        for i in 0..inputs.len() {
            let mut unit = UnitState::new(0.0);
            unit.set_input(inputs[i]);
            rule.apply(
                &mut unit,
                &mut [],
                &mut AuxiliaryState::ScalarBias(biases[i]),
                &clock,
            )
            .unwrap();
            assert_eq!(layer.activations()[i], unit.activation());
        }
    }

    #[test]
    fn test_sigmoidal_degenerate_range() {
        let rule = SigmoidalRule::build(SquashingFunction::Arctan, 0.3, 0.3, 1.0).unwrap();
        assert_eq!(rule.function().value(5.0, 0.3, 0.3, 1.0), 0.3);
        assert_eq!(rule.derivative(5.0), Some(0.0));
    }

    #[test]
    fn test_sigmoidal_invalid() {
        assert!(SigmoidalRule::build(SquashingFunction::Logistic, 1.0, 0.0, 1.0).is_err());
        assert!(SigmoidalRule::build(SquashingFunction::Logistic, 0.0, 1.0, f64::NAN).is_err());
    }
}
