//! Binary threshold units.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::aux_state::{AuxiliaryState, DataKind};
use crate::core::bounds::BoundedRange;
use crate::core::clock::SimulationClock;
use crate::core::layer::LayerState;
use crate::core::synapse::Afferent;
use crate::core::unit::UnitState;
use crate::error::SimError;
use crate::rules::UpdateRule;

/// Outputs the ceiling when the biased input exceeds the threshold, and the floor otherwise.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BinaryRule {
    /// The threshold the biased input must exceed.
    threshold: f64,
    /// The on (upper) and off (lower) values.
    bounds: BoundedRange,
}

impl BinaryRule {
    /// Create a binary rule. Returns an error unless `floor <= ceiling`.
    pub fn build(floor: f64, ceiling: f64, threshold: f64) -> Result<Self, SimError> {
        Ok(BinaryRule {
            threshold,
            bounds: BoundedRange::build(floor, ceiling, false)?,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    /// The on value.
    pub fn ceiling(&self) -> f64 {
        self.bounds.upper()
    }

    /// The off value.
    pub fn floor(&self) -> f64 {
        self.bounds.lower()
    }

    /// The output for a given input and bias.
    pub fn fire(&self, input: f64, bias: f64) -> f64 {
        if input + bias > self.threshold {
            self.ceiling()
        } else {
            self.floor()
        }
    }
}

impl Default for BinaryRule {
    fn default() -> Self {
        BinaryRule {
            threshold: 0.5,
            bounds: BoundedRange::new_unchecked(-1.0, 1.0, false),
        }
    }
}

impl UpdateRule for BinaryRule {
    fn name(&self) -> &'static str {
        "Binary"
    }

    fn data_kind(&self) -> DataKind {
        DataKind::Biased
    }

    fn supports_layer(&self) -> bool {
        true
    }

    fn apply(
        &mut self,
        unit: &mut UnitState,
        _fan_in: &mut [Afferent],
        aux: &mut AuxiliaryState,
        _clock: &SimulationClock,
    ) -> Result<(), SimError> {
        let bias = aux.require_scalar_bias(self.name())?;
        unit.set_activation(self.fire(unit.input(), bias));
        Ok(())
    }

    fn apply_layer(
        &mut self,
        layer: &mut LayerState,
        aux: &mut AuxiliaryState,
        _clock: &SimulationClock,
    ) -> Result<(), SimError> {
        let biases = aux.require_vector_bias(self.name(), layer.len())?;
        layer.write_activations(|i, input| self.fire(input, biases[i]));
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

    /// Either the ceiling or the floor, with equal probability.
    fn random_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if rng.gen_bool(0.5) {
            self.ceiling()
        } else {
            self.floor()
        }
    }

    fn graphical_bounds(&self) -> (f64, f64) {
        (self.floor() - 1.0, self.ceiling() + 1.0)
    }

    fn contextual_increment(&self, unit: &mut UnitState) {
        unit.set_activation(self.ceiling());
    }

    fn contextual_decrement(&self, unit: &mut UnitState) {
        unit.set_activation(self.floor());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    fn apply_scalar(rule: &mut BinaryRule, input: f64, bias: f64) -> f64 {
        let clock = SimulationClock::build(0.1).unwrap();
        let mut unit = UnitState::new(0.0);
        unit.set_input(input);
        rule.apply(&mut unit, &mut [], &mut AuxiliaryState::ScalarBias(bias), &clock)
            .unwrap();
        unit.activation()
    }

    #[test]
    fn test_binary_threshold() {
        let mut rule = BinaryRule::build(-1.0, 1.0, 0.5).unwrap();
        assert_eq!(apply_scalar(&mut rule, 1.0, 0.0), 1.0);
        assert_eq!(apply_scalar(&mut rule, 0.0, 0.0), -1.0);
        assert_eq!(apply_scalar(&mut rule, 0.25, 0.5), 1.0);
        assert_eq!(apply_scalar(&mut rule, 0.0, -2.0), -1.0);
    }

    #[test]
    fn test_binary_equality_gives_floor() {
        let mut rule = BinaryRule::build(0.0, 3.0, 0.75).unwrap();
        assert_eq!(apply_scalar(&mut rule, 0.25, 0.5), 0.0);
        assert_eq!(apply_scalar(&mut rule, 0.75, 0.0), 0.0);
    }

    #[test]
    fn test_binary_grid() {
        let mut rule = BinaryRule::default();
        for threshold in [-1.0, 0.0, 0.5, 2.0] {
            rule.set_threshold(threshold);
            for input in [-2.0, -0.5, 0.0, 0.5, 1.0, 3.0] {
                for bias in [-1.0, 0.0, 0.5] {
                    let expected = if input + bias > threshold { 1.0 } else { -1.0 };
                    assert_eq!(apply_scalar(&mut rule, input, bias), expected);
                }
            }
        }
    }

    #[test]
    fn test_binary_requires_bias() {
        let clock = SimulationClock::build(0.1).unwrap();
        let mut rule = BinaryRule::default();
        let mut unit = UnitState::new(0.0);
        assert!(matches!(
            rule.apply(&mut unit, &mut [], &mut AuxiliaryState::None, &clock),
            Err(SimError::IncompatibleAuxState { .. })
        ));
    }

    #[test]
    fn test_binary_layer_matches_scalar() {
        let clock = SimulationClock::build(0.1).unwrap();
        let mut rule = BinaryRule::build(-1.0, 1.0, 0.5).unwrap();
        let inputs = vec![-1.0, 0.0, 0.5, 0.25, 1.0];
        let biases = vec![0.0, 0.6, 0.0, 0.25, -0.6];

        let mut layer = LayerState::new(inputs.len());
        layer.set_inputs(DVector::from_vec(inputs.clone())).unwrap();
        let mut aux = AuxiliaryState::VectorBias(DVector::from_vec(biases.clone()));
        rule.apply_layer(&mut layer, &mut aux, &clock).unwrap();

        for i in 0..inputs.len() {
            assert_eq!(
                layer.activations()[i],
                apply_scalar(&mut rule, inputs[i], biases[i])
            );
        }
        assert_eq!(
            layer.activations(),
            &DVector::from_vec(vec![-1.0, 1.0, -1.0, -1.0, -1.0])
        );
    }

    #[test]
    fn test_binary_contextual() {
        let rule = BinaryRule::default();
        let mut unit = UnitState::new(0.0);
        rule.contextual_increment(&mut unit);
        assert_eq!(unit.activation(), 1.0);
        rule.contextual_decrement(&mut unit);
        assert_eq!(unit.activation(), -1.0);
        assert_eq!(rule.graphical_bounds(), (-2.0, 2.0));
    }
}
