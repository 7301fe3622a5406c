//! Interactive activation and competition (IAC) units.
//!
//! Notation follows McClelland (1981): the net input pushes the activation toward the ceiling
//! (excitation) or the floor (inhibition), while the activation decays toward a resting value.
use serde::{Deserialize, Serialize};

use crate::core::aux_state::AuxiliaryState;
use crate::core::bounds::BoundedRange;
use crate::core::clock::SimulationClock;
use crate::core::noise::RandomVariate;
use crate::core::synapse::Afferent;
use crate::core::unit::UnitState;
use crate::error::SimError;
use crate::rules::UpdateRule;

/// An IAC unit integrated with an explicit Euler step.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct IacRule {
    /// The rate at which the activation decays to its resting value.
    decay: f64,
    /// The resting value the activation decays to.
    rest: f64,
    /// Ceiling, floor and clipping policy.
    bounds: BoundedRange,
    /// Whether to add noise after integration.
    add_noise: bool,
    /// The noise generator.
    noise_generator: RandomVariate,
}

impl IacRule {
    /// Create an IAC rule with the given decay and rest, and default bounds.
    /// Returns an error for a negative decay.
    pub fn build(decay: f64, rest: f64) -> Result<Self, SimError> {
        let mut rule = IacRule::default();
        rule.set_decay(decay)?;
        rule.set_rest(rest);
        Ok(rule)
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Set the decay rate. Returns an error for a negative (or NaN) decay.
    pub fn set_decay(&mut self, decay: f64) -> Result<(), SimError> {
        check_decay(decay)?;
        self.decay = decay;
        Ok(())
    }

    pub fn rest(&self) -> f64 {
        self.rest
    }

    pub fn set_rest(&mut self, rest: f64) {
        self.rest = rest;
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

    /// The accumulated input plus the weighted fan-in from sources with positive activation.
    /// Connections from silent or negative sources do not contribute.
    pub fn net_input(input: f64, fan_in: &[Afferent]) -> f64 {
        input
            + fan_in
                .iter()
                .filter(|afferent| afferent.source_activation > 0.0)
                .map(Afferent::weighted)
                .sum::<f64>()
    }
}

fn check_decay(decay: f64) -> Result<(), SimError> {
    if !(decay >= 0.0) {
        return Err(SimError::InvalidParameter(format!(
            "IAC decay must be non-negative, got {}",
            decay
        )));
    }
    Ok(())
}

impl Default for IacRule {
    fn default() -> Self {
        IacRule {
            decay: 0.05,
            rest: 0.1,
            bounds: BoundedRange::new_unchecked(-0.2, 1.0, true),
            add_noise: false,
            noise_generator: RandomVariate::default(),
        }
    }
}

impl UpdateRule for IacRule {
    fn name(&self) -> &'static str {
        "IAC"
    }

    fn validate(&self) -> Result<(), SimError> {
        check_decay(self.decay)
    }

    fn apply(
        &mut self,
        unit: &mut UnitState,
        fan_in: &mut [Afferent],
        _aux: &mut AuxiliaryState,
        clock: &SimulationClock,
    ) -> Result<(), SimError> {
        let net_input = Self::net_input(unit.input(), fan_in);
        let activation = unit.activation();

        let effect = if net_input >= 0.0 {
            (self.bounds.upper() - activation) * net_input
        } else {
            (activation - self.bounds.lower()) * net_input
        };

        let mut next = activation
            + clock.time_step() * (effect - self.decay * (activation - self.rest));
        if self.add_noise {
            next += self.noise_generator.sample();
        }

        unit.set_activation(self.bounds.clip(next));
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

    fn step(rule: &mut IacRule, unit: &mut UnitState, fan_in: &mut [Afferent], clock: &SimulationClock) {
        rule.apply(unit, fan_in, &mut AuxiliaryState::None, clock)
            .unwrap();
    }

    #[test]
    fn test_iac_net_input_ignores_non_positive_sources() {
        let fan_in = [
            Afferent::new(0.5, 2.0),
            Afferent::new(0.0, 10.0),
            Afferent::new(-1.0, 3.0),
            Afferent::new(1.0, -0.5),
        ];
        assert_relative_eq!(IacRule::net_input(0.25, &fan_in), 0.25 + 1.0 - 0.5);
    }

    #[test]
    fn test_iac_excitatory_step() {
        let clock = SimulationClock::build(0.1).unwrap();
        let mut rule = IacRule::default();
        let mut unit = UnitState::new(0.0);
        let mut fan_in = [Afferent::new(1.0, 0.5)];
        step(&mut rule, &mut unit, &mut fan_in, &clock);
        // effect = (1 - 0) * 0.5, decay term = 0.05 * (0 - 0.1)
        assert_relative_eq!(unit.activation(), 0.1 * (0.5 + 0.005));
    }

    #[test]
    fn test_iac_inhibitory_step() {
        let clock = SimulationClock::build(0.1).unwrap();
        let mut rule = IacRule::default();
        let mut unit = UnitState::new(0.5);
        unit.set_input(-1.0);
        step(&mut rule, &mut unit, &mut [], &clock);
        // effect = (0.5 + 0.2) * -1, decay term = 0.05 * (0.5 - 0.1)
        assert_relative_eq!(unit.activation(), 0.5 + 0.1 * (-0.7 - 0.02));
    }

    #[test]
    fn test_iac_decay_to_rest() {
        let clock = SimulationClock::build(0.5).unwrap();
        let mut rule = IacRule::build(0.5, 0.3).unwrap();
        let mut unit = UnitState::new(0.9);

        let mut previous_distance = (unit.activation() - rule.rest()).abs();
        for _ in 0..200 {
            step(&mut rule, &mut unit, &mut [], &clock);
            let distance = (unit.activation() - rule.rest()).abs();
            assert!(distance <= previous_distance);
            previous_distance = distance;
        }
        assert_relative_eq!(unit.activation(), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_iac_clipping() {
        let clock = SimulationClock::build(1.0).unwrap();
        let mut rule = IacRule::default();
        let mut unit = UnitState::new(0.0);
        unit.set_input(-50.0);
        step(&mut rule, &mut unit, &mut [], &clock);
        assert_eq!(unit.activation(), -0.2);

        rule.set_clipped(false);
        let mut unit = UnitState::new(0.0);
        unit.set_input(-50.0);
        step(&mut rule, &mut unit, &mut [], &clock);
        assert!(unit.activation() < -0.2);
    }

    #[test]
    fn test_iac_noise_then_clip() {
        let clock = SimulationClock::build(0.1).unwrap();
        let mut rule = IacRule::default();
        rule.set_add_noise(true);
        rule.set_noise_generator(RandomVariate::uniform(5.0, 6.0, 0).unwrap());
        let mut unit = UnitState::new(0.0);
        step(&mut rule, &mut unit, &mut [], &clock);
        assert_eq!(unit.activation(), 1.0);
    }

    #[test]
    fn test_iac_nan_propagates() {
        let clock = SimulationClock::build(0.1).unwrap();
        let mut rule = IacRule::default();
        let mut unit = UnitState::new(0.0);
        unit.set_input(f64::NAN);
        step(&mut rule, &mut unit, &mut [], &clock);
        assert!(unit.activation().is_nan());
    }

    #[test]
    fn test_iac_invalid_decay() {
        assert!(IacRule::build(-0.1, 0.0).is_err());
        assert!(IacRule::build(f64::NAN, 0.0).is_err());
    }
}
