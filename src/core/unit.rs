//! Module implementing individual units.

use serde::{Deserialize, Serialize};

use super::aux_state::AuxiliaryState;
use super::bounds::BoundedRange;
use super::clock::SimulationClock;
use super::synapse::Afferent;
use crate::error::SimError;
use crate::rules::{NeuronRule, UpdateRule};

/// The mutable state of a unit, as read and written by its rule.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Default)]
pub struct UnitState {
    /// The current activation.
    activation: f64,
    /// The input accumulated for the coming update.
    input: f64,
    /// Whether the unit spiked during the last update.
    spike: bool,
    /// The time of the last spike, if the unit ever spiked.
    last_spike_time: Option<f64>,
}

impl UnitState {
    /// Create a state with the given activation and no input.
    pub fn new(activation: f64) -> Self {
        UnitState {
            activation,
            ..Default::default()
        }
    }

    pub fn activation(&self) -> f64 {
        self.activation
    }

    pub fn set_activation(&mut self, activation: f64) {
        self.activation = activation;
    }

    /// Returns the accumulated input.
    pub fn input(&self) -> f64 {
        self.input
    }

    pub fn set_input(&mut self, input: f64) {
        self.input = input;
    }

    /// Add to the accumulated input.
    pub fn add_input(&mut self, input: f64) {
        self.input += input;
    }

    pub fn clear_input(&mut self) {
        self.input = 0.0;
    }

    /// Returns true if the unit spiked during the last update.
    pub fn is_spike(&self) -> bool {
        self.spike
    }

    /// Returns the time of the last spike, if any.
    pub fn last_spike_time(&self) -> Option<f64> {
        self.last_spike_time
    }

    /// Record a spike at the given time.
    pub fn fire(&mut self, time: f64) {
        self.spike = true;
        self.last_spike_time = Some(time);
    }

    pub(crate) fn reset_spike(&mut self) {
        self.spike = false;
    }
}

/// A single unit driven by its own rule instance.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Unit {
    id: usize,
    state: UnitState,
    rule: NeuronRule,
    aux: AuxiliaryState,
}

impl Unit {
    /// Create a unit with the default auxiliary state of its rule.
    pub fn new(id: usize, rule: NeuronRule) -> Self {
        let aux = rule.data_kind().create_scalar();
        Unit {
            id,
            state: UnitState::default(),
            rule,
            aux,
        }
    }

    /// Create a unit with the provided auxiliary state.
    /// Returns an error if the state does not have the shape the rule requires.
    pub fn build(id: usize, rule: NeuronRule, aux: AuxiliaryState) -> Result<Self, SimError> {
        rule.data_kind().validate_scalar(rule.name(), &aux)?;
        Ok(Unit {
            id,
            state: UnitState::default(),
            rule,
            aux,
        })
    }

    /// Returns the ID of the unit.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the activation of the unit.
    pub fn activation(&self) -> f64 {
        self.state.activation()
    }

    /// Returns true if the unit spiked during the last update.
    pub fn is_spike(&self) -> bool {
        self.state.is_spike()
    }

    pub fn state(&self) -> &UnitState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut UnitState {
        &mut self.state
    }

    pub fn rule(&self) -> &NeuronRule {
        &self.rule
    }

    /// A mutable reference to the rule, e.g., to edit its parameters.
    /// Swapping in a rule that expects another auxiliary state is reported by [`Unit::check`];
    /// use [`Unit::set_rule`] to reset the state along with the rule.
    pub fn rule_mut(&mut self) -> &mut NeuronRule {
        &mut self.rule
    }

    /// Replace the rule, resetting the auxiliary state to the one the new rule expects.
    pub fn set_rule(&mut self, rule: NeuronRule) {
        self.aux = rule.data_kind().create_scalar();
        self.rule = rule;
    }

    pub fn aux(&self) -> &AuxiliaryState {
        &self.aux
    }

    /// Replace the auxiliary state.
    /// Returns an error if the state does not have the shape the rule requires.
    pub fn set_aux(&mut self, aux: AuxiliaryState) -> Result<(), SimError> {
        self.rule.data_kind().validate_scalar(self.rule.name(), &aux)?;
        self.aux = aux;
        Ok(())
    }

    /// Check that the rule parameters are valid and that the auxiliary state has the shape the rule requires.
    pub fn check(&self) -> Result<(), SimError> {
        self.rule.validate()?;
        self.rule.data_kind().validate_scalar(self.rule.name(), &self.aux)
    }

    /// Returns the activation bounds of the rule.
    pub fn bounds(&self) -> BoundedRange {
        self.rule.bounds()
    }

    /// Clip the activation to the rule bounds, if the rule clips.
    pub fn clip(&mut self) {
        let clipped = self.rule.bounds().clip(self.state.activation());
        self.state.set_activation(clipped);
    }

    /// Apply the rule once, reading the fan-in provided by the caller.
    pub fn update(&mut self, fan_in: &mut [Afferent], clock: &SimulationClock) -> Result<(), SimError> {
        self.rule.apply(&mut self.state, fan_in, &mut self.aux, clock)
    }

    /// Nudge the activation up, the way an editor would.
    pub fn contextual_increment(&mut self) {
        self.rule.contextual_increment(&mut self.state);
    }

    /// Nudge the activation down, the way an editor would.
    pub fn contextual_decrement(&mut self) {
        self.rule.contextual_decrement(&mut self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::binary::BinaryRule;
    use crate::rules::iac::IacRule;

    #[test]
    fn test_unit_new_default_aux() {
        let unit = Unit::new(0, NeuronRule::Binary(BinaryRule::default()));
        assert_eq!(unit.aux(), &AuxiliaryState::ScalarBias(0.0));
        let unit = Unit::new(1, NeuronRule::Iac(IacRule::default()));
        assert_eq!(unit.aux(), &AuxiliaryState::None);
    }

    #[test]
    fn test_unit_build_incompatible_aux() {
        let result = Unit::build(0, NeuronRule::Binary(BinaryRule::default()), AuxiliaryState::None);
        assert!(matches!(result, Err(SimError::IncompatibleAuxState { .. })));
        let result = Unit::build(0, NeuronRule::Iac(IacRule::default()), AuxiliaryState::ScalarBias(1.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_unit_set_rule_resets_aux() {
        let mut unit = Unit::build(0, NeuronRule::Binary(BinaryRule::default()), AuxiliaryState::ScalarBias(2.0)).unwrap();
        unit.set_rule(NeuronRule::Iac(IacRule::default()));
        assert_eq!(unit.aux(), &AuxiliaryState::None);
        assert!(unit.set_aux(AuxiliaryState::ScalarBias(1.0)).is_err());
    }

    #[test]
    fn test_unit_clip() {
        let mut unit = Unit::new(0, NeuronRule::Iac(IacRule::default()));
        unit.state_mut().set_activation(5.0);
        unit.clip();
        assert_eq!(unit.activation(), 1.0);
    }

    #[test]
    fn test_unit_fire() {
        let mut state = UnitState::new(0.0);
        assert_eq!(state.last_spike_time(), None);
        state.fire(1.5);
        assert!(state.is_spike());
        assert_eq!(state.last_spike_time(), Some(1.5));
        state.reset_spike();
        assert!(!state.is_spike());
        assert_eq!(state.last_spike_time(), Some(1.5));
    }

    #[test]
    fn test_unit_check_after_rule_swap() {
        let mut unit = Unit::new(0, NeuronRule::Iac(IacRule::default()));
        assert!(unit.check().is_ok());
        *unit.rule_mut() = NeuronRule::Binary(BinaryRule::default());
        assert!(matches!(
            unit.check(),
            Err(SimError::IncompatibleAuxState { .. })
        ));
        unit.set_rule(NeuronRule::Binary(BinaryRule::default()));
        assert!(unit.check().is_ok());
    }
}
