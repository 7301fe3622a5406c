//! Neuron update rules.
//!
//! Every rule implements [`UpdateRule`]; [`NeuronRule`] is the closed set of rules a unit or layer can carry.
//! A configured rule is used as a template and forked onto each unit, so that adaptive state
//! (e.g. the SORN threshold) and noise generators are never shared between units.
//!
//! - [`binary`]: threshold units
//! - [`iac`]: interactive activation and competition units
//! - [`kuramoto`]: phase oscillators
//! - [`sinusoidal`]: autonomous periodic generators
//! - [`sorn`]: homeostatic spiking units
//! - [`sigmoidal`]: squashing units
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::aux_state::{AuxiliaryState, DataKind};
use crate::core::bounds::BoundedRange;
use crate::core::clock::{SimulationClock, TimeType};
use crate::core::layer::LayerState;
use crate::core::noise::RandomVariate;
use crate::core::synapse::Afferent;
use crate::core::unit::UnitState;
use crate::error::SimError;
use crate::DEFAULT_INCREMENT;

pub mod binary;
pub mod iac;
pub mod kuramoto;
pub mod sigmoidal;
pub mod sinusoidal;
pub mod sorn;

use binary::BinaryRule;
use iac::IacRule;
use kuramoto::KuramotoRule;
use sigmoidal::SigmoidalRule;
use sinusoidal::SinusoidalRule;
use sorn::SornRule;

/// The capabilities shared by all update rules.
pub trait UpdateRule {
    /// The display name of the rule.
    fn name(&self) -> &'static str;

    /// Whether the dynamics are discrete or continuous.
    fn time_type(&self) -> TimeType {
        TimeType::Discrete
    }

    /// The auxiliary data the rule reads.
    fn data_kind(&self) -> DataKind {
        DataKind::Empty
    }

    /// Whether the rule can drive a layer.
    fn supports_layer(&self) -> bool {
        false
    }

    /// Check the parameters, e.g., after loading the rule from a file.
    fn validate(&self) -> Result<(), SimError> {
        Ok(())
    }

    /// Compute the next state of a unit from its accumulated input and fan-in.
    /// The fan-in holds the source activations of the previous tick; its strengths may be rewritten.
    fn apply(
        &mut self,
        unit: &mut UnitState,
        fan_in: &mut [Afferent],
        aux: &mut AuxiliaryState,
        clock: &SimulationClock,
    ) -> Result<(), SimError>;

    /// Compute the next activations of a layer from its inputs.
    fn apply_layer(
        &mut self,
        _layer: &mut LayerState,
        _aux: &mut AuxiliaryState,
        _clock: &SimulationClock,
    ) -> Result<(), SimError> {
        Err(SimError::UnsupportedLayer(self.name().to_string()))
    }

    /// The activation bounds and clipping policy.
    fn bounds(&self) -> BoundedRange;

    /// Set the activation bounds. Returns an error unless `lower <= upper`.
    fn set_bounds(&mut self, lower: f64, upper: f64) -> Result<(), SimError>;

    /// Enable or disable clipping of the activation to the bounds.
    fn set_clipped(&mut self, clipped: bool);

    /// A plausible activation for randomized initialization.
    fn random_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.bounds().sample_uniform(rng)
    }

    /// The derivative of the activation function at the given input, for differentiable rules.
    fn derivative(&self, _input: f64) -> Option<f64> {
        None
    }

    /// The range an activation plot should span.
    fn graphical_bounds(&self) -> (f64, f64) {
        let bounds = self.bounds();
        (bounds.lower(), bounds.upper())
    }

    fn contextual_increment(&self, unit: &mut UnitState) {
        let activation = self.bounds().clip(unit.activation() + DEFAULT_INCREMENT);
        unit.set_activation(activation);
    }

    fn contextual_decrement(&self, unit: &mut UnitState) {
        let activation = self.bounds().clip(unit.activation() - DEFAULT_INCREMENT);
        unit.set_activation(activation);
    }

    /// The noise generator, for rules that can add noise.
    fn noise_generator(&self) -> Option<&RandomVariate> {
        None
    }

    fn noise_generator_mut(&mut self) -> Option<&mut RandomVariate> {
        None
    }
}

/// The closed set of update rules. Parameters are checked when a rule is deserialized.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", try_from = "TaggedRule")]
pub enum NeuronRule {
    Binary(BinaryRule),
    Iac(IacRule),
    Kuramoto(KuramotoRule),
    Sinusoidal(SinusoidalRule),
    Sorn(SornRule),
    Sigmoidal(SigmoidalRule),
}

/// The serialized form of a rule, before its parameters are checked.
#[derive(Deserialize)]
#[serde(tag = "rule")]
enum TaggedRule {
    Binary(BinaryRule),
    Iac(IacRule),
    Kuramoto(KuramotoRule),
    Sinusoidal(SinusoidalRule),
    Sorn(SornRule),
    Sigmoidal(SigmoidalRule),
}

impl TryFrom<TaggedRule> for NeuronRule {
    type Error = SimError;

    fn try_from(tagged: TaggedRule) -> Result<Self, Self::Error> {
        let rule = match tagged {
            TaggedRule::Binary(rule) => NeuronRule::Binary(rule),
            TaggedRule::Iac(rule) => NeuronRule::Iac(rule),
            TaggedRule::Kuramoto(rule) => NeuronRule::Kuramoto(rule),
            TaggedRule::Sinusoidal(rule) => NeuronRule::Sinusoidal(rule),
            TaggedRule::Sorn(rule) => NeuronRule::Sorn(rule),
            TaggedRule::Sigmoidal(rule) => NeuronRule::Sigmoidal(rule),
        };
        rule.validate()?;
        Ok(rule)
    }
}

macro_rules! delegate {
    ($self:expr, $rule:ident => $body:expr) => {
        match $self {
            NeuronRule::Binary($rule) => $body,
            NeuronRule::Iac($rule) => $body,
            NeuronRule::Kuramoto($rule) => $body,
            NeuronRule::Sinusoidal($rule) => $body,
            NeuronRule::Sorn($rule) => $body,
            NeuronRule::Sigmoidal($rule) => $body,
        }
    };
}

impl NeuronRule {
    /// A fully independent copy, including the noise generator state and any adaptive state.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// A deep copy whose noise generator is reseeded, so that units instantiated from
    /// the same template evolve independent noise streams.
    pub fn fork(&self, seed: u64) -> Self {
        let mut rule = self.deep_copy();
        rule.reseed(seed);
        rule
    }

    /// Reseed the noise generator, if the rule has one.
    pub fn reseed(&mut self, seed: u64) {
        if let Some(noise) = self.noise_generator_mut() {
            noise.reseed(seed);
        }
    }
}

impl UpdateRule for NeuronRule {
    fn name(&self) -> &'static str {
        delegate!(self, rule => rule.name())
    }

    fn time_type(&self) -> TimeType {
        delegate!(self, rule => rule.time_type())
    }

    fn data_kind(&self) -> DataKind {
        delegate!(self, rule => rule.data_kind())
    }

    fn supports_layer(&self) -> bool {
        delegate!(self, rule => rule.supports_layer())
    }

    fn validate(&self) -> Result<(), SimError> {
        delegate!(self, rule => rule.validate())
    }

    /// Validate the auxiliary state, reset the spike flag and apply the rule.
    fn apply(
        &mut self,
        unit: &mut UnitState,
        fan_in: &mut [Afferent],
        aux: &mut AuxiliaryState,
        clock: &SimulationClock,
    ) -> Result<(), SimError> {
        self.data_kind().validate_scalar(self.name(), aux)?;
        unit.reset_spike();
        delegate!(self, rule => rule.apply(unit, fan_in, aux, clock))
    }

    fn apply_layer(
        &mut self,
        layer: &mut LayerState,
        aux: &mut AuxiliaryState,
        clock: &SimulationClock,
    ) -> Result<(), SimError> {
        self.data_kind()
            .validate_vector(self.name(), aux, layer.len())?;
        delegate!(self, rule => rule.apply_layer(layer, aux, clock))
    }

    fn bounds(&self) -> BoundedRange {
        delegate!(self, rule => rule.bounds())
    }

    fn set_bounds(&mut self, lower: f64, upper: f64) -> Result<(), SimError> {
        delegate!(self, rule => rule.set_bounds(lower, upper))
    }

    fn set_clipped(&mut self, clipped: bool) {
        delegate!(self, rule => rule.set_clipped(clipped))
    }

    fn random_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        delegate!(self, rule => rule.random_value(rng))
    }

    fn derivative(&self, input: f64) -> Option<f64> {
        delegate!(self, rule => rule.derivative(input))
    }

    fn graphical_bounds(&self) -> (f64, f64) {
        delegate!(self, rule => rule.graphical_bounds())
    }

    fn contextual_increment(&self, unit: &mut UnitState) {
        delegate!(self, rule => rule.contextual_increment(unit))
    }

    fn contextual_decrement(&self, unit: &mut UnitState) {
        delegate!(self, rule => rule.contextual_decrement(unit))
    }

    fn noise_generator(&self) -> Option<&RandomVariate> {
        delegate!(self, rule => rule.noise_generator())
    }

    fn noise_generator_mut(&mut self) -> Option<&mut RandomVariate> {
        delegate!(self, rule => rule.noise_generator_mut())
    }
}
