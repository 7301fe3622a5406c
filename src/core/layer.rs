//! Module implementing vectorized layers of units.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use super::aux_state::AuxiliaryState;
use super::clock::SimulationClock;
use crate::error::SimError;
use crate::rules::{NeuronRule, UpdateRule};

/// The activations and inputs of a layer, aligned index for index.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LayerState {
    activations: DVector<f64>,
    inputs: DVector<f64>,
}

impl LayerState {
    /// Create a state of `size` units at rest.
    pub fn new(size: usize) -> Self {
        LayerState {
            activations: DVector::zeros(size),
            inputs: DVector::zeros(size),
        }
    }

    /// Returns the number of units.
    pub fn len(&self) -> usize {
        self.activations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }

    pub fn activations(&self) -> &DVector<f64> {
        &self.activations
    }

    /// Replace the activations. Returns an error if the length does not match.
    pub fn set_activations(&mut self, activations: DVector<f64>) -> Result<(), SimError> {
        check_len(self.len(), activations.len())?;
        self.activations = activations;
        Ok(())
    }

    pub fn inputs(&self) -> &DVector<f64> {
        &self.inputs
    }

    /// Replace the inputs. Returns an error if the length does not match.
    pub fn set_inputs(&mut self, inputs: DVector<f64>) -> Result<(), SimError> {
        check_len(self.len(), inputs.len())?;
        self.inputs = inputs;
        Ok(())
    }

    /// Add to the accumulated inputs. Returns an error if the length does not match.
    pub fn add_inputs(&mut self, inputs: &DVector<f64>) -> Result<(), SimError> {
        check_len(self.len(), inputs.len())?;
        self.inputs += inputs;
        Ok(())
    }

    pub fn clear_inputs(&mut self) {
        self.inputs.fill(0.0);
    }

    /// Write activations computed by a rule; the length is preserved by construction.
    pub(crate) fn write_activations<F: FnMut(usize, f64) -> f64>(&mut self, mut f: F) {
        for (i, (activation, input)) in self
            .activations
            .iter_mut()
            .zip(self.inputs.iter())
            .enumerate()
        {
            *activation = f(i, *input);
        }
    }
}

fn check_len(expected: usize, found: usize) -> Result<(), SimError> {
    if expected != found {
        return Err(SimError::IncompatibleShape { expected, found });
    }
    Ok(())
}

/// A group of units sharing one rule instance, updated in a single batched call.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Layer {
    id: usize,
    state: LayerState,
    rule: NeuronRule,
    aux: AuxiliaryState,
}

impl Layer {
    /// Create a layer of `size` units with the default auxiliary state of its rule.
    /// Returns an error if the rule has no vectorized form.
    pub fn new(id: usize, size: usize, rule: NeuronRule) -> Result<Self, SimError> {
        let aux = rule.data_kind().create_vector(size);
        Self::build(id, size, rule, aux)
    }

    /// Create a layer with the provided auxiliary state.
    /// Returns an error if the rule has no vectorized form or if the state does not have the required shape.
    pub fn build(
        id: usize,
        size: usize,
        rule: NeuronRule,
        aux: AuxiliaryState,
    ) -> Result<Self, SimError> {
        if !rule.supports_layer() {
            return Err(SimError::UnsupportedLayer(rule.name().to_string()));
        }
        rule.data_kind().validate_vector(rule.name(), &aux, size)?;
        Ok(Layer {
            id,
            state: LayerState::new(size),
            rule,
            aux,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the number of units in the layer.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn activations(&self) -> &DVector<f64> {
        self.state.activations()
    }

    pub fn state(&self) -> &LayerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut LayerState {
        &mut self.state
    }

    pub fn rule(&self) -> &NeuronRule {
        &self.rule
    }

    /// A mutable reference to the rule, e.g., to edit its parameters.
    /// Replacing it with a rule the layer cannot carry is reported by [`Layer::check`].
    pub fn rule_mut(&mut self) -> &mut NeuronRule {
        &mut self.rule
    }

    pub fn aux(&self) -> &AuxiliaryState {
        &self.aux
    }

    /// Replace the auxiliary state.
    /// Returns an error if the state does not have the shape the rule requires.
    pub fn set_aux(&mut self, aux: AuxiliaryState) -> Result<(), SimError> {
        self.rule
            .data_kind()
            .validate_vector(self.rule.name(), &aux, self.len())?;
        self.aux = aux;
        Ok(())
    }

    /// Set the bias of a single unit of the layer.
    /// Returns an error if the rule reads no biases or the index is out of range.
    pub fn set_bias(&mut self, index: usize, bias: f64) -> Result<(), SimError> {
        let len = self.len();
        let name = self.rule.name();
        let biases = self.aux.vector_bias_mut().ok_or_else(|| {
            SimError::InvalidParameter(format!("rule {} reads no biases", name))
        })?;
        if index >= len {
            return Err(SimError::InvalidParameter(format!(
                "bias index {} out of range for a layer of {} units",
                index, len
            )));
        }
        biases[index] = bias;
        Ok(())
    }

    /// Check that the rule can drive a layer, that its parameters are valid,
    /// and that the auxiliary state has the shape it requires.
    pub fn check(&self) -> Result<(), SimError> {
        if !self.rule.supports_layer() {
            return Err(SimError::UnsupportedLayer(self.rule.name().to_string()));
        }
        self.rule.validate()?;
        self.rule
            .data_kind()
            .validate_vector(self.rule.name(), &self.aux, self.len())
    }

    /// Apply the rule once to all units of the layer.
    pub fn update(&mut self, clock: &SimulationClock) -> Result<(), SimError> {
        self.rule.apply_layer(&mut self.state, &mut self.aux, clock)
    }
}
