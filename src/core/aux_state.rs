//! Per-unit auxiliary data attached to a rule instance.
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Mutable scratch data owned by a unit (scalar) or a layer (vector).
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Default)]
pub enum AuxiliaryState {
    #[default]
    None,
    ScalarBias(f64),
    VectorBias(DVector<f64>),
}

impl AuxiliaryState {
    /// Returns the scalar bias, if any.
    pub fn scalar_bias(&self) -> Option<f64> {
        match self {
            AuxiliaryState::ScalarBias(bias) => Some(*bias),
            _ => None,
        }
    }

    /// Returns the vector of biases, if any.
    pub fn vector_bias(&self) -> Option<&DVector<f64>> {
        match self {
            AuxiliaryState::VectorBias(biases) => Some(biases),
            _ => None,
        }
    }

    /// A mutable reference to the vector of biases, if any.
    pub fn vector_bias_mut(&mut self) -> Option<&mut DVector<f64>> {
        match self {
            AuxiliaryState::VectorBias(biases) => Some(biases),
            _ => None,
        }
    }

    /// Set the scalar bias. Only valid on a scalar bias holder.
    pub fn set_scalar_bias(&mut self, bias: f64) -> Result<(), SimError> {
        match self {
            AuxiliaryState::ScalarBias(current) => {
                *current = bias;
                Ok(())
            }
            _ => Err(SimError::InvalidParameter(format!(
                "cannot set a scalar bias on {}",
                self.shape()
            ))),
        }
    }

    /// Returns the scalar bias, or an error naming the rule that required it.
    pub fn require_scalar_bias(&self, rule: &str) -> Result<f64, SimError> {
        self.scalar_bias()
            .ok_or_else(|| incompatible(rule, "scalar bias", self))
    }

    /// Returns the vector of biases, or an error naming the rule that required it.
    /// The vector must hold exactly `size` biases.
    pub fn require_vector_bias(&self, rule: &str, size: usize) -> Result<&DVector<f64>, SimError> {
        let biases = self
            .vector_bias()
            .ok_or_else(|| incompatible(rule, "vector bias", self))?;
        if biases.len() != size {
            return Err(SimError::IncompatibleShape {
                expected: size,
                found: biases.len(),
            });
        }
        Ok(biases)
    }

    /// A short description of the shape, used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            AuxiliaryState::None => "none",
            AuxiliaryState::ScalarBias(_) => "scalar bias",
            AuxiliaryState::VectorBias(_) => "vector bias",
        }
    }
}

/// The kind of auxiliary data a rule requires.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DataKind {
    /// The rule carries no per-unit data.
    Empty,
    /// The rule reads a bias, scalar for units and vector for layers.
    Biased,
}

impl DataKind {
    /// The auxiliary state a new unit should start with.
    pub fn create_scalar(&self) -> AuxiliaryState {
        match self {
            DataKind::Empty => AuxiliaryState::None,
            DataKind::Biased => AuxiliaryState::ScalarBias(0.0),
        }
    }

    /// The auxiliary state a new layer of `size` units should start with.
    pub fn create_vector(&self, size: usize) -> AuxiliaryState {
        match self {
            DataKind::Empty => AuxiliaryState::None,
            DataKind::Biased => AuxiliaryState::VectorBias(DVector::zeros(size)),
        }
    }

    /// Check the auxiliary state of a unit driven by the named rule.
    pub fn validate_scalar(&self, rule: &str, aux: &AuxiliaryState) -> Result<(), SimError> {
        match (self, aux) {
            (DataKind::Empty, AuxiliaryState::None) => Ok(()),
            (DataKind::Biased, AuxiliaryState::ScalarBias(_)) => Ok(()),
            (DataKind::Empty, _) => Err(incompatible(rule, "none", aux)),
            (DataKind::Biased, _) => Err(incompatible(rule, "scalar bias", aux)),
        }
    }

    /// Check the auxiliary state of a layer of `size` units driven by the named rule.
    pub fn validate_vector(
        &self,
        rule: &str,
        aux: &AuxiliaryState,
        size: usize,
    ) -> Result<(), SimError> {
        match (self, aux) {
            (DataKind::Empty, AuxiliaryState::None) => Ok(()),
            (DataKind::Biased, AuxiliaryState::VectorBias(biases)) => {
                if biases.len() == size {
                    Ok(())
                } else {
                    Err(SimError::IncompatibleShape {
                        expected: size,
                        found: biases.len(),
                    })
                }
            }
            (DataKind::Empty, _) => Err(incompatible(rule, "none", aux)),
            (DataKind::Biased, _) => Err(incompatible(rule, "vector bias", aux)),
        }
    }
}

fn incompatible(rule: &str, expected: &str, aux: &AuxiliaryState) -> SimError {
    SimError::IncompatibleAuxState {
        rule: rule.to_string(),
        expected: expected.to_string(),
        found: aux.shape().to_string(),
    }
}
