//! Error module for the Rusty Neurons library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq, Clone)]
pub enum SimError {
    /// The auxiliary state attached to a unit or layer does not have the shape the rule requires.
    IncompatibleAuxState {
        rule: String,
        expected: String,
        found: String,
    },
    /// Error for a non-positive (or non-finite) simulation time step.
    InvalidTimeStep(f64),
    /// Error for a negative (or non-finite) refractory period.
    InvalidRefractoryPeriod(f64),
    /// Error for invalid rule or distribution parameters.
    InvalidParameter(String),
    /// The rule has no vectorized form and cannot drive a layer.
    UnsupportedLayer(String),
    /// Error for vectors whose length does not match the layer size.
    IncompatibleShape { expected: usize, found: usize },
    /// Error for a unit id that is not part of the network.
    UnitNotFound(usize),
    /// Error for I/O operations, e.g., while reading a configuration file.
    IOError(String),
}

impl SimError {
    /// Returns true for errors raised while configuring units, layers, rules or the clock.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, SimError::IOError(_))
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::IncompatibleAuxState {
                rule,
                expected,
                found,
            } => write!(
                f,
                "Incompatible auxiliary state for rule {}: expected {}, found {}",
                rule, expected, found
            ),
            SimError::InvalidTimeStep(dt) => {
                write!(f, "Invalid time step: {} (must be positive)", dt)
            }
            SimError::InvalidRefractoryPeriod(p) => {
                write!(f, "Invalid refractory period: {} (must be non-negative)", p)
            }
            SimError::InvalidParameter(e) => write!(f, "Invalid parameters: {}", e),
            SimError::UnsupportedLayer(rule) => {
                write!(f, "Rule {} cannot be applied to a layer", rule)
            }
            SimError::IncompatibleShape { expected, found } => write!(
                f,
                "Incompatible shape: expected length {}, found {}",
                expected, found
            ),
            SimError::UnitNotFound(id) => write!(f, "Unit {} not found in the network", id),
            SimError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for SimError {}
