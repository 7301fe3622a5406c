//! Module implementing synapses and the fan-in view handed to the update rules.

use serde::{Deserialize, Serialize};

/// A weighted directed connection between two units of a network.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Synapse {
    /// The ID of the unit sending activation.
    source: usize,
    /// The ID of the unit receiving activation.
    target: usize,
    /// The synaptic strength.
    strength: f64,
}

impl Synapse {
    /// Create a new synapse. Self loops are allowed.
    /// The function cannot check that the ids are valid; this check must be done at the network level.
    pub fn new(source: usize, target: usize, strength: f64) -> Self {
        Synapse {
            source,
            target,
            strength,
        }
    }

    /// Returns the ID of the source unit.
    pub fn source(&self) -> usize {
        self.source
    }

    /// Returns the ID of the target unit.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Returns the strength of the synapse.
    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn set_strength(&mut self, strength: f64) {
        self.strength = strength;
    }
}

/// One incoming connection as seen by a rule during a tick: the source activation
/// (as it stood at the end of the previous tick) and a mutable strength.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Afferent {
    pub source_activation: f64,
    pub strength: f64,
}

impl Afferent {
    pub fn new(source_activation: f64, strength: f64) -> Self {
        Afferent {
            source_activation,
            strength,
        }
    }

    /// The weighted contribution of the connection.
    pub fn weighted(&self) -> f64 {
        self.strength * self.source_activation
    }
}

/// Sum of the weighted contributions of a fan-in.
pub fn weighted_sum(fan_in: &[Afferent]) -> f64 {
    fan_in.iter().map(Afferent::weighted).sum()
}

/// Rescale the excitatory (positive) strengths of a fan-in so they sum to `target`.
/// Inhibitory strengths are left untouched, and so is a fan-in without excitatory strength.
pub fn normalize_excitatory(fan_in: &mut [Afferent], target: f64) {
    let total: f64 = fan_in
        .iter()
        .filter(|afferent| afferent.strength > 0.0)
        .map(|afferent| afferent.strength)
        .sum();
    if total <= 0.0 {
        return;
    }
    let scale = target / total;
    fan_in
        .iter_mut()
        .filter(|afferent| afferent.strength > 0.0)
        .for_each(|afferent| afferent.strength *= scale);
}
