//! Core module defining the main components of the Rusty Neurons library.
//!
//! This module provides the data model driven by the update rules. It consists of the following components:
//!
//! - [`clock`]: The simulation time context (time, time step and time type)
//! - [`bounds`]: Activation bounds with an optional clipping policy
//! - [`noise`]: Seedable random variates used as noise sources
//! - [`aux_state`]: Per-unit auxiliary data (biases)
//! - [`synapse`]: Weighted directed connections and the fan-in view handed to the rules
//! - [`unit`]: Individual units and their mutable state
//! - [`layer`]: Vectorized groups of units
//! - [`network`]: The tick driver
//!
//! # Examples
//!
//! ```
//! use rusty_neurons::core::{network::Network, aux_state::AuxiliaryState};
//! use rusty_neurons::rules::{NeuronRule, binary::BinaryRule};
//!
//! let mut network = Network::new(0.1).unwrap();
//!
//! // A binary unit requires a scalar bias
//! let id = network
//!     .add_unit_with_state(NeuronRule::Binary(BinaryRule::default()), AuxiliaryState::ScalarBias(0.25))
//!     .unwrap();
//!
//! // Giving it no bias is a configuration error
//! assert!(network
//!     .add_unit_with_state(NeuronRule::Binary(BinaryRule::default()), AuxiliaryState::None)
//!     .is_err());
//!
//! network.unit_mut(id).unwrap().state_mut().set_input(0.5);
//! network.update().unwrap();
//! assert_eq!(network.unit(id).unwrap().activation(), 1.0);
//! ```
pub mod aux_state;
pub mod bounds;
pub mod clock;
pub mod layer;
pub mod network;
pub mod noise;
pub mod synapse;
pub mod unit;
pub mod utils;
