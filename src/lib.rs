//! This crate provides pluggable neuron update rules and a tick driver for simulating
//! rate-based and spiking neural networks in discrete time.
//!
//! # Creating Networks
//!
//! ```rust
//! use rusty_neurons::core::network::Network;
//! use rusty_neurons::rules::{NeuronRule, iac::IacRule};
//!
//! // Init an empty network with a time step of 0.1
//! let mut network = Network::new(0.1).unwrap();
//!
//! // Add two IAC units sharing the same configuration
//! let template = NeuronRule::Iac(IacRule::default());
//! let a = network.add_unit(&template);
//! let b = network.add_unit(&template);
//!
//! // Wire them in a cycle
//! network.add_synapse(a, b, 0.5).unwrap();
//! network.add_synapse(b, a, -0.5).unwrap();
//!
//! assert_eq!(network.num_units(), 2);
//! assert_eq!(network.num_synapses(), 2);
//! ```
//!
//! # Simulating Networks
//!
//! ```rust
//! use rusty_neurons::core::network::Network;
//! use rusty_neurons::rules::{NeuronRule, kuramoto::KuramotoRule};
//!
//! let mut network = Network::new(0.1).unwrap();
//! let id = network.add_unit(&NeuronRule::Kuramoto(KuramotoRule::default()));
//!
//! // Each tick reads a snapshot of the previous tick, then the clock advances once
//! network.run(10).unwrap();
//!
//! assert_eq!(network.clock().ticks(), 10);
//! assert!(network.unit(id).unwrap().activation() < std::f64::consts::TAU);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod rules;

/// The default simulation time step.
pub const DEFAULT_TIME_STEP: f64 = 0.1;
/// Minimum number of units (or layers) to consider parallel processing.
pub const MIN_PARALLEL_UNITS: usize = 100;
/// The amount by which a contextual increment or decrement nudges an activation.
pub const DEFAULT_INCREMENT: f64 = 0.1;
