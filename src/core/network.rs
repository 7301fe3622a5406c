//! The tick driver owning units, layers, synapses and the clock.
use derivative::Derivative;
use itertools::Itertools;
use nalgebra::DVector;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::aux_state::AuxiliaryState;
use super::clock::{SimulationClock, TimeType};
use super::layer::Layer;
use super::synapse::{weighted_sum, Afferent, Synapse};
use super::unit::Unit;
use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::rules::{NeuronRule, UpdateRule};
use crate::MIN_PARALLEL_UNITS;

/// Offset separating the noise seeds of layers from those of units.
const LAYER_SEED_OFFSET: u64 = 1 << 32;

/// A network of units and layers advanced one tick at a time.
///
/// Every tick reads the activations of the previous tick: the fan-in of each unit is built from
/// a snapshot taken before any unit is updated, so the result does not depend on the order in
/// which units are processed, nor on whether they are processed in parallel.
#[derive(Derivative, Clone, Serialize)]
#[derivative(Debug)]
pub struct Network {
    clock: SimulationClock,
    units: Vec<Unit>,
    layers: Vec<Layer>,
    synapses: Vec<Synapse>,
    /// The indices of the incoming synapses of each unit, in insertion order.
    #[serde(skip)]
    fan_in: Vec<Vec<usize>>,
    /// The seed the rule instances and the initialization generator derive from.
    seed: u64,
    /// The generator used for randomized initialization.
    #[serde(skip)]
    #[derivative(Debug = "ignore")]
    rng: ChaCha8Rng,
    /// Whether the weighted fan-in is added to the input of each unit before it updates.
    accumulate_inputs: bool,
    /// Minimum number of units (or layers) to update them in parallel.
    parallel_threshold: usize,
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct NetworkData {
            clock: SimulationClock,
            units: Vec<Unit>,
            layers: Vec<Layer>,
            synapses: Vec<Synapse>,
            seed: u64,
            accumulate_inputs: bool,
            parallel_threshold: usize,
        }

        let data = NetworkData::deserialize(deserializer)?;
        let mut network = Network::with_clock(data.clock, data.seed);
        network.units = data.units;
        network.fan_in = vec![Vec::new(); network.units.len()];
        network.layers = data.layers;
        network.accumulate_inputs = data.accumulate_inputs;
        network.parallel_threshold = data.parallel_threshold;
        for synapse in data.synapses {
            network
                .push_synapse(synapse)
                .map_err(<D::Error as serde::de::Error>::custom)?;
        }
        network
            .check()
            .map_err(<D::Error as serde::de::Error>::custom)?;
        Ok(network)
    }
}

impl Network {
    fn with_clock(clock: SimulationClock, seed: u64) -> Self {
        Network {
            clock,
            units: Vec::new(),
            layers: Vec::new(),
            synapses: Vec::new(),
            fan_in: Vec::new(),
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            accumulate_inputs: true,
            parallel_threshold: MIN_PARALLEL_UNITS,
        }
    }

    /// Create an empty network starting at time zero with the given time step.
    /// Returns an error for a non-positive time step.
    pub fn new(time_step: f64) -> Result<Self, SimError> {
        Ok(Self::with_clock(SimulationClock::build(time_step)?, 0))
    }

    /// Create an empty network from a simulation configuration.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mut clock = SimulationClock::build_from(config.start_time, config.time_step)?;
        clock.set_time_type(config.time_type);
        let mut network = Self::with_clock(clock, config.seed);
        network.accumulate_inputs = config.accumulate_inputs;
        network.parallel_threshold = config.parallel_threshold;
        log::debug!(
            "Network configured with dt={} and seed {}",
            config.time_step,
            config.seed
        );
        Ok(network)
    }

    /// Add a unit driven by a fresh copy of the template rule, with the default auxiliary state.
    /// Returns the ID of the new unit.
    pub fn add_unit(&mut self, template: &NeuronRule) -> usize {
        let id = self.units.len();
        let rule = template.fork(self.seed.wrapping_add(id as u64));
        self.units.push(Unit::new(id, rule));
        self.fan_in.push(Vec::new());
        id
    }

    /// Add a unit with the provided auxiliary state.
    /// Returns an error if the state does not have the shape the rule requires.
    pub fn add_unit_with_state(
        &mut self,
        rule: NeuronRule,
        aux: AuxiliaryState,
    ) -> Result<usize, SimError> {
        let id = self.units.len();
        let rule = rule.fork(self.seed.wrapping_add(id as u64));
        self.units.push(Unit::build(id, rule, aux)?);
        self.fan_in.push(Vec::new());
        Ok(id)
    }

    /// Add a layer of `size` units driven by a fresh copy of the template rule.
    /// Returns an error if the rule cannot drive a layer.
    pub fn add_layer(&mut self, template: &NeuronRule, size: usize) -> Result<usize, SimError> {
        let id = self.layers.len();
        let layer = Layer::new(id, size, template.fork(self.layer_seed(id)))?;
        self.layers.push(layer);
        Ok(id)
    }

    /// Add a layer with the provided auxiliary state.
    pub fn add_layer_with_state(
        &mut self,
        rule: NeuronRule,
        size: usize,
        aux: AuxiliaryState,
    ) -> Result<usize, SimError> {
        let id = self.layers.len();
        let layer = Layer::build(id, size, rule.fork(self.layer_seed(id)), aux)?;
        self.layers.push(layer);
        Ok(id)
    }

    fn layer_seed(&self, id: usize) -> u64 {
        self.seed
            .wrapping_add(LAYER_SEED_OFFSET)
            .wrapping_add(id as u64)
    }

    /// Connect two units. Returns the index of the new synapse.
    /// Returns an error if either unit is not part of the network.
    pub fn add_synapse(
        &mut self,
        source: usize,
        target: usize,
        strength: f64,
    ) -> Result<usize, SimError> {
        self.push_synapse(Synapse::new(source, target, strength))
    }

    fn push_synapse(&mut self, synapse: Synapse) -> Result<usize, SimError> {
        for id in [synapse.source(), synapse.target()] {
            if id >= self.units.len() {
                return Err(SimError::UnitNotFound(id));
            }
        }
        let index = self.synapses.len();
        self.fan_in[synapse.target()].push(index);
        self.synapses.push(synapse);
        Ok(index)
    }

    pub fn unit(&self, id: usize) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn unit_mut(&mut self, id: usize) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn layer(&self, id: usize) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn layer_mut(&mut self, id: usize) -> Option<&mut Layer> {
        self.layers.get_mut(id)
    }

    pub fn synapses(&self) -> &[Synapse] {
        &self.synapses
    }

    /// The incoming synapses of a unit, in insertion order.
    pub fn fan_in(&self, id: usize) -> Option<impl Iterator<Item = &Synapse> + '_> {
        self.fan_in
            .get(id)
            .map(|indices| indices.iter().map(|&index| &self.synapses[index]))
    }

    pub fn num_units(&self) -> usize {
        self.units.len()
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn num_synapses(&self) -> usize {
        self.synapses.len()
    }

    /// The activations of all units, indexed by unit ID.
    pub fn activations(&self) -> Vec<f64> {
        self.units.iter().map(Unit::activation).collect()
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn set_accumulate_inputs(&mut self, accumulate_inputs: bool) {
        self.accumulate_inputs = accumulate_inputs;
    }

    pub fn set_parallel_threshold(&mut self, parallel_threshold: usize) {
        self.parallel_threshold = parallel_threshold;
    }

    /// Continuous if the clock or any rule in the network is continuous, discrete otherwise.
    pub fn time_type(&self) -> TimeType {
        let continuous = self.clock.time_type() == TimeType::Continuous
            || self
                .units
                .iter()
                .map(Unit::rule)
                .chain(self.layers.iter().map(Layer::rule))
                .any(|rule| rule.time_type() == TimeType::Continuous);
        if continuous {
            TimeType::Continuous
        } else {
            TimeType::Discrete
        }
    }

    /// Set every activation to a random value plausible for its rule, drawn from the network generator.
    pub fn randomize(&mut self) -> Result<(), SimError> {
        for unit in self.units.iter_mut() {
            let value = unit.rule().random_value(&mut self.rng);
            unit.state_mut().set_activation(value);
        }
        for layer in self.layers.iter_mut() {
            let values = DVector::from_iterator(
                layer.len(),
                (0..layer.len()).map(|_| layer.rule().random_value(&mut self.rng)),
            );
            layer.state_mut().set_activations(values)?;
        }
        Ok(())
    }

    /// Check every unit and layer: rule parameters, auxiliary state shapes and layer support.
    pub fn check(&self) -> Result<(), SimError> {
        self.units.iter().try_for_each(Unit::check)?;
        self.layers.iter().try_for_each(Layer::check)
    }

    /// Run one tick: update all units from the previous-tick snapshot, update all layers,
    /// then advance the clock.
    /// Returns an error, leaving the network untouched, if any unit or layer fails [`Network::check`].
    pub fn update(&mut self) -> Result<(), SimError> {
        self.check()?;
        let snapshot = self.activations();
        let synapses = &self.synapses;
        let clock = &self.clock;
        let accumulate_inputs = self.accumulate_inputs;

        let strengths: Vec<Vec<f64>> = if self.units.len() >= self.parallel_threshold {
            self.units
                .par_iter_mut()
                .zip(self.fan_in.par_iter())
                .map(|(unit, fan_in)| {
                    update_unit(unit, fan_in, synapses, &snapshot, clock, accumulate_inputs)
                })
                .collect::<Result<_, _>>()?
        } else {
            self.units
                .iter_mut()
                .zip_eq(self.fan_in.iter())
                .map(|(unit, fan_in)| {
                    update_unit(unit, fan_in, synapses, &snapshot, clock, accumulate_inputs)
                })
                .collect::<Result<_, _>>()?
        };

        // Write back the strengths the rules may have rewritten (e.g. normalization).
        for (indices, strengths) in self.fan_in.iter().zip_eq(strengths) {
            for (&index, strength) in indices.iter().zip_eq(strengths) {
                self.synapses[index].set_strength(strength);
            }
        }

        if self.layers.len() >= self.parallel_threshold {
            self.layers
                .par_iter_mut()
                .try_for_each(|layer| update_layer(layer, clock))?;
        } else {
            self.layers
                .iter_mut()
                .try_for_each(|layer| update_layer(layer, clock))?;
        }

        self.clock.advance();
        Ok(())
    }

    /// Run the simulation for the given number of ticks.
    pub fn run(&mut self, num_ticks: u64) -> Result<(), SimError> {
        log::info!(
            "Starting simulation of {} ticks at t={}...",
            num_ticks,
            self.clock.time()
        );

        // For logging purposes
        let log_interval = (num_ticks / 100).max(1);

        for tick in 1..=num_ticks {
            self.update()?;
            if tick % log_interval == 0 {
                log::debug!(
                    "Simulation progress: {:.2}% (Time: {:.2})",
                    100.0 * tick as f64 / num_ticks as f64,
                    self.clock.time()
                );
            }
        }

        log::info!("Simulation completed successfully!");
        Ok(())
    }

    /// Save the network to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SimError> {
        let file = File::create(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| SimError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| SimError::IOError(e.to_string()))
    }

    /// Load a network from a file. The initialization generator restarts from the seed.
    /// Invalid parameters or shapes in the file are reported as [`SimError::InvalidParameter`].
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let file = File::open(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| {
            if e.is_data() {
                SimError::InvalidParameter(e.to_string())
            } else {
                SimError::IOError(e.to_string())
            }
        })
    }
}

/// Update a unit from the snapshot and return the (possibly rewritten) strengths of its fan-in.
fn update_unit(
    unit: &mut Unit,
    fan_in: &[usize],
    synapses: &[Synapse],
    snapshot: &[f64],
    clock: &SimulationClock,
    accumulate_inputs: bool,
) -> Result<Vec<f64>, SimError> {
    let mut afferents: Vec<Afferent> = fan_in
        .iter()
        .map(|&index| {
            let synapse = &synapses[index];
            Afferent::new(snapshot[synapse.source()], synapse.strength())
        })
        .collect();

    if accumulate_inputs {
        unit.state_mut().add_input(weighted_sum(&afferents));
    }
    unit.update(&mut afferents, clock)?;
    unit.state_mut().clear_input();

    if unit.is_spike() {
        log::trace!("Unit {} spiked at t={}", unit.id(), clock.time());
    }

    Ok(afferents.into_iter().map(|afferent| afferent.strength).collect())
}

fn update_layer(layer: &mut Layer, clock: &SimulationClock) -> Result<(), SimError> {
    layer.update(clock)?;
    layer.state_mut().clear_inputs();
    Ok(())
}
