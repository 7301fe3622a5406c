//! Simulation configuration, loadable from JSON files.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::core::clock::TimeType;
use crate::error::SimError;
use crate::{DEFAULT_TIME_STEP, MIN_PARALLEL_UNITS};

/// The parameters of a simulation run. Missing fields take their default values.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// The fixed time step of the clock.
    pub time_step: f64,
    /// The time of the first tick.
    pub start_time: f64,
    /// The time type the clock declares.
    pub time_type: TimeType,
    /// The seed of the initialization generator and of every rule instance.
    pub seed: u64,
    /// The number of ticks a run driven by this configuration lasts.
    pub num_ticks: u64,
    /// Whether the weighted fan-in is added to the input of each unit before it updates.
    pub accumulate_inputs: bool,
    /// Minimum number of units (or layers) to update them in parallel.
    pub parallel_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            time_step: DEFAULT_TIME_STEP,
            start_time: 0.0,
            time_type: TimeType::Discrete,
            seed: 0,
            num_ticks: 0,
            accumulate_inputs: true,
            parallel_threshold: MIN_PARALLEL_UNITS,
        }
    }
}

impl SimulationConfig {
    /// Check the configuration. Returns an error for a non-positive time step or a non-finite start time.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(SimError::InvalidTimeStep(self.time_step));
        }
        if !self.start_time.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "start time must be finite, got {}",
                self.start_time
            )));
        }
        Ok(())
    }

    /// Save the configuration to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SimError> {
        let file = File::create(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| SimError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| SimError::IOError(e.to_string()))
    }

    /// Load a configuration from a file and validate it.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let file = File::open(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        let config: SimulationConfig = serde_json::from_reader(reader).map_err(|e| {
            if e.is_data() {
                SimError::InvalidParameter(e.to_string())
            } else {
                SimError::IOError(e.to_string())
            }
        })?;
        config.validate()?;
        Ok(config)
    }
}
