//! Self-organizing recurrent network (SORN) threshold units.
//!
//! A spiking threshold unit with synaptic normalization of its excitatory fan-in and
//! homeostatic intrinsic plasticity: the threshold rises after every spike and slowly
//! decays otherwise, driving the firing rate toward a target rate.
use serde::{Deserialize, Serialize};

use crate::core::aux_state::AuxiliaryState;
use crate::core::bounds::BoundedRange;
use crate::core::clock::SimulationClock;
use crate::core::noise::{DistributionKind, RandomVariate};
use crate::core::synapse::{normalize_excitatory, Afferent};
use crate::core::unit::UnitState;
use crate::error::SimError;
use crate::rules::UpdateRule;

/// Whether a unit may currently fire.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RefractoryState {
    Refractory,
    Eligible,
}

/// Returns the refractory state of a unit at the given time.
/// A unit that never fired is eligible.
pub fn refractory_state(unit: &UnitState, time: f64, refractory_period: f64) -> RefractoryState {
    match unit.last_spike_time() {
        Some(last) if time <= last + refractory_period => RefractoryState::Refractory,
        _ => RefractoryState::Eligible,
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SornRule {
    /// The adaptive firing threshold.
    threshold: f64,
    /// The learning rate of the intrinsic plasticity.
    eta_ip: f64,
    /// The homeostatic target firing rate.
    target_rate: f64,
    /// The minimum time between two spikes.
    refractory_period: f64,
    /// An optional ceiling on the threshold.
    max_threshold: Option<f64>,
    /// The sum the excitatory fan-in weights are rescaled to.
    normalization_target: f64,
    bounds: BoundedRange,
    /// Whether to add noise to the input.
    add_noise: bool,
    noise_generator: RandomVariate,
}

impl SornRule {
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    pub fn eta_ip(&self) -> f64 {
        self.eta_ip
    }

    pub fn set_eta_ip(&mut self, eta_ip: f64) -> Result<(), SimError> {
        check_eta_ip(eta_ip)?;
        self.eta_ip = eta_ip;
        Ok(())
    }

    pub fn target_rate(&self) -> f64 {
        self.target_rate
    }

    /// Set the target rate. Returns an error outside [0, 1].
    pub fn set_target_rate(&mut self, target_rate: f64) -> Result<(), SimError> {
        check_target_rate(target_rate)?;
        self.target_rate = target_rate;
        Ok(())
    }

    pub fn refractory_period(&self) -> f64 {
        self.refractory_period
    }

    /// Set the refractory period. Returns an error for a negative (or NaN) period.
    pub fn set_refractory_period(&mut self, refractory_period: f64) -> Result<(), SimError> {
        check_refractory_period(refractory_period)?;
        self.refractory_period = refractory_period;
        Ok(())
    }

    pub fn max_threshold(&self) -> Option<f64> {
        self.max_threshold
    }

    /// Cap the threshold, or remove the cap with `None`.
    pub fn set_max_threshold(&mut self, max_threshold: Option<f64>) {
        self.max_threshold = max_threshold;
    }

    pub fn normalization_target(&self) -> f64 {
        self.normalization_target
    }

    pub fn set_normalization_target(&mut self, target: f64) -> Result<(), SimError> {
        check_normalization_target(target)?;
        self.normalization_target = target;
        Ok(())
    }

    pub fn add_noise(&self) -> bool {
        self.add_noise
    }

    pub fn set_add_noise(&mut self, add_noise: bool) {
        self.add_noise = add_noise;
    }

    pub fn set_noise_generator(&mut self, noise_generator: RandomVariate) {
        self.noise_generator = noise_generator;
    }

    /// Homeostatic update of the threshold after a spike decision.
    pub fn plastic_update(&mut self, spiked: bool) {
        let indicator = if spiked { 1.0 } else { 0.0 };
        self.threshold += self.eta_ip * (indicator - self.target_rate);
        if let Some(max_threshold) = self.max_threshold {
            self.threshold = self.threshold.min(max_threshold);
        }
    }
}

fn check_eta_ip(eta_ip: f64) -> Result<(), SimError> {
    if !(eta_ip >= 0.0) {
        return Err(SimError::InvalidParameter(format!(
            "SORN learning rate must be non-negative, got {}",
            eta_ip
        )));
    }
    Ok(())
}

fn check_target_rate(target_rate: f64) -> Result<(), SimError> {
    if !(0.0..=1.0).contains(&target_rate) {
        return Err(SimError::InvalidParameter(format!(
            "SORN target rate must lie in [0, 1], got {}",
            target_rate
        )));
    }
    Ok(())
}

fn check_refractory_period(refractory_period: f64) -> Result<(), SimError> {
    if !(refractory_period >= 0.0) {
        return Err(SimError::InvalidRefractoryPeriod(refractory_period));
    }
    Ok(())
}

fn check_normalization_target(target: f64) -> Result<(), SimError> {
    if !(target > 0.0) {
        return Err(SimError::InvalidParameter(format!(
            "SORN normalization target must be positive, got {}",
            target
        )));
    }
    Ok(())
}

impl Default for SornRule {
    fn default() -> Self {
        SornRule {
            threshold: 0.5,
            eta_ip: 0.001,
            target_rate: 0.01,
            refractory_period: 0.0,
            max_threshold: None,
            normalization_target: 1.0,
            bounds: BoundedRange::new_unchecked(-1.0, 1.0, false),
            add_noise: false,
            noise_generator: RandomVariate::new_unchecked(
                DistributionKind::Normal {
                    mean: 0.0,
                    std_dev: 0.05,
                },
                0,
            ),
        }
    }
}

impl UpdateRule for SornRule {
    fn name(&self) -> &'static str {
        "SORN"
    }

    fn validate(&self) -> Result<(), SimError> {
        check_eta_ip(self.eta_ip)?;
        check_target_rate(self.target_rate)?;
        check_refractory_period(self.refractory_period)?;
        check_normalization_target(self.normalization_target)
    }

    fn apply(
        &mut self,
        unit: &mut UnitState,
        fan_in: &mut [Afferent],
        _aux: &mut AuxiliaryState,
        clock: &SimulationClock,
    ) -> Result<(), SimError> {
        normalize_excitatory(fan_in, self.normalization_target);

        let mut input = unit.input();
        if self.add_noise {
            input += self.noise_generator.sample();
        }

        let time = clock.time();
        let eligible =
            refractory_state(unit, time, self.refractory_period) == RefractoryState::Eligible;
        let spiked = eligible && input >= self.threshold;
        if spiked {
            log::trace!("SORN unit fired at t={}", time);
            unit.fire(time);
        } else {
            unit.reset_spike();
        }

        unit.set_activation(2.0 * (input - self.threshold));
        self.plastic_update(spiked);
        Ok(())
    }

    fn bounds(&self) -> BoundedRange {
        self.bounds
    }

    fn set_bounds(&mut self, lower: f64, upper: f64) -> Result<(), SimError> {
        self.bounds.set_bounds(lower, upper)
    }

    fn set_clipped(&mut self, clipped: bool) {
        self.bounds.set_clipped(clipped);
    }

    fn noise_generator(&self) -> Option<&RandomVariate> {
        Some(&self.noise_generator)
    }

    fn noise_generator_mut(&mut self) -> Option<&mut RandomVariate> {
        Some(&mut self.noise_generator)
    }
}
