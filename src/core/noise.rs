//! Seedable random variates used as noise sources by the update rules.
use derivative::Derivative;
use nalgebra::DVector;
use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use rand_distr::{Distribution, Exp, LogNormal, Normal};
use serde::{Deserialize, Serialize};

use super::bounds::BoundedRange;
use crate::error::SimError;

/// The probability law a [`RandomVariate`] samples from.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DistributionKind {
    /// Uniform on the closed interval [min, max].
    Uniform { min: f64, max: f64 },
    /// Normal with the given mean and standard deviation.
    Normal { mean: f64, std_dev: f64 },
    /// Log-normal with the given location and scale of the underlying normal.
    LogNormal { location: f64, scale: f64 },
    /// Exponential with the given rate.
    Exponential { lambda: f64 },
}

impl DistributionKind {
    fn validate(&self) -> Result<(), SimError> {
        let valid = match *self {
            DistributionKind::Uniform { min, max } => min <= max && min.is_finite() && max.is_finite(),
            DistributionKind::Normal { mean, std_dev } => mean.is_finite() && std_dev >= 0.0 && std_dev.is_finite(),
            DistributionKind::LogNormal { location, scale } => location.is_finite() && scale >= 0.0 && scale.is_finite(),
            DistributionKind::Exponential { lambda } => lambda > 0.0 && lambda.is_finite(),
        };
        if valid {
            Ok(())
        } else {
            Err(SimError::InvalidParameter(format!("invalid distribution {:?}", self)))
        }
    }
}

/// A sampleable probability distribution with optional floor/ceiling clipping of the samples.
/// Each variate owns its own generator, seeded explicitly, so noise streams are reproducible.
#[derive(Derivative, Clone, Serialize)]
#[derivative(Debug, PartialEq)]
pub struct RandomVariate {
    /// The probability law.
    distribution: DistributionKind,
    /// Floor and ceiling of the samples, only enforced when clipping is enabled.
    bounds: BoundedRange,
    /// The seed of the generator.
    seed: u64,
    /// The random number generator.
    #[serde(skip)]
    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    rng: ChaCha8Rng,
}

impl<'de> Deserialize<'de> for RandomVariate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RandomVariateData {
            distribution: DistributionKind,
            bounds: BoundedRange,
            seed: u64,
        }

        let data = RandomVariateData::deserialize(deserializer)?;
        let mut variate = RandomVariate::build(data.distribution, data.seed)
            .map_err(<D::Error as serde::de::Error>::custom)?;
        variate.bounds = data.bounds;
        Ok(variate)
    }
}

impl RandomVariate {
    /// Create a variate for the given distribution. Returns an error for invalid parameters.
    pub fn build(distribution: DistributionKind, seed: u64) -> Result<Self, SimError> {
        distribution.validate()?;
        Ok(RandomVariate::new_unchecked(distribution, seed))
    }

    /// Create a variate without validating the distribution.
    pub(crate) fn new_unchecked(distribution: DistributionKind, seed: u64) -> Self {
        RandomVariate {
            distribution,
            bounds: BoundedRange::unbounded(),
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform variate on [min, max].
    pub fn uniform(min: f64, max: f64, seed: u64) -> Result<Self, SimError> {
        Self::build(DistributionKind::Uniform { min, max }, seed)
    }

    /// Normal variate with the given mean and standard deviation.
    pub fn normal(mean: f64, std_dev: f64, seed: u64) -> Result<Self, SimError> {
        Self::build(DistributionKind::Normal { mean, std_dev }, seed)
    }

    /// Returns the distribution.
    pub fn distribution(&self) -> DistributionKind {
        self.distribution
    }

    /// Returns the floor/ceiling range of the samples.
    pub fn bounds(&self) -> BoundedRange {
        self.bounds
    }

    /// Set the floor and ceiling of the samples and enable clipping.
    pub fn set_clipping(&mut self, floor: f64, ceiling: f64) -> Result<(), SimError> {
        self.bounds = BoundedRange::build(floor, ceiling, true)?;
        Ok(())
    }

    /// Returns the seed the generator was last seeded with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Reset the generator with a new seed.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Draw one sample, clipped to the floor/ceiling if clipping is enabled.
    pub fn sample(&mut self) -> f64 {
        let value = match self.distribution {
            DistributionKind::Uniform { min, max } => self.rng.gen_range(min..=max),
            DistributionKind::Normal { mean, std_dev } => Normal::new(mean, std_dev)
                .map(|dist| dist.sample(&mut self.rng))
                .unwrap_or(f64::NAN),
            DistributionKind::LogNormal { location, scale } => LogNormal::new(location, scale)
                .map(|dist| dist.sample(&mut self.rng))
                .unwrap_or(f64::NAN),
            DistributionKind::Exponential { lambda } => Exp::new(lambda)
                .map(|dist| dist.sample(&mut self.rng))
                .unwrap_or(f64::NAN),
        };
        self.bounds.clip(value)
    }

    /// Draw `n` independent samples.
    pub fn sample_vector(&mut self, n: usize) -> DVector<f64> {
        DVector::from_iterator(n, (0..n).map(|_| self.sample()))
    }
}

impl Default for RandomVariate {
    /// Uniform noise on [0, 1] seeded with zero.
    fn default() -> Self {
        RandomVariate::new_unchecked(DistributionKind::Uniform { min: 0.0, max: 1.0 }, 0)
    }
}
