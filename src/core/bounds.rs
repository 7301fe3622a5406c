//! Module implementing activation bounds.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// A lower/upper bound pair with an optional clip-to-range policy.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RangeData")]
pub struct BoundedRange {
    lower: f64,
    upper: f64,
    clipped: bool,
}

/// The serialized form of a range, checked on load.
#[derive(Deserialize)]
struct RangeData {
    lower: f64,
    upper: f64,
    clipped: bool,
}

impl TryFrom<RangeData> for BoundedRange {
    type Error = SimError;

    fn try_from(data: RangeData) -> Result<Self, Self::Error> {
        BoundedRange::build(data.lower, data.upper, data.clipped)
    }
}

impl BoundedRange {
    /// Create a new range. Returns an error unless `lower <= upper`.
    pub fn build(lower: f64, upper: f64, clipped: bool) -> Result<Self, SimError> {
        if !(lower <= upper) {
            return Err(SimError::InvalidParameter(format!(
                "lower bound {} must not exceed upper bound {}",
                lower, upper
            )));
        }
        Ok(BoundedRange {
            lower,
            upper,
            clipped,
        })
    }

    /// Only for constants known to satisfy `lower <= upper`.
    pub(crate) const fn new_unchecked(lower: f64, upper: f64, clipped: bool) -> Self {
        BoundedRange {
            lower,
            upper,
            clipped,
        }
    }

    /// A range that never clips and spans all finite values.
    pub const fn unbounded() -> Self {
        BoundedRange::new_unchecked(f64::MIN, f64::MAX, false)
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn is_clipped(&self) -> bool {
        self.clipped
    }

    pub fn set_clipped(&mut self, clipped: bool) {
        self.clipped = clipped;
    }

    /// Set both bounds at once. Returns an error unless `lower <= upper`, in which case the range is unchanged.
    pub fn set_bounds(&mut self, lower: f64, upper: f64) -> Result<(), SimError> {
        *self = BoundedRange::build(lower, upper, self.clipped)?;
        Ok(())
    }

    /// The distance between the bounds.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// The center of the range.
    pub fn midpoint(&self) -> f64 {
        (self.upper + self.lower) / 2.0
    }

    /// Clamp the value to the range if clipping is enabled, otherwise return it unchanged.
    /// NaN goes through untouched.
    pub fn clip(&self, value: f64) -> f64 {
        if self.clipped {
            value.clamp(self.lower, self.upper)
        } else {
            value
        }
    }

    /// Draw a value uniformly from the range.
    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.lower + self.width() * rng.gen::<f64>()
    }
}
