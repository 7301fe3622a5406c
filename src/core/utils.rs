//! Utility functions.
use std::f64::consts::TAU;

/// Wrap a phase into [0, 2π).
/// `rem_euclid` may round up to exactly 2π for tiny negative inputs, which is folded back to zero.
pub fn wrap_phase(theta: f64) -> f64 {
    let wrapped = theta.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
