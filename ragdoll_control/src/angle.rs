//! Wrap-safe angle arithmetic in degrees.
//!
//! Rigid bodies may report any number of accumulated turns. Everything the
//! control core compares goes through [`normalize`] or [`delta`], so the
//! results stay in (-180°, 180°] regardless of how far a body has spun.

use ragdoll_common::consts::ANGLE_EPSILON;

/// Normalize any angle into (-180°, 180°].
#[inline]
pub fn normalize(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Shortest signed rotation from `from` to `to`, in (-180°, 180°].
#[inline]
pub fn delta(from: f64, to: f64) -> f64 {
    normalize(to - from)
}

/// Rotate `current` toward `target` along the shortest arc by at most `max_step`.
///
/// Never overshoots: if the remaining arc is within `max_step`, the result
/// lands exactly on `current + delta(current, target)`. The result keeps
/// `current`'s turn count rather than renormalizing it.
#[inline]
pub fn move_towards(current: f64, target: f64, max_step: f64) -> f64 {
    let remaining = delta(current, target);
    let step = max_step.max(0.0);
    if remaining.abs() <= step {
        current + remaining
    } else {
        current + step.copysign(remaining)
    }
}

/// Equality within [`ANGLE_EPSILON`].
#[inline]
pub fn approximately(a: f64, b: f64) -> bool {
    (a - b).abs() <= ANGLE_EPSILON
}
