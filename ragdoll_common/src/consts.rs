//! Workspace-wide constants.
//!
//! Single source of truth for default authoring values and capacity bounds.
//! Angles are in degrees, angular velocities in degrees per time unit.

use static_assertions::const_assert;

/// Maximum number of segments in one figure (`SegmentId` is a `u16`).
pub const MAX_SEGMENTS: usize = 1024;

const_assert!(MAX_SEGMENTS > 0 && MAX_SEGMENTS <= u16::MAX as usize);

/// Run-wide proportional calibration stamped onto every segment by load aggregation.
pub const DEFAULT_P_BASE: f64 = 30.0;

/// Base torque factor `K`. Chosen so that a torso carrying only itself gets factor 10.
pub const DEFAULT_BASE_TORQUE_FACTOR_K: f64 = 10.0;

/// Externally tunable muscle strength added to the load factor.
pub const DEFAULT_EXTERNAL_STRENGTH: f64 = 10.0;

/// Proportional gain.
pub const DEFAULT_P_GAIN: f64 = 1.0;

/// Damping coefficient applied against the current angular velocity.
pub const DEFAULT_DAMPING: f64 = 5.0;

/// Mechanical advantage multiplier.
pub const DEFAULT_LEVERAGE_FACTOR: f64 = 1.0;

/// Share of a carried child's load that transfers to its carrier.
pub const DEFAULT_LOAD_INFLUENCE_FACTOR: f64 = 1.0;

/// Default lower relative joint bound [deg].
pub const DEFAULT_LOWER_ANGLE: f64 = -90.0;

/// Default upper relative joint bound [deg].
pub const DEFAULT_UPPER_ANGLE: f64 = 90.0;

/// Default bounded-rate rewind speed [deg / time unit].
pub const DEFAULT_REWIND_SPEED: f64 = 360.0;

/// Tolerance under which a clamped angle is considered equal to the unclamped one.
pub const ANGLE_EPSILON: f64 = 1e-6;

/// Default fixed physics step [time units].
pub const DEFAULT_FIXED_DT: f64 = 0.02;

/// Default angular drag of the reference simulation [1 / time unit].
pub const DEFAULT_ANGULAR_DRAG: f64 = 0.05;
