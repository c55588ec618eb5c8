//! Load-weighted PD pose controller.
//!
//! Each tick the controller turns (target angle, current relative angle,
//! angular velocity) into a commanded angular velocity and writes it
//! straight onto the body. This is a velocity override, not torque
//! accumulation: the previous velocity only survives through the damping
//! term.
//!
//! ```text
//! error      = delta(relative, target)
//! pd         = error * p_gain * p_base  -  omega * damping
//! strength   = load_factor + external_strength
//! commanded  = pd * strength * mass
//! ```

use ragdoll_common::consts::{DEFAULT_DAMPING, DEFAULT_EXTERNAL_STRENGTH, DEFAULT_P_BASE, DEFAULT_P_GAIN};
use tracing::warn;

use crate::angle;
use crate::body::{BodySet, RigidBody, SegmentId};

/// Structural load computed once by load aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLoad {
    /// Own mass plus the propagated load of everything carried.
    pub total_load: f64,
    /// Normalized torque scale derived from `total_load`.
    pub load_factor: f64,
}

/// PD gains of one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseGains {
    /// Proportional gain.
    pub p_gain: f64,
    /// Damping coefficient against current angular velocity.
    pub damping: f64,
}

impl Default for PoseGains {
    fn default() -> Self {
        Self {
            p_gain: DEFAULT_P_GAIN,
            damping: DEFAULT_DAMPING,
        }
    }
}

/// Inputs of one PD evaluation.
#[derive(Debug, Clone, Copy)]
pub struct PoseInput {
    /// Current angle relative to the anchor [deg].
    pub relative_angle: f64,
    /// Target relative angle [deg].
    pub target_angle: f64,
    /// Current angular velocity [deg / time unit].
    pub angular_velocity: f64,
    pub load_factor: f64,
    pub external_strength: f64,
    pub mass: f64,
}

/// Intermediate terms and result of one PD evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseCommand {
    pub error: f64,
    pub proportional: f64,
    pub damping: f64,
    pub strength: f64,
    /// Angular velocity to write onto the body.
    pub angular_velocity: f64,
}

/// Evaluate the PD law.
///
/// # Arguments
/// - `input`: angles, velocity, load factor and mass for this tick.
/// - `gains`: proportional gain and damping coefficient.
/// - `p_base`: base proportional scale stamped by load aggregation.
#[inline]
pub fn pd_command(input: &PoseInput, gains: &PoseGains, p_base: f64) -> PoseCommand {
    let error = angle::delta(input.relative_angle, input.target_angle);
    let proportional = error * gains.p_gain * p_base;
    let damping = -input.angular_velocity * gains.damping;
    let strength = input.load_factor + input.external_strength;
    let angular_velocity = (proportional + damping) * strength * input.mass;

    PoseCommand {
        error,
        proportional,
        damping,
        strength,
        angular_velocity,
    }
}

/// Result of one controller tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseOutcome {
    /// Controller switched off; velocity left to physics.
    Inactive,
    /// Load aggregation has not reached this segment.
    LoadNotComputed,
    MissingBody,
    /// The anchor is configured but has no rigid body to measure against.
    MissingAnchor,
    /// Mass <= 0; nothing is commanded.
    NonPositiveMass,
    /// A velocity was written.
    Commanded(PoseCommand),
}

/// Per-segment pose controller state.
#[derive(Debug, Clone)]
pub struct PoseController {
    target_angle: f64,
    gains: PoseGains,
    base_proportional_scale: f64,
    external_strength: f64,
    max_angular_velocity: Option<f64>,
    active: bool,
    load: Option<SegmentLoad>,
}

impl Default for PoseController {
    fn default() -> Self {
        Self::new(0.0, PoseGains::default())
    }
}

impl PoseController {
    /// Active controller with no load computed yet.
    pub fn new(target_angle: f64, gains: PoseGains) -> Self {
        Self {
            target_angle,
            gains,
            base_proportional_scale: DEFAULT_P_BASE,
            external_strength: DEFAULT_EXTERNAL_STRENGTH,
            max_angular_velocity: None,
            active: true,
            load: None,
        }
    }

    pub fn with_external_strength(mut self, value: f64) -> Self {
        self.external_strength = value;
        self
    }

    /// Clamp the commanded velocity to `±limit`. Unclamped by default.
    pub fn with_max_angular_velocity(mut self, limit: Option<f64>) -> Self {
        self.max_angular_velocity = limit.filter(|l| *l > 0.0);
        self
    }

    #[inline]
    pub fn target_angle(&self) -> f64 {
        self.target_angle
    }

    #[inline]
    pub fn gains(&self) -> PoseGains {
        self.gains
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn external_strength(&self) -> f64 {
        self.external_strength
    }

    #[inline]
    pub fn base_proportional_scale(&self) -> f64 {
        self.base_proportional_scale
    }

    /// Aggregated load, `None` until load aggregation has visited the segment.
    #[inline]
    pub fn load(&self) -> Option<SegmentLoad> {
        self.load
    }

    pub(crate) fn apply_load(&mut self, load: SegmentLoad) {
        self.load = Some(load);
    }

    pub(crate) fn clear_load(&mut self) {
        self.load = None;
    }

    pub fn set_external_strength(&mut self, value: f64) {
        self.external_strength = value;
    }

    /// Set the base proportional scale. Non-positive values are rejected.
    ///
    /// Returns whether the value was accepted.
    pub fn set_base_proportional_scale(&mut self, value: f64) -> bool {
        if value > 0.0 {
            self.base_proportional_scale = value;
            true
        } else {
            warn!("rejected non-positive base proportional scale {value}");
            false
        }
    }

    /// Switch the controller on or off.
    ///
    /// Switching off zeroes the body's angular velocity so the segment
    /// goes limp without residual spin.
    pub fn set_active<R: RigidBody>(&mut self, active: bool, body: Option<&mut R>) {
        self.set_active_flag(active);
        if !active {
            if let Some(body) = body {
                body.set_angular_velocity(0.0);
            }
        }
    }

    /// Set the active flag without touching any body.
    pub(crate) fn set_active_flag(&mut self, active: bool) {
        self.active = active;
    }

    /// Run one control tick for segment `id`, measured against `anchor`.
    pub fn tick<B: BodySet>(&self, bodies: &mut B, id: SegmentId, anchor: Option<SegmentId>) -> PoseOutcome {
        if !self.active {
            return PoseOutcome::Inactive;
        }
        let Some(load) = self.load else {
            return PoseOutcome::LoadNotComputed;
        };

        let anchor_angle = match anchor {
            Some(a) => match bodies.rotation_of(a) {
                Some(reference) => Some(reference),
                None => return PoseOutcome::MissingAnchor,
            },
            None => None,
        };
        let Some(body) = bodies.body_mut(id) else {
            return PoseOutcome::MissingBody;
        };
        let mass = body.mass();
        if mass <= 0.0 {
            return PoseOutcome::NonPositiveMass;
        }

        let relative_angle = match anchor_angle {
            Some(reference) => angle::delta(reference, body.rotation()),
            None => angle::normalize(body.rotation()),
        };

        let input = PoseInput {
            relative_angle,
            target_angle: self.target_angle,
            angular_velocity: body.angular_velocity(),
            load_factor: load.load_factor,
            external_strength: self.external_strength,
            mass,
        };
        let mut command = pd_command(&input, &self.gains, self.base_proportional_scale);
        if let Some(limit) = self.max_angular_velocity {
            command.angular_velocity = command.angular_velocity.clamp(-limit, limit);
        }

        body.set_angular_velocity(command.angular_velocity);
        PoseOutcome::Commanded(command)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
