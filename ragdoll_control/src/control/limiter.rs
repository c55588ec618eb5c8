//! Wrap-safe hinge limiter.
//!
//! Bounds are enforced on the relative angle `delta(reference, self)`,
//! never on a body's raw accumulated rotation, so a segment that has spun
//! any number of turns is still limited correctly. The limiter keeps no
//! state between ticks: it either snaps the body onto the bound or rewinds
//! it toward the bound at a bounded rate.

use ragdoll_common::consts::{DEFAULT_LOWER_ANGLE, DEFAULT_REWIND_SPEED, DEFAULT_UPPER_ANGLE};
use ragdoll_common::state::CorrectionMode;
use tracing::{trace, warn};

use crate::angle;
use crate::body::{BodySet, RigidBody, SegmentId};

/// Correction written by one limiter tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitCorrection {
    /// Relative angle before clamping [deg].
    pub relative_angle: f64,
    /// Relative angle after clamping [deg].
    pub clamped_angle: f64,
    /// World orientation before the correction [deg].
    pub from: f64,
    /// World orientation written [deg].
    pub to: f64,
}

/// Result of one limiter tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitOutcome {
    Disabled,
    MissingBody,
    /// The reference is configured but has no rigid body.
    MissingReference,
    WithinLimits,
    Corrected(LimitCorrection),
}

/// Relative angle limit on one segment's hinge.
#[derive(Debug, Clone)]
pub struct JointLimiter {
    segment: SegmentId,
    reference: Option<SegmentId>,
    lower: f64,
    upper: f64,
    enabled: bool,
    correction: CorrectionMode,
    rewind_speed: f64,
    zero_angular_velocity: bool,
}

impl JointLimiter {
    /// Enabled instant limiter with default bounds.
    pub fn new(segment: SegmentId, reference: Option<SegmentId>) -> Self {
        Self {
            segment,
            reference,
            lower: DEFAULT_LOWER_ANGLE,
            upper: DEFAULT_UPPER_ANGLE,
            enabled: true,
            correction: CorrectionMode::Instant,
            rewind_speed: DEFAULT_REWIND_SPEED,
            zero_angular_velocity: true,
        }
    }

    pub fn with_limits(mut self, lower: f64, upper: f64) -> Self {
        self.set_limits(lower, upper);
        self
    }

    pub fn with_correction(mut self, correction: CorrectionMode, rewind_speed: f64) -> Self {
        self.correction = correction;
        self.rewind_speed = rewind_speed.max(0.0);
        self
    }

    pub fn with_zero_angular_velocity(mut self, zero: bool) -> Self {
        self.zero_angular_velocity = zero;
        self
    }

    #[inline]
    pub fn segment(&self) -> SegmentId {
        self.segment
    }

    #[inline]
    pub fn reference(&self) -> Option<SegmentId> {
        self.reference
    }

    #[inline]
    pub fn limits(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn correction(&self) -> CorrectionMode {
        self.correction
    }

    /// Set the relative bounds [deg]. Inverted bounds are swapped.
    pub fn set_limits(&mut self, lower: f64, upper: f64) {
        if lower > upper {
            warn!(
                "joint on segment {}: lower {lower} > upper {upper}, swapping",
                self.segment
            );
            self.lower = upper;
            self.upper = lower;
        } else {
            self.lower = lower;
            self.upper = upper;
        }
    }

    pub fn enable_limits(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Run one limiter tick over `dt` time units.
    pub fn tick<B: BodySet>(&self, bodies: &mut B, dt: f64) -> LimitOutcome {
        if !self.enabled {
            return LimitOutcome::Disabled;
        }

        let reference_angle = match self.reference {
            Some(r) => match bodies.rotation_of(r) {
                Some(angle) => angle,
                None => return LimitOutcome::MissingReference,
            },
            None => 0.0,
        };
        let Some(body) = bodies.body_mut(self.segment) else {
            return LimitOutcome::MissingBody;
        };

        let self_angle = body.rotation();
        let relative_angle = angle::delta(reference_angle, self_angle);
        let clamped_angle = relative_angle.clamp(self.lower, self.upper);
        if angle::approximately(relative_angle, clamped_angle) {
            return LimitOutcome::WithinLimits;
        }

        let target = reference_angle + clamped_angle;
        let to = match self.correction {
            CorrectionMode::Instant => target,
            CorrectionMode::BoundedRate => {
                angle::move_towards(self_angle, target, self.rewind_speed * dt.max(0.0))
            }
        };
        body.set_rotation(to);
        if self.zero_angular_velocity {
            body.set_angular_velocity(0.0);
        }

        trace!(
            "segment {} limited: relative {relative_angle:.3} -> {clamped_angle:.3}, world {self_angle:.3} -> {to:.3}",
            self.segment
        );
        LimitOutcome::Corrected(LimitCorrection {
            relative_angle,
            clamped_angle,
            from: self_angle,
            to,
        })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
