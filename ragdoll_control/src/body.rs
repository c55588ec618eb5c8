//! Seams to the external physics engine.
//!
//! The core never owns rigid bodies. It reads and writes them through
//! [`BodySet`], addressed by the stable [`SegmentId`] arena index assigned
//! when a figure is built, and toggles self-collision through
//! [`CollisionFilter`].

use std::fmt;

/// Stable arena index of a segment within one figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub u16);

impl SegmentId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One rigid body as seen by the control core.
///
/// Angles are degrees and may carry any number of accumulated turns.
/// Writes must take effect before the next physics integration step.
pub trait RigidBody {
    /// World orientation [deg].
    fn rotation(&self) -> f64;
    fn set_rotation(&mut self, degrees: f64);
    /// Angular velocity [deg / time unit].
    fn angular_velocity(&self) -> f64;
    fn set_angular_velocity(&mut self, degrees_per_unit: f64);
    fn mass(&self) -> f64;
}

/// Lookup of the rigid bodies backing a figure's segments.
///
/// Returning `None` means the segment has no body attached; the core
/// degrades that segment instead of failing.
pub trait BodySet {
    type Body: RigidBody;

    fn body(&self, id: SegmentId) -> Option<&Self::Body>;
    fn body_mut(&mut self, id: SegmentId) -> Option<&mut Self::Body>;

    #[inline]
    fn contains(&self, id: SegmentId) -> bool {
        self.body(id).is_some()
    }

    /// World angle of `id`, if it has a body.
    #[inline]
    fn rotation_of(&self, id: SegmentId) -> Option<f64> {
        self.body(id).map(RigidBody::rotation)
    }
}

/// Collision-pair suppression service.
pub trait CollisionFilter {
    /// Ignore (`true`) or restore (`false`) collision response between two segments.
    fn set_pair_ignored(&mut self, a: SegmentId, b: SegmentId, ignored: bool);
}

/// Filter that discards every request, for hosts without self-collision.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCollisionFilter;

impl CollisionFilter for NoCollisionFilter {
    fn set_pair_ignored(&mut self, _a: SegmentId, _b: SegmentId, _ignored: bool) {}
}
