//! Reference rigid-body simulation.
//!
//! Stands in for the external physics engine: integrates orientation from
//! angular velocity with linear angular drag, and [`IgnoredPairs`] records
//! the collision pairs the engine would skip. Orientation is never wrapped,
//! so bodies accumulate turns the way engine rotations do. Used by the
//! binary, integration tests and benchmarks.

use std::collections::HashSet;

use ragdoll_common::consts::DEFAULT_ANGULAR_DRAG;
use ragdoll_common::figure::BodyConfig;
use tracing::trace;

use crate::body::{BodySet, CollisionFilter, RigidBody, SegmentId};

/// One simulated rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimBody {
    rotation: f64,
    angular_velocity: f64,
    mass: f64,
}

impl SimBody {
    /// Body at rest at 0°.
    pub fn new(mass: f64) -> Self {
        Self {
            rotation: 0.0,
            angular_velocity: 0.0,
            mass,
        }
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_angular_velocity(mut self, degrees_per_unit: f64) -> Self {
        self.angular_velocity = degrees_per_unit;
        self
    }
}

impl From<&BodyConfig> for SimBody {
    fn from(cfg: &BodyConfig) -> Self {
        Self::new(cfg.mass)
            .with_rotation(cfg.angle)
            .with_angular_velocity(cfg.angular_velocity)
    }
}

impl RigidBody for SimBody {
    #[inline]
    fn rotation(&self) -> f64 {
        self.rotation
    }
    #[inline]
    fn set_rotation(&mut self, degrees: f64) {
        self.rotation = degrees;
    }
    #[inline]
    fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }
    #[inline]
    fn set_angular_velocity(&mut self, degrees_per_unit: f64) {
        self.angular_velocity = degrees_per_unit;
    }
    #[inline]
    fn mass(&self) -> f64 {
        self.mass
    }
}

/// Arena of simulated bodies indexed by [`SegmentId`].
#[derive(Debug, Clone)]
pub struct SimWorld {
    bodies: Vec<Option<SimBody>>,
    angular_drag: f64,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            angular_drag: DEFAULT_ANGULAR_DRAG,
        }
    }

    pub fn with_angular_drag(mut self, drag: f64) -> Self {
        self.angular_drag = drag.max(0.0);
        self
    }

    /// Append a body; its id is the next arena slot.
    pub fn insert(&mut self, body: SimBody) -> SegmentId {
        self.push(Some(body))
    }

    /// Append an empty slot, modelling a segment without a rigid body.
    pub fn insert_missing(&mut self) -> SegmentId {
        self.push(None)
    }

    fn push(&mut self, slot: Option<SimBody>) -> SegmentId {
        let id = SegmentId(self.bodies.len() as u16);
        self.bodies.push(slot);
        id
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Integrate every body over `dt`.
    pub fn integrate(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let decay = 1.0 / (1.0 + self.angular_drag * dt);
        for body in self.bodies.iter_mut().flatten() {
            body.rotation += body.angular_velocity * dt;
            body.angular_velocity *= decay;
        }
        trace!("integrated {} bodies over dt={dt}", self.bodies.len());
    }
}

impl BodySet for SimWorld {
    type Body = SimBody;

    #[inline]
    fn body(&self, id: SegmentId) -> Option<&SimBody> {
        self.bodies.get(id.index()).and_then(Option::as_ref)
    }

    #[inline]
    fn body_mut(&mut self, id: SegmentId) -> Option<&mut SimBody> {
        self.bodies.get_mut(id.index()).and_then(Option::as_mut)
    }
}

/// Collision pairs whose response is switched off.
#[derive(Debug, Clone, Default)]
pub struct IgnoredPairs {
    pairs: HashSet<(SegmentId, SegmentId)>,
}

impl IgnoredPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether collision response between `a` and `b` is currently ignored.
    pub fn is_pair_ignored(&self, a: SegmentId, b: SegmentId) -> bool {
        self.pairs.contains(&ordered(a, b))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[inline]
fn ordered(a: SegmentId, b: SegmentId) -> (SegmentId, SegmentId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl CollisionFilter for IgnoredPairs {
    fn set_pair_ignored(&mut self, a: SegmentId, b: SegmentId, ignored: bool) {
        if a == b {
            return;
        }
        if ignored {
            self.pairs.insert(ordered(a, b));
        } else {
            self.pairs.remove(&ordered(a, b));
        }
    }
}
