//! One articulated figure: segment arena, joint limiters and mode state.
//!
//! # Tick order
//!
//! ```text
//! aggregate_loads()   once at setup (explicit re-run only)
//! activate()          apply the initial mode
//! loop {
//!     tick(dt)        1. every enabled limiter
//!                     2. every active controller
//!     physics step    owned by the host
//! }
//! ```
//!
//! Limiters run before controllers so a controller always reads an
//! orientation already clamped in the same tick.

use ragdoll_common::error::SegmentFault;
use ragdoll_common::state::RagdollMode;
use tracing::{debug, warn};

use crate::body::{BodySet, CollisionFilter, SegmentId};
use crate::control::limiter::{JointLimiter, LimitOutcome};
use crate::control::pose::PoseOutcome;
use crate::load::{LoadAggregator, LoadReport};
use crate::segment::Segment;
use crate::state::mode::{CollisionPolicy, ModeTransition, RagdollModeCoordinator, flag_missing_references};

/// Counters for one figure tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Limiters that were enabled and had a body.
    pub limiters_run: usize,
    /// Limiters that wrote a correction.
    pub corrections: usize,
    /// Controllers that wrote an angular velocity.
    pub commanded: usize,
    /// Active controllers that could not run (no load, no body, bad mass).
    pub skipped: usize,
    /// Largest |commanded angular velocity| this tick.
    pub max_abs_command: f64,
}

/// A complete controllable figure.
#[derive(Debug, Clone)]
pub struct Figure {
    name: String,
    segments: Vec<Segment>,
    joints: Vec<JointLimiter>,
    roots: Vec<SegmentId>,
    aggregator: LoadAggregator,
    initial_mode: RagdollMode,
    coordinator: RagdollModeCoordinator,
}

impl Figure {
    /// Figure over `segments` with roots derived from the carry graph.
    ///
    /// Controllers and limiters start with the flags of the initial mode.
    /// Collision policy and body checks wait for [`Figure::activate`].
    pub fn new(name: impl Into<String>, segments: Vec<Segment>, joints: Vec<JointLimiter>) -> Self {
        let roots = derive_roots(&segments);
        let mut figure = Self {
            name: name.into(),
            segments,
            joints,
            roots,
            aggregator: LoadAggregator::default(),
            initial_mode: RagdollMode::default(),
            coordinator: RagdollModeCoordinator::new(RagdollMode::default(), CollisionPolicy::default()),
        };
        figure.apply_mode_flags();
        figure
    }

    /// Override the derived roots. An empty list keeps the derived roots.
    pub fn with_roots(mut self, roots: Vec<SegmentId>) -> Self {
        if !roots.is_empty() {
            self.roots = roots;
        }
        self
    }

    pub fn with_p_base(mut self, p_base: f64) -> Self {
        self.aggregator = LoadAggregator::new(p_base);
        self
    }

    /// Mode and collision policy applied by [`Figure::activate`].
    pub fn with_mode(mut self, initial: RagdollMode, policy: CollisionPolicy) -> Self {
        self.initial_mode = initial;
        self.coordinator = RagdollModeCoordinator::new(initial, policy);
        self.apply_mode_flags();
        self
    }

    fn apply_mode_flags(&mut self) {
        let mode = self.coordinator.mode();
        for seg in &mut self.segments {
            seg.controller_mut().set_active_flag(mode.controllers_active());
        }
        for joint in &mut self.joints {
            joint.enable_limits(mode.limits_enabled());
        }
    }

    /// Change the mode [`Figure::activate`] applies.
    pub fn set_initial_mode(&mut self, mode: RagdollMode) {
        self.initial_mode = mode;
    }

    #[inline]
    pub fn initial_mode(&self) -> RagdollMode {
        self.initial_mode
    }

    // ─── Lifecycle ──────────────────────────────────────────────────

    /// Compute every segment's load from scratch.
    ///
    /// Also flags segments whose anchor or joint reference has no rigid body.
    pub fn aggregate_loads<B: BodySet>(&mut self, bodies: &B) -> LoadReport {
        let mut report = self
            .aggregator
            .compute_loads(&mut self.segments, bodies, &self.roots);

        report.missing_anchor = flag_missing_references(&mut self.segments, &self.joints, bodies);
        for id in &report.missing_anchor {
            if let Some(seg) = self.segments.get(id.index()) {
                warn!(
                    "segment '{}' is measured against a segment without a rigid body; control and limits stay off",
                    seg.name()
                );
            }
        }
        report
    }

    /// Apply the initial mode to every member.
    pub fn activate<B: BodySet, C: CollisionFilter>(
        &mut self,
        bodies: &mut B,
        collisions: &mut C,
    ) -> ModeTransition {
        let initial = self.initial_mode;
        self.set_mode(initial, bodies, collisions)
    }

    /// One control tick: limiters first, then controllers.
    pub fn tick<B: BodySet>(&self, bodies: &mut B, dt: f64) -> TickReport {
        let mut report = TickReport::default();

        for joint in &self.joints {
            match joint.tick(bodies, dt) {
                LimitOutcome::Disabled
                | LimitOutcome::MissingBody
                | LimitOutcome::MissingReference => {}
                LimitOutcome::WithinLimits => report.limiters_run += 1,
                LimitOutcome::Corrected(_) => {
                    report.limiters_run += 1;
                    report.corrections += 1;
                }
            }
        }

        for (i, seg) in self.segments.iter().enumerate() {
            let id = SegmentId(i as u16);
            match seg.controller().tick(bodies, id, seg.anchor()) {
                PoseOutcome::Inactive => {}
                PoseOutcome::Commanded(cmd) => {
                    report.commanded += 1;
                    report.max_abs_command = report.max_abs_command.max(cmd.angular_velocity.abs());
                }
                PoseOutcome::LoadNotComputed
                | PoseOutcome::MissingBody
                | PoseOutcome::MissingAnchor
                | PoseOutcome::NonPositiveMass => report.skipped += 1,
            }
        }

        report
    }

    // ─── Mode ───────────────────────────────────────────────────────

    #[inline]
    pub fn mode(&self) -> RagdollMode {
        self.coordinator.mode()
    }

    pub fn toggle<B: BodySet, C: CollisionFilter>(
        &mut self,
        bodies: &mut B,
        collisions: &mut C,
    ) -> ModeTransition {
        self.coordinator
            .toggle(&mut self.segments, &mut self.joints, bodies, collisions)
    }

    pub fn set_mode<B: BodySet, C: CollisionFilter>(
        &mut self,
        target: RagdollMode,
        bodies: &mut B,
        collisions: &mut C,
    ) -> ModeTransition {
        self.coordinator
            .toggle_explicit(target, &mut self.segments, &mut self.joints, bodies, collisions)
    }

    // ─── Per-segment mutators ───────────────────────────────────────
    //
    // Each returns `false` when the id is unknown or the value was rejected.

    pub fn set_segment_active<B: BodySet>(&mut self, id: SegmentId, active: bool, bodies: &mut B) -> bool {
        let Some(seg) = self.segments.get_mut(id.index()) else {
            return false;
        };
        seg.controller_mut().set_active(active, bodies.body_mut(id));
        true
    }

    pub fn set_external_strength(&mut self, id: SegmentId, value: f64) -> bool {
        let Some(seg) = self.segments.get_mut(id.index()) else {
            return false;
        };
        seg.controller_mut().set_external_strength(value);
        true
    }

    pub fn set_base_proportional_scale(&mut self, id: SegmentId, value: f64) -> bool {
        self.segments
            .get_mut(id.index())
            .is_some_and(|seg| seg.controller_mut().set_base_proportional_scale(value))
    }

    pub fn set_limits(&mut self, id: SegmentId, lower: f64, upper: f64) -> bool {
        let Some(joint) = self.joint_mut(id) else {
            return false;
        };
        joint.set_limits(lower, upper);
        true
    }

    pub fn enable_limits(&mut self, id: SegmentId, enabled: bool) -> bool {
        let Some(joint) = self.joint_mut(id) else {
            return false;
        };
        joint.enable_limits(enabled);
        true
    }

    // ─── Queries ────────────────────────────────────────────────────

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn p_base(&self) -> f64 {
        self.aggregator.p_base()
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn joints(&self) -> &[JointLimiter] {
        &self.joints
    }

    #[inline]
    pub fn roots(&self) -> &[SegmentId] {
        &self.roots
    }

    #[inline]
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.index())
    }

    pub fn segment_id(&self, name: &str) -> Option<SegmentId> {
        self.segments
            .iter()
            .position(|s| s.name() == name)
            .map(|i| SegmentId(i as u16))
    }

    /// Limiter on `id`'s hinge, if it has one.
    pub fn joint(&self, id: SegmentId) -> Option<&JointLimiter> {
        self.joints.iter().find(|j| j.segment() == id)
    }

    fn joint_mut(&mut self, id: SegmentId) -> Option<&mut JointLimiter> {
        self.joints.iter_mut().find(|j| j.segment() == id)
    }

    pub fn faults(&self, id: SegmentId) -> Option<SegmentFault> {
        self.segment(id).map(Segment::faults)
    }

    /// Every segment carrying at least one fault.
    pub fn degraded(&self) -> Vec<(SegmentId, SegmentFault)> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.faults().is_empty())
            .map(|(i, s)| (SegmentId(i as u16), s.faults()))
            .collect()
    }
}

/// Segments no other segment carries.
fn derive_roots(segments: &[Segment]) -> Vec<SegmentId> {
    let mut carried = vec![false; segments.len()];
    for seg in segments {
        for c in seg.carries() {
            if let Some(flag) = carried.get_mut(c.index()) {
                *flag = true;
            }
        }
    }
    let roots: Vec<SegmentId> = carried
        .iter()
        .enumerate()
        .filter(|(_, c)| !**c)
        .map(|(i, _)| SegmentId(i as u16))
        .collect();
    debug!("derived {} root(s) from {} segment(s)", roots.len(), segments.len());
    roots
}

// ─── Tests ──────────────────────────────────────────────────────────
