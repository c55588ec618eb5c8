//! Ragdoll ⇄ Posed mode coordinator.
//!
//! One coordinator per figure owns the mode; segments and joints never keep
//! their own half of it. Every transition, from the caller's point of view,
//! atomically:
//!
//! - sets every well-formed segment's controller active = (mode == Posed),
//! - sets every joint limiter's enable flag = (mode == Ragdoll),
//! - applies the configured self-collision policy for the new mode.
//!
//! ```text
//! Posed ──toggle──▶ Ragdoll
//!   ▲                 │
//!   └─────toggle──────┘
//! set_mode(m): any ──▶ m   (idempotent)
//! ```
//!
//! Inert segments (no rigid body, or an anchor or limit reference without
//! one) are excluded from the transition and reported. Their controller and
//! limiter are switched off; the transition still completes for every other
//! segment.

use std::collections::HashSet;

use ragdoll_common::error::SegmentFault;
use ragdoll_common::state::{PairPolicy, RagdollMode};
use tracing::{info, warn};

use crate::body::{BodySet, CollisionFilter, SegmentId};
use crate::control::limiter::JointLimiter;
use crate::segment::Segment;

/// Self-collision handling on mode entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionPolicy {
    /// Applied on entering `Posed`.
    pub posed: PairPolicy,
    /// Applied on entering `Ragdoll`.
    pub ragdoll: PairPolicy,
    allow: HashSet<(SegmentId, SegmentId)>,
}

impl CollisionPolicy {
    pub fn new(posed: PairPolicy, ragdoll: PairPolicy) -> Self {
        Self {
            posed,
            ragdoll,
            allow: HashSet::new(),
        }
    }

    /// Exempt a pair from `SuppressExceptAllowList`. Order does not matter.
    pub fn allow_pair(mut self, a: SegmentId, b: SegmentId) -> Self {
        self.allow.insert(ordered(a, b));
        self
    }

    #[inline]
    pub fn is_allowed(&self, a: SegmentId, b: SegmentId) -> bool {
        self.allow.contains(&ordered(a, b))
    }

    #[inline]
    pub fn for_mode(&self, mode: RagdollMode) -> PairPolicy {
        match mode {
            RagdollMode::Posed => self.posed,
            RagdollMode::Ragdoll => self.ragdoll,
        }
    }
}

#[inline]
fn ordered(a: SegmentId, b: SegmentId) -> (SegmentId, SegmentId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Summary of one applied transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeTransition {
    pub from: RagdollMode,
    pub to: RagdollMode,
    /// Controllers whose active flag was written.
    pub controllers: usize,
    /// Limiters whose enable flag was written.
    pub limiters: usize,
    /// Segment pairs whose collision state was written.
    pub pairs: usize,
    /// Segments left out because they or their reference have no rigid body.
    pub excluded: Vec<SegmentId>,
}

/// Figure-wide mode state machine.
#[derive(Debug, Clone)]
pub struct RagdollModeCoordinator {
    mode: RagdollMode,
    policy: CollisionPolicy,
    transitions: u64,
}

impl RagdollModeCoordinator {
    /// Coordinator holding `initial`; nothing is applied until the first transition.
    pub fn new(initial: RagdollMode, policy: CollisionPolicy) -> Self {
        Self {
            mode: initial,
            policy,
            transitions: 0,
        }
    }

    #[inline]
    pub const fn mode(&self) -> RagdollMode {
        self.mode
    }

    #[inline]
    pub fn policy(&self) -> &CollisionPolicy {
        &self.policy
    }

    /// Number of transitions applied so far.
    #[inline]
    pub const fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Flip the mode and apply it.
    pub fn toggle<B: BodySet, C: CollisionFilter>(
        &mut self,
        segments: &mut [Segment],
        joints: &mut [JointLimiter],
        bodies: &mut B,
        collisions: &mut C,
    ) -> ModeTransition {
        let target = self.mode.flipped();
        self.toggle_explicit(target, segments, joints, bodies, collisions)
    }

    /// Set the mode to `target` and apply it, even if it is already current.
    pub fn toggle_explicit<B: BodySet, C: CollisionFilter>(
        &mut self,
        target: RagdollMode,
        segments: &mut [Segment],
        joints: &mut [JointLimiter],
        bodies: &mut B,
        collisions: &mut C,
    ) -> ModeTransition {
        let from = self.mode;
        let mut excluded = Vec::new();
        let mut eligible = Vec::with_capacity(segments.len());

        flag_missing_references(segments, joints, bodies);
        for (i, seg) in segments.iter_mut().enumerate() {
            let id = SegmentId(i as u16);
            if bodies.contains(id) {
                seg.clear(SegmentFault::MISSING_BODY);
            } else {
                seg.raise(SegmentFault::MISSING_BODY);
            }

            if seg.faults().is_inert() {
                seg.controller_mut().set_active(false, bodies.body_mut(id));
                excluded.push(id);
                warn!(
                    "segment '{}' is inert ({:?}); excluded from {target} transition",
                    seg.name(),
                    seg.faults() & SegmentFault::INERT_MASK
                );
            } else {
                eligible.push(id);
            }
        }

        let active = target.controllers_active();
        for &id in &eligible {
            segments[id.index()]
                .controller_mut()
                .set_active(active, bodies.body_mut(id));
        }

        let enabled = target.limits_enabled();
        let mut limiters = 0;
        for joint in joints.iter_mut() {
            let usable = segments
                .get(joint.segment().index())
                .is_some_and(|s| !s.faults().is_inert());
            if usable {
                joint.enable_limits(enabled);
                limiters += 1;
            } else {
                joint.enable_limits(false);
            }
        }

        let pairs = self.apply_collision_policy(target, &eligible, collisions);

        self.mode = target;
        self.transitions += 1;
        info!(
            "mode {from} -> {target}: {} controller(s), {limiters} limiter(s), {pairs} pair(s), {} excluded",
            eligible.len(),
            excluded.len()
        );

        ModeTransition {
            from,
            to: target,
            controllers: eligible.len(),
            limiters,
            pairs,
            excluded,
        }
    }

    fn apply_collision_policy<C: CollisionFilter>(
        &self,
        target: RagdollMode,
        eligible: &[SegmentId],
        collisions: &mut C,
    ) -> usize {
        let policy = self.policy.for_mode(target);
        if policy == PairPolicy::Unchanged {
            return 0;
        }

        let mut written = 0;
        for (i, &a) in eligible.iter().enumerate() {
            for &b in &eligible[i + 1..] {
                if let Some(ignored) = policy.ignores(self.policy.is_allowed(a, b)) {
                    collisions.set_pair_ignored(a, b, ignored);
                    written += 1;
                }
            }
        }
        written
    }
}

/// Raise `MISSING_ANCHOR` on every segment whose anchor, or whose joint's
/// reference, has no rigid body. Clears it everywhere else.
///
/// Returns the flagged segments.
pub(crate) fn flag_missing_references<B: BodySet>(
    segments: &mut [Segment],
    joints: &[JointLimiter],
    bodies: &B,
) -> Vec<SegmentId> {
    let missing = |reference: Option<SegmentId>| reference.is_some_and(|r| !bodies.contains(r));

    let mut flagged: Vec<SegmentId> = segments
        .iter()
        .enumerate()
        .filter(|(_, seg)| missing(seg.anchor()))
        .map(|(i, _)| SegmentId(i as u16))
        .collect();
    for joint in joints {
        if missing(joint.reference()) && !flagged.contains(&joint.segment()) {
            flagged.push(joint.segment());
        }
    }

    for seg in segments.iter_mut() {
        seg.clear(SegmentFault::MISSING_ANCHOR);
    }
    for id in &flagged {
        if let Some(seg) = segments.get_mut(id.index()) {
            seg.raise(SegmentFault::MISSING_ANCHOR);
        }
    }
    flagged
}

// ─── Tests ──────────────────────────────────────────────────────────
