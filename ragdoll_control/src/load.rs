//! Static load propagation over the carried-parts forest.
//!
//! A post-order walk from every root computes, children before parents:
//!
//! ```text
//! total_load(S)  = mass(S) + Σ total_load(C) * load_influence(S)
//! load_factor(S) = K(S) * (total_load(S) * leverage(S)) / mass(S)     mass(S) > 0
//! load_factor(S) = 0                                                   mass(S) <= 0
//! ```
//!
//! One visited map is shared across all roots, so each segment is computed
//! exactly once even when several carriers share it. An edge back to a
//! segment still on the walk path closes a cycle; it is skipped and flagged.
//! The walk uses an explicit stack, so depth is bounded by memory rather
//! than the call stack.
//!
//! Loads are computed once at setup. A re-run recomputes every segment from
//! scratch; there is no incremental update.

use ragdoll_common::consts::DEFAULT_P_BASE;
use ragdoll_common::error::SegmentFault;
use tracing::{debug, info, warn};

use crate::body::{BodySet, RigidBody, SegmentId};
use crate::control::pose::SegmentLoad;
use crate::segment::Segment;

/// Outcome of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Segments in the order their loads were computed (children first).
    pub order: Vec<SegmentId>,
    /// Segments with mass <= 0 (load factor forced to 0).
    pub non_positive_mass: Vec<SegmentId>,
    /// Segments without a rigid body (no load computed).
    pub missing_body: Vec<SegmentId>,
    /// Segments whose anchor or joint reference has no rigid body. Filled in
    /// by [`crate::figure::Figure::aggregate_loads`].
    pub missing_anchor: Vec<SegmentId>,
    /// `(carrier, carried)` edges skipped because they close a cycle.
    pub cyclic_edges: Vec<(SegmentId, SegmentId)>,
    /// Segments not reachable from any root (no load computed).
    pub unreachable: Vec<SegmentId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Enter(SegmentId),
    Exit(SegmentId),
}

/// Computes total load and load factor for a figure's segments.
#[derive(Debug, Clone, Copy)]
pub struct LoadAggregator {
    p_base: f64,
}

impl Default for LoadAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_P_BASE)
    }
}

impl LoadAggregator {
    /// `p_base` is the run-wide proportional calibration stamped onto every
    /// traversed segment's controller.
    pub fn new(p_base: f64) -> Self {
        Self { p_base }
    }

    #[inline]
    pub fn p_base(&self) -> f64 {
        self.p_base
    }

    /// Compute loads for everything reachable from `roots`.
    ///
    /// Root ids outside the arena are ignored with a warning.
    pub fn compute_loads<B: BodySet>(
        &self,
        segments: &mut [Segment],
        bodies: &B,
        roots: &[SegmentId],
    ) -> LoadReport {
        let mut report = LoadReport::default();
        let mut marks = vec![Mark::Unvisited; segments.len()];

        for seg in segments.iter_mut() {
            seg.controller_mut().clear_load();
            seg.clear(
                SegmentFault::MISSING_BODY | SegmentFault::NON_POSITIVE_MASS | SegmentFault::CYCLIC_CARRY,
            );
            seg.raise(SegmentFault::LOAD_NOT_COMPUTED);
        }

        let mut stack: Vec<Frame> = Vec::new();
        for &root in roots {
            if root.index() >= segments.len() {
                warn!("load root {root} is not part of the figure, skipping");
                continue;
            }
            stack.push(Frame::Enter(root));

            while let Some(frame) = stack.pop() {
                match frame {
                    Frame::Enter(id) => {
                        if marks[id.index()] != Mark::Unvisited {
                            continue;
                        }
                        marks[id.index()] = Mark::OnPath;
                        stack.push(Frame::Exit(id));

                        let seg = &segments[id.index()];
                        for &child in seg.carries().iter().rev() {
                            match marks.get(child.index()) {
                                Some(Mark::Unvisited) => stack.push(Frame::Enter(child)),
                                Some(Mark::OnPath) => report.cyclic_edges.push((id, child)),
                                Some(Mark::Done) | None => {}
                            }
                        }
                    }
                    Frame::Exit(id) => {
                        self.compute_one(segments, bodies, &marks, id, &mut report);
                        marks[id.index()] = Mark::Done;
                        report.order.push(id);
                    }
                }
            }
        }

        for &(carrier, carried) in &report.cyclic_edges {
            let seg = &mut segments[carrier.index()];
            seg.raise(SegmentFault::CYCLIC_CARRY);
            warn!(
                "segment '{}' carries {carried}, which closes a cycle; edge skipped",
                seg.name()
            );
        }

        report.unreachable = marks
            .iter()
            .enumerate()
            .filter(|(_, m)| **m == Mark::Unvisited)
            .map(|(i, _)| SegmentId(i as u16))
            .collect();
        if !report.unreachable.is_empty() {
            warn!(
                "{} segment(s) unreachable from the load roots stay uncontrolled",
                report.unreachable.len()
            );
        }

        info!(
            "load aggregation: {} computed, {} without body, {} with non-positive mass, {} cyclic edge(s)",
            report.order.len() - report.missing_body.len(),
            report.missing_body.len(),
            report.non_positive_mass.len(),
            report.cyclic_edges.len()
        );
        report
    }

    fn compute_one<B: BodySet>(
        &self,
        segments: &mut [Segment],
        bodies: &B,
        marks: &[Mark],
        id: SegmentId,
        report: &mut LoadReport,
    ) {
        let seg = &segments[id.index()];
        let params = seg.load_params();

        let carried: f64 = seg
            .carries()
            .iter()
            .filter(|c| marks.get(c.index()) == Some(&Mark::Done))
            .filter_map(|c| segments[c.index()].total_load())
            .map(|child_load| child_load * params.load_influence_factor)
            .sum();

        let mass = bodies.body(id).map(RigidBody::mass);
        let seg = &mut segments[id.index()];
        seg.controller_mut().set_base_proportional_scale(self.p_base);

        let Some(mass) = mass else {
            seg.raise(SegmentFault::MISSING_BODY);
            report.missing_body.push(id);
            warn!("segment '{}' has no rigid body; controller stays inert", seg.name());
            return;
        };

        let total_load = mass + carried;
        let load_factor = if mass > 0.0 {
            params.base_torque_factor_k * ((total_load * params.leverage_factor) / mass)
        } else {
            seg.raise(SegmentFault::NON_POSITIVE_MASS);
            report.non_positive_mass.push(id);
            warn!(
                "segment '{}' has mass {mass}; load factor set to 0",
                seg.name()
            );
            0.0
        };

        seg.controller_mut().apply_load(SegmentLoad {
            total_load,
            load_factor,
        });
        seg.clear(SegmentFault::LOAD_NOT_COMPUTED);
        debug!(
            "[load] {}: total load = {total_load:.2}, load factor = {load_factor:.2}",
            seg.name()
        );
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
