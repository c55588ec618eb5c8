//! Arena node for one segment of a figure.
//!
//! Segments refer to each other by [`SegmentId`] only: the carried-parts
//! forest is an adjacency list over the arena, independent of any scene
//! graph, and may share sub-trees or even contain cycles.

use ragdoll_common::consts::{
    DEFAULT_BASE_TORQUE_FACTOR_K, DEFAULT_LEVERAGE_FACTOR, DEFAULT_LOAD_INFLUENCE_FACTOR,
};
use ragdoll_common::error::SegmentFault;

use crate::body::SegmentId;
use crate::control::pose::PoseController;

/// Inputs of the load propagation formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadParams {
    /// Joint-specific mechanical advantage multiplier.
    pub leverage_factor: f64,
    /// Share of each carried child's total load transferred to this segment.
    pub load_influence_factor: f64,
    /// Base torque factor `K`.
    pub base_torque_factor_k: f64,
}

impl Default for LoadParams {
    fn default() -> Self {
        Self {
            leverage_factor: DEFAULT_LEVERAGE_FACTOR,
            load_influence_factor: DEFAULT_LOAD_INFLUENCE_FACTOR,
            base_torque_factor_k: DEFAULT_BASE_TORQUE_FACTOR_K,
        }
    }
}

/// One segment: topology, load inputs, controller and accumulated faults.
#[derive(Debug, Clone)]
pub struct Segment {
    name: String,
    anchor: Option<SegmentId>,
    carries: Vec<SegmentId>,
    load_params: LoadParams,
    controller: PoseController,
    faults: SegmentFault,
}

impl Segment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            anchor: None,
            carries: Vec::new(),
            load_params: LoadParams::default(),
            controller: PoseController::default(),
            faults: SegmentFault::LOAD_NOT_COMPUTED,
        }
    }

    pub fn with_anchor(mut self, anchor: Option<SegmentId>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_carries(mut self, carries: Vec<SegmentId>) -> Self {
        self.carries = carries;
        self
    }

    pub fn with_load_params(mut self, params: LoadParams) -> Self {
        self.load_params = params;
        self
    }

    pub fn with_controller(mut self, controller: PoseController) -> Self {
        self.controller = controller;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn anchor(&self) -> Option<SegmentId> {
        self.anchor
    }

    #[inline]
    pub fn carries(&self) -> &[SegmentId] {
        &self.carries
    }

    #[inline]
    pub fn load_params(&self) -> LoadParams {
        self.load_params
    }

    #[inline]
    pub fn controller(&self) -> &PoseController {
        &self.controller
    }

    #[inline]
    pub fn controller_mut(&mut self) -> &mut PoseController {
        &mut self.controller
    }

    #[inline]
    pub fn faults(&self) -> SegmentFault {
        self.faults
    }

    /// Total load, `None` before aggregation.
    #[inline]
    pub fn total_load(&self) -> Option<f64> {
        self.controller.load().map(|l| l.total_load)
    }

    /// Load factor, `None` before aggregation.
    #[inline]
    pub fn load_factor(&self) -> Option<f64> {
        self.controller.load().map(|l| l.load_factor)
    }

    pub(crate) fn raise(&mut self, fault: SegmentFault) {
        self.faults |= fault;
    }

    pub(crate) fn clear(&mut self, fault: SegmentFault) {
        self.faults.remove(fault);
    }
}
