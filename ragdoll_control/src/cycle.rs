//! Fixed-step driver: control tick, then physics integration.
//!
//! # Step Order
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ 1. Scheduled mode toggle (if due)           │
//! │ 2. Figure tick: limiters, then controllers  │
//! │ 3. Physics integration over dt              │
//! │ 4. Record statistics                        │
//! └─────────────────────────────────────────────┘
//! ```

use ragdoll_common::consts::DEFAULT_FIXED_DT;
use tracing::{debug, warn};

use crate::figure::{Figure, TickReport};
use crate::sim::{IgnoredPairs, SimWorld};

/// Accumulated tick statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickStats {
    /// Total steps executed.
    pub cycle_count: u64,
    /// Total limiter corrections written.
    pub corrections: u64,
    /// Total controller commands written.
    pub commanded: u64,
    /// Total controller ticks skipped on a degraded segment.
    pub skipped: u64,
    /// Mode toggles applied.
    pub toggles: u64,
    /// Largest |commanded angular velocity| seen [deg / time unit].
    pub max_abs_command: f64,
    /// Simulated time elapsed.
    pub sim_time: f64,
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TickStats {
    /// Create a new zeroed stats instance.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            corrections: 0,
            commanded: 0,
            skipped: 0,
            toggles: 0,
            max_abs_command: 0.0,
            sim_time: 0.0,
        }
    }

    /// Record one step. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, report: &TickReport, dt: f64) {
        self.cycle_count += 1;
        self.corrections += report.corrections as u64;
        self.commanded += report.commanded as u64;
        self.skipped += report.skipped as u64;
        if report.max_abs_command > self.max_abs_command {
            self.max_abs_command = report.max_abs_command;
        }
        self.sim_time += dt;
    }

    /// Average corrections per step (0 if no steps).
    #[inline]
    pub fn avg_corrections(&self) -> f64 {
        if self.cycle_count == 0 {
            0.0
        } else {
            self.corrections as f64 / self.cycle_count as f64
        }
    }
}

/// Steps a figure and its simulated world at a fixed `dt`.
#[derive(Debug, Clone)]
pub struct FixedStepRunner {
    dt: f64,
    toggle_at: Vec<u64>,
    step: u64,
    stats: TickStats,
}

impl FixedStepRunner {
    /// Runner with step size `dt`. Non-positive or non-finite `dt` falls back
    /// to [`DEFAULT_FIXED_DT`].
    pub fn new(dt: f64) -> Self {
        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            warn!("invalid step size {dt}, using {DEFAULT_FIXED_DT}");
            DEFAULT_FIXED_DT
        };
        Self {
            dt,
            toggle_at: Vec::new(),
            step: 0,
            stats: TickStats::new(),
        }
    }

    /// Toggle the figure's mode at the start of each listed step.
    pub fn with_toggles(mut self, steps: impl IntoIterator<Item = u64>) -> Self {
        self.toggle_at = steps.into_iter().collect();
        self.toggle_at.sort_unstable();
        self.toggle_at.dedup();
        self
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Index of the next step.
    #[inline]
    pub fn step_index(&self) -> u64 {
        self.step
    }

    #[inline]
    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Execute one step.
    pub fn step(&mut self, figure: &mut Figure, world: &mut SimWorld, pairs: &mut IgnoredPairs) -> TickReport {
        if self.toggle_at.binary_search(&self.step).is_ok() {
            let t = figure.toggle(world, pairs);
            self.stats.toggles += 1;
            debug!("step {}: toggled {} -> {}", self.step, t.from, t.to);
        }

        let report = figure.tick(world, self.dt);
        world.integrate(self.dt);
        self.stats.record(&report, self.dt);
        self.step += 1;
        report
    }

    /// Execute `steps` steps and return the accumulated statistics.
    pub fn run(
        &mut self,
        figure: &mut Figure,
        world: &mut SimWorld,
        pairs: &mut IgnoredPairs,
        steps: u64,
    ) -> &TickStats {
        for _ in 0..steps {
            self.step(figure, world, pairs);
        }
        &self.stats
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
