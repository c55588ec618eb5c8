//! # Ragdoll Control Library
//!
//! Procedural pose control for articulated 2D rigid-body figures. A figure
//! is a set of hinged segments that either hangs as a passive ragdoll or
//! holds a target pose through corrective angular velocities weighted by
//! the structural load each joint carries.
//!
//! ## Subsystems
//!
//! 1. **LoadAggregator** ([`load`]) - post-order static load propagation,
//!    once per segment, cycle-safe
//! 2. **PoseController** ([`control::pose`]) - load-weighted PD law written
//!    as an angular velocity override
//! 3. **JointLimiter** ([`control::limiter`]) - wrap-safe relative angle clamp
//! 4. **RagdollModeCoordinator** ([`state::mode`]) - figure-wide
//!    Posed ⇄ Ragdoll switching and self-collision policy
//!
//! [`figure::Figure`] owns all four and runs the per-tick pass. Rigid
//! bodies stay outside the core behind the [`body`] traits; [`sim`]
//! provides a reference implementation used by the binary, tests and
//! benchmarks.

pub mod angle;
pub mod body;
pub mod config;
pub mod control;
pub mod cycle;
pub mod figure;
pub mod load;
pub mod segment;
pub mod sim;
pub mod state;
