//! Prelude module for common re-exports.
//!
//! ```rust
//! use ragdoll_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::figure::{BodyConfig, CollisionConfig, FigureConfig, JointConfig, SegmentConfig};

// ─── State & Faults ─────────────────────────────────────────────────
pub use crate::error::SegmentFault;
pub use crate::state::{CorrectionMode, PairPolicy, RagdollMode};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{DEFAULT_FIXED_DT, DEFAULT_P_BASE, MAX_SEGMENTS};
