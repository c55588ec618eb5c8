//! Mode and correction enums.
//!
//! Enums use snake_case serde names for TOML authoring.

use serde::{Deserialize, Serialize};

/// Operating mode of a whole articulated figure.
///
/// Every segment and joint of a figure moves between modes together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RagdollMode {
    /// Controllers active, hard limits off.
    #[default]
    Posed = 0,
    /// Controllers off, hard limits on, physics drives the joints.
    Ragdoll = 1,
}

impl RagdollMode {
    /// The other mode.
    #[inline]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Posed => Self::Ragdoll,
            Self::Ragdoll => Self::Posed,
        }
    }

    /// Whether pose controllers run in this mode.
    #[inline]
    pub const fn controllers_active(self) -> bool {
        matches!(self, Self::Posed)
    }

    /// Whether joint limiters are enforced in this mode.
    #[inline]
    pub const fn limits_enabled(self) -> bool {
        matches!(self, Self::Ragdoll)
    }
}

impl std::fmt::Display for RagdollMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Posed => f.write_str("posed"),
            Self::Ragdoll => f.write_str("ragdoll"),
        }
    }
}

/// How a joint limiter brings a violating segment back inside its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CorrectionMode {
    /// Snap the orientation onto the bound in one tick.
    #[default]
    Instant = 0,
    /// Rewind toward the bound at `rewind_speed` per time unit.
    BoundedRate = 1,
}

/// Self-collision policy applied to a figure's segment pairs on entering a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PairPolicy {
    /// Leave collision state as it is.
    #[default]
    Unchanged,
    /// Ignore collisions between every pair of segments.
    SuppressAll,
    /// Ignore every pair except those on the allow-list.
    SuppressExceptAllowList,
    /// Let every pair collide.
    CollideAll,
}

impl PairPolicy {
    /// Whether the pair should ignore collisions under this policy.
    ///
    /// Returns `None` for [`PairPolicy::Unchanged`].
    #[inline]
    pub const fn ignores(self, allow_listed: bool) -> Option<bool> {
        match self {
            Self::Unchanged => None,
            Self::SuppressAll => Some(true),
            Self::SuppressExceptAllowList => Some(!allow_listed),
            Self::CollideAll => Some(false),
        }
    }
}
