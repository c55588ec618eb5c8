//! Authoring surface for one articulated figure.
//!
//! Every value here is a design-time constant: the control core reads it,
//! never infers it. Segments reference each other by name; names are
//! resolved to arena indices when the figure is built.
//!
//! # TOML Example
//!
//! ```toml
//! name = "puppet"
//! p_base = 30.0
//! initial_mode = "posed"
//! roots = ["torso"]
//!
//! [[segments]]
//! name = "torso"
//! carries = ["upper_arm"]
//! [segments.body]
//! mass = 10.0
//!
//! [[segments]]
//! name = "upper_arm"
//! anchor = "torso"
//! target_angle = -20.0
//! [segments.body]
//! mass = 2.0
//!
//! [[joints]]
//! segment = "upper_arm"
//! lower_angle = -120.0
//! upper_angle = 45.0
//!
//! [collision]
//! posed = "suppress_all"
//! ragdoll = "suppress_except_allow_list"
//! allow = [["torso", "upper_arm"]]
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    DEFAULT_BASE_TORQUE_FACTOR_K, DEFAULT_DAMPING, DEFAULT_EXTERNAL_STRENGTH,
    DEFAULT_LEVERAGE_FACTOR, DEFAULT_LOAD_INFLUENCE_FACTOR, DEFAULT_LOWER_ANGLE, DEFAULT_P_BASE,
    DEFAULT_P_GAIN, DEFAULT_REWIND_SPEED, DEFAULT_UPPER_ANGLE, MAX_SEGMENTS,
};
use crate::state::{CorrectionMode, PairPolicy, RagdollMode};

// ─── Figure ─────────────────────────────────────────────────────────

/// Complete authoring description of one figure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FigureConfig {
    #[serde(default)]
    pub shared: SharedConfig,

    /// Figure name, used in diagnostics.
    pub name: String,

    /// Run-wide proportional calibration stamped onto every aggregated segment.
    #[serde(default = "default_p_base")]
    pub p_base: f64,

    /// Mode the figure is built in, applied in full on activation.
    #[serde(default)]
    pub initial_mode: RagdollMode,

    /// Roots of the carried-parts forest. Empty means "every segment no one carries".
    #[serde(default)]
    pub roots: Vec<String>,

    pub segments: Vec<SegmentConfig>,

    #[serde(default)]
    pub joints: Vec<JointConfig>,

    #[serde(default)]
    pub collision: CollisionConfig,
}

fn default_p_base() -> f64 {
    DEFAULT_P_BASE
}

// ─── Segment ────────────────────────────────────────────────────────

/// One rigid body part and its controller tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SegmentConfig {
    pub name: String,

    /// Parent body the relative angle is measured against. `None` for a root.
    #[serde(default)]
    pub anchor: Option<String>,

    /// Segments whose load this one structurally supports.
    #[serde(default)]
    pub carries: Vec<String>,

    /// Target relative angle [deg].
    #[serde(default)]
    pub target_angle: f64,

    #[serde(default = "default_leverage")]
    pub leverage_factor: f64,

    #[serde(default = "default_load_influence")]
    pub load_influence_factor: f64,

    #[serde(default = "default_torque_k")]
    pub base_torque_factor_k: f64,

    #[serde(default = "default_external_strength")]
    pub external_strength: f64,

    #[serde(default = "default_p_gain")]
    pub p_gain: f64,

    #[serde(default = "default_damping")]
    pub damping: f64,

    /// Optional clamp on the commanded angular velocity [deg / time unit].
    #[serde(default)]
    pub max_angular_velocity: Option<f64>,

    /// Rigid body backing this segment. `None` models a missing body.
    #[serde(default)]
    pub body: Option<BodyConfig>,
}

fn default_leverage() -> f64 {
    DEFAULT_LEVERAGE_FACTOR
}
fn default_load_influence() -> f64 {
    DEFAULT_LOAD_INFLUENCE_FACTOR
}
fn default_torque_k() -> f64 {
    DEFAULT_BASE_TORQUE_FACTOR_K
}
fn default_external_strength() -> f64 {
    DEFAULT_EXTERNAL_STRENGTH
}
fn default_p_gain() -> f64 {
    DEFAULT_P_GAIN
}
fn default_damping() -> f64 {
    DEFAULT_DAMPING
}

impl SegmentConfig {
    /// Segment with default tuning and no body.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            anchor: None,
            carries: Vec::new(),
            target_angle: 0.0,
            leverage_factor: DEFAULT_LEVERAGE_FACTOR,
            load_influence_factor: DEFAULT_LOAD_INFLUENCE_FACTOR,
            base_torque_factor_k: DEFAULT_BASE_TORQUE_FACTOR_K,
            external_strength: DEFAULT_EXTERNAL_STRENGTH,
            p_gain: DEFAULT_P_GAIN,
            damping: DEFAULT_DAMPING,
            max_angular_velocity: None,
            body: None,
        }
    }

    /// Builder: attach a body with the given mass at rest.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.body = Some(BodyConfig {
            mass,
            ..BodyConfig::default()
        });
        self
    }

    fn numbers(&self) -> [(&'static str, f64); 7] {
        [
            ("target_angle", self.target_angle),
            ("leverage_factor", self.leverage_factor),
            ("load_influence_factor", self.load_influence_factor),
            ("base_torque_factor_k", self.base_torque_factor_k),
            ("external_strength", self.external_strength),
            ("p_gain", self.p_gain),
            ("damping", self.damping),
        ]
    }
}

/// Initial physical state of a segment's rigid body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    /// Mass. Non-positive values are accepted and degrade the segment.
    pub mass: f64,
    /// Initial world angle [deg], any number of turns.
    #[serde(default)]
    pub angle: f64,
    /// Initial angular velocity [deg / time unit].
    #[serde(default)]
    pub angular_velocity: f64,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            angle: 0.0,
            angular_velocity: 0.0,
        }
    }
}

// ─── Joint ──────────────────────────────────────────────────────────

/// Relative angle limit on a segment's hinge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JointConfig {
    /// Limited segment.
    pub segment: String,

    /// Explicit reference body. Falls back to the segment's anchor.
    #[serde(default)]
    pub reference: Option<String>,

    #[serde(default = "default_lower")]
    pub lower_angle: f64,

    #[serde(default = "default_upper")]
    pub upper_angle: f64,

    #[serde(default)]
    pub correction: CorrectionMode,

    /// Bounded-rate correction speed [deg / time unit].
    #[serde(default = "default_rewind")]
    pub rewind_speed: f64,

    /// Zero the angular velocity whenever a correction is applied.
    #[serde(default = "default_true")]
    pub zero_angular_velocity: bool,
}

fn default_lower() -> f64 {
    DEFAULT_LOWER_ANGLE
}
fn default_upper() -> f64 {
    DEFAULT_UPPER_ANGLE
}
fn default_rewind() -> f64 {
    DEFAULT_REWIND_SPEED
}
fn default_true() -> bool {
    true
}

impl JointConfig {
    /// Joint on `segment` with default limits.
    pub fn on(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            reference: None,
            lower_angle: DEFAULT_LOWER_ANGLE,
            upper_angle: DEFAULT_UPPER_ANGLE,
            correction: CorrectionMode::Instant,
            rewind_speed: DEFAULT_REWIND_SPEED,
            zero_angular_velocity: true,
        }
    }
}

// ─── Collision ──────────────────────────────────────────────────────

/// Self-collision policy per mode plus the exempted pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CollisionConfig {
    /// Applied on entering `Posed`.
    #[serde(default)]
    pub posed: PairPolicy,
    /// Applied on entering `Ragdoll`.
    #[serde(default)]
    pub ragdoll: PairPolicy,
    /// Segment name pairs left colliding by `suppress_except_allow_list`.
    #[serde(default)]
    pub allow: Vec<[String; 2]>,
}

// ─── Validation ─────────────────────────────────────────────────────

impl FigureConfig {
    /// Validate authoring errors that make the figure unbuildable.
    ///
    /// Conditions the runtime degrades gracefully (missing body,
    /// non-positive mass, cyclic carries) are accepted here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.name.is_empty() {
            return Err(invalid("figure name cannot be empty".to_string()));
        }
        if !(self.p_base.is_finite() && self.p_base > 0.0) {
            return Err(invalid(format!("p_base {} must be positive", self.p_base)));
        }
        if self.segments.is_empty() {
            return Err(invalid("figure has no segments".to_string()));
        }
        if self.segments.len() > MAX_SEGMENTS {
            return Err(invalid(format!(
                "{} segments exceed the limit of {MAX_SEGMENTS}",
                self.segments.len()
            )));
        }

        let mut names: HashMap<&str, usize> = HashMap::new();
        for (i, seg) in self.segments.iter().enumerate() {
            if seg.name.is_empty() {
                return Err(invalid(format!("segment #{i} has an empty name")));
            }
            if names.insert(seg.name.as_str(), i).is_some() {
                return Err(invalid(format!("duplicate segment name '{}'", seg.name)));
            }
        }

        for seg in &self.segments {
            for (field, value) in seg.numbers() {
                if !value.is_finite() {
                    return Err(invalid(format!("segment '{}': {field} is not finite", seg.name)));
                }
            }
            if let Some(max) = seg.max_angular_velocity {
                if !(max.is_finite() && max > 0.0) {
                    return Err(invalid(format!(
                        "segment '{}': max_angular_velocity {max} must be positive",
                        seg.name
                    )));
                }
            }
            if let Some(body) = &seg.body {
                if !(body.mass.is_finite() && body.angle.is_finite() && body.angular_velocity.is_finite()) {
                    return Err(invalid(format!("segment '{}': body values must be finite", seg.name)));
                }
            }
            if let Some(anchor) = &seg.anchor {
                if anchor == &seg.name {
                    return Err(invalid(format!("segment '{}' is anchored to itself", seg.name)));
                }
                require_known(&names, anchor, || format!("anchor of '{}'", seg.name))?;
            }
            for carried in &seg.carries {
                require_known(&names, carried, || format!("carried part of '{}'", seg.name))?;
            }
        }

        for root in &self.roots {
            require_known(&names, root, || "root".to_string())?;
        }

        let mut limited: HashSet<&str> = HashSet::new();
        for joint in &self.joints {
            require_known(&names, &joint.segment, || "joint segment".to_string())?;
            if !limited.insert(joint.segment.as_str()) {
                return Err(invalid(format!("segment '{}' has more than one joint", joint.segment)));
            }
            if let Some(reference) = &joint.reference {
                if reference == &joint.segment {
                    return Err(invalid(format!(
                        "joint on '{}' references its own segment",
                        joint.segment
                    )));
                }
                require_known(&names, reference, || format!("reference of joint '{}'", joint.segment))?;
            }
            if !(joint.lower_angle.is_finite() && joint.upper_angle.is_finite()) {
                return Err(invalid(format!("joint '{}': limits must be finite", joint.segment)));
            }
            if joint.lower_angle > joint.upper_angle {
                return Err(invalid(format!(
                    "joint '{}': lower_angle {} > upper_angle {}",
                    joint.segment, joint.lower_angle, joint.upper_angle
                )));
            }
            if !(joint.rewind_speed.is_finite() && joint.rewind_speed >= 0.0) {
                return Err(invalid(format!(
                    "joint '{}': rewind_speed {} must be non-negative",
                    joint.segment, joint.rewind_speed
                )));
            }
        }

        for [a, b] in &self.collision.allow {
            require_known(&names, a, || "collision allow-list".to_string())?;
            require_known(&names, b, || "collision allow-list".to_string())?;
            if a == b {
                return Err(invalid(format!("collision allow-list pairs '{a}' with itself")));
            }
        }

        debug!(
            "figure '{}' validated: {} segment(s), {} joint(s)",
            self.name,
            self.segments.len(),
            self.joints.len()
        );
        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

fn require_known(
    names: &HashMap<&str, usize>,
    name: &str,
    role: impl FnOnce() -> String,
) -> Result<(), ConfigError> {
    if names.contains_key(name) {
        Ok(())
    } else {
        Err(invalid(format!("{} references unknown segment '{name}'", role())))
    }
}
