//! Build a runnable [`Figure`] from its TOML authoring description.
//!
//! Names are resolved to [`SegmentId`]s here, once. Segment `i` of the
//! config becomes arena slot `i` in both the figure and the simulated world.

use std::collections::HashMap;
use std::path::Path;

use ragdoll_common::config::{ConfigError, ConfigLoader};
use ragdoll_common::figure::{FigureConfig, SegmentConfig};
use tracing::info;

use crate::body::SegmentId;
use crate::control::limiter::JointLimiter;
use crate::control::pose::{PoseController, PoseGains};
use crate::figure::Figure;
use crate::segment::{LoadParams, Segment};
use crate::sim::{IgnoredPairs, SimBody, SimWorld};
use crate::state::mode::CollisionPolicy;

/// A figure together with the configuration and simulation it was built from.
#[derive(Debug, Clone)]
pub struct LoadedFigure {
    pub config: FigureConfig,
    pub figure: Figure,
    pub world: SimWorld,
    pub pairs: IgnoredPairs,
}

/// Load, validate and build a figure file.
pub fn load_figure(path: &Path) -> Result<LoadedFigure, ConfigError> {
    let config = FigureConfig::load(path)?;
    info!("loaded figure config from {}", path.display());
    assemble(config)
}

/// Same as [`load_figure`] for an in-memory TOML document.
pub fn load_figure_from_str(content: &str) -> Result<LoadedFigure, ConfigError> {
    assemble(FigureConfig::from_toml_str(content)?)
}

/// Validate an already parsed config and build its figure and world.
pub fn assemble(config: FigureConfig) -> Result<LoadedFigure, ConfigError> {
    let figure = build_figure(&config)?;
    let world = build_world(&config);
    Ok(LoadedFigure {
        config,
        figure,
        world,
        pairs: IgnoredPairs::new(),
    })
}

/// Validate `config` and build its figure.
pub fn build_figure(config: &FigureConfig) -> Result<Figure, ConfigError> {
    config.validate()?;

    let ids: HashMap<&str, SegmentId> = config
        .segments
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.as_str(), SegmentId(i as u16)))
        .collect();
    let resolve = |name: &str| {
        ids.get(name)
            .copied()
            .ok_or_else(|| ConfigError::ValidationError(format!("unknown segment '{name}'")))
    };

    let segments = config
        .segments
        .iter()
        .map(|s| build_segment(s, &resolve))
        .collect::<Result<Vec<_>, _>>()?;

    let mut joints = Vec::with_capacity(config.joints.len());
    for jc in &config.joints {
        let segment = resolve(jc.segment.as_str())?;
        // Explicit override, else the hinge anchor, else world.
        let reference = match &jc.reference {
            Some(name) => Some(resolve(name.as_str())?),
            None => segments[segment.index()].anchor(),
        };
        joints.push(
            JointLimiter::new(segment, reference)
                .with_limits(jc.lower_angle, jc.upper_angle)
                .with_correction(jc.correction, jc.rewind_speed)
                .with_zero_angular_velocity(jc.zero_angular_velocity),
        );
    }

    let mut policy = CollisionPolicy::new(config.collision.posed, config.collision.ragdoll);
    for [a, b] in &config.collision.allow {
        policy = policy.allow_pair(resolve(a.as_str())?, resolve(b.as_str())?);
    }

    let roots = config
        .roots
        .iter()
        .map(|r| resolve(r.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let figure = Figure::new(config.name.clone(), segments, joints)
        .with_roots(roots)
        .with_p_base(config.p_base)
        .with_mode(config.initial_mode, policy);

    info!(
        "built figure '{}': {} segment(s), {} joint(s), {} root(s)",
        figure.name(),
        figure.segments().len(),
        figure.joints().len(),
        figure.roots().len()
    );
    Ok(figure)
}

fn build_segment(
    sc: &SegmentConfig,
    resolve: &impl Fn(&str) -> Result<SegmentId, ConfigError>,
) -> Result<Segment, ConfigError> {
    let anchor = sc.anchor.as_deref().map(resolve).transpose()?;
    let carries = sc
        .carries
        .iter()
        .map(|c| resolve(c.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let controller = PoseController::new(
        sc.target_angle,
        PoseGains {
            p_gain: sc.p_gain,
            damping: sc.damping,
        },
    )
    .with_external_strength(sc.external_strength)
    .with_max_angular_velocity(sc.max_angular_velocity);

    Ok(Segment::new(sc.name.clone())
        .with_anchor(anchor)
        .with_carries(carries)
        .with_load_params(LoadParams {
            leverage_factor: sc.leverage_factor,
            load_influence_factor: sc.load_influence_factor,
            base_torque_factor_k: sc.base_torque_factor_k,
        })
        .with_controller(controller))
}

/// Simulated bodies in config order. Segments without a `body` get an empty slot.
pub fn build_world(config: &FigureConfig) -> SimWorld {
    let mut world = SimWorld::new();
    for seg in &config.segments {
        match &seg.body {
            Some(body) => world.insert(SimBody::from(body)),
            None => world.insert_missing(),
        };
    }
    world
}

// ─── Tests ──────────────────────────────────────────────────────────
