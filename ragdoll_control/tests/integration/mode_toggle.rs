//! Posed ⇄ Ragdoll switching on the shipped humanoid.

use ragdoll_common::error::SegmentFault;
use ragdoll_common::state::RagdollMode;
use ragdoll_control::body::{BodySet, RigidBody, SegmentId};
use ragdoll_control::config::{LoadedFigure, load_figure, load_figure_from_str};
use ragdoll_control::cycle::FixedStepRunner;

use super::humanoid_path;

fn humanoid() -> LoadedFigure {
    let mut loaded = load_figure(&humanoid_path()).unwrap();
    loaded.figure.aggregate_loads(&loaded.world);
    loaded
}

fn flags(loaded: &LoadedFigure) -> (Vec<bool>, Vec<bool>) {
    (
        loaded.figure.segments().iter().map(|s| s.controller().is_active()).collect(),
        loaded.figure.joints().iter().map(|j| j.is_enabled()).collect(),
    )
}

#[test]
fn double_toggle_restores_all_flags() {
    for initial in [RagdollMode::Posed, RagdollMode::Ragdoll] {
        let mut loaded = humanoid();
        loaded.figure.set_initial_mode(initial);
        loaded.figure.activate(&mut loaded.world, &mut loaded.pairs);
        let before = flags(&loaded);

        loaded.figure.toggle(&mut loaded.world, &mut loaded.pairs);
        let flipped = flags(&loaded);
        assert!(flipped.0.iter().zip(&before.0).all(|(a, b)| a != b));
        assert!(flipped.1.iter().zip(&before.1).all(|(a, b)| a != b));

        loaded.figure.toggle(&mut loaded.world, &mut loaded.pairs);
        assert_eq!(flags(&loaded), before);
        assert_eq!(loaded.figure.mode(), initial);
    }
}

#[test]
fn collision_policy_follows_mode() {
    let mut loaded = humanoid();
    let n = loaded.figure.segments().len();
    let all_pairs = n * (n - 1) / 2;

    let posed = loaded.figure.activate(&mut loaded.world, &mut loaded.pairs);
    assert_eq!(posed.to, RagdollMode::Posed);
    assert_eq!(posed.pairs, all_pairs);
    assert_eq!(loaded.pairs.len(), all_pairs);

    let ragdoll = loaded.figure.toggle(&mut loaded.world, &mut loaded.pairs);
    assert_eq!(ragdoll.to, RagdollMode::Ragdoll);
    let allowed = loaded.config.collision.allow.len();
    assert_eq!(loaded.pairs.len(), all_pairs - allowed);

    let id = |name: &str| loaded.figure.segment_id(name).unwrap();
    assert!(!loaded.pairs.is_pair_ignored(id("forearm_l"), id("torso")));
    assert!(loaded.pairs.is_pair_ignored(id("head"), id("torso")));
}

#[test]
fn going_limp_zeroes_every_spin() {
    let mut loaded = humanoid();
    loaded.figure.activate(&mut loaded.world, &mut loaded.pairs);
    let mut runner = FixedStepRunner::new(0.02);
    runner.run(&mut loaded.figure, &mut loaded.world, &mut loaded.pairs, 10);

    loaded.figure.set_mode(RagdollMode::Ragdoll, &mut loaded.world, &mut loaded.pairs);
    for i in 0..loaded.figure.segments().len() {
        let body = loaded.world.body(SegmentId(i as u16)).unwrap();
        assert_eq!(body.angular_velocity(), 0.0);
    }
}

#[test]
fn ragdoll_holds_limits_and_posed_ignores_them() {
    let mut loaded = humanoid();
    loaded.figure.set_initial_mode(RagdollMode::Ragdoll);
    loaded.figure.activate(&mut loaded.world, &mut loaded.pairs);

    let mut runner = FixedStepRunner::new(0.02);
    let stats = *runner.run(&mut loaded.figure, &mut loaded.world, &mut loaded.pairs, 50);
    assert_eq!(stats.commanded, 0);
    // forearm_l starts at relative 195° (wraps to -165°), outside [0, 150].
    assert!(stats.corrections > 0);

    loaded.figure.toggle(&mut loaded.world, &mut loaded.pairs);
    let report = loaded.figure.tick(&mut loaded.world, 0.02);
    assert_eq!(report.limiters_run, 0);
    assert_eq!(report.commanded, loaded.figure.segments().len());
}

#[test]
fn bodyless_segment_is_excluded_from_transitions() {
    let mut loaded = load_figure_from_str(
        r#"
name = "partial"
initial_mode = "ragdoll"

[[segments]]
name = "torso"
carries = ["ghost"]
[segments.body]
mass = 8.0

[[segments]]
name = "ghost"
anchor = "torso"

[[joints]]
segment = "ghost"

[collision]
ragdoll = "suppress_all"
"#,
    )
    .unwrap();
    loaded.figure.aggregate_loads(&loaded.world);
    let ghost = loaded.figure.segment_id("ghost").unwrap();

    let t = loaded.figure.activate(&mut loaded.world, &mut loaded.pairs);
    assert_eq!(t.excluded, vec![ghost]);
    assert_eq!(t.controllers, 1);
    assert_eq!(t.pairs, 0);
    assert!(!loaded.figure.joint(ghost).unwrap().is_enabled());

    // The rest of the figure still ticks; the ghost stays switched off.
    loaded.figure.toggle(&mut loaded.world, &mut loaded.pairs);
    assert!(!loaded.figure.segment(ghost).unwrap().controller().is_active());
    let report = loaded.figure.tick(&mut loaded.world, 0.02);
    assert_eq!(report.commanded, 1);
    assert_eq!(report.skipped, 0);
}

#[test]
fn limb_on_bodyless_anchor_is_never_driven_against_world() {
    let mut loaded = load_figure_from_str(
        r#"
name = "stump"
initial_mode = "ragdoll"

[[segments]]
name = "torso"
carries = ["arm"]

[[segments]]
name = "arm"
anchor = "torso"
[segments.body]
mass = 1.0
angle = 100.0

[[joints]]
segment = "arm"
"#,
    )
    .unwrap();
    let arm = loaded.figure.segment_id("arm").unwrap();
    let report = loaded.figure.aggregate_loads(&loaded.world);
    assert_eq!(report.missing_anchor, vec![arm]);
    assert!(loaded.figure.faults(arm).unwrap().contains(SegmentFault::MISSING_ANCHOR));

    // Built in ragdoll, the limiter is on but has nothing to measure against.
    let tick = loaded.figure.tick(&mut loaded.world, 0.02);
    assert_eq!(tick.corrections, 0);
    assert_eq!(loaded.world.rotation_of(arm), Some(100.0));

    let t = loaded.figure.toggle(&mut loaded.world, &mut loaded.pairs);
    assert_eq!(t.to, RagdollMode::Posed);
    assert!(t.excluded.contains(&arm));
    let tick = loaded.figure.tick(&mut loaded.world, 0.02);
    assert_eq!(tick.commanded, 0);
    assert_eq!(loaded.world.body(arm).unwrap().angular_velocity(), 0.0);
}
