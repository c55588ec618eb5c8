//! Pose control in the reference simulation.
//!
//! Covers the literal velocity-override formula, the zero-error fixed
//! point, going limp, and convergence to a target pose without unwinding
//! accumulated turns.

use proptest::prelude::*;
use ragdoll_control::angle;
use ragdoll_control::body::{BodySet, RigidBody, SegmentId};
use ragdoll_control::config::{LoadedFigure, load_figure_from_str};
use ragdoll_control::control::pose::{PoseGains, PoseInput, pd_command};
use ragdoll_control::cycle::FixedStepRunner;

fn arm_on_base(arm_angle: f64, target: f64, p_gain: f64, damping: f64) -> LoadedFigure {
    let toml = format!(
        r#"
name = "arm"

[[segments]]
name = "base"
[segments.body]
mass = 5.0

[[segments]]
name = "arm"
anchor = "base"
target_angle = {target:?}
p_gain = {p_gain:?}
damping = {damping:?}
external_strength = 0.0
[segments.body]
mass = 1.0
angle = {arm_angle:?}
"#
    );
    let mut loaded = load_figure_from_str(&toml).unwrap();
    loaded.figure.aggregate_loads(&loaded.world);
    loaded
}

#[test]
fn literal_formula_scenario() {
    // Relative 30°, target 0°, default gains, load factor 10, no external strength.
    let mut loaded = arm_on_base(30.0, 0.0, 1.0, 5.0);
    let arm = loaded.figure.segment_id("arm").unwrap();
    assert_eq!(loaded.figure.segment(arm).unwrap().load_factor(), Some(10.0));

    let report = loaded.figure.tick(&mut loaded.world, 0.02);
    assert_eq!(report.commanded, 2);
    assert_eq!(loaded.world.body(arm).unwrap().angular_velocity(), -9000.0);
}

proptest! {
    /// At the target and at rest the command is zero whatever the load.
    #[test]
    fn zero_error_and_rest_command_nothing_for_any_load(
        heading in -179.999..=180.0f64,
        load_factor in 0.0..1e6f64,
        external_strength in 0.0..100.0f64,
        mass in 0.01..100.0f64,
        p_gain in 0.0..10.0f64,
        damping in 0.0..20.0f64,
    ) {
        let cmd = pd_command(
            &PoseInput {
                relative_angle: heading,
                target_angle: heading,
                angular_velocity: 0.0,
                load_factor,
                external_strength,
                mass,
            },
            &PoseGains { p_gain, damping },
            30.0,
        );
        prop_assert_eq!(cmd.angular_velocity, 0.0);
    }
}

#[test]
fn disabling_controller_zeroes_velocity() {
    for spin in [1e9, -0.001, 42.0] {
        let mut loaded = arm_on_base(10.0, 0.0, 1.0, 5.0);
        let arm = loaded.figure.segment_id("arm").unwrap();
        if let Some(body) = loaded.world.body_mut(arm) {
            body.set_angular_velocity(spin);
        }

        assert!(loaded.figure.set_segment_active(arm, false, &mut loaded.world));
        assert_eq!(loaded.world.body(arm).unwrap().angular_velocity(), 0.0);

        // Inactive controllers leave the body alone.
        loaded.figure.tick(&mut loaded.world, 0.02);
        assert_eq!(loaded.world.body(arm).unwrap().angular_velocity(), 0.0);
    }
}

#[test]
fn holds_target_pose_in_simulation() {
    // p_gain * p_base * strength * mass = 0.01 * 30 * 10 * 1 = 3 per time unit.
    let mut loaded = arm_on_base(-40.0, 30.0, 0.01, 0.0);
    let arm = loaded.figure.segment_id("arm").unwrap();

    let mut runner = FixedStepRunner::new(0.02);
    runner.run(&mut loaded.figure, &mut loaded.world, &mut loaded.pairs, 400);

    let base = loaded.world.rotation_of(SegmentId(0)).unwrap();
    let rel = angle::delta(base, loaded.world.rotation_of(arm).unwrap());
    assert!((rel - 30.0).abs() < 1e-3, "relative angle {rel}");
}

#[test]
fn multi_turn_body_settles_without_unwinding() {
    // 725° is relative 5°; the target is reached on the same turn.
    let mut loaded = arm_on_base(725.0, 20.0, 0.01, 0.0);
    let arm = loaded.figure.segment_id("arm").unwrap();

    let mut runner = FixedStepRunner::new(0.02);
    runner.run(&mut loaded.figure, &mut loaded.world, &mut loaded.pairs, 400);

    let rotation = loaded.world.rotation_of(arm).unwrap();
    assert!((rotation - 740.0).abs() < 1e-3, "rotation {rotation}");
}

#[test]
fn angular_velocity_clamp_bounds_commands() {
    let mut loaded = load_figure_from_str(
        r#"
name = "clamped"

[[segments]]
name = "arm"
target_angle = 90.0
max_angular_velocity = 360.0
[segments.body]
mass = 2.0
"#,
    )
    .unwrap();
    loaded.figure.aggregate_loads(&loaded.world);
    let report = loaded.figure.tick(&mut loaded.world, 0.02);
    assert_eq!(report.max_abs_command, 360.0);
    assert_eq!(loaded.world.body(SegmentId(0)).unwrap().angular_velocity(), 360.0);
}
