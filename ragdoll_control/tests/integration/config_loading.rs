//! Figure loading from disk.

use std::fs;

use ragdoll_common::config::ConfigError;
use ragdoll_common::state::{CorrectionMode, PairPolicy, RagdollMode};
use ragdoll_control::body::BodySet;
use ragdoll_control::config::load_figure;
use tempfile::TempDir;

use super::humanoid_path;

#[test]
fn shipped_humanoid_loads() {
    let loaded = load_figure(&humanoid_path()).unwrap();
    let figure = &loaded.figure;

    assert_eq!(figure.name(), "humanoid");
    assert_eq!(figure.segments().len(), 10);
    assert_eq!(figure.joints().len(), 9);
    assert_eq!(figure.initial_mode(), RagdollMode::Posed);
    assert_eq!(figure.roots(), &[figure.segment_id("torso").unwrap()]);
    assert_eq!(loaded.config.collision.posed, PairPolicy::SuppressAll);

    let forearm = figure.segment_id("forearm_l").unwrap();
    assert_eq!(figure.joint(forearm).unwrap().correction(), CorrectionMode::BoundedRate);
    assert_eq!(loaded.world.rotation_of(forearm), Some(725.0));
}

#[test]
fn humanoid_loads_are_ordered_children_first() {
    let mut loaded = load_figure(&humanoid_path()).unwrap();
    let report = loaded.figure.aggregate_loads(&loaded.world);
    let figure = &loaded.figure;

    assert_eq!(report.order.len(), 10);
    assert_eq!(report.order.last(), figure.segment_id("torso").as_ref());
    assert!(report.cyclic_edges.is_empty());

    // torso = 10 + head 3 + arms (2 + 1) * 2 + legs (4 + 3) * 2
    let torso = figure.segment(figure.segment_id("torso").unwrap()).unwrap();
    assert_eq!(torso.total_load(), Some(33.0));
}

#[test]
fn figure_written_to_disk_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pendulum.toml");
    fs::write(
        &path,
        r#"
name = "pendulum"
initial_mode = "ragdoll"

[[segments]]
name = "pivot"
carries = ["bob"]
[segments.body]
mass = 100.0

[[segments]]
name = "bob"
anchor = "pivot"
[segments.body]
mass = 1.0
angle = -30.0

[[joints]]
segment = "bob"
lower_angle = -10.0
upper_angle = 10.0
"#,
    )
    .unwrap();

    let mut loaded = load_figure(&path).unwrap();
    loaded.figure.aggregate_loads(&loaded.world);
    loaded.figure.activate(&mut loaded.world, &mut loaded.pairs);
    let report = loaded.figure.tick(&mut loaded.world, 0.02);

    assert_eq!(report.corrections, 1);
    assert_eq!(loaded.world.rotation_of(loaded.figure.segment_id("bob").unwrap()), Some(-10.0));
}

#[test]
fn load_errors_are_classified() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.toml");
    assert!(matches!(load_figure(&missing), Err(ConfigError::FileNotFound(_))));

    let garbled = dir.path().join("garbled.toml");
    fs::write(&garbled, "name = [unterminated").unwrap();
    assert!(matches!(load_figure(&garbled), Err(ConfigError::ParseError(_))));

    let unknown_field = dir.path().join("unknown.toml");
    fs::write(
        &unknown_field,
        "name = \"x\"\n[[segments]]\nname = \"a\"\nstiffness = 3.0\n",
    )
    .unwrap();
    assert!(matches!(load_figure(&unknown_field), Err(ConfigError::ParseError(_))));

    let inverted = dir.path().join("inverted.toml");
    fs::write(
        &inverted,
        "name = \"x\"\n[[segments]]\nname = \"a\"\n[[joints]]\nsegment = \"a\"\nlower_angle = 10.0\nupper_angle = -10.0\n",
    )
    .unwrap();
    assert!(matches!(load_figure(&inverted), Err(ConfigError::ValidationError(_))));
}
