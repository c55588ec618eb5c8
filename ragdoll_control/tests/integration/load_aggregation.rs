//! Load aggregation over generated carry graphs.
//!
//! Verifies the load inequalities hold for arbitrary forests with shared
//! sub-trees, that every reachable segment is computed exactly once, and
//! that cycles terminate.

use std::collections::HashSet;

use proptest::prelude::*;
use ragdoll_control::body::{BodySet, RigidBody, SegmentId};
use ragdoll_control::config::load_figure_from_str;
use ragdoll_control::load::LoadAggregator;
use ragdoll_control::segment::{LoadParams, Segment};
use ragdoll_control::sim::{SimBody, SimWorld};

/// One generated segment: its carriers among earlier segments, mass,
/// leverage and load influence.
#[derive(Debug, Clone)]
struct NodeSpec {
    carriers: (usize, Option<usize>),
    mass: f64,
    leverage: f64,
    influence: f64,
}

/// Random DAG rooted at segment 0: segment `i > 0` is carried by one
/// earlier segment, and sometimes by a second one as well.
fn arb_forest() -> impl Strategy<Value = Vec<NodeSpec>> {
    (2usize..150).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                let carriers = if i == 0 {
                    Just((0usize, None::<usize>)).boxed()
                } else {
                    (0..i, prop::option::weighted(0.2, 0..i)).boxed()
                };
                (carriers, 0.5..5.0f64, 0.5..2.0f64, 0.0..1.0f64).prop_map(
                    |(carriers, mass, leverage, influence)| NodeSpec {
                        carriers,
                        mass,
                        leverage,
                        influence,
                    },
                )
            })
            .collect::<Vec<_>>()
    })
}

fn build_forest(nodes: &[NodeSpec]) -> (Vec<Segment>, SimWorld) {
    let mut carries: Vec<Vec<SegmentId>> = vec![Vec::new(); nodes.len()];
    for (i, node) in nodes.iter().enumerate().skip(1) {
        let (parent, other) = node.carriers;
        carries[parent].push(SegmentId(i as u16));
        if let Some(other) = other.filter(|o| *o != parent) {
            carries[other].push(SegmentId(i as u16));
        }
    }

    let mut world = SimWorld::new();
    let segments = carries
        .into_iter()
        .zip(nodes)
        .enumerate()
        .map(|(i, (c, node))| {
            world.insert(SimBody::new(node.mass));
            Segment::new(format!("s{i}"))
                .with_carries(c)
                .with_load_params(LoadParams {
                    leverage_factor: node.leverage,
                    load_influence_factor: node.influence,
                    base_torque_factor_k: 10.0,
                })
        })
        .collect();
    (segments, world)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every segment carries at least its own mass and each carried share.
    #[test]
    fn carried_load_never_exceeds_carrier_load(nodes in arb_forest()) {
        let (mut segments, world) = build_forest(&nodes);
        let report = LoadAggregator::default().compute_loads(&mut segments, &world, &[SegmentId(0)]);

        let unique: HashSet<_> = report.order.iter().collect();
        prop_assert_eq!(unique.len(), segments.len());
        prop_assert_eq!(report.order.len(), segments.len());

        for (i, seg) in segments.iter().enumerate() {
            let total = seg.total_load().unwrap();
            let mass = world.body(SegmentId(i as u16)).unwrap().mass();
            prop_assert!(total >= mass, "s{} total {} < mass {}", i, total, mass);

            let influence = seg.load_params().load_influence_factor;
            for c in seg.carries() {
                let child = segments[c.index()].total_load().unwrap();
                prop_assert!(
                    total >= child * influence,
                    "s{} total {} < carried {} * {}", i, total, child, influence
                );
            }
        }
    }
}

#[test]
fn each_segment_is_computed_once_across_roots_and_cycles() {
    let mut world = SimWorld::new();
    for _ in 0..4 {
        world.insert(SimBody::new(1.0));
    }
    // 0 -> 1 -> 2 -> 0 is a cycle; 3 also carries 1.
    let mut segments = vec![
        Segment::new("a").with_carries(vec![SegmentId(1)]),
        Segment::new("b").with_carries(vec![SegmentId(2)]),
        Segment::new("c").with_carries(vec![SegmentId(0)]),
        Segment::new("d").with_carries(vec![SegmentId(1)]),
    ];

    let report =
        LoadAggregator::default().compute_loads(&mut segments, &world, &[SegmentId(0), SegmentId(3)]);

    let unique: HashSet<_> = report.order.iter().collect();
    assert_eq!(unique.len(), report.order.len());
    assert_eq!(report.order.len(), 4);
    assert_eq!(report.cyclic_edges, vec![(SegmentId(2), SegmentId(0))]);

    // c skips the edge back to a; b and d see c's and b's finished totals.
    assert_eq!(segments[2].total_load(), Some(1.0));
    assert_eq!(segments[1].total_load(), Some(2.0));
    assert_eq!(segments[0].total_load(), Some(3.0));
    assert_eq!(segments[3].total_load(), Some(3.0));
}

#[test]
fn non_positive_mass_always_yields_zero_factor() {
    for mass in [0.0, -0.5, -10.0] {
        let mut world = SimWorld::new();
        let root = world.insert(SimBody::new(mass));
        let child = world.insert(SimBody::new(3.0));
        let mut segments = vec![
            Segment::new("root").with_carries(vec![child]),
            Segment::new("child"),
        ];
        LoadAggregator::default().compute_loads(&mut segments, &world, &[root]);
        assert_eq!(segments[0].load_factor(), Some(0.0));
        assert_eq!(segments[1].load_factor(), Some(10.0));
    }
}

#[test]
fn chain_scenario_from_config() {
    let loaded = load_figure_from_str(
        r#"
name = "chain"

[[segments]]
name = "root"
carries = ["child"]
[segments.body]
mass = 10.0

[[segments]]
name = "child"
anchor = "root"
carries = ["grandchild"]
[segments.body]
mass = 5.0

[[segments]]
name = "grandchild"
anchor = "child"
[segments.body]
mass = 2.0
"#,
    )
    .unwrap();
    let mut figure = loaded.figure;
    let report = figure.aggregate_loads(&loaded.world);

    let root = figure.segment_id("root").unwrap();
    let child = figure.segment_id("child").unwrap();
    let grandchild = figure.segment_id("grandchild").unwrap();
    assert_eq!(report.order, vec![grandchild, child, root]);

    let grandchild = figure.segment(grandchild).unwrap();
    assert_eq!(grandchild.total_load(), Some(2.0));
    assert_eq!(grandchild.load_factor(), Some(10.0));

    let child = figure.segment(child).unwrap();
    assert_eq!(child.total_load(), Some(7.0));
    assert_eq!(child.load_factor(), Some(14.0));

    let root = figure.segment(root).unwrap();
    assert_eq!(root.total_load(), Some(17.0));
    assert_eq!(root.load_factor(), Some(17.0));
}

#[test]
fn aggregation_stamps_configured_p_base() {
    let loaded = load_figure_from_str(
        r#"
name = "stamp"
p_base = 12.5

[[segments]]
name = "only"
[segments.body]
mass = 1.0
"#,
    )
    .unwrap();
    let mut figure = loaded.figure;
    figure.aggregate_loads(&loaded.world);
    assert_eq!(figure.segments()[0].controller().base_proportional_scale(), 12.5);
}
