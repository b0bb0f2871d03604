//! Integration tests for wt-graph.

use wt_graph::{
    Edge, GraphError, NodeKind, ProcessAttrs, PruneMode, TopologyBuilder, TrainGraph,
    ViolationKind,
};

/// intake -> ro1 -> uv1 -> cf1 -> outfall
fn three_process_train() -> TrainGraph {
    let mut builder = TopologyBuilder::new();
    builder.add_source("intake").add_use("outfall");
    for (name, key) in [
        ("ro1", "reverse_osmosis"),
        ("uv1", "uv_irradiation"),
        ("cf1", "coag_and_floc"),
    ] {
        builder.add_unit_process(name, ProcessAttrs::new(key)).unwrap();
    }
    builder.connect("l0", "intake", "ro1_start", None).unwrap();
    builder.connect("l1", "ro1_end", "uv1_start", None).unwrap();
    builder.connect("l2", "uv1_end", "cf1_start", None).unwrap();
    builder.connect("l3", "cf1_end", "outfall", None).unwrap();
    builder.build()
}

#[test]
fn build_linear_train() {
    let train = three_process_train();

    assert_eq!(train.node_count(), 8);
    assert_eq!(train.edge_count(), 7);
    assert!(train.is_well_formed());
    assert_eq!(train.unit_process_names(), ["ro1", "uv1", "cf1"]);
    assert_eq!(
        train.topological_order().unwrap().first().map(String::as_str),
        Some("intake")
    );
}

#[test]
fn select_subset_keeps_named_processes_only() {
    let mut train = three_process_train();
    let removed = train.select_subset(&["ro1", "uv1"]);

    assert_eq!(removed, ["cf1"]);
    assert!(!train.contains_node("cf1_start"));
    assert!(!train.contains_node("cf1_end"));
    assert!(train.contains_node("intake"));
    assert!(train.contains_node("outfall"));
    assert_eq!(train.unit_process_names(), ["ro1", "uv1"]);
    assert_eq!(train.node_count(), 6);
}

#[test]
fn variants_do_not_share_state() {
    let base = three_process_train();
    let a = base.variant(&["ro1"]);
    let b = base.variant(&["uv1", "cf1"]);

    assert_eq!(a.unit_process_names(), ["ro1"]);
    assert_eq!(b.unit_process_names(), ["uv1", "cf1"]);
    assert_eq!(base.unit_process_names(), ["ro1", "uv1", "cf1"]);
}

#[test]
fn remove_node_on_absent_id_is_identity() {
    let mut train = three_process_train();
    train.process_mut("ro1").unwrap().recovery_factor = Some(0.75);
    let before = train.clone();

    assert!(train.remove_node("does_not_exist").is_none());
    assert_eq!(train, before);
}

#[test]
fn remove_node_does_not_cascade() {
    let mut train = three_process_train();
    train.remove_node("uv1_start");

    assert!(!train.contains_edge("uv1"));
    assert!(!train.contains_edge("l1"));
    // No pruning: the now-orphaned end anchor stays.
    assert!(train.contains_node("uv1_end"));
    assert_eq!(train.in_degree("uv1_end"), 0);
}

#[test]
fn no_isolated_nodes_after_remove_process() {
    let mut train = three_process_train();
    train.remove_process("uv1");

    for node in train.nodes() {
        assert!(
            train.in_degree(&node.id) + train.out_degree(&node.id) > 0,
            "{} left isolated",
            node.id
        );
    }
    // ro1_end and cf1_start are dangling but not isolated.
    let dangling: Vec<_> = train
        .violations()
        .into_iter()
        .map(|v| (v.node, v.kind))
        .collect();
    assert!(dangling.contains(&("ro1_end".to_string(), ViolationKind::NoOutbound)));
    assert!(dangling.contains(&("cf1_start".to_string(), ViolationKind::NoInbound)));
}

#[test]
fn single_pass_and_fixed_point_differ_on_junction_chains() {
    // intake -> a -> j1 -> j2 -> b -> outfall
    let mut builder = TopologyBuilder::new();
    builder.add_source("intake").add_use("outfall");
    builder.add_junction("j1").add_junction("j2");
    builder.add_unit_process("a", ProcessAttrs::new("x")).unwrap();
    builder.add_unit_process("b", ProcessAttrs::new("y")).unwrap();
    builder.connect("l0", "intake", "a_start", None).unwrap();
    builder.connect("l1", "a_end", "j1", None).unwrap();
    builder.connect("l2", "j1", "j2", None).unwrap();
    builder.connect("l3", "j2", "b_start", None).unwrap();
    builder.connect("l4", "b_end", "outfall", None).unwrap();
    let train = builder.build();

    let mut single = train.clone();
    single.remove_process("a");
    assert!(single.contains_node("j1"));
    assert!(single.contains_node("j2"));
    assert!(!single.contains_node("intake"));

    let mut fixed = train.clone();
    fixed.remove_process_with("a", PruneMode::DanglingJunctions);
    assert!(!fixed.contains_node("j1"));
    assert!(!fixed.contains_node("j2"));
    assert!(fixed.contains_edge("b"));
}

#[test]
fn duplicate_names_rejected_across_kinds() {
    let mut train = three_process_train();
    let err = train
        .add_edge("intake", "outfall", Edge::transport("uv1", None))
        .unwrap_err();
    assert_eq!(err, GraphError::DuplicateEdge { name: "uv1".into() });
}

#[test]
fn node_state_is_writable_by_collaborators() {
    let mut train = three_process_train();
    train.node_mut("intake").unwrap().state.flow = Some(wt_core::m3ps(1.0));
    assert!(train.node("intake").unwrap().state.flow.is_some());
    assert_eq!(train.node("intake").unwrap().kind, NodeKind::Source);
}

/// intake -> p0 -> j0 -> p1 -> j1 -> ... -> outfall, where `taps[i]` hangs an
/// extra use node off junction `j{i}`.
fn branched_train(taps: &[bool]) -> TrainGraph {
    let mut builder = TopologyBuilder::new();
    builder.add_source("intake").add_use("outfall");
    let mut upstream = "intake".to_string();
    for (i, &tap) in taps.iter().enumerate() {
        let p = format!("p{i}");
        builder.add_unit_process(&p, ProcessAttrs::new("x")).unwrap();
        builder
            .connect(&format!("in{i}"), &upstream, &format!("{p}_start"), None)
            .unwrap();
        let junction = format!("j{i}");
        builder.add_junction(junction.clone());
        builder
            .connect(&format!("out{i}"), &format!("{p}_end"), &junction, None)
            .unwrap();
        if tap {
            let tap_node = format!("tap{i}");
            builder.add_use(tap_node.clone());
            builder
                .connect(&format!("tap_link{i}"), &junction, &tap_node, None)
                .unwrap();
        }
        upstream = junction;
    }
    builder.connect("last", &upstream, "outfall", None).unwrap();
    builder.build()
}

mod pruning {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn remove_process_never_leaves_isolated_nodes(
            taps in prop::collection::vec(any::<bool>(), 1..8),
            pick in any::<prop::sample::Index>(),
            dangling in any::<bool>(),
        ) {
            let mut train = branched_train(&taps);
            let victim = format!("p{}", pick.index(taps.len()));
            let mode = if dangling { PruneMode::DanglingJunctions } else { PruneMode::Isolated };

            let removed = train.remove_process_with(&victim, mode);

            let victim_start = format!("{victim}_start");
            let victim_end = format!("{victim}_end");
            prop_assert!(removed.contains(&victim_start));
            prop_assert!(removed.contains(&victim_end));
            prop_assert!(!train.contains_edge(&victim));
            for node in train.nodes() {
                prop_assert!(
                    train.in_degree(&node.id) + train.out_degree(&node.id) > 0,
                    "{} left isolated", node.id
                );
            }
            let survivors = train.unit_process_names();
            prop_assert_eq!(survivors.len(), taps.len() - 1);
        }
    }
}
