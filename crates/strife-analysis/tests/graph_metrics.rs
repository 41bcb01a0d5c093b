//! Known-topology regression tests for graph metrics.
//!
//! Each test uses a hand-crafted graph with known properties. Expected
//! metric values are computed analytically and hardcoded, so any algorithm
//! change that shifts values will be caught.

use strife_analysis::community::modularity;
use strife_analysis::metrics::{
    betweenness_centrality, closeness_centrality, degree_centrality, eigenvector_centrality,
};
use strife_analysis::robustness::{articulation_points, giant_component_curve};
use strife_analysis::{
    CentralityAnalyzer, CommunityDetector, ConflictGraph, GraphBuilder, IntensityModeler,
    RobustnessAnalyzer, TopologyAnalyzer,
};
use strife_core::config::{CentralityConfig, CommunityConfig, IntensityConfig, RobustnessConfig};
use strife_core::{AggregationPolicy, EntityKind, EntityRecord, RelationRecord};

const EPS: f64 = 1e-10;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_graph(edges: &[(&str, &str, f64)]) -> ConflictGraph {
    let nodes: std::collections::BTreeSet<&str> =
        edges.iter().flat_map(|(a, b, _)| [*a, *b]).collect();
    let nodes: Vec<&str> = nodes.into_iter().collect();
    build_graph_with_isolated(&nodes, edges)
}

fn build_graph_with_isolated(nodes: &[&str], edges: &[(&str, &str, f64)]) -> ConflictGraph {
    let entities: Vec<EntityRecord> = nodes
        .iter()
        .map(|id| EntityRecord::new(*id, id.to_uppercase(), EntityKind::Character))
        .collect();
    let relations: Vec<RelationRecord> = edges
        .iter()
        .map(|(a, b, w)| RelationRecord::new(*a, *b, *w))
        .collect();
    GraphBuilder::new(AggregationPolicy::SumClamped)
        .build(&entities, &relations)
        .graph
}

fn path5() -> ConflictGraph {
    build_graph(&[
        ("a", "b", 1.0),
        ("b", "c", 1.0),
        ("c", "d", 1.0),
        ("d", "e", 1.0),
    ])
}

fn star4() -> ConflictGraph {
    build_graph(&[("hub", "l1", 1.0), ("hub", "l2", 1.0), ("hub", "l3", 1.0)])
}

fn score(graph: &ConflictGraph, values: &[f64], id: &str) -> f64 {
    values[graph.index_of(id).expect("node present")]
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

#[test]
fn triangle_is_fully_clustered() {
    let g = build_graph(&[("a", "b", 0.5), ("b", "c", 0.5), ("a", "c", 0.5)]);
    let t = TopologyAnalyzer::new().analyze(&g);
    assert!((t.density - 1.0).abs() < EPS);
    assert!((t.global_clustering - 1.0).abs() < EPS);
    assert!((t.average_clustering - 1.0).abs() < EPS);
    assert_eq!(t.average_path_length, Some(1.0));
    assert_eq!(t.diameter, Some(1));
}

#[test]
fn path_of_four_statistics() {
    let g = build_graph(&[("a", "b", 1.0), ("b", "c", 1.0), ("c", "d", 1.0)]);
    let t = TopologyAnalyzer::new().analyze(&g);
    assert!((t.density - 0.5).abs() < EPS);
    assert!(t.global_clustering.abs() < EPS);
    assert!((t.average_path_length.expect("defined") - 5.0 / 3.0).abs() < EPS);
    assert_eq!(t.diameter, Some(3));

    assert_eq!(t.degree.min, 1);
    assert_eq!(t.degree.max, 2);
    assert!((t.degree.mean - 1.5).abs() < EPS);
    assert!((t.degree.p25 - 1.0).abs() < EPS);
    assert!((t.degree.p50 - 1.5).abs() < EPS);
    assert!((t.degree.p75 - 2.0).abs() < EPS);
    assert!((t.degree.p90 - 2.0).abs() < EPS);
}

#[test]
fn components_sorted_and_largest_tie_takes_lowest_id() {
    let g = build_graph_with_isolated(
        &["a", "b", "c", "d", "e"],
        &[("a", "b", 1.0), ("c", "d", 1.0)],
    );
    let t = TopologyAnalyzer::new().analyze(&g);
    assert_eq!(t.component_count, 3);
    assert_eq!(t.component_sizes, vec![2, 2, 1]);
    assert_eq!(t.largest_component_size, 2);
    assert_eq!(t.isolated_nodes, 1);
    assert_eq!(t.average_path_length, Some(1.0));
}

#[test]
fn single_node_has_undefined_paths() {
    let g = build_graph_with_isolated(&["solo"], &[]);
    let t = TopologyAnalyzer::new().analyze(&g);
    assert_eq!(t.average_path_length, None);
    assert_eq!(t.diameter, None);
    assert!(t.density.abs() < EPS);
}

#[test]
fn empty_graph_topology_is_zeroed() {
    let g = build_graph(&[]);
    let t = TopologyAnalyzer::new().analyze(&g);
    assert_eq!(t.node_count, 0);
    assert_eq!(t.component_count, 0);
    assert_eq!(t.average_path_length, None);
}

// ---------------------------------------------------------------------------
// Intensity
// ---------------------------------------------------------------------------

#[test]
fn intensity_profile_of_five_edges() {
    let g = build_graph(&[
        ("a", "b", 0.1),
        ("b", "c", 0.3),
        ("c", "d", 0.6),
        ("d", "e", 0.8),
        ("a", "e", 0.9),
    ]);
    let p = IntensityModeler::new(IntensityConfig::default()).analyze(&g);
    assert_eq!(p.edge_count, 5);
    assert!((p.mean - 0.54).abs() < EPS);
    assert!((p.median - 0.6).abs() < EPS);
    assert!((p.min - 0.1).abs() < EPS);
    assert!((p.max - 0.9).abs() < EPS);
    assert_eq!(
        (p.levels.low, p.levels.medium, p.levels.high, p.levels.critical),
        (1, 1, 1, 2)
    );
    assert!((p.high_risk_threshold - 0.86).abs() < EPS);
    assert_eq!(p.high_risk_pairs.len(), 1);
    assert_eq!(p.high_risk_pairs[0].source, "a");
    assert_eq!(p.high_risk_pairs[0].target, "e");
    let all = p.domain_pairs["unassigned<->unassigned"];
    assert!((all - 0.54).abs() < EPS);
}

#[test]
fn high_risk_ties_sorted_by_pair_key() {
    let g = build_graph(&[("c", "d", 0.7), ("a", "b", 0.7), ("a", "c", 0.7)]);
    let p = IntensityModeler::new(IntensityConfig::default()).analyze(&g);
    let keys: Vec<String> = p
        .high_risk_pairs
        .iter()
        .map(|h| format!("{}|{}", h.source, h.target))
        .collect();
    assert_eq!(keys, vec!["a|b", "a|c", "c|d"]);
}

#[test]
fn empty_edge_set_has_zero_intensity() {
    let g = build_graph_with_isolated(&["a", "b"], &[]);
    let p = IntensityModeler::new(IntensityConfig::default()).analyze(&g);
    assert_eq!(p.edge_count, 0);
    assert!(p.mean.abs() < EPS);
    assert!(p.high_risk_pairs.is_empty());
}

// ---------------------------------------------------------------------------
// Centrality
// ---------------------------------------------------------------------------

#[test]
fn path_of_three_betweenness() {
    let g = build_graph(&[("a", "b", 1.0), ("b", "c", 1.0)]);
    let bc = betweenness_centrality(&g);
    assert!((score(&g, &bc, "b") - 1.0).abs() < EPS);
    assert!(score(&g, &bc, "a").abs() < EPS);
}

#[test]
fn path_of_four_betweenness() {
    let g = build_graph(&[("a", "b", 1.0), ("b", "c", 1.0), ("c", "d", 1.0)]);
    let bc = betweenness_centrality(&g);
    assert!((score(&g, &bc, "b") - 2.0 / 3.0).abs() < EPS);
    assert!((score(&g, &bc, "c") - 2.0 / 3.0).abs() < EPS);
}

#[test]
fn star_degree_and_closeness() {
    let g = star4();
    let degree = degree_centrality(&g);
    let closeness = closeness_centrality(&g);
    assert!((score(&g, &degree, "hub") - 1.0).abs() < EPS);
    assert!((score(&g, &degree, "l1") - 1.0 / 3.0).abs() < EPS);
    assert!((score(&g, &closeness, "hub") - 1.0).abs() < EPS);
    assert!((score(&g, &closeness, "l2") - 0.6).abs() < EPS);
}

#[test]
fn closeness_scales_by_reachable_share() {
    let g = build_graph_with_isolated(&["a", "b", "c"], &[("a", "b", 1.0)]);
    let closeness = closeness_centrality(&g);
    assert!((score(&g, &closeness, "a") - 0.5).abs() < EPS);
    assert!(score(&g, &closeness, "c").abs() < EPS);
}

#[test]
fn star_eigenvector() {
    let g = star4();
    let ev = eigenvector_centrality(&g, 1000, 1e-12).expect("converges");
    assert!((score(&g, &ev.scores, "hub") - 1.0 / 2.0_f64.sqrt()).abs() < 1e-6);
    assert!((score(&g, &ev.scores, "l3") - 1.0 / 6.0_f64.sqrt()).abs() < 1e-6);
}

#[test]
fn edgeless_eigenvector_is_zero_and_converged() {
    let g = build_graph_with_isolated(&["a", "b"], &[]);
    let scores = CentralityAnalyzer::new(CentralityConfig::default()).analyze(&g);
    assert!(scores.eigenvector.converged);
    assert!(!scores.eigenvector.fallback);
    assert!(scores.nodes.values().all(|c| c.eigenvector.abs() < EPS));
}

#[test]
fn zero_weight_edges_score_like_no_edges() {
    let g = build_graph_with_isolated(&["a", "b", "c"], &[("a", "b", 0.0)]);
    assert_eq!(g.edge_count(), 1);
    let ev = eigenvector_centrality(&g, 1000, 1e-12).expect("converges");
    assert_eq!(ev.iterations, 0);
    assert!(ev.scores.iter().all(|s| s.abs() < EPS));

    let scores = CentralityAnalyzer::new(CentralityConfig::default()).analyze(&g);
    assert!(scores.eigenvector.converged);
    assert!(scores.nodes["c"].eigenvector.abs() < EPS);
}

#[test]
fn eigenvector_falls_back_to_degree() {
    let config = CentralityConfig {
        eigenvector_max_iter: 1,
        eigenvector_tolerance: 1e-15,
        ..CentralityConfig::default()
    };
    let scores = CentralityAnalyzer::new(config).analyze(&star4());
    assert!(scores.eigenvector.fallback);
    assert!(!scores.eigenvector.converged);
    for node in scores.nodes.values() {
        assert!((node.eigenvector - node.degree).abs() < EPS);
    }
}

#[test]
fn top_k_truncates_rankings() {
    let config = CentralityConfig {
        top_k: 2,
        ..CentralityConfig::default()
    };
    let scores = CentralityAnalyzer::new(config).analyze(&path5());
    let top = &scores.top["betweenness"];
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].id, "c");
    assert_eq!(top[1].id, "b", "b and d tie; lower id first");
}

// ---------------------------------------------------------------------------
// Communities
// ---------------------------------------------------------------------------

#[test]
fn bridged_triangles_split_in_two() {
    let g = build_graph(&[
        ("a", "b", 1.0),
        ("b", "c", 1.0),
        ("a", "c", 1.0),
        ("d", "e", 1.0),
        ("e", "f", 1.0),
        ("d", "f", 1.0),
        ("c", "d", 1.0),
    ]);
    let s = CommunityDetector::new(CommunityConfig::default()).detect(&g);
    assert_eq!(s.community_count, 2);
    assert_eq!(s.communities[0].members, vec!["a", "b", "c"]);
    assert_eq!(s.communities[1].members, vec!["d", "e", "f"]);
    assert!((s.communities[0].internal_weight - 3.0).abs() < EPS);
    assert!((s.modularity - 5.0 / 14.0).abs() < EPS);
    assert_eq!(s.assignments["a"], 0);
    assert_eq!(s.assignments["f"], 1);
}

#[test]
fn edgeless_graph_is_all_singletons() {
    let g = build_graph_with_isolated(&["a", "b", "c"], &[]);
    let s = CommunityDetector::new(CommunityConfig::default()).detect(&g);
    assert_eq!(s.community_count, 3);
    assert!(s.modularity.abs() < EPS);
    assert_eq!(s.assignments["c"], 2);
}

/// Two triangles (`b c d` and `e f g`) with `a` bridging `b` and `e`.
fn bridged_by_lowest_node() -> ConflictGraph {
    build_graph(&[
        ("a", "b", 1.0),
        ("a", "e", 1.0),
        ("b", "c", 1.0),
        ("b", "d", 1.0),
        ("c", "d", 1.0),
        ("e", "f", 1.0),
        ("e", "g", 1.0),
        ("f", "g", 1.0),
    ])
}

/// Pairs `a b` and `c d` (weight 1) fully cross-linked at 0.75. No single
/// node gains by switching pairs, but merging the pairs does.
fn cross_linked_pairs() -> ConflictGraph {
    build_graph(&[
        ("a", "b", 1.0),
        ("c", "d", 1.0),
        ("a", "c", 0.75),
        ("a", "d", 0.75),
        ("b", "c", 0.75),
        ("b", "d", 0.75),
    ])
}

#[test]
fn equal_candidates_resolve_to_lowest_community() {
    // `a` sees the two triangles with identical gain and settles with `b`.
    let g = bridged_by_lowest_node();
    let s = CommunityDetector::new(CommunityConfig::default()).detect(&g);
    assert_eq!(s.community_count, 2);
    assert_eq!(s.communities[0].members, vec!["a", "b", "c", "d"]);
    assert_eq!(s.communities[1].members, vec!["e", "f", "g"]);
    assert!((s.modularity - 47.0 / 128.0).abs() < EPS);
    assert_eq!(s.levels, 2);
}

#[test]
fn equal_gain_does_not_move_a_node() {
    // On a 4-cycle the pairs `a b` / `c d` and the single community both
    // have Q = 0; merging gains exactly nothing, so the pairs stay apart.
    let g = build_graph(&[
        ("a", "b", 1.0),
        ("b", "c", 1.0),
        ("c", "d", 1.0),
        ("a", "d", 1.0),
    ]);
    let s = CommunityDetector::new(CommunityConfig::default()).detect(&g);
    assert_eq!(s.community_count, 2);
    assert_eq!(s.communities[0].members, vec!["a", "b"]);
    assert_eq!(s.communities[1].members, vec!["c", "d"]);
    assert!(s.modularity.abs() < EPS);
    assert_eq!(s.levels, 2);
}

#[test]
fn aggregation_merges_what_single_moves_cannot() {
    let g = cross_linked_pairs();
    let s = CommunityDetector::new(CommunityConfig::default()).detect(&g);
    assert_eq!(s.community_count, 1);
    assert!(s.modularity.abs() < EPS);
    assert_eq!(s.levels, 3);
    assert_eq!(s.passes, 5);
}

#[test]
fn max_levels_stops_before_aggregation() {
    let config = CommunityConfig {
        max_levels: 1,
        ..CommunityConfig::default()
    };
    let s = CommunityDetector::new(config).detect(&cross_linked_pairs());
    assert_eq!(s.community_count, 2);
    assert_eq!(s.communities[0].members, vec!["a", "b"]);
    assert!((s.modularity + 0.1).abs() < EPS);
    assert_eq!(s.levels, 1);
    assert_eq!(s.passes, 2);
}

#[test]
fn max_passes_caps_each_local_phase() {
    let config = CommunityConfig {
        max_passes: 1,
        ..CommunityConfig::default()
    };
    let s = CommunityDetector::new(config).detect(&cross_linked_pairs());
    assert_eq!(s.community_count, 1);
    assert_eq!(s.levels, 3);
    assert_eq!(s.passes, 3);
}

#[test]
fn ring_of_six_triangles() {
    let mut edges: Vec<(String, String)> = Vec::new();
    for t in 0..6 {
        let (a, b, c) = (format!("t{t}a"), format!("t{t}b"), format!("t{t}c"));
        edges.push((a.clone(), b.clone()));
        edges.push((b, c.clone()));
        edges.push((a, c.clone()));
        edges.push((c, format!("t{}a", (t + 1) % 6)));
    }
    let edges: Vec<(&str, &str, f64)> =
        edges.iter().map(|(a, b)| (a.as_str(), b.as_str(), 1.0)).collect();
    let g = build_graph(&edges);

    let s = CommunityDetector::new(CommunityConfig::default()).detect(&g);
    assert_eq!(s.community_count, 6);
    assert!((s.modularity - 7.0 / 12.0).abs() < EPS);
    assert_eq!(s.levels, 2);
    for (id, community) in s.communities.iter().enumerate() {
        let prefix = format!("t{id}");
        assert_eq!(community.size, 3);
        assert!(community.members.iter().all(|m| m.starts_with(&prefix)));
    }
}

#[test]
fn one_community_has_zero_modularity() {
    let g = path5();
    assert!(modularity(&g, &[0; 5], 1.0).abs() < EPS);
}

// ---------------------------------------------------------------------------
// Robustness
// ---------------------------------------------------------------------------

fn risk(graph: &ConflictGraph) -> f64 {
    let centrality = CentralityAnalyzer::new(CentralityConfig::default()).analyze(graph);
    RobustnessAnalyzer::new(RobustnessConfig::default())
        .analyze(graph, &centrality)
        .systemic_risk_score
}

#[test]
fn path_of_five_risk() {
    // Targeted order c, b, d, a, e: curve [1, .4, .4, .2, .2, 0].
    assert!((risk(&path5()) - 2.0 / 3.0).abs() < EPS);
}

#[test]
fn removing_path_center_does_not_lower_risk() {
    let split = build_graph(&[("a", "b", 1.0), ("d", "e", 1.0)]);
    let before = risk(&path5());
    let after = risk(&split);
    assert!((after - 1.0).abs() < EPS);
    assert!(after >= before);
}

#[test]
fn removing_star_hub_does_not_lower_risk() {
    let before = risk(&star4());
    let after = risk(&build_graph_with_isolated(&["l1", "l2", "l3"], &[]));
    assert!((before - 1.0).abs() < EPS);
    assert!((after - 1.0).abs() < EPS);
}

#[test]
fn edgeless_pair_is_fully_fragile_but_connected_pair_is_not() {
    let apart = build_graph_with_isolated(&["a", "b"], &[]);
    let together = build_graph(&[("a", "b", 1.0)]);
    assert!((risk(&apart) - 1.0).abs() < EPS);
    assert!(risk(&together).abs() < EPS);
    let single = build_graph_with_isolated(&["a"], &[]);
    assert!(risk(&single).abs() < EPS);
}

#[test]
fn curve_tracks_largest_component() {
    let g = build_graph(&[("a", "b", 1.0), ("b", "c", 1.0)]);
    let curve = giant_component_curve(&g, &[1, 0, 2]);
    let expected = [1.0, 1.0 / 3.0, 1.0 / 3.0, 0.0];
    for (got, want) in curve.iter().zip(expected) {
        assert!((got - want).abs() < EPS);
    }
}

#[test]
fn articulation_points_of_path_and_star() {
    let p = path5();
    let cut: Vec<&str> = articulation_points(&p).into_iter().map(|i| p.node_id(i)).collect();
    assert_eq!(cut, vec!["b", "c", "d"]);

    let s = star4();
    let cut: Vec<&str> = articulation_points(&s).into_iter().map(|i| s.node_id(i)).collect();
    assert_eq!(cut, vec!["hub"]);
}

#[test]
fn random_curve_starts_whole_and_ends_empty() {
    let g = path5();
    let centrality = CentralityAnalyzer::new(CentralityConfig::default()).analyze(&g);
    let report = RobustnessAnalyzer::new(RobustnessConfig::default()).analyze(&g, &centrality);
    assert_eq!(report.random_curve.len(), 6);
    assert!((report.random_curve[0] - 1.0).abs() < EPS);
    assert!(report.random_curve[5].abs() < EPS);
    assert_eq!(report.targeted_order[0], "c");
    assert!((0.0..=1.0).contains(&report.random_strategy_score));
}
