//! Property tests over randomly generated trade records.

use std::collections::{BTreeMap, BTreeSet};

use faonet::{
    betweenness::BetweennessConfig,
    bipartite::{BipartiteGraph, Group, MergePolicy, Node},
    filtering::top_percentile,
    graph::invert_weight,
    projection::ProjectionWeight,
    table::TradeRecord,
};
use proptest::collection::vec;
use proptest::prelude::*;

/// Country labels are drawn from a small pool so the same label often shows up on both sides.
fn records() -> impl Strategy<Value = Vec<TradeRecord>> {
    vec((0u8..8, 0u8..8, 0u32..100), 1..40).prop_map(|rows| {
        rows.into_iter()
            .map(|(r, p, v)| TradeRecord::new(format!("c{r}"), format!("c{p}"), f64::from(v)))
            .collect()
    })
}

proptest! {
    /// Every distinct reporter and every distinct partner becomes its own node.
    #[test]
    fn node_count_matches_distinct_labels(records in records()) {
        let reporters: BTreeSet<_> = records.iter().map(|r| r.reporter.clone()).collect();
        let partners: BTreeSet<_> = records.iter().map(|r| r.partner.clone()).collect();

        let graph = BipartiteGraph::from_records(records, MergePolicy::Sum);

        prop_assert_eq!(graph.reporters().len(), reporters.len());
        prop_assert_eq!(graph.partners().len(), partners.len());
        prop_assert_eq!(graph.graph().vertex_count(), reporters.len() + partners.len());
    }

    /// Summing duplicates makes a reporter's strength its total exported value.
    #[test]
    fn strength_is_total_value(records in records()) {
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        let mut partners: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for record in &records {
            *totals.entry(record.reporter.clone()).or_default() += record.value;
            partners.entry(record.reporter.clone()).or_default().insert(record.partner.clone());
        }

        let graph = BipartiteGraph::from_records(records, MergePolicy::Sum);

        for row in graph.degree_strength(Group::Reporter) {
            prop_assert_eq!(row.strength, totals[&row.node]);
            prop_assert_eq!(row.degree, partners[&row.node].len());
        }
    }

    /// Pruning drops exactly the zero edges and is idempotent.
    #[test]
    fn pruning_is_idempotent(records in records()) {
        let graph = BipartiteGraph::from_records(records, MergePolicy::Overwrite);
        let zeros = graph.graph().edges().filter(|(_, weight)| *weight == 0.0).count();

        let once = graph.remove_zero_weight_edges();
        let twice = once.remove_zero_weight_edges();

        prop_assert_eq!(once.graph().edge_count(), graph.graph().edge_count() - zeros);
        prop_assert_eq!(once.graph().vertex_count(), graph.graph().vertex_count());
        prop_assert_eq!(&once, &twice);
    }

    /// Inversion keeps the topology and maps each weight through `invert_weight`.
    #[test]
    fn inversion_keeps_topology(records in records()) {
        let graph = BipartiteGraph::from_records(records, MergePolicy::Sum);
        let inverted = graph.inverted();

        prop_assert_eq!(inverted.graph().edge_count(), graph.graph().edge_count());
        for (edge, weight) in graph.graph().edges() {
            prop_assert_eq!(inverted.graph().weight(edge), Some(invert_weight(weight)));
        }
    }

    /// Projections only link nodes of the projected side.
    #[test]
    fn projection_stays_on_one_side(records in records()) {
        let graph = BipartiteGraph::from_records(records, MergePolicy::Sum);

        for group in [Group::Reporter, Group::Partner] {
            let projected = graph.project(group, ProjectionWeight::SharedPartners);

            prop_assert_eq!(projected.vertex_count(), graph.nodes(group).len());
            for (edge, weight) in projected.edges() {
                prop_assert_eq!(edge.source().group(), group);
                prop_assert_eq!(edge.target().group(), group);
                prop_assert!(weight >= 1.0);
            }
        }
    }

    /// Betweenness is non-negative and does not depend on the number of workers.
    #[test]
    fn betweenness_is_thread_independent(records in records(), threads in 2usize..6) {
        let graph = BipartiteGraph::from_records(records, MergePolicy::Sum).remove_zero_weight_edges();

        let single = graph.graph().betweenness_centrality(&BetweennessConfig::new());
        let multi = graph
            .graph()
            .betweenness_centrality(&BetweennessConfig::new().with_num_threads(threads));

        prop_assert_eq!(single.len(), multi.len());
        for (node, value) in &single {
            prop_assert!(*value >= 0.0);
            prop_assert!((value - multi[node]).abs() < 1e-9);
        }
    }

    /// A full percentile keeps every row and accumulates to the whole total.
    #[test]
    fn full_percentile_keeps_everything(values in vec(1u32..1000, 1..50)) {
        let items: Vec<f64> = values.iter().map(|v| f64::from(*v)).collect();

        let ranked = top_percentile(items.clone(), |v| *v, 1.0).unwrap();

        prop_assert_eq!(ranked.len(), items.len());
        prop_assert_eq!(ranked.last().map(|r| r.cumperc), Some(1.0));
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].value >= pair[1].value);
            prop_assert!(pair[0].cumsum <= pair[1].cumsum);
        }
    }
}

#[test]
fn complete_bipartite_graph_is_symmetric() {
    let records = ["a", "b"]
        .iter()
        .flat_map(|r| ["x", "y"].map(|p| TradeRecord::new(*r, p, 1.0)));
    let graph = BipartiteGraph::from_records(records, MergePolicy::Sum);

    let betweenness = graph.graph().betweenness_centrality(&BetweennessConfig::new());
    let values: BTreeSet<u64> = betweenness.values().map(|v| v.to_bits()).collect();

    // Every node of K2,2 plays the same role.
    assert_eq!(values.len(), 1);
    assert_eq!(betweenness[&Node::reporter("a")], betweenness[&Node::partner("x")]);
}
