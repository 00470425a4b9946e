//! One-mode projections of bipartite graphs.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Debug,
    time::Instant,
};

use itertools::Itertools;
use serde::Deserialize;

use crate::{edge::Edge, graph::Graph};

/// The weight given to an edge of a projection, accumulated over the neighbours the two
/// projected nodes have in common.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionWeight {
    /// The number of shared neighbours.
    #[default]
    SharedPartners,
    /// The sum, over shared neighbours, of the lighter of the two connecting edges.
    MinWeight,
    /// Newman's collaboration weighting: each shared neighbour `p` contributes
    /// `1 / (deg(p) - 1)`.
    Newman,
}

/// Projects `graph` onto `nodes`: two of them are linked when they share at least one neighbour.
///
/// Every node of the set is part of the projection, including those without any shared
/// neighbour. Edges with both or neither endpoint in `nodes` are ignored.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
///
/// use faonet::edge::Edge;
/// use faonet::graph::Graph;
/// use faonet::projection::{project, ProjectionWeight};
///
/// let mut graph = Graph::new();
/// graph.insert(Edge::new("a", "x"), 10.0);
/// graph.insert(Edge::new("b", "x"), 4.0);
/// graph.insert(Edge::new("c", "y"), 1.0);
///
/// let exporters: BTreeSet<_> = ["a", "b", "c"].into_iter().collect();
/// let projected = project(&graph, &exporters, ProjectionWeight::MinWeight);
///
/// assert_eq!(projected.vertex_count(), 3);
/// assert_eq!(projected.weight(&Edge::new("a", "b")), Some(4.0));
/// ```
pub fn project<T>(graph: &Graph<T>, nodes: &BTreeSet<T>, weight: ProjectionWeight) -> Graph<T>
where
    T: Clone + Ord + Debug,
{
    let start = Instant::now();

    let mut projected = Graph::new();
    for node in nodes {
        projected.insert_vertex(node.clone());
    }

    // The projected nodes attached to each neighbour on the other side.
    let mut attached: BTreeMap<&T, Vec<(&T, f64)>> = BTreeMap::new();
    for member in nodes {
        for (other, w) in graph.neighbours(member) {
            if !nodes.contains(other) {
                attached.entry(other).or_default().push((member, w));
            }
        }
    }

    for members in attached.values() {
        let degree = members.len();

        for ((u, wu), (v, wv)) in members.iter().tuple_combinations() {
            let contribution = match weight {
                ProjectionWeight::SharedPartners => 1.0,
                ProjectionWeight::MinWeight => wu.min(*wv),
                // A pair exists, so the degree is at least 2.
                ProjectionWeight::Newman => 1.0 / (degree - 1) as f64,
            };

            projected.add_weight(Edge::new((*u).clone(), (*v).clone()), contribution);
        }
    }

    tracing::debug!(
        nodes = projected.vertex_count(),
        edges = projected.edge_count(),
        ?weight,
        elapsed = ?start.elapsed(),
        "projected bipartite graph"
    );

    projected
}
