//! Per-node metrics of a bipartite trade network: degree, strength and betweenness centrality
//! over the bipartite graph and its two projections.
//!
//! Every betweenness series comes in two flavours. The raw one reads trade values as distances,
//! so heavy flows make long paths. The inverted one reads them as affinities (`1 / weight`, zero
//! staying zero), so heavy flows make short paths.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    betweenness::BetweennessConfig,
    bipartite::{BipartiteGraph, Group, Node},
    graph::Graph,
    projection::ProjectionWeight,
};

/// Configuration for [`node_metrics`] and [`BetweennessSeries::compute`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub betweenness: BetweennessConfig,
    pub projection: ProjectionWeight,
}

impl MetricsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_betweenness(mut self, betweenness: BetweennessConfig) -> Self {
        self.betweenness = betweenness;
        self
    }

    pub const fn with_projection(mut self, projection: ProjectionWeight) -> Self {
        self.projection = projection;
        self
    }
}

/// Degree and strength of one node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DegreeStrength {
    #[serde(rename = "Node")]
    pub node: String,
    #[serde(rename = "Degree")]
    pub degree: usize,
    #[serde(rename = "Strength")]
    pub strength: f64,
}

/// Returns the degree and strength of each of `nodes`, in iteration order.
///
/// Nodes without incident edges, or absent from the graph, get a degree and strength of zero.
pub fn degree_strength<'a, T, I>(graph: &Graph<T>, nodes: I) -> Vec<DegreeStrength>
where
    T: Clone + Ord + std::fmt::Debug + std::fmt::Display + 'a,
    I: IntoIterator<Item = &'a T>,
{
    nodes
        .into_iter()
        .map(|node| DegreeStrength {
            node: node.to_string(),
            degree: graph.degree(node),
            strength: graph.strength(node),
        })
        .collect()
}

impl BipartiteGraph {
    /// Degree and strength of every node of one side.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::bipartite::{BipartiteGraph, Group, MergePolicy};
    /// use faonet::table::TradeRecord;
    ///
    /// let graph = BipartiteGraph::from_records(
    ///     [
    ///         TradeRecord::new("A", "X", 10.0),
    ///         TradeRecord::new("A", "Y", 5.0),
    ///         TradeRecord::new("B", "Y", 7.0),
    ///     ],
    ///     MergePolicy::Sum,
    /// );
    ///
    /// let rows = graph.degree_strength(Group::Reporter);
    /// assert_eq!((rows[0].node.as_str(), rows[0].degree, rows[0].strength), ("A", 2, 15.0));
    /// assert_eq!((rows[1].node.as_str(), rows[1].degree, rows[1].strength), ("B", 1, 7.0));
    /// ```
    pub fn degree_strength(&self, group: Group) -> Vec<DegreeStrength> {
        degree_strength(self.graph(), self.nodes(group))
    }
}

/// The six betweenness centrality series of a bipartite trade network.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BetweennessSeries {
    pub bipartite: BTreeMap<Node, f64>,
    pub bipartite_inverted: BTreeMap<Node, f64>,
    pub reporters: BTreeMap<Node, f64>,
    pub reporters_inverted: BTreeMap<Node, f64>,
    pub partners: BTreeMap<Node, f64>,
    pub partners_inverted: BTreeMap<Node, f64>,
}

impl BetweennessSeries {
    /// Computes betweenness on the bipartite graph and on both projections, with raw and
    /// inverted weights.
    pub fn compute(graph: &BipartiteGraph, config: &MetricsConfig) -> Self {
        let betweenness = &config.betweenness;
        let both = |g: &Graph<Node>| {
            (
                g.betweenness_centrality(betweenness),
                g.inverted().betweenness_centrality(betweenness),
            )
        };

        let (bipartite, bipartite_inverted) = both(graph.graph());
        let (reporters, reporters_inverted) =
            both(&graph.project(Group::Reporter, config.projection));
        let (partners, partners_inverted) = both(&graph.project(Group::Partner, config.projection));

        Self {
            bipartite,
            bipartite_inverted,
            reporters,
            reporters_inverted,
            partners,
            partners_inverted,
        }
    }
}

/// Every metric of one node. Projection columns are empty for nodes outside that projection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeMetrics {
    #[serde(rename = "Node")]
    pub node: String,
    #[serde(rename = "Group")]
    pub group: Group,
    #[serde(rename = "Degree")]
    pub degree: usize,
    #[serde(rename = "Strength")]
    pub strength: f64,
    pub betweenness_bipartite: f64,
    pub betweenness_bipartite_inverted: f64,
    pub betweenness_projected_reporters: Option<f64>,
    pub betweenness_projected_reporters_inverted: Option<f64>,
    pub betweenness_projected_partners: Option<f64>,
    pub betweenness_projected_partners_inverted: Option<f64>,
}

impl NodeMetrics {
    /// Betweenness in the projection of the node's own side.
    pub fn betweenness_projected(&self) -> Option<f64> {
        match self.group {
            Group::Reporter => self.betweenness_projected_reporters,
            Group::Partner => self.betweenness_projected_partners,
        }
    }

    /// Inverted-weight betweenness in the projection of the node's own side.
    pub fn betweenness_projected_inverted(&self) -> Option<f64> {
        match self.group {
            Group::Reporter => self.betweenness_projected_reporters_inverted,
            Group::Partner => self.betweenness_projected_partners_inverted,
        }
    }
}

/// Computes one row of metrics per node, reporters first, each side in label order.
pub fn node_metrics(graph: &BipartiteGraph, config: &MetricsConfig) -> Vec<NodeMetrics> {
    let series = BetweennessSeries::compute(graph, config);
    let degrees = graph.graph().degrees();
    let strengths = graph.graph().strengths();

    let nodes: BTreeSet<&Node> = graph.reporters().iter().chain(graph.partners()).collect();

    nodes
        .into_iter()
        .map(|node| NodeMetrics {
            node: node.label().to_owned(),
            group: node.group(),
            degree: degrees.get(node).copied().unwrap_or(0),
            strength: strengths.get(node).copied().unwrap_or(0.0),
            betweenness_bipartite: series.bipartite.get(node).copied().unwrap_or(0.0),
            betweenness_bipartite_inverted: series
                .bipartite_inverted
                .get(node)
                .copied()
                .unwrap_or(0.0),
            betweenness_projected_reporters: series.reporters.get(node).copied(),
            betweenness_projected_reporters_inverted: series
                .reporters_inverted
                .get(node)
                .copied(),
            betweenness_projected_partners: series.partners.get(node).copied(),
            betweenness_projected_partners_inverted: series.partners_inverted.get(node).copied(),
        })
        .collect()
}
