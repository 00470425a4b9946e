//! Bipartite trade networks: reporters on one side, partners on the other.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    edge::Edge,
    error::Result,
    graph::Graph,
    projection::{project, ProjectionWeight},
    table::{ColumnSelection, TradeRecord, TradeTable},
};

/// The side of the bipartite graph a node belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Exporting entities, group 0.
    Reporter,
    /// Importing entities, group 1.
    Partner,
}

impl Group {
    /// The numeric group tag, 0 for reporters and 1 for partners.
    pub const fn index(self) -> u8 {
        match self {
            Group::Reporter => 0,
            Group::Partner => 1,
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Group::Reporter => Group::Partner,
            Group::Partner => Group::Reporter,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Reporter => f.write_str("reporter"),
            Group::Partner => f.write_str("partner"),
        }
    }
}

/// A node identity: the same label on both sides yields two distinct nodes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Node {
    group: Group,
    label: String,
}

impl Node {
    pub fn new(group: Group, label: impl Into<String>) -> Self {
        Self {
            group,
            label: label.into(),
        }
    }

    pub fn reporter(label: impl Into<String>) -> Self {
        Self::new(Group::Reporter, label)
    }

    pub fn partner(label: impl Into<String>) -> Self {
        Self::new(Group::Partner, label)
    }

    pub fn group(&self) -> Group {
        self.group
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// How repeated `(reporter, partner)` rows combine into one edge weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Weights of repeated pairs are summed.
    #[default]
    Sum,
    /// The last row of a repeated pair wins.
    Overwrite,
}

/// Configuration for building a [`BipartiteGraph`] from a table.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub columns: ColumnSelection,
    pub merge: MergePolicy,
}

impl BuildConfig {
    pub fn new(columns: ColumnSelection) -> Self {
        Self {
            columns,
            merge: MergePolicy::default(),
        }
    }

    pub fn with_merge(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }
}

/// An undirected bipartite graph where every edge joins a reporter to a partner.
#[derive(Clone, Debug, PartialEq)]
pub struct BipartiteGraph {
    graph: Graph<Node>,
    reporters: BTreeSet<Node>,
    partners: BTreeSet<Node>,
}

impl BipartiteGraph {
    /// Builds the graph from the rows of a table.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::bipartite::{BipartiteGraph, BuildConfig, Node};
    /// use faonet::table::TradeTable;
    ///
    /// let mut table = TradeTable::new(["Reporter Countries", "Partner Countries", "Value"]);
    /// table.push_row(["A", "X", "10"]);
    /// table.push_row(["A", "Y", "20"]);
    /// table.push_row(["B", "Y", "30"]);
    ///
    /// let graph = BipartiteGraph::from_table(&table, &BuildConfig::default())?;
    ///
    /// assert_eq!(graph.graph().vertex_count(), 4);
    /// assert_eq!(graph.graph().strength(&Node::partner("Y")), 50.0);
    /// # Ok::<(), faonet::Error>(())
    /// ```
    pub fn from_table(table: &TradeTable, config: &BuildConfig) -> Result<Self> {
        let records = table.records(&config.columns)?;
        let graph = Self::from_records(records, config.merge);

        tracing::info!(
            reporters = graph.reporters.len(),
            partners = graph.partners.len(),
            edges = graph.graph.edge_count(),
            density = graph.graph.density(),
            "built bipartite trade graph"
        );

        Ok(graph)
    }

    /// Builds the graph from trade records.
    pub fn from_records<I>(records: I, merge: MergePolicy) -> Self
    where
        I: IntoIterator<Item = TradeRecord>,
    {
        let mut graph = Graph::new();
        let mut reporters = BTreeSet::new();
        let mut partners = BTreeSet::new();

        for record in records {
            let reporter = Node::reporter(record.reporter);
            let partner = Node::partner(record.partner);

            reporters.insert(reporter.clone());
            partners.insert(partner.clone());

            let edge = Edge::new(reporter, partner);
            match merge {
                MergePolicy::Sum => graph.add_weight(edge, record.value),
                MergePolicy::Overwrite => {
                    graph.insert(edge, record.value);
                }
            }
        }

        Self {
            graph,
            reporters,
            partners,
        }
    }

    /// The underlying weighted graph.
    pub fn graph(&self) -> &Graph<Node> {
        &self.graph
    }

    pub fn reporters(&self) -> &BTreeSet<Node> {
        &self.reporters
    }

    pub fn partners(&self) -> &BTreeSet<Node> {
        &self.partners
    }

    /// The nodes of one side.
    pub fn nodes(&self, group: Group) -> &BTreeSet<Node> {
        match group {
            Group::Reporter => &self.reporters,
            Group::Partner => &self.partners,
        }
    }

    /// Returns a copy without the edges weighing exactly zero; node sets are unchanged.
    pub fn remove_zero_weight_edges(&self) -> Self {
        self.with_graph(self.graph.remove_zero_weight_edges())
    }

    /// Returns a copy with every weight [inverted](crate::graph::invert_weight).
    pub fn inverted(&self) -> Self {
        self.with_graph(self.graph.inverted())
    }

    /// Projects the graph onto one side: two nodes of `group` are linked when they share at least
    /// one neighbour, the weight being derived from their common neighbours.
    pub fn project(&self, group: Group, weight: ProjectionWeight) -> Graph<Node> {
        project(&self.graph, self.nodes(group), weight)
    }

    fn with_graph(&self, graph: Graph<Node>) -> Self {
        Self {
            graph,
            reporters: self.reporters.clone(),
            partners: self.partners.clone(),
        }
    }
}
