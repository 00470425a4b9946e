//! A module for working with weighted undirected graphs.

use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt::Debug,
    time::Instant,
};

use crate::{
    betweenness::{compute_betweenness, BetweennessConfig, WeightedIndices},
    edge::Edge,
};

/// Compact vertex index used by the path computations.
pub type GraphIndex = u32;

/// Inverts an edge weight so that strong ties become short distances.
///
/// Zero (and any non-positive weight) maps to zero rather than infinity.
///
/// # Examples
///
/// ```
/// use faonet::graph::invert_weight;
///
/// assert_eq!(invert_weight(10.0), 0.1);
/// assert_eq!(invert_weight(0.0), 0.0);
/// ```
pub fn invert_weight(weight: f64) -> f64 {
    if weight > 0.0 {
        1.0 / weight
    } else {
        0.0
    }
}

/// An undirected graph, made up of weighted edges.
///
/// Vertices are tracked explicitly so that removing edges never removes the vertices they were
/// attached to.
#[derive(Clone, Debug, PartialEq)]
pub struct Graph<T> {
    /// Every vertex of the graph, including isolated ones, mapped to its neighbours and the weights
    /// of the connecting edges. Sorted, so indices are stable between computations.
    adjacency: BTreeMap<T, BTreeMap<T, f64>>,
    /// The edges in the graph and their weights.
    edges: BTreeMap<Edge<T>, f64>,
}

impl<T> Default for Graph<T>
where
    T: Clone + Ord + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Graph<T>
where
    T: Clone + Ord + Debug,
{
    /// Creates an empty graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::graph::Graph;
    ///
    /// let graph: Graph<&str> = Graph::new();
    /// assert_eq!(graph.vertex_count(), 0);
    /// ```
    pub fn new() -> Self {
        Self {
            adjacency: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    /// Adds a vertex without any edges, returns whether it was new.
    pub fn insert_vertex(&mut self, vertex: T) -> bool {
        match self.adjacency.entry(vertex) {
            Entry::Vacant(entry) => {
                entry.insert(BTreeMap::new());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Inserts an edge with the given weight, overwriting the weight of an existing edge.
    ///
    /// Returns the previous weight, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::edge::Edge;
    /// use faonet::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    ///
    /// assert_eq!(graph.insert(Edge::new("a", "x"), 10.0), None);
    /// assert_eq!(graph.insert(Edge::new("x", "a"), 4.0), Some(10.0));
    /// assert_eq!(graph.weight(&Edge::new("a", "x")), Some(4.0));
    /// ```
    pub fn insert(&mut self, edge: Edge<T>, weight: f64) -> Option<f64> {
        self.link(&edge, weight);
        self.edges.insert(edge, weight)
    }

    /// Adds `weight` to the edge's current weight, inserting the edge if it doesn't exist yet.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::edge::Edge;
    /// use faonet::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.add_weight(Edge::new("a", "x"), 10.0);
    /// graph.add_weight(Edge::new("a", "x"), 4.0);
    ///
    /// assert_eq!(graph.weight(&Edge::new("a", "x")), Some(14.0));
    /// ```
    pub fn add_weight(&mut self, edge: Edge<T>, weight: f64) {
        let total = self.weight(&edge).unwrap_or(0.0) + weight;
        self.insert(edge, total);
    }

    /// Removes an edge and returns its weight if it was present. Its vertices stay in the graph.
    pub fn remove(&mut self, edge: &Edge<T>) -> Option<f64> {
        let weight = self.edges.remove(edge)?;

        if let Some(neighbours) = self.adjacency.get_mut(edge.source()) {
            neighbours.remove(edge.target());
        }
        if let Some(neighbours) = self.adjacency.get_mut(edge.target()) {
            neighbours.remove(edge.source());
        }

        Some(weight)
    }

    /// Checks if the graph contains an edge.
    pub fn contains(&self, edge: &Edge<T>) -> bool {
        self.edges.contains_key(edge)
    }

    /// Checks if the graph contains a vertex.
    pub fn contains_vertex(&self, vertex: &T) -> bool {
        self.adjacency.contains_key(vertex)
    }

    /// Returns the weight of an edge.
    pub fn weight(&self, edge: &Edge<T>) -> Option<f64> {
        self.edges.get(edge).copied()
    }

    /// Returns the vertex count of the graph.
    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns the edge count of the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterates over the vertices in ascending order.
    pub fn vertices(&self) -> impl Iterator<Item = &T> {
        self.adjacency.keys()
    }

    /// Iterates over the edges and their weights.
    pub fn edges(&self) -> impl Iterator<Item = (&Edge<T>, f64)> {
        self.edges.iter().map(|(edge, weight)| (edge, *weight))
    }

    /// Computes the density of the graph, the ratio of edges with respect to the maximum possible
    /// edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::edge::Edge;
    /// use faonet::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    ///
    /// graph.insert(Edge::new("a", "b"), 1.0);
    /// assert_eq!(graph.density(), 1.0);
    ///
    /// graph.insert(Edge::new("a", "c"), 1.0);
    /// assert_eq!(graph.density(), 2.0 / 3.0);
    /// ```
    pub fn density(&self) -> f64 {
        let vc = self.vertex_count() as f64;
        let ec = self.edge_count() as f64;

        // Calculate the total number of possible edges given a vertex count.
        let pec = vc * (vc - 1.0) / 2.0;
        // Actual edges divided by the possible edges gives the density.
        ec / pec
    }

    /// Returns the neighbours of a vertex, in ascending order, and the weights of the connecting
    /// edges.
    pub fn neighbours(&self, vertex: &T) -> Vec<(&T, f64)> {
        self.adjacency
            .get(vertex)
            .into_iter()
            .flatten()
            .map(|(other, weight)| (other, *weight))
            .collect()
    }

    /// Returns the number of edges incident to a vertex, zero if it isn't part of the graph.
    pub fn degree(&self, vertex: &T) -> usize {
        self.adjacency.get(vertex).map_or(0, BTreeMap::len)
    }

    /// Returns the sum of the weights of the edges incident to a vertex, zero if it isn't part of
    /// the graph.
    pub fn strength(&self, vertex: &T) -> f64 {
        self.adjacency
            .get(vertex)
            .map_or(0.0, |neighbours| neighbours.values().sum())
    }

    /// Returns a mapping of every vertex to its degree (number of connections).
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::edge::Edge;
    /// use faonet::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.insert(Edge::new("a", "x"), 10.0);
    /// graph.insert(Edge::new("a", "y"), 5.0);
    /// graph.insert(Edge::new("b", "y"), 7.0);
    ///
    /// let degrees = graph.degrees();
    /// assert_eq!(degrees[&"a"], 2);
    /// assert_eq!(degrees[&"b"], 1);
    /// ```
    pub fn degrees(&self) -> BTreeMap<T, usize> {
        self.adjacency
            .iter()
            .map(|(vertex, neighbours)| (vertex.clone(), neighbours.len()))
            .collect()
    }

    /// Returns a mapping of every vertex to its strength (sum of incident edge weights).
    pub fn strengths(&self) -> BTreeMap<T, f64> {
        self.adjacency
            .iter()
            .map(|(vertex, neighbours)| (vertex.clone(), neighbours.values().sum()))
            .collect()
    }

    /// Returns a copy of the graph without the edges weighing exactly zero. Vertices left
    /// isolated by the removal are kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::edge::Edge;
    /// use faonet::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.insert(Edge::new("a", "x"), 0.0);
    /// graph.insert(Edge::new("a", "y"), 3.0);
    ///
    /// let pruned = graph.remove_zero_weight_edges();
    /// assert_eq!(pruned.edge_count(), 1);
    /// assert_eq!(pruned.vertex_count(), 3);
    /// ```
    pub fn remove_zero_weight_edges(&self) -> Self {
        self.filter_edges(|_, weight| weight != 0.0)
    }

    /// Returns a copy of the graph keeping only the edges matching the predicate.
    pub fn filter_edges<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&Edge<T>, f64) -> bool,
    {
        let mut graph = self.without_edges();
        for (edge, weight) in &self.edges {
            if keep(edge, *weight) {
                graph.insert(edge.clone(), *weight);
            }
        }

        graph
    }

    /// Returns a copy of the graph with every weight replaced by its [inverse](invert_weight).
    pub fn inverted(&self) -> Self {
        self.map_weights(invert_weight)
    }

    /// Returns a copy of the graph with every weight transformed by `f`.
    pub fn map_weights<F>(&self, mut f: F) -> Self
    where
        F: FnMut(f64) -> f64,
    {
        let mut graph = self.without_edges();
        for (edge, weight) in &self.edges {
            graph.insert(edge.clone(), f(*weight));
        }

        graph
    }

    /// Returns the edge weights scaled so the heaviest edge maps to `max`, as used for drawing
    /// edge widths. The maximum falls back to 1 when the graph has no edges or only zero weights.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::edge::Edge;
    /// use faonet::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.insert(Edge::new("a", "x"), 10.0);
    /// graph.insert(Edge::new("a", "y"), 5.0);
    ///
    /// let widths = graph.scaled_weights(5.0);
    /// assert_eq!(widths[&Edge::new("a", "x")], 5.0);
    /// assert_eq!(widths[&Edge::new("a", "y")], 2.5);
    /// ```
    pub fn scaled_weights(&self, max: f64) -> BTreeMap<Edge<T>, f64> {
        let heaviest = self
            .edges
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let heaviest = if heaviest.is_finite() && heaviest != 0.0 {
            heaviest
        } else {
            1.0
        };

        self.edges
            .iter()
            .map(|(edge, weight)| (edge.clone(), weight / heaviest * max))
            .collect()
    }

    /// Returns a mapping of vertices to their betweenness centrality, edge weights being
    /// interpreted as distances.
    ///
    /// B(v) = sum over pairs (s, t) of the fraction of shortest s-t paths passing through v.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::betweenness::BetweennessConfig;
    /// use faonet::edge::Edge;
    /// use faonet::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.insert(Edge::new("a", "b"), 1.0);
    /// graph.insert(Edge::new("b", "c"), 1.0);
    ///
    /// let config = BetweennessConfig::new().with_normalize(false);
    /// let centrality = graph.betweenness_centrality(&config);
    ///
    /// assert_eq!(centrality[&"a"], 0.0);
    /// assert_eq!(centrality[&"b"], 1.0);
    /// ```
    pub fn betweenness_centrality(&self, config: &BetweennessConfig) -> BTreeMap<T, f64> {
        let start = Instant::now();

        let index = self.generate_index();
        let values = compute_betweenness(self.weighted_indices(&index), config);

        tracing::debug!(
            vertices = self.vertex_count(),
            edges = self.edge_count(),
            elapsed = ?start.elapsed(),
            "computed betweenness centrality"
        );

        index
            .into_keys()
            .zip(values)
            .collect()
    }

    //
    // Private
    //

    /// Records the edge in the adjacency of both endpoints.
    fn link(&mut self, edge: &Edge<T>, weight: f64) {
        self.adjacency
            .entry(edge.source().clone())
            .or_default()
            .insert(edge.target().clone(), weight);
        self.adjacency
            .entry(edge.target().clone())
            .or_default()
            .insert(edge.source().clone(), weight);
    }

    /// A copy holding the same vertices and no edges.
    fn without_edges(&self) -> Self {
        Self {
            adjacency: self
                .adjacency
                .keys()
                .map(|vertex| (vertex.clone(), BTreeMap::new()))
                .collect(),
            edges: BTreeMap::new(),
        }
    }

    /// Constructs an index of vertices, sorted by `T`'s implementation of `Ord`.
    fn generate_index(&self) -> BTreeMap<T, usize> {
        self.adjacency
            .keys()
            .enumerate()
            .map(|(i, vertex)| (vertex.clone(), i))
            .collect()
    }

    /// Builds the adjacency lists used by the path computations.
    fn weighted_indices(&self, index: &BTreeMap<T, usize>) -> WeightedIndices {
        // The index enumerates the adjacency keys in the same order.
        self.adjacency
            .values()
            .map(|neighbours| {
                neighbours
                    .iter()
                    .filter_map(|(other, weight)| {
                        index.get(other).map(|&j| (j as GraphIndex, *weight))
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! graph {
          ($($path:expr),*) => {{
              let mut graph = Graph::new();

              $(
                  let mut iter = $path.into_iter().peekable();
                  while let (Some(a), Some(b)) = (iter.next(), iter.peek()) {
                      graph.insert(Edge::new(a, *b), 1.0);
                  }

              )*

              graph
          }}
      }

    fn unnormalized() -> BetweennessConfig {
        BetweennessConfig::new().with_normalize(false)
    }

    #[test]
    fn new() {
        let _: Graph<()> = Graph::new();
    }

    #[test]
    fn insert() {
        let mut graph = Graph::new();
        let edge = Edge::new("a", "b");

        assert_eq!(graph.insert(edge.clone(), 1.0), None);
        assert_eq!(graph.insert(edge.clone(), 2.0), Some(1.0));
        assert_eq!(graph.weight(&edge), Some(2.0));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn add_weight() {
        let mut graph = Graph::new();
        graph.add_weight(Edge::new("a", "b"), 1.5);
        graph.add_weight(Edge::new("b", "a"), 2.5);

        assert_eq!(graph.weight(&Edge::new("a", "b")), Some(4.0));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn remove_keeps_vertices() {
        let edge = Edge::new("a", "b");
        let mut graph = Graph::new();
        graph.insert(edge.clone(), 1.0);

        assert_eq!(graph.remove(&edge), Some(1.0));
        assert_eq!(graph.remove(&Edge::new("a", "c")), None);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.vertex_count(), 2);
    }

    #[test]
    fn vertex_count() {
        let mut graph = Graph::new();
        assert_eq!(graph.vertex_count(), 0);

        // Verify two new vertices get added when they don't yet exist in the graph.
        graph.insert(Edge::new("a", "b"), 1.0);
        assert_eq!(graph.vertex_count(), 2);

        // Verify only one new vertex is added when one of them already exists in the graph.
        graph.insert(Edge::new("a", "c"), 1.0);
        assert_eq!(graph.vertex_count(), 3);

        assert!(graph.insert_vertex("d"));
        assert!(!graph.insert_vertex("a"));
        assert_eq!(graph.vertex_count(), 4);
    }

    #[test]
    fn density() {
        let mut graph = Graph::new();
        assert!(graph.density().is_nan());

        graph.insert(Edge::new("a", "b"), 1.0);
        assert_eq!(graph.density(), 1.0);
    }

    #[test]
    fn degree_and_strength() {
        let mut graph = Graph::new();
        graph.insert(Edge::new("a", "x"), 10.0);
        graph.insert(Edge::new("a", "y"), 5.0);
        graph.insert(Edge::new("b", "y"), 7.0);
        graph.insert_vertex("z");

        assert_eq!(graph.degree(&"a"), 2);
        assert_eq!(graph.degree(&"b"), 1);
        assert_eq!(graph.degree(&"z"), 0);
        assert_eq!(graph.degree(&"missing"), 0);

        assert_eq!(graph.strength(&"a"), 15.0);
        assert_eq!(graph.strength(&"b"), 7.0);
        assert_eq!(graph.strength(&"y"), 12.0);
        assert_eq!(graph.strength(&"z"), 0.0);

        let degrees = graph.degrees();
        let strengths = graph.strengths();
        assert_eq!(degrees.len(), 5);
        assert_eq!(degrees[&"y"], 2);
        assert_eq!(strengths[&"a"], 15.0);
        assert_eq!(strengths[&"z"], 0.0);
    }

    #[test]
    fn neighbours() {
        let mut graph = Graph::new();
        graph.insert(Edge::new("a", "x"), 10.0);
        graph.insert(Edge::new("y", "a"), 5.0);

        assert_eq!(graph.neighbours(&"a"), vec![(&"x", 10.0), (&"y", 5.0)]);
        assert!(graph.neighbours(&"b").is_empty());
    }

    #[test]
    fn adjacency_follows_mutations() {
        let mut graph = Graph::new();
        graph.insert(Edge::new("a", "x"), 10.0);
        graph.add_weight(Edge::new("x", "a"), 2.0);
        graph.insert(Edge::new("a", "y"), 5.0);

        assert_eq!(graph.neighbours(&"x"), vec![(&"a", 12.0)]);
        assert_eq!(graph.strength(&"a"), 17.0);

        graph.remove(&Edge::new("y", "a"));
        assert_eq!(graph.degree(&"a"), 1);
        assert_eq!(graph.degree(&"y"), 0);
        assert!(graph.neighbours(&"y").is_empty());

        let doubled = graph.map_weights(|w| w * 2.0);
        assert_eq!(doubled.neighbours(&"a"), vec![(&"x", 24.0)]);
        assert_eq!(doubled.vertex_count(), 3);
    }

    #[test]
    fn pruning_updates_adjacency() {
        let mut graph = Graph::new();
        graph.insert(Edge::new("a", "x"), 0.0);
        graph.insert(Edge::new("a", "y"), 3.0);

        let pruned = graph.remove_zero_weight_edges();

        assert_eq!(pruned.degree(&"a"), 1);
        assert_eq!(pruned.degree(&"x"), 0);
        assert_eq!(pruned.degrees()[&"x"], 0);
        assert_eq!(pruned.strengths()[&"a"], 3.0);
    }

    #[test]
    fn remove_zero_weight_edges() {
        let mut graph = Graph::new();
        graph.insert(Edge::new("a", "x"), 0.0);
        graph.insert(Edge::new("a", "y"), 2.0);
        graph.insert(Edge::new("b", "x"), 0.0);

        let pruned = graph.remove_zero_weight_edges();

        assert_eq!(pruned.edge_count(), 1);
        assert_eq!(pruned.vertex_count(), graph.vertex_count());
        assert!(pruned.contains_vertex(&"b"));
        assert_eq!(pruned.remove_zero_weight_edges(), pruned);
    }

    #[test]
    fn inverted() {
        let mut graph = Graph::new();
        graph.insert(Edge::new("a", "x"), 10.0);
        graph.insert(Edge::new("a", "y"), 0.0);

        let inverted = graph.inverted();

        assert_eq!(inverted.weight(&Edge::new("a", "x")), Some(0.1));
        assert_eq!(inverted.weight(&Edge::new("a", "y")), Some(0.0));
    }

    #[test]
    fn scaled_weights_fallback() {
        let mut graph = Graph::new();
        assert!(graph.scaled_weights(5.0).is_empty());

        graph.insert(Edge::new("a", "x"), 0.0);
        assert_eq!(graph.scaled_weights(5.0)[&Edge::new("a", "x")], 0.0);
    }

    #[test]
    fn betweenness() {
        let (a, b, c, d) = ("a", "b", "c", "d");
        let graph = graph!([a, b, c, d]);

        let betweenness_centrality = graph.betweenness_centrality(&unnormalized());

        assert_eq!(betweenness_centrality.get_key_value(a), Some((&a, &0.0)));
        assert_eq!(betweenness_centrality.get_key_value(b), Some((&b, &2.0)));
        assert_eq!(betweenness_centrality.get_key_value(c), Some((&c, &2.0)));
        assert_eq!(betweenness_centrality.get_key_value(d), Some((&d, &0.0)));
    }

    #[test]
    fn betweenness_isolated_vertex() {
        let (a, b, c) = ("a", "b", "c");
        let mut graph = graph!([a, b, c]);
        graph.insert_vertex("z");

        let centrality = graph.betweenness_centrality(&unnormalized());

        assert_eq!(centrality.len(), 4);
        assert_eq!(centrality[&"b"], 1.0);
        assert_eq!(centrality[&"z"], 0.0);
    }

    #[test]
    fn betweenness_weighted_vs_inverted() {
        let mut graph = Graph::new();
        graph.insert(Edge::new("a", "b"), 1.0);
        graph.insert(Edge::new("b", "c"), 1.0);
        graph.insert(Edge::new("a", "c"), 5.0);

        // As distances, the heavy a-c edge is avoided.
        let weighted = graph.betweenness_centrality(&unnormalized());
        assert_eq!(weighted[&"b"], 1.0);

        // As affinities (inverted), the heavy a-c edge is the shortest route.
        let inverted = graph.inverted().betweenness_centrality(&unnormalized());
        assert_eq!(inverted[&"b"], 0.0);
    }

    #[test]
    fn generate_index() {
        let mut graph = Graph::new();
        assert!(graph.generate_index().is_empty());

        let (a, b) = ("a", "b");
        graph.insert(Edge::new(b, a), 1.0);
        let index = graph.generate_index();

        assert_eq!(index.get_key_value(a), Some((&a, &0)));
        assert_eq!(index.get_key_value(b), Some((&b, &1)));
        assert_eq!(index.len(), 2);
    }
}
