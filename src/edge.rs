//! A module for working with edges.

use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

/// A pair of vertices representing a graph edge. Edges don't have a direction, despite the
/// `source`-`target` nomenclature used: in a bipartite trade graph the source is the reporter and
/// the target the partner, but `(a, b)` and `(b, a)` are the same edge.
#[derive(Clone, Debug, Eq)]
pub struct Edge<T> {
    source: T,
    target: T,
}

impl<T> Edge<T> {
    /// Creates a new edge from two vertices.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::edge::Edge;
    ///
    /// let edge = Edge::new("a", "b");
    /// assert_eq!(edge, Edge::new("b", "a"));
    /// ```
    pub fn new(source: T, target: T) -> Self {
        Self { source, target }
    }

    /// Returns the first vertex forming the edge.
    pub fn source(&self) -> &T {
        &self.source
    }

    /// Returns the second vertex forming the edge.
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Returns whether the edge contains the given vertex.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::edge::Edge;
    ///
    /// let edge = Edge::new("a", "b");
    ///
    /// assert!(edge.contains(&"a"));
    /// assert!(!edge.contains(&"c"));
    /// ```
    pub fn contains(&self, vertex: &T) -> bool
    where
        T: PartialEq,
    {
        self.source() == vertex || self.target() == vertex
    }

    /// Returns the endpoint opposite to `vertex`, or `None` if the edge doesn't contain it.
    ///
    /// # Examples
    ///
    /// ```
    /// use faonet::edge::Edge;
    ///
    /// let edge = Edge::new("a", "b");
    ///
    /// assert_eq!(edge.other(&"a"), Some(&"b"));
    /// assert_eq!(edge.other(&"c"), None);
    /// ```
    pub fn other(&self, vertex: &T) -> Option<&T>
    where
        T: PartialEq,
    {
        if self.source() == vertex {
            Some(self.target())
        } else if self.target() == vertex {
            Some(self.source())
        } else {
            None
        }
    }

    /// The endpoints in ascending order, the canonical form shared by `(a, b)` and `(b, a)`.
    fn ordered(&self) -> (&T, &T)
    where
        T: Ord,
    {
        match self.source.cmp(&self.target) {
            Ordering::Greater => (&self.target, &self.source),
            _ => (&self.source, &self.target),
        }
    }
}

//
// Trait implementations
//

impl<T: PartialEq> PartialEq for Edge<T> {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&self.source, &self.target);
        let (c, d) = (&other.source, &other.target);

        a == d && b == c || a == c && b == d
    }
}

impl<T: Hash + Ord> Hash for Edge<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // This ensures the hash is the same for (a, b) as it is for (b, a).
        let (a, b) = self.ordered();
        a.hash(state);
        b.hash(state);
    }
}

impl<T: Ord> PartialOrd for Edge<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Ordering on the canonical pair keeps `Ord` consistent with the symmetric `PartialEq`.
impl<T: Ord> Ord for Edge<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordered().cmp(&other.ordered())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn new() {
        let (source, target) = ("a", "b");

        assert_eq!(Edge::new(source, target), Edge { source, target })
    }

    #[test]
    fn contains() {
        let (a, b) = ("a", "b");
        let edge = Edge::new(a, b);

        assert!(edge.contains(&a));
        assert!(edge.contains(&b));
        assert!(!edge.contains(&"c"));
    }

    #[test]
    fn other() {
        let edge = Edge::new("a", "b");

        assert_eq!(edge.other(&"a"), Some(&"b"));
        assert_eq!(edge.other(&"b"), Some(&"a"));
        assert_eq!(edge.other(&"c"), None);
    }

    //
    // Trait implementations
    //

    #[test]
    fn partial_eq() {
        let (a, b) = ("a", "b");

        assert_eq!(Edge::new(a, b), Edge::new(a, b));
        assert_eq!(Edge::new(a, b), Edge::new(b, a));
        assert_ne!(Edge::new(a, b), Edge::new(a, "c"));
    }

    #[test]
    fn hash() {
        use std::collections::hash_map::DefaultHasher;

        let (a, b) = ("a", "b");

        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();

        Edge::new(a, b).hash(&mut h1);
        Edge::new(b, a).hash(&mut h2);

        // Verify k1 == k2 => hash(k1) == hash(k2).
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn ord() {
        assert_eq!(Edge::new("a", "b").cmp(&Edge::new("b", "a")), Ordering::Equal);
        assert!(Edge::new("a", "b") < Edge::new("a", "c"));
        assert!(Edge::new("c", "a") < Edge::new("b", "c"));
    }

    #[test]
    fn ordered_map_key() {
        let mut weights = BTreeMap::new();
        weights.insert(Edge::new("x", "a"), 1.0);
        weights.insert(Edge::new("a", "x"), 2.0);

        assert_eq!(weights.len(), 1);
        assert_eq!(weights.get(&Edge::new("x", "a")), Some(&2.0));
    }
}
