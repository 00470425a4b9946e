//! A module for computing weighted betweenness centrality, optionally across worker threads.

use std::{cmp::Ordering, collections::BinaryHeap, thread};

use serde::Deserialize;

use crate::graph::GraphIndex;

pub(crate) const MIN_NUM_THREADS: usize = 1;
pub(crate) const MAX_NUM_THREADS: usize = 128;

/// Adjacency lists indexed by vertex, each entry a `(neighbour, distance)` pair.
pub(crate) type WeightedIndices = Vec<Vec<(GraphIndex, f64)>>;

/// Configuration for betweenness centrality computation.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BetweennessConfig {
    /// Whether to scale values by `1 / ((n - 1)(n - 2))`.
    ///
    /// Default: true
    pub normalize: bool,

    /// Number of worker threads the source vertices are split across, clamped to `[1, 128]`.
    ///
    /// Default: 1
    pub num_threads: usize,
}

impl Default for BetweennessConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            num_threads: MIN_NUM_THREADS,
        }
    }
}

impl BetweennessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub const fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }
}

/// A frontier entry in the Dijkstra search, ordered so the `BinaryHeap` pops the closest vertex
/// first and breaks ties on the lower index.
#[derive(Clone, Copy, Debug)]
struct Visit {
    distance: f64,
    vertex: usize,
}

impl PartialEq for Visit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Visit {}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Visit {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// This is an implementation of Ulrik Brandes's
/// A Faster Algorithm for Betweenness Centrality
/// http://snap.stanford.edu/class/cs224w-readings/brandes01centrality.pdf
/// with the breadth-first search replaced by Dijkstra's algorithm, edge weights being distances.
fn betweenness_for_node(index: usize, indices: &WeightedIndices, betweenness_count: &mut [f64]) {
    let num_nodes = indices.len();

    let mut sigma: Vec<f64> = vec![0.0; num_nodes];
    let mut distance: Vec<Option<f64>> = vec![None; num_nodes];
    let mut settled: Vec<bool> = vec![false; num_nodes];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
    let mut delta: Vec<f64> = vec![0.0; num_nodes];
    let mut heap: BinaryHeap<Visit> = BinaryHeap::new();
    let mut stack: Vec<usize> = Vec::with_capacity(num_nodes);

    sigma[index] = 1.0;
    distance[index] = Some(0.0);
    heap.push(Visit {
        distance: 0.0,
        vertex: index,
    });

    while let Some(Visit { distance: d, vertex: v }) = heap.pop() {
        // Stale entries are left in the heap when a shorter path is found.
        if settled[v] {
            continue;
        }
        settled[v] = true;
        stack.push(v);

        for &(w, weight) in &indices[v] {
            let w = w as usize;
            if settled[w] {
                continue;
            }

            let candidate = d + weight;
            match distance[w] {
                Some(current) if candidate == current => {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
                Some(current) if candidate > current => {}
                _ => {
                    distance[w] = Some(candidate);
                    sigma[w] = sigma[v];
                    predecessors[w].clear();
                    predecessors[w].push(v);
                    heap.push(Visit {
                        distance: candidate,
                        vertex: w,
                    });
                }
            }
        }
    }

    // Vertices are popped in order of non-increasing distance from the source.
    while let Some(w) = stack.pop() {
        let coefficient = (1.0 + delta[w]) / sigma[w];
        for &v in &predecessors[w] {
            delta[v] += sigma[v] * coefficient;
        }
        if w != index {
            betweenness_count[w] += delta[w];
        }
    }
}

/// The thread task: accumulates the dependencies of every `stride`-th source, starting at
/// `offset`.
fn betweenness_task(offset: usize, stride: usize, indices: &WeightedIndices) -> Vec<f64> {
    let num_nodes = indices.len();

    // Each worker keeps its own accumulator, these are summed by the caller.
    let mut betweenness_count: Vec<f64> = vec![0.0; num_nodes];

    for index in (offset..num_nodes).step_by(stride) {
        betweenness_for_node(index, indices, &mut betweenness_count);
    }

    betweenness_count
}

/// Called by [`Graph::betweenness_centrality`](crate::graph::Graph::betweenness_centrality) to do
/// the heavy lifting. It is responsible for:
/// - partitioning the source vertices across the worker threads
/// - spawning the threads and collecting their accumulators
/// - summing the accumulators in thread order and rescaling the result
///
/// The static partition and ordered reduction make the output deterministic for a given thread
/// count.
pub(crate) fn compute_betweenness(
    indices: WeightedIndices,
    config: &BetweennessConfig,
) -> Vec<f64> {
    let num_threads = config
        .num_threads
        .clamp(MIN_NUM_THREADS, MAX_NUM_THREADS)
        .min(indices.len().max(1));
    let num_nodes = indices.len();

    let partials: Vec<Vec<f64>> = if num_threads == 1 {
        vec![betweenness_task(0, 1, &indices)]
    } else {
        thread::scope(|scope| {
            let handles: Vec<_> = (0..num_threads)
                .map(|offset| {
                    let indices = &indices;
                    scope.spawn(move || betweenness_task(offset, num_threads, indices))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(partial) => partial,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        })
    };

    let scale = rescale_factor(num_nodes, config.normalize);

    let mut betweenness_count: Vec<f64> = vec![0.0; num_nodes];
    for partial in partials {
        for (total, value) in betweenness_count.iter_mut().zip(partial) {
            *total += value;
        }
    }

    if let Some(scale) = scale {
        for value in betweenness_count.iter_mut() {
            *value *= scale;
        }
    }

    betweenness_count
}

/// Undirected pairs are counted from both ends.
fn rescale_factor(num_nodes: usize, normalize: bool) -> Option<f64> {
    if normalize {
        if num_nodes <= 2 {
            None
        } else {
            Some(1.0 / ((num_nodes - 1) * (num_nodes - 2)) as f64)
        }
    } else {
        Some(0.5)
    }
}
