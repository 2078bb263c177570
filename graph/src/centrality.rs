//! Iterative link importance.
//!
//! `power_iteration` is a pure function of the adjacency and its parameters.
//! Every node pulls rank from its in-neighbours in ascending index order and
//! dangling mass is summed sequentially, so the floating-point evaluation
//! order is fixed no matter how many threads run the pull step.

use fanout_core::model::{EdgeKind, NodeId};
use rayon::prelude::*;
use std::collections::HashMap;

use crate::index::ContentGraph;

/// Internal-link adjacency over a dense `0..n` index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    ids: Vec<NodeId>,
    incoming: Vec<Vec<usize>>,
    out_degree: Vec<usize>,
}

impl Adjacency {
    /// `edges` are `(source, target)` index pairs; duplicates and self-loops
    /// are ignored.
    pub fn from_index_edges(n: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut incoming = vec![Vec::new(); n];
        let mut out_degree = vec![0usize; n];
        for (source, target) in edges {
            if source == target || source >= n || target >= n {
                continue;
            }
            incoming[target].push(source);
        }
        for sources in incoming.iter_mut() {
            sources.sort_unstable();
            sources.dedup();
        }
        for sources in &incoming {
            for &source in sources {
                out_degree[source] += 1;
            }
        }

        Self {
            ids: (0..n as NodeId).collect(),
            incoming,
            out_degree,
        }
    }

    /// Internal links between posts and pages, indexed in node id order.
    pub fn internal_links(graph: &ContentGraph) -> Self {
        let ids: Vec<NodeId> = graph.content_nodes().map(|node| node.id).collect();
        let index: HashMap<NodeId, usize> =
            ids.iter().enumerate().map(|(idx, id)| (*id, idx)).collect();

        let pairs = graph
            .edges_of_kind(EdgeKind::InternalLink)
            .filter_map(|edge| Some((*index.get(&edge.source)?, *index.get(&edge.target)?)));

        let mut adjacency = Self::from_index_edges(ids.len(), pairs);
        adjacency.ids = ids;
        adjacency
    }

    pub fn len(&self) -> usize {
        self.incoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn in_degree(&self, idx: usize) -> usize {
        self.incoming[idx].len()
    }

    pub fn out_degree(&self, idx: usize) -> usize {
        self.out_degree[idx]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PowerIteration {
    pub scores: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

pub fn power_iteration(
    adjacency: &Adjacency,
    damping: f64,
    max_iterations: usize,
    convergence_epsilon: f64,
) -> PowerIteration {
    let n = adjacency.len();
    if n == 0 {
        return PowerIteration {
            scores: Vec::new(),
            iterations: 0,
            converged: true,
        };
    }

    let n_f64 = n as f64;
    let damping = damping.clamp(f64::EPSILON, 1.0 - f64::EPSILON);
    let mut rank = vec![1.0 / n_f64; n];
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..max_iterations {
        let dangling_mass: f64 = (0..n)
            .filter(|&idx| adjacency.out_degree[idx] == 0)
            .map(|idx| rank[idx])
            .sum();
        let base = (1.0 - damping) / n_f64 + damping * dangling_mass / n_f64;

        let next: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|idx| {
                let mut pulled = 0.0;
                for &source in &adjacency.incoming[idx] {
                    pulled += rank[source] / adjacency.out_degree[source] as f64;
                }
                base + damping * pulled
            })
            .collect();

        let delta: f64 = next
            .iter()
            .zip(rank.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();

        rank = next;
        iterations += 1;
        if delta < convergence_epsilon {
            converged = true;
            break;
        }
    }

    PowerIteration {
        scores: rank,
        iterations,
        converged,
    }
}
