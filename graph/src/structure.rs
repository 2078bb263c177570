use fanout_core::config::{OrphanRule, StructureConfig};
use fanout_core::model::{NodeId, NodeKind};
use fanout_core::percentile::percentile;
use serde::Serialize;
use tracing::{debug, info};

use crate::centrality::{power_iteration, Adjacency};
use crate::index::ContentGraph;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMetrics {
    pub id: NodeId,
    pub kind: NodeKind,
    pub title: String,
    pub url: String,
    pub in_degree: usize,
    pub out_degree: usize,
    pub orphan: bool,
    /// Raw iterative importance; sums to one over all posts and pages.
    pub importance: f64,
    pub hub_score: f64,
    pub hub_candidate: bool,
    pub depth_score: f64,
}

impl NodeMetrics {
    pub fn total_degree(&self) -> usize {
        self.in_degree + self.out_degree
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructuralReport {
    /// One entry per post/page, in node id order.
    pub metrics: Vec<NodeMetrics>,
    pub hub_threshold: Option<f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl StructuralReport {
    pub fn get(&self, id: NodeId) -> Option<&NodeMetrics> {
        self.metrics
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|idx| &self.metrics[idx])
    }

    pub fn orphans(&self) -> impl Iterator<Item = &NodeMetrics> {
        self.metrics.iter().filter(|m| m.orphan)
    }

    pub fn hub_candidates(&self) -> impl Iterator<Item = &NodeMetrics> {
        self.metrics.iter().filter(|m| m.hub_candidate)
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans().count()
    }

    pub fn hub_count(&self) -> usize {
        self.hub_candidates().count()
    }
}

pub struct StructuralAnalyzer;

impl StructuralAnalyzer {
    pub fn analyze(graph: &ContentGraph, config: &StructureConfig) -> StructuralReport {
        let adjacency = Adjacency::internal_links(graph);
        let ranked = power_iteration(
            &adjacency,
            config.damping,
            config.max_iterations,
            config.convergence_epsilon,
        );

        let n = adjacency.len();
        let max_degree = (0..n)
            .map(|idx| adjacency.in_degree(idx) + adjacency.out_degree(idx))
            .max()
            .unwrap_or(0);
        let max_rank = ranked.scores.iter().copied().fold(0.0_f64, f64::max);
        let degree_weight = config.degree_weight.clamp(0.0, 1.0);

        let mut metrics = Vec::with_capacity(n);
        for (idx, id) in adjacency.ids().iter().copied().enumerate() {
            let Some(node) = graph.node(id) else {
                continue;
            };
            let in_degree = adjacency.in_degree(idx);
            let out_degree = adjacency.out_degree(idx);
            let importance = ranked.scores[idx];

            let degree_part = if max_degree == 0 {
                0.0
            } else {
                (in_degree + out_degree) as f64 / max_degree as f64
            };
            let rank_part = if max_rank <= 0.0 {
                0.0
            } else {
                importance / max_rank
            };

            let orphan = match config.orphan_rule {
                OrphanRule::IncomingOnly => in_degree == 0,
                OrphanRule::Isolated => in_degree == 0 && out_degree == 0,
            };

            metrics.push(NodeMetrics {
                id,
                kind: node.kind,
                title: node.title.clone(),
                url: node.url.clone(),
                in_degree,
                out_degree,
                orphan,
                importance,
                hub_score: degree_weight * degree_part + (1.0 - degree_weight) * rank_part,
                hub_candidate: false,
                depth_score: node.depth_score,
            });
        }

        let mut eligible: Vec<f64> = metrics
            .iter()
            .filter(|m| m.total_degree() >= config.min_hub_degree)
            .map(|m| m.hub_score)
            .collect();
        eligible.sort_by(|a, b| a.total_cmp(b));
        let hub_threshold = percentile(&eligible, config.hub_percentile);

        if let Some(threshold) = hub_threshold {
            for m in metrics.iter_mut() {
                m.hub_candidate =
                    m.total_degree() >= config.min_hub_degree && m.hub_score >= threshold;
                if m.hub_candidate {
                    debug!("Hub candidate {} ({:.4}): {}", m.id, m.hub_score, m.title);
                }
            }
        }

        let report = StructuralReport {
            metrics,
            hub_threshold,
            iterations: ranked.iterations,
            converged: ranked.converged,
        };

        info!(
            "Structural analysis: {} content nodes, {} orphans, {} hub candidates, {} iterations (converged: {})",
            report.metrics.len(),
            report.orphan_count(),
            report.hub_count(),
            report.iterations,
            report.converged
        );

        report
    }
}
