use crate::decomposition::ComplexQuery;
use fanout_core::config::GapConfig;
use fanout_core::model::NodeId;
use graph::ContentGraph;
use rayon::prelude::*;
use semantic::token_set;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Coverage of one sub-query by the site's posts and pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub query: String,
    pub sub_query: String,
    pub covered: bool,
    /// Best shared-token ratio over all posts and pages, in [0, 1].
    pub score: f64,
    /// Node with the best score; `None` when no node shares a token.
    pub best_node: Option<NodeId>,
}

pub struct QueryGapAnalyzer;

impl QueryGapAnalyzer {
    /// One entry per sub-query, in query then sub-query order.
    pub fn analyze(graph: &ContentGraph, queries: &[ComplexQuery], config: &GapConfig) -> Vec<Gap> {
        let content: Vec<(NodeId, String)> =
            graph.content_nodes().map(|n| (n.id, n.text())).collect();
        let documents: Vec<(NodeId, BTreeSet<String>)> = content
            .par_iter()
            .map(|(id, text)| (*id, token_set(text)))
            .collect();

        let mut gaps = Vec::new();
        for query in queries {
            for sub_query in query.sub_queries() {
                let (score, best_node) = best_match(&token_set(sub_query), &documents);
                let covered = best_node.is_some() && score >= config.coverage_threshold;
                debug!(
                    "Sub-query `{}` best score {:.3} (node {:?}, covered: {})",
                    sub_query, score, best_node, covered
                );
                gaps.push(Gap {
                    query: query.query().to_string(),
                    sub_query: sub_query.clone(),
                    covered,
                    score,
                    best_node,
                });
            }
        }

        info!(
            "Gap analysis: {} sub-queries, {} uncovered",
            gaps.len(),
            gaps.iter().filter(|g| !g.covered).count()
        );
        gaps
    }
}

/// `|q ∩ d| / |q|`, maximized over documents in id order; the first (lowest
/// id) document wins ties.
fn best_match(query: &BTreeSet<String>, documents: &[(NodeId, BTreeSet<String>)]) -> (f64, Option<NodeId>) {
    if query.is_empty() {
        return (0.0, None);
    }
    let total = query.len() as f64;
    let mut best = (0.0, None);
    for (id, tokens) in documents {
        let shared = query.iter().filter(|t| tokens.contains(*t)).count();
        if shared == 0 {
            continue;
        }
        let score = shared as f64 / total;
        if score > best.0 {
            best = (score, Some(*id));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_best_match_ratio_and_tie_break() {
        let docs = vec![
            (2, set(&["zones"])),
            (4, set(&["zones", "rates"])),
            (9, set(&["zones", "rates"])),
        ];
        let (score, node) = best_match(&set(&["zones", "rates", "customs", "eu"]), &docs);
        assert_eq!(score, 0.5);
        assert_eq!(node, Some(4));
    }

    #[test]
    fn test_best_match_without_overlap() {
        let docs = vec![(1, set(&["coffee"]))];
        assert_eq!(best_match(&set(&["zones"]), &docs), (0.0, None));
        assert_eq!(best_match(&BTreeSet::new(), &docs), (0.0, None));
    }
}
