use fanout_core::model::{EdgeKind, NodeId};
use graph::{ContentGraph, StructuralReport};
use query::Gap;
use semantic::ClusterSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ContentGap,
    InternalLinking,
    HubOptimization,
    SemanticBridge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub action: String,
    pub rationale: String,
    pub impact: String,
}

/// Recommendations bucketed by priority, each bucket in generation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub immediate: Vec<Recommendation>,
    pub short_term: Vec<Recommendation>,
    pub long_term: Vec<Recommendation>,
}

impl ActionPlan {
    pub fn from_recommendations(recommendations: &[Recommendation]) -> Self {
        let mut plan = Self::default();
        for rec in recommendations {
            let bucket = match rec.priority {
                Priority::High => &mut plan.immediate,
                Priority::Medium => &mut plan.short_term,
                Priority::Low => &mut plan.long_term,
            };
            bucket.push(rec.clone());
        }
        plan
    }

    pub fn len(&self) -> usize {
        self.immediate.len() + self.short_term.len() + self.long_term.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct RecommendationEngine;

impl RecommendationEngine {
    /// Content gaps first, then internal linking, hub optimization and
    /// semantic bridges.
    pub fn recommend(
        graph: &ContentGraph,
        structure: &StructuralReport,
        clusters: &ClusterSet,
        gaps: &[Gap],
    ) -> Vec<Recommendation> {
        let mut recommendations = content_gaps(gaps);
        recommendations.extend(internal_linking(graph, structure));
        recommendations.extend(hub_optimization(graph, structure, clusters));
        recommendations.extend(semantic_bridges(graph, clusters));

        info!(
            "Generated {} recommendations ({} high priority)",
            recommendations.len(),
            recommendations
                .iter()
                .filter(|r| r.priority == Priority::High)
                .count()
        );
        recommendations
    }
}

fn content_gaps(gaps: &[Gap]) -> Vec<Recommendation> {
    let mut uncovered: BTreeMap<&str, usize> = BTreeMap::new();
    for gap in gaps.iter().filter(|g| !g.covered) {
        *uncovered.entry(gap.query.as_str()).or_insert(0) += 1;
    }

    gaps.iter()
        .filter(|g| !g.covered)
        .map(|gap| {
            // A sibling gap means the whole reasoning path is broken.
            let priority = if uncovered[gap.query.as_str()] >= 2 {
                Priority::High
            } else {
                Priority::Medium
            };
            Recommendation {
                kind: RecommendationKind::ContentGap,
                priority,
                target: None,
                url: None,
                action: "Create new content".to_string(),
                rationale: format!(
                    "No content answers sub-query \"{}\" of \"{}\" (best match {:.2})",
                    gap.sub_query, gap.query, gap.score
                ),
                impact: "Enables multi-hop reasoning path".to_string(),
            }
        })
        .collect()
}

fn internal_linking(graph: &ContentGraph, structure: &StructuralReport) -> Vec<Recommendation> {
    let hubs: Vec<(NodeId, &BTreeSet<String>, &str)> = structure
        .hub_candidates()
        .filter_map(|m| graph.node(m.id).map(|n| (n.id, &n.categories, n.title.as_str())))
        .collect();

    let mut out = Vec::new();
    for orphan in structure.orphans() {
        let Some(node) = graph.node(orphan.id) else {
            continue;
        };
        let shared = hubs.iter().find_map(|(hub_id, categories, title)| {
            if *hub_id == orphan.id {
                return None;
            }
            node.categories
                .intersection(categories)
                .next()
                .map(|category| (category, *title))
        });
        let Some((category, hub_title)) = shared else {
            continue;
        };
        debug!("Orphan {} shares category {} with a hub", orphan.id, category);
        out.push(Recommendation {
            kind: RecommendationKind::InternalLinking,
            priority: Priority::Medium,
            target: Some(orphan.id),
            url: non_empty(&orphan.url),
            action: "Add internal links".to_string(),
            rationale: format!(
                "\"{}\" has no incoming links but shares category \"{}\" with hub \"{}\"",
                orphan.title, category, hub_title
            ),
            impact: "Improves content graph connectivity".to_string(),
        });
    }
    out
}

fn hub_optimization(
    graph: &ContentGraph,
    structure: &StructuralReport,
    clusters: &ClusterSet,
) -> Vec<Recommendation> {
    let mut out = Vec::new();
    for hub in structure.hub_candidates() {
        let Some(cluster) = clusters.cluster_of(hub.id) else {
            continue;
        };
        if cluster.members.len() < 2 {
            continue;
        }
        let links_into_cluster = graph
            .links_from(hub.id)
            .iter()
            .any(|target| *target != hub.id && cluster.contains(*target));
        if links_into_cluster {
            continue;
        }
        out.push(Recommendation {
            kind: RecommendationKind::HubOptimization,
            priority: Priority::High,
            target: Some(hub.id),
            url: non_empty(&hub.url),
            action: "Enhance hub page".to_string(),
            rationale: format!(
                "Hub \"{}\" does not link to any of the {} other pages in its topic cluster ({})",
                hub.title,
                cluster.members.len() - 1,
                cluster.terms.join(", ")
            ),
            impact: "Strengthens multi-source selection".to_string(),
        });
    }
    out
}

fn semantic_bridges(graph: &ContentGraph, clusters: &ClusterSet) -> Vec<Recommendation> {
    let tags: Vec<BTreeSet<&str>> = clusters
        .clusters
        .iter()
        .map(|cluster| {
            cluster
                .members
                .iter()
                .filter_map(|id| graph.node(*id))
                .flat_map(|node| node.tags.iter().map(String::as_str))
                .collect()
        })
        .collect();
    let assignments = clusters.assignments();

    let mut linked_pairs = BTreeSet::new();
    for edge in graph.edges_of_kind(EdgeKind::InternalLink) {
        if let (Some(a), Some(b)) = (assignments.get(&edge.source), assignments.get(&edge.target)) {
            if a != b {
                linked_pairs.insert((*a.min(b), *a.max(b)));
            }
        }
    }

    let mut out = Vec::new();
    for (i, left) in clusters.clusters.iter().enumerate() {
        for (j, right) in clusters.clusters.iter().enumerate().skip(i + 1) {
            if linked_pairs.contains(&(left.id, right.id)) {
                continue;
            }
            let shared: Vec<&str> = tags[i].intersection(&tags[j]).copied().collect();
            if shared.is_empty() {
                continue;
            }
            out.push(Recommendation {
                kind: RecommendationKind::SemanticBridge,
                priority: Priority::Low,
                target: None,
                url: None,
                action: "Create semantic bridges".to_string(),
                rationale: format!(
                    "Clusters {} ({}) and {} ({}) share tags [{}] but never link to each other",
                    left.id,
                    left.terms.join(", "),
                    right.id,
                    right.terms.join(", "),
                    shared.join(", ")
                ),
                impact: "Enables query fan-out paths".to_string(),
            });
        }
    }
    out
}

fn non_empty(url: &str) -> Option<String> {
    (!url.is_empty()).then(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gap(query: &str, sub: &str, covered: bool) -> Gap {
        Gap {
            query: query.to_string(),
            sub_query: sub.to_string(),
            covered,
            score: if covered { 1.0 } else { 0.0 },
            best_node: None,
        }
    }

    fn rec(priority: Priority) -> Recommendation {
        Recommendation {
            kind: RecommendationKind::ContentGap,
            priority,
            target: None,
            url: None,
            action: String::new(),
            rationale: String::new(),
            impact: String::new(),
        }
    }

    #[test]
    fn test_gap_priority_depends_on_siblings() {
        let recs = content_gaps(&[
            gap("q1", "a", false),
            gap("q1", "b", false),
            gap("q2", "c", false),
            gap("q2", "d", true),
        ]);
        let priorities: Vec<Priority> = recs.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, [Priority::High, Priority::High, Priority::Medium]);
    }

    #[test]
    fn test_action_plan_buckets_preserve_order() {
        let mut first = rec(Priority::High);
        first.action = "first".into();
        let mut second = rec(Priority::High);
        second.action = "second".into();
        let recs = vec![first, rec(Priority::Low), second, rec(Priority::Medium)];

        let plan = ActionPlan::from_recommendations(&recs);
        assert_eq!(plan.len(), recs.len());
        assert_eq!(plan.immediate[0].action, "first");
        assert_eq!(plan.immediate[1].action, "second");
        assert_eq!(plan.short_term.len(), 1);
        assert_eq!(plan.long_term.len(), 1);
    }

    #[test]
    fn test_kinds_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&RecommendationKind::SemanticBridge).unwrap(),
            "\"semantic_bridge\""
        );
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"medium\"");
    }
}
