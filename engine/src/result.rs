use crate::recommend::{ActionPlan, Recommendation};
use graph::{ContentGraph, NodeMetrics, StructuralReport};
use query::{ComplexQuery, Gap};
use semantic::{Cluster, ClusterSet};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_posts: usize,
    pub total_pages: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub internal_link_count: usize,
    pub orphan_count: usize,
    pub hub_count: usize,
    pub cluster_count: usize,
    pub skipped_records: usize,
    pub dropped_links: usize,
    pub dropped_decompositions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOptimization {
    /// Query texts in delivery order.
    pub complex_queries: Vec<String>,
    pub decompositions: BTreeMap<String, Vec<String>>,
    pub gaps: Vec<Gap>,
    pub opportunities: Vec<String>,
}

impl QueryOptimization {
    pub fn new(queries: &[ComplexQuery], gaps: Vec<Gap>) -> Self {
        Self {
            complex_queries: queries.iter().map(|q| q.query().to_string()).collect(),
            decompositions: queries
                .iter()
                .map(|q| (q.query().to_string(), q.sub_queries().to_vec()))
                .collect(),
            gaps,
            opportunities: Vec::new(),
        }
    }

    pub fn with_opportunities(mut self, opportunities: Vec<String>) -> Self {
        self.opportunities = opportunities;
        self
    }

    pub fn uncovered(&self) -> impl Iterator<Item = &Gap> {
        self.gaps.iter().filter(|g| !g.covered)
    }
}

/// Everything one run produced. Report and visualization writers only read
/// from it.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub snapshot_id: String,
    pub site_url: String,
    pub summary: Summary,
    pub query_optimization: QueryOptimization,
    #[serde(rename = "content_metrics", serialize_with = "metrics_only")]
    pub structure: StructuralReport,
    #[serde(serialize_with = "clusters_only")]
    pub clusters: ClusterSet,
    pub recommendations: Vec<Recommendation>,
    pub action_plan: ActionPlan,
    #[serde(skip)]
    pub graph: ContentGraph,
}

impl AnalysisResult {
    pub fn content_metrics(&self) -> &[NodeMetrics] {
        &self.structure.metrics
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn metrics_only<S: Serializer>(report: &StructuralReport, s: S) -> Result<S::Ok, S::Error> {
    report.metrics.serialize(s)
}

fn clusters_only<S: Serializer>(set: &ClusterSet, s: S) -> Result<S::Ok, S::Error> {
    let clusters: &[Cluster] = &set.clusters;
    clusters.serialize(s)
}
