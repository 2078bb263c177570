use crate::recommend::{ActionPlan, RecommendationEngine};
use crate::result::{AnalysisResult, QueryOptimization, Summary};
use fanout_core::config::AnalysisConfig;
use fanout_core::error::{ErrorCode, FanoutError};
use fanout_core::ingest::{ContentRecord, SnapshotEntry};
use fanout_core::model::{EdgeKind, NodeKind};
use graph::{GraphError, StructuralAnalyzer};
use ingestion::{BuildOutcome, ContentGraphBuilder, IngestionError};
use query::{Decompositions, QueryGapAnalyzer};
use semantic::SemanticClusterer;
use thiserror::Error;
use tracing::{error, info};

/// Errors that stop a run before any result exists.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Ingestion(#[from] IngestionError),
    #[error("graph invariant violated: {0}")]
    Graph(#[from] GraphError),
}

impl FanoutError for AnalysisError {
    fn error_code(&self) -> ErrorCode {
        match self {
            AnalysisError::Ingestion(err) => err.error_code(),
            AnalysisError::Graph(err) => err.error_code(),
        }
    }
}

pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Builds the graph, measures it, clusters it, checks query coverage and
    /// derives recommendations. Malformed records and decompositions are
    /// counted in the summary; only a broken graph invariant aborts.
    pub fn run(
        &self,
        site_url: &str,
        records: &[ContentRecord],
        decompositions: &Decompositions,
    ) -> Result<AnalysisResult, AnalysisError> {
        info!("Starting analysis of {}", site_url);
        let builder = ContentGraphBuilder::new(site_url)?;
        let outcome = builder.build(records)?;
        self.analyze(&builder, outcome, decompositions)
    }

    /// Same as [`run`](Self::run) for a snapshot decoded entry by entry;
    /// entries that did not decode count as skipped records.
    pub fn run_snapshot(
        &self,
        site_url: &str,
        entries: &[SnapshotEntry],
        decompositions: &Decompositions,
    ) -> Result<AnalysisResult, AnalysisError> {
        info!("Starting analysis of {}", site_url);
        let builder = ContentGraphBuilder::new(site_url)?;
        let outcome = builder.build_snapshot(entries)?;
        self.analyze(&builder, outcome, decompositions)
    }

    fn analyze(
        &self,
        builder: &ContentGraphBuilder,
        outcome: BuildOutcome,
        decompositions: &Decompositions,
    ) -> Result<AnalysisResult, AnalysisError> {
        let graph = outcome.graph;
        if let Err(err) = graph.validate() {
            error!("Content graph failed validation: {}", err);
            return Err(err.into());
        }

        let structure = StructuralAnalyzer::analyze(&graph, &self.config.structure);
        let clusters = SemanticClusterer::cluster(&graph, &self.config.clustering);
        let gaps = QueryGapAnalyzer::analyze(&graph, &decompositions.queries, &self.config.gaps);
        let recommendations = RecommendationEngine::recommend(&graph, &structure, &clusters, &gaps);
        let action_plan = ActionPlan::from_recommendations(&recommendations);

        let summary = Summary {
            total_posts: graph.nodes().filter(|n| n.kind == NodeKind::Post).count(),
            total_pages: graph.nodes().filter(|n| n.kind == NodeKind::Page).count(),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            internal_link_count: graph.edges_of_kind(EdgeKind::InternalLink).count(),
            orphan_count: structure.orphan_count(),
            hub_count: structure.hub_count(),
            cluster_count: clusters.len(),
            skipped_records: outcome.skipped.len(),
            dropped_links: outcome.dropped_links,
            dropped_decompositions: decompositions.dropped_count(),
        };

        info!(
            "Analysis complete: {} nodes, {} orphans, {} hubs, {} clusters, {} recommendations",
            summary.node_count,
            summary.orphan_count,
            summary.hub_count,
            summary.cluster_count,
            recommendations.len()
        );

        Ok(AnalysisResult {
            snapshot_id: outcome.snapshot_id,
            site_url: builder.site().to_string(),
            summary,
            query_optimization: QueryOptimization::new(&decompositions.queries, gaps)
                .with_opportunities(decompositions.opportunities.clone()),
            structure,
            clusters,
            recommendations,
            action_plan,
            graph,
        })
    }
}
