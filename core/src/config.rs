use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which nodes count as orphans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanRule {
    /// No other content links to the node; its own outbound links are ignored.
    #[default]
    IncomingOnly,
    /// No inbound and no outbound internal links.
    Isolated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Damping factor for the iterative importance score, in (0, 1).
    pub damping: f64,
    /// Iteration cap for the importance score.
    pub max_iterations: usize,
    /// Early exit once the L1 change between iterations drops below this.
    pub convergence_epsilon: f64,
    /// Share of the hub score taken by normalized degree; the rest is the
    /// normalized importance score.
    pub degree_weight: f64,
    /// Nodes at or above this percentile of hub score are hub candidates.
    pub hub_percentile: f64,
    /// Hub candidates need at least this many internal links, in or out.
    pub min_hub_degree: usize,
    pub orphan_rule: OrphanRule,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            convergence_epsilon: 1e-9,
            degree_weight: 0.5,
            hub_percentile: 90.0,
            min_hub_degree: 1,
            orphan_rule: OrphanRule::IncomingOnly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Documents with fewer tokens are left out of clustering.
    pub min_tokens: usize,
    /// Below this many eligible documents no clusters are produced.
    pub min_corpus_size: usize,
    /// Terms found in fewer documents are dropped from the vocabulary.
    pub min_document_frequency: usize,
    /// Terms found in more than this fraction of documents are dropped.
    pub max_document_fraction: f64,
    /// Fixed cluster count. When unset, `max(1, round(sqrt(n / 2)))`.
    pub target_clusters: Option<usize>,
    pub max_iterations: usize,
    /// Representative terms kept per cluster.
    pub label_terms: usize,
}

impl ClusterConfig {
    pub fn cluster_count(&self, documents: usize) -> usize {
        let k = match self.target_clusters {
            Some(k) => k,
            None => ((documents as f64) / 2.0).sqrt().round() as usize,
        };
        k.max(1).min(documents.max(1))
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            min_tokens: 20,
            min_corpus_size: 3,
            min_document_frequency: 2,
            max_document_fraction: 0.85,
            target_clusters: None,
            max_iterations: 50,
            label_terms: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Minimum shared-token ratio for a sub-query to count as covered.
    pub coverage_threshold: f64,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            coverage_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub structure: StructureConfig,
    pub clustering: ClusterConfig,
    pub gaps: GapConfig,
}

impl AnalysisConfig {
    /// Defaults, overlaid by an optional file, overlaid by `FANOUT__*`
    /// environment variables (e.g. `FANOUT__GAPS__COVERAGE_THRESHOLD=0.5`).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix("FANOUT")
                .prefix_separator("__")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }
}
