pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod percentile;

pub use config::{AnalysisConfig, ClusterConfig, GapConfig, OrphanRule, StructureConfig};
pub use error::{ErrorCode, FanoutError};
pub use model::{ContentNode, Edge, EdgeKind, NodeId, NodeKind};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins over `default_level` when set.
pub fn init_tracing(default_level: &str) {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A second call (tests, embedding hosts) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}
