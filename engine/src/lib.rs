//! End-to-end analysis: records and decompositions in, an immutable
//! [`AnalysisResult`] out.

pub mod pipeline;
pub mod recommend;
pub mod result;
pub mod visualize;

pub use pipeline::{AnalysisError, Analyzer};
pub use recommend::{ActionPlan, Priority, Recommendation, RecommendationEngine, RecommendationKind};
pub use result::{AnalysisResult, QueryOptimization, Summary};
pub use visualize::{VisualEdge, VisualGraph, VisualNode};
