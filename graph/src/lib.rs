pub mod centrality;
pub mod index;
pub mod structure;

pub use centrality::{power_iteration, Adjacency, PowerIteration};
pub use index::{ContentGraph, GraphError};
pub use structure::{NodeMetrics, StructuralAnalyzer, StructuralReport};
