pub mod decomposition;
pub mod gap;

pub use decomposition::{
    parse_llm_payload, ComplexQuery, DecompositionError, Decompositions, RawComplexQuery,
};
pub use gap::{Gap, QueryGapAnalyzer};
