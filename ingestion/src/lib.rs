pub mod builder;
pub mod extract;

pub use builder::{BuildOutcome, ContentGraphBuilder, IngestionError, RecordError};
