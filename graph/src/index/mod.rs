pub mod graph;

pub use graph::{ContentGraph, GraphError};
