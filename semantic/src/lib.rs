//! Text representation and similarity grouping of posts and pages.

pub mod cluster;
pub mod tfidf;
pub mod tokenize;

pub use cluster::{Cluster, ClusterSet, SemanticClusterer};
pub use tfidf::{cosine, TermVector, TfIdfModel};
pub use tokenize::{token_set, tokenize};
