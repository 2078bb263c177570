use fanout_core::config::ClusterConfig;
use fanout_core::model::NodeId;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Sparse, L2-normalized term weights sorted by term index.
#[derive(Debug, Clone, PartialEq)]
pub struct TermVector {
    pub id: NodeId,
    pub weights: Vec<(usize, f64)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TfIdfModel {
    vocabulary: Vec<String>,
    idf: Vec<f64>,
    vectors: Vec<TermVector>,
    empty: Vec<NodeId>,
}

impl TfIdfModel {
    /// `documents` are `(id, tokens)` in id order. Terms outside
    /// `[min_document_frequency, max_document_fraction * n]` are dropped;
    /// documents left without any term are reported by `empty`.
    pub fn fit(documents: &[(NodeId, Vec<String>)], config: &ClusterConfig) -> Self {
        let n = documents.len();
        if n == 0 {
            return Self::default();
        }

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for (_, tokens) in documents {
            let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let max_df = config.max_document_fraction * n as f64;
        let min_df = config.min_document_frequency.max(1);
        let n_f64 = n as f64;

        let mut vocabulary = Vec::new();
        let mut idf = Vec::new();
        let mut index: BTreeMap<&str, usize> = BTreeMap::new();
        for (term, df) in &document_frequency {
            if *df < min_df || *df as f64 > max_df {
                continue;
            }
            index.insert(term, vocabulary.len());
            vocabulary.push(term.to_string());
            idf.push(((1.0 + n_f64) / (1.0 + *df as f64)).ln() + 1.0);
        }
        debug!(
            "TF-IDF vocabulary: {} of {} terms kept over {} documents",
            vocabulary.len(),
            document_frequency.len(),
            n
        );

        let weighted: Vec<TermVector> = documents
            .par_iter()
            .map(|(id, tokens)| {
                let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
                for token in tokens {
                    if let Some(&term) = index.get(token.as_str()) {
                        *counts.entry(term).or_insert(0) += 1;
                    }
                }
                let mut weights: Vec<(usize, f64)> = counts
                    .into_iter()
                    .map(|(term, count)| (term, count as f64 * idf[term]))
                    .collect();
                let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in weights.iter_mut() {
                        *w /= norm;
                    }
                }
                TermVector { id: *id, weights }
            })
            .collect();

        let (vectors, empty): (Vec<TermVector>, Vec<TermVector>) =
            weighted.into_iter().partition(|v| !v.weights.is_empty());

        Self {
            vocabulary,
            idf,
            vectors,
            empty: empty.into_iter().map(|v| v.id).collect(),
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn term(&self, index: usize) -> &str {
        &self.vocabulary[index]
    }

    pub fn idf(&self, index: usize) -> f64 {
        self.idf[index]
    }

    /// Non-empty vectors in id order.
    pub fn vectors(&self) -> &[TermVector] {
        &self.vectors
    }

    pub fn empty(&self) -> &[NodeId] {
        &self.empty
    }
}

/// Cosine similarity of two normalized sparse vectors.
pub fn cosine(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: NodeId, text: &str) -> (NodeId, Vec<String>) {
        (id, text.split_whitespace().map(str::to_string).collect())
    }

    fn permissive() -> ClusterConfig {
        ClusterConfig {
            min_document_frequency: 1,
            max_document_fraction: 1.0,
            ..ClusterConfig::default()
        }
    }

    #[test]
    fn test_vectors_are_normalized() {
        let model = TfIdfModel::fit(&[doc(1, "rates rates zones"), doc(2, "zones")], &permissive());
        for vector in model.vectors() {
            let norm: f64 = vector.weights.iter().map(|(_, w)| w * w).sum();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        let model = TfIdfModel::fit(
            &[doc(1, "zones customs"), doc(2, "zones"), doc(3, "zones")],
            &permissive(),
        );
        let zones = model.vocabulary().iter().position(|t| t == "zones").unwrap();
        let customs = model.vocabulary().iter().position(|t| t == "customs").unwrap();
        assert!(model.idf(customs) > model.idf(zones));
    }

    #[test]
    fn test_document_frequency_bounds_prune_vocabulary() {
        let config = ClusterConfig {
            min_document_frequency: 2,
            max_document_fraction: 0.7,
            ..ClusterConfig::default()
        };
        let model = TfIdfModel::fit(
            &[
                doc(1, "everywhere shipping unique"),
                doc(2, "everywhere shipping"),
                doc(3, "everywhere coffee"),
            ],
            &config,
        );
        assert_eq!(model.vocabulary(), ["shipping"]);
        assert_eq!(model.empty(), [3]);
        assert_eq!(model.vectors().len(), 2);
    }

    #[test]
    fn test_cosine() {
        let a = vec![(0, 0.6), (2, 0.8)];
        let b = vec![(0, 0.6), (2, 0.8)];
        let c = vec![(1, 1.0)];
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-12);
        assert_eq!(cosine(&a, &c), 0.0);
    }
}
