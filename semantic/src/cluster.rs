use crate::tfidf::{cosine, TermVector, TfIdfModel};
use crate::tokenize::tokenize;
use fanout_core::config::ClusterConfig;
use fanout_core::model::NodeId;
use graph::ContentGraph;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: usize,
    /// Ascending node ids.
    pub members: Vec<NodeId>,
    /// Highest-weighted terms across the members.
    pub terms: Vec<String>,
}

impl Cluster {
    pub fn contains(&self, id: NodeId) -> bool {
        self.members.binary_search(&id).is_ok()
    }
}

/// Disjoint clusters plus the posts and pages left out of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSet {
    pub clusters: Vec<Cluster>,
    pub excluded: Vec<NodeId>,
}

impl ClusterSet {
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn cluster_of(&self, id: NodeId) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.contains(id))
    }

    pub fn assignments(&self) -> BTreeMap<NodeId, usize> {
        self.clusters
            .iter()
            .flat_map(|c| c.members.iter().map(move |m| (*m, c.id)))
            .collect()
    }
}

pub struct SemanticClusterer;

impl SemanticClusterer {
    pub fn cluster(graph: &ContentGraph, config: &ClusterConfig) -> ClusterSet {
        let content: Vec<(NodeId, String)> =
            graph.content_nodes().map(|n| (n.id, n.text())).collect();
        let tokenized: Vec<(NodeId, Vec<String>)> = content
            .par_iter()
            .map(|(id, text)| (*id, tokenize(text)))
            .collect();

        let mut excluded = Vec::new();
        let mut documents = Vec::with_capacity(tokenized.len());
        for (id, tokens) in tokenized {
            if tokens.len() < config.min_tokens {
                excluded.push(id);
            } else {
                documents.push((id, tokens));
            }
        }

        if documents.len() < config.min_corpus_size.max(1) {
            info!(
                "Corpus too small for clustering ({} of {} documents eligible); no clusters",
                documents.len(),
                config.min_corpus_size
            );
            excluded.extend(documents.into_iter().map(|(id, _)| id));
            excluded.sort_unstable();
            return ClusterSet {
                clusters: Vec::new(),
                excluded,
            };
        }

        let model = TfIdfModel::fit(&documents, config);
        excluded.extend_from_slice(model.empty());
        let vectors = model.vectors();

        if vectors.len() < config.min_corpus_size.max(1) {
            info!(
                "Only {} documents kept terms after pruning; no clusters",
                vectors.len()
            );
            excluded.extend(vectors.iter().map(|v| v.id));
            excluded.sort_unstable();
            return ClusterSet {
                clusters: Vec::new(),
                excluded,
            };
        }
        excluded.sort_unstable();

        let k = config.cluster_count(vectors.len());
        let assignment = spherical_kmeans(vectors, model.vocabulary().len(), k, config.max_iterations);

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (doc, centroid) in assignment.iter().enumerate() {
            groups.entry(*centroid).or_default().push(doc);
        }
        let mut groups: Vec<Vec<usize>> = groups.into_values().collect();
        // Vectors are in id order, so the first index is the lowest member id.
        groups.sort_by_key(|docs| docs[0]);

        let clusters: Vec<Cluster> = groups
            .iter()
            .enumerate()
            .map(|(id, docs)| Cluster {
                id,
                members: docs.iter().map(|d| vectors[*d].id).collect(),
                terms: label_terms(&model, docs, config.label_terms),
            })
            .collect();

        info!(
            "Clustered {} documents into {} clusters ({} excluded)",
            vectors.len(),
            clusters.len(),
            excluded.len()
        );

        ClusterSet { clusters, excluded }
    }
}

fn densify(vector: &TermVector, dims: usize) -> Vec<f64> {
    let mut dense = vec![0.0; dims];
    for (term, weight) in &vector.weights {
        dense[*term] = *weight;
    }
    dense
}

fn similarity(vector: &TermVector, centroid: &[f64]) -> f64 {
    vector
        .weights
        .iter()
        .map(|(term, weight)| weight * centroid[*term])
        .sum()
}

/// Farthest-first seeds: the first document, then repeatedly the document
/// least similar to its closest seed.
fn farthest_first(vectors: &[TermVector], k: usize) -> Vec<usize> {
    let mut seeds = vec![0];
    let mut closest: Vec<f64> = vectors
        .iter()
        .map(|v| cosine(&v.weights, &vectors[0].weights))
        .collect();

    while seeds.len() < k {
        let mut next: Option<(usize, f64)> = None;
        for (idx, sim) in closest.iter().enumerate() {
            if seeds.contains(&idx) {
                continue;
            }
            if next.map_or(true, |(_, best)| *sim < best) {
                next = Some((idx, *sim));
            }
        }
        let Some((seed, _)) = next else { break };
        seeds.push(seed);
        for (idx, v) in vectors.iter().enumerate() {
            let sim = cosine(&v.weights, &vectors[seed].weights);
            if sim > closest[idx] {
                closest[idx] = sim;
            }
        }
    }
    seeds
}

/// Returns the centroid index of every vector.
fn spherical_kmeans(
    vectors: &[TermVector],
    dims: usize,
    k: usize,
    max_iterations: usize,
) -> Vec<usize> {
    let mut centroids: Vec<Vec<f64>> = farthest_first(vectors, k)
        .into_iter()
        .map(|seed| densify(&vectors[seed], dims))
        .collect();
    let mut assignment: Vec<usize> = Vec::new();

    for iteration in 0..max_iterations.max(1) {
        let next: Vec<usize> = vectors
            .par_iter()
            .map(|v| {
                let mut best = 0;
                let mut best_sim = f64::NEG_INFINITY;
                for (idx, centroid) in centroids.iter().enumerate() {
                    let sim = similarity(v, centroid);
                    if sim > best_sim {
                        best = idx;
                        best_sim = sim;
                    }
                }
                best
            })
            .collect();

        if next == assignment {
            debug!("k-means assignments stable after {} iterations", iteration);
            break;
        }
        assignment = next;

        for (idx, centroid) in centroids.iter_mut().enumerate() {
            let mut sum = vec![0.0; dims];
            let mut members = 0;
            for (v, _) in vectors
                .iter()
                .zip(assignment.iter())
                .filter(|(_, a)| **a == idx)
            {
                members += 1;
                for (term, weight) in &v.weights {
                    sum[*term] += weight;
                }
            }
            if members == 0 {
                continue;
            }
            let norm = sum.iter().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for w in sum.iter_mut() {
                    *w /= norm;
                }
            }
            *centroid = sum;
        }
    }

    assignment
}

fn label_terms(model: &TfIdfModel, docs: &[usize], limit: usize) -> Vec<String> {
    let mut totals: BTreeMap<usize, f64> = BTreeMap::new();
    for doc in docs {
        for (term, weight) in &model.vectors()[*doc].weights {
            *totals.entry(*term).or_insert(0.0) += weight;
        }
    }
    let mut ranked: Vec<(&str, f64)> = totals
        .into_iter()
        .map(|(term, weight)| (model.term(term), weight))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(term, _)| term.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(id: NodeId, weights: &[(usize, f64)]) -> TermVector {
        TermVector {
            id,
            weights: weights.to_vec(),
        }
    }

    #[test]
    fn test_farthest_first_picks_dissimilar_seed() {
        let vectors = vec![
            vector(1, &[(0, 1.0)]),
            vector(2, &[(0, 1.0)]),
            vector(3, &[(1, 1.0)]),
        ];
        assert_eq!(farthest_first(&vectors, 2), vec![0, 2]);
    }

    #[test]
    fn test_kmeans_separates_orthogonal_groups() {
        let vectors = vec![
            vector(1, &[(0, 1.0)]),
            vector(2, &[(0, 0.8), (1, 0.6)]),
            vector(3, &[(2, 1.0)]),
            vector(4, &[(2, 0.8), (3, 0.6)]),
        ];
        let assignment = spherical_kmeans(&vectors, 4, 2, 10);
        assert_eq!(assignment[0], assignment[1]);
        assert_eq!(assignment[2], assignment[3]);
        assert_ne!(assignment[0], assignment[2]);
    }

    #[test]
    fn test_single_cluster_takes_everything() {
        let vectors = vec![vector(1, &[(0, 1.0)]), vector(2, &[(1, 1.0)])];
        assert_eq!(spherical_kmeans(&vectors, 2, 1, 10), vec![0, 0]);
    }
}
