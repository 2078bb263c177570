use crate::result::AnalysisResult;
use fanout_core::model::{EdgeKind, NodeId, NodeKind};
use serde::Serialize;

const LABEL_CHARS: usize = 30;
const BASE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisualNode {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisualEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
}

/// Renderer-neutral node/edge lists; node size grows with total degree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

impl VisualGraph {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let graph = &result.graph;
        let assignments = result.clusters.assignments();
        let degrees = graph.degrees();

        let nodes = graph
            .nodes()
            .map(|node| VisualNode {
                id: node.id,
                label: node.title.chars().take(LABEL_CHARS).collect(),
                kind: node.kind,
                cluster: assignments.get(&node.id).copied(),
                url: (!node.url.is_empty()).then(|| node.url.clone()),
                size: BASE_SIZE + 2 * degrees.get(&node.id).copied().unwrap_or(0),
            })
            .collect();
        let edges = graph
            .edges()
            .map(|edge| VisualEdge {
                source: edge.source,
                target: edge.target,
                kind: edge.kind,
            })
            .collect();

        Self { nodes, edges }
    }
}
