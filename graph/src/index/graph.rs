use fanout_core::error::{ErrorCode, FanoutError};
use fanout_core::model::{ContentNode, Edge, EdgeKind, NodeId};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("edge {from} -> {to} references a node that is not in the graph")]
    MissingEndpoint { from: NodeId, to: NodeId },
    #[error("self-loop on node {0}")]
    SelfLoop(NodeId),
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
}

impl FanoutError for GraphError {
    fn error_code(&self) -> ErrorCode {
        match self {
            GraphError::MissingEndpoint { .. } => ErrorCode::Internal,
            GraphError::SelfLoop(_) => ErrorCode::InvalidArgument,
            GraphError::DuplicateNode(_) => ErrorCode::Internal,
        }
    }
}

/// Nodes keyed by id plus one ordered edge set. Outgoing views are ranges of
/// the edge set; incoming views come from a per-target index kept in step
/// with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentGraph {
    nodes: BTreeMap<NodeId, ContentNode>,
    edges: BTreeSet<Edge>,
    incoming: BTreeMap<NodeId, BTreeSet<Edge>>,
}

impl ContentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: ContentNode) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Returns `Ok(false)` when the same `(source, target, kind)` is already
    /// present.
    pub fn add_edge(&mut self, edge: Edge) -> Result<bool, GraphError> {
        if edge.source == edge.target {
            return Err(GraphError::SelfLoop(edge.source));
        }
        if !self.nodes.contains_key(&edge.source) || !self.nodes.contains_key(&edge.target) {
            return Err(GraphError::MissingEndpoint {
                from: edge.source,
                to: edge.target,
            });
        }
        if !self.edges.insert(edge) {
            return Ok(false);
        }
        self.incoming.entry(edge.target).or_default().insert(edge);
        Ok(true)
    }

    pub fn node(&self, id: NodeId) -> Option<&ContentNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &ContentNode> {
        self.nodes.values()
    }

    /// Posts and pages in id order.
    pub fn content_nodes(&self) -> impl Iterator<Item = &ContentNode> {
        self.nodes.values().filter(|node| node.kind.is_content())
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }

    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        let lo = Edge::new(id, NodeId::MIN, EdgeKind::InternalLink);
        let hi = Edge::new(id, NodeId::MAX, EdgeKind::TagMembership);
        self.edges.range(lo..=hi)
    }

    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.incoming.get(&id).into_iter().flatten()
    }

    /// Targets of internal links leaving `id`, ascending.
    pub fn links_from(&self, id: NodeId) -> Vec<NodeId> {
        self.outgoing(id)
            .filter(|edge| edge.kind == EdgeKind::InternalLink)
            .map(|edge| edge.target)
            .collect()
    }

    pub fn has_edge(&self, source: NodeId, target: NodeId, kind: EdgeKind) -> bool {
        self.edges.contains(&Edge::new(source, target, kind))
    }

    pub fn out_degree(&self, id: NodeId, kind: EdgeKind) -> usize {
        self.outgoing(id).filter(|edge| edge.kind == kind).count()
    }

    pub fn in_degree(&self, id: NodeId, kind: EdgeKind) -> usize {
        self.incoming(id).filter(|edge| edge.kind == kind).count()
    }

    /// In plus out, over every edge kind.
    pub fn degree(&self, id: NodeId) -> usize {
        self.outgoing(id).count() + self.incoming.get(&id).map_or(0, BTreeSet::len)
    }

    /// Total degree of every node, in one pass over the edge set. Nodes
    /// without edges map to 0.
    pub fn degrees(&self) -> BTreeMap<NodeId, usize> {
        let mut degrees: BTreeMap<NodeId, usize> = self.nodes.keys().map(|&id| (id, 0)).collect();
        for edge in &self.edges {
            *degrees.entry(edge.source).or_default() += 1;
            *degrees.entry(edge.target).or_default() += 1;
        }
        degrees
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Re-checks every edge against the node set.
    pub fn validate(&self) -> Result<(), GraphError> {
        for edge in &self.edges {
            if edge.source == edge.target {
                return Err(GraphError::SelfLoop(edge.source));
            }
            if !self.contains(edge.source) || !self.contains(edge.target) {
                return Err(GraphError::MissingEndpoint {
                    from: edge.source,
                    to: edge.target,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_core::model::NodeKind;

    fn three_posts() -> ContentGraph {
        let mut graph = ContentGraph::new();
        for id in 1..=3 {
            graph
                .add_node(ContentNode::new(id, NodeKind::Post, format!("P{id}")))
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut graph = three_posts();
        assert!(graph.add_edge(Edge::new(1, 2, EdgeKind::InternalLink)).unwrap());
        assert!(!graph.add_edge(Edge::new(1, 2, EdgeKind::InternalLink)).unwrap());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_same_pair_different_kind_is_distinct() {
        let mut graph = three_posts();
        graph.add_node(ContentNode::new(9, NodeKind::Tag, "t")).unwrap();
        graph.add_edge(Edge::new(1, 9, EdgeKind::TagMembership)).unwrap();
        graph.add_edge(Edge::new(1, 2, EdgeKind::InternalLink)).unwrap();
        assert_eq!(graph.outgoing(1).count(), 2);
        assert_eq!(graph.links_from(1), vec![2]);
    }

    #[test]
    fn test_rejects_self_loop_and_missing_endpoint() {
        let mut graph = three_posts();
        assert_eq!(
            graph.add_edge(Edge::new(1, 1, EdgeKind::InternalLink)),
            Err(GraphError::SelfLoop(1))
        );
        let err = graph
            .add_edge(Edge::new(1, 42, EdgeKind::InternalLink))
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_incoming_and_outgoing_views_agree() {
        let mut graph = three_posts();
        graph.add_edge(Edge::new(1, 2, EdgeKind::InternalLink)).unwrap();
        graph.add_edge(Edge::new(3, 2, EdgeKind::InternalLink)).unwrap();
        graph.add_edge(Edge::new(2, 3, EdgeKind::InternalLink)).unwrap();

        assert_eq!(graph.in_degree(2, EdgeKind::InternalLink), 2);
        assert_eq!(graph.out_degree(2, EdgeKind::InternalLink), 1);
        assert_eq!(graph.degree(2), 3);

        let out_total: usize = (1..=3).map(|id| graph.outgoing(id).count()).sum();
        let in_total: usize = (1..=3).map(|id| graph.incoming(id).count()).sum();
        assert_eq!(out_total, graph.edge_count());
        assert_eq!(in_total, graph.edge_count());
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_degrees_match_per_node_degree() {
        let mut graph = three_posts();
        graph.add_node(ContentNode::new(9, NodeKind::Category, "c")).unwrap();
        graph.add_edge(Edge::new(1, 2, EdgeKind::InternalLink)).unwrap();
        graph.add_edge(Edge::new(2, 1, EdgeKind::InternalLink)).unwrap();
        graph.add_edge(Edge::new(1, 9, EdgeKind::CategoryMembership)).unwrap();
        assert!(!graph.add_edge(Edge::new(1, 2, EdgeKind::InternalLink)).unwrap());

        let degrees = graph.degrees();
        assert_eq!(
            degrees.clone().into_iter().collect::<Vec<_>>(),
            vec![(1, 3), (2, 2), (3, 0), (9, 1)]
        );
        for (id, degree) in degrees {
            assert_eq!(graph.degree(id), degree);
        }
        assert_eq!(graph.incoming(2).count(), 1);
    }
}
