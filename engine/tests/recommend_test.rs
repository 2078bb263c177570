use fanout_core::config::StructureConfig;
use fanout_core::model::{ContentNode, Edge, EdgeKind, NodeKind};
use fanout_engine::{ActionPlan, Priority, RecommendationEngine, RecommendationKind};
use graph::{ContentGraph, StructuralAnalyzer};
use semantic::{Cluster, ClusterSet};

fn cluster(id: usize, members: &[u64], term: &str) -> Cluster {
    Cluster {
        id,
        members: members.to_vec(),
        terms: vec![term.to_string()],
    }
}

/// Node 0 is a hub linked both ways with 1, 2 and 3. Everything else is
/// unlinked.
fn site() -> ContentGraph {
    let mut graph = ContentGraph::new();
    let nodes = vec![
        ContentNode::new(0, NodeKind::Page, "Shipping guide").with_categories(["Guides"]),
        ContentNode::new(1, NodeKind::Post, "Rates"),
        ContentNode::new(2, NodeKind::Post, "Carriers"),
        ContentNode::new(3, NodeKind::Post, "Tracking"),
        ContentNode::new(4, NodeKind::Post, "Customs forms")
            .with_categories(["Guides"])
            .with_url("https://shop.example/customs/"),
        ContentNode::new(5, NodeKind::Post, "EU zones").with_tags(["eu"]),
        ContentNode::new(6, NodeKind::Post, "Delivery times"),
        ContentNode::new(7, NodeKind::Post, "EU rates").with_tags(["eu"]),
        ContentNode::new(8, NodeKind::Post, "EU returns").with_tags(["eu"]),
    ];
    for node in nodes {
        graph.add_node(node).unwrap();
    }
    for spoke in 1..=3 {
        graph
            .add_edge(Edge::new(0, spoke, EdgeKind::InternalLink))
            .unwrap();
        graph
            .add_edge(Edge::new(spoke, 0, EdgeKind::InternalLink))
            .unwrap();
    }
    graph
}

fn clusters() -> ClusterSet {
    ClusterSet {
        clusters: vec![
            cluster(0, &[0, 5, 6], "shipping"),
            cluster(1, &[1, 7], "rates"),
            cluster(2, &[8], "returns"),
        ],
        excluded: vec![2, 3, 4],
    }
}

#[test]
fn test_rules_fire_in_order() {
    let graph = site();
    let structure = StructuralAnalyzer::analyze(&graph, &StructureConfig::default());
    assert_eq!(structure.hub_candidates().map(|m| m.id).collect::<Vec<_>>(), vec![0]);

    let recs = RecommendationEngine::recommend(&graph, &structure, &clusters(), &[]);
    let kinds: Vec<(RecommendationKind, Priority, Option<u64>)> =
        recs.iter().map(|r| (r.kind, r.priority, r.target)).collect();

    assert_eq!(
        kinds,
        vec![
            (RecommendationKind::InternalLinking, Priority::Medium, Some(4)),
            (RecommendationKind::HubOptimization, Priority::High, Some(0)),
            (RecommendationKind::SemanticBridge, Priority::Low, None),
            (RecommendationKind::SemanticBridge, Priority::Low, None),
        ]
    );
    assert_eq!(recs[0].url.as_deref(), Some("https://shop.example/customs/"));
    assert!(recs[0].rationale.contains("Guides"));
    assert!(recs[2].rationale.contains("Clusters 0"));
    assert!(recs[3].rationale.contains("Clusters 1"));
}

#[test]
fn test_hub_linking_into_its_cluster_is_left_alone() {
    let graph = site();
    let structure = StructuralAnalyzer::analyze(&graph, &StructureConfig::default());
    let set = ClusterSet {
        clusters: vec![cluster(0, &[0, 1, 2], "shipping")],
        excluded: vec![3, 4, 5, 6, 7, 8],
    };

    let recs = RecommendationEngine::recommend(&graph, &structure, &set, &[]);
    assert!(recs
        .iter()
        .all(|r| r.kind != RecommendationKind::HubOptimization));
}

#[test]
fn test_every_recommendation_lands_in_one_bucket() {
    let graph = site();
    let structure = StructuralAnalyzer::analyze(&graph, &StructureConfig::default());
    let recs = RecommendationEngine::recommend(&graph, &structure, &clusters(), &[]);

    let plan = ActionPlan::from_recommendations(&recs);
    assert_eq!(plan.len(), recs.len());
    assert!(plan.immediate.iter().all(|r| r.priority == Priority::High));
    assert!(plan.short_term.iter().all(|r| r.priority == Priority::Medium));
    assert!(plan.long_term.iter().all(|r| r.priority == Priority::Low));
}

#[test]
fn test_no_findings_no_recommendations() {
    let graph = ContentGraph::new();
    let structure = StructuralAnalyzer::analyze(&graph, &StructureConfig::default());
    let recs = RecommendationEngine::recommend(&graph, &structure, &ClusterSet::default(), &[]);
    assert!(recs.is_empty());
    assert!(ActionPlan::from_recommendations(&recs).is_empty());
}
