use fanout_core::config::GapConfig;
use fanout_core::model::{ContentNode, NodeKind};
use graph::ContentGraph;
use query::{ComplexQuery, QueryGapAnalyzer};

fn site() -> ContentGraph {
    let mut graph = ContentGraph::new();
    graph
        .add_node(
            ContentNode::new(0, NodeKind::Post, "Brewing espresso at home")
                .with_body("Grind size, water temperature and roast level."),
        )
        .unwrap();
    graph
        .add_node(
            ContentNode::new(1, NodeKind::Page, "Shipping zones")
                .with_body("We deliver to every zone in the EU."),
        )
        .unwrap();
    graph
        .add_node(
            ContentNode::new(2, NodeKind::Post, "Shipping zones and rates")
                .with_body("Rates differ per zone."),
        )
        .unwrap();
    graph
}

fn shipping_query() -> ComplexQuery {
    ComplexQuery::new(
        "How do I set up international shipping?",
        [
            "What are shipping zones?",
            "How to configure international shipping?",
        ],
    )
    .unwrap()
}

#[test]
fn test_uncovered_sub_queries_are_gaps() {
    let mut graph = ContentGraph::new();
    graph
        .add_node(
            ContentNode::new(0, NodeKind::Post, "Brewing espresso at home")
                .with_body("Grind size and roast level."),
        )
        .unwrap();

    let gaps = QueryGapAnalyzer::analyze(&graph, &[shipping_query()], &GapConfig::default());

    assert_eq!(gaps.len(), 2);
    assert!(gaps.iter().all(|g| !g.covered));
    assert!(gaps.iter().all(|g| g.best_node.is_none() && g.score == 0.0));
    assert_eq!(gaps[0].sub_query, "What are shipping zones?");
    assert_eq!(gaps[1].query, "How do I set up international shipping?");
}

#[test]
fn test_covered_sub_query_records_lowest_best_node() {
    let gaps = QueryGapAnalyzer::analyze(&site(), &[shipping_query()], &GapConfig::default());

    // Nodes 1 and 2 both contain "shipping" and "zones".
    assert!(gaps[0].covered);
    assert_eq!(gaps[0].score, 1.0);
    assert_eq!(gaps[0].best_node, Some(1));

    // Only "shipping" of three tokens is present.
    assert!(!gaps[1].covered);
    assert!((gaps[1].score - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(gaps[1].best_node, Some(1));
}

#[test]
fn test_raising_threshold_only_uncovers() {
    let queries = vec![
        shipping_query(),
        ComplexQuery::new(
            "How much does shipping cost?",
            ["Shipping rates per zone", "Espresso roast level guide"],
        )
        .unwrap(),
    ];
    let graph = site();

    let mut previous: Option<Vec<bool>> = None;
    for threshold in [0.0, 0.2, 0.34, 0.5, 0.67, 0.9, 1.0, 1.1] {
        let config = GapConfig {
            coverage_threshold: threshold,
        };
        let covered: Vec<bool> = QueryGapAnalyzer::analyze(&graph, &queries, &config)
            .iter()
            .map(|g| g.covered)
            .collect();
        if let Some(prev) = &previous {
            for (before, after) in prev.iter().zip(covered.iter()) {
                assert!(*before || !*after, "threshold {threshold} re-covered a gap");
            }
        }
        previous = Some(covered);
    }
    assert!(previous.unwrap().iter().all(|c| !c));
}

#[test]
fn test_taxonomy_nodes_never_cover() {
    let mut graph = ContentGraph::new();
    graph
        .add_node(ContentNode::new(0, NodeKind::Category, "Shipping zones"))
        .unwrap();
    let gaps = QueryGapAnalyzer::analyze(&graph, &[shipping_query()], &GapConfig::default());
    assert!(gaps.iter().all(|g| !g.covered));
}

#[test]
fn test_zero_threshold_still_needs_a_matching_node() {
    let config = GapConfig {
        coverage_threshold: 0.0,
    };
    let query = ComplexQuery::new(
        "Where do beans grow?",
        ["Coffee belt climates", "Shipping zones"],
    )
    .unwrap();
    let gaps = QueryGapAnalyzer::analyze(&site(), &[query], &config);

    assert!(!gaps[0].covered);
    assert_eq!(gaps[0].best_node, None);
    assert!(gaps[1].covered);
    assert_eq!(gaps[1].best_node, Some(1));
}
