use fanout_core::ingest::{decode_snapshot, ContentRecord};
use fanout_core::model::{EdgeKind, NodeKind};
use ingestion::{ContentGraphBuilder, RecordError};

const SITE: &str = "https://shop.example";

fn builder() -> ContentGraphBuilder {
    ContentGraphBuilder::new(SITE).unwrap()
}

fn post(id: &str, slug: &str, body: &str) -> ContentRecord {
    ContentRecord::new(id, "post")
        .with_title(format!("Post {id}"))
        .with_url(format!("{SITE}/{slug}/"))
        .with_body(body)
}

#[test]
fn test_internal_links_become_edges() {
    let records = vec![
        post("1", "zones", r#"<p>See <a href="/rates/">rates</a></p>"#),
        post("2", "rates", r#"<p>Back to https://www.shop.example/zones and <a href="https://elsewhere.example/x">x</a></p>"#),
        post("3", "carriers", "<p>No links here.</p>"),
    ];

    let outcome = builder().build(&records).unwrap();
    let graph = &outcome.graph;

    assert_eq!(graph.node_count(), 3);
    assert!(graph.has_edge(0, 1, EdgeKind::InternalLink));
    assert!(graph.has_edge(1, 0, EdgeKind::InternalLink));
    assert_eq!(graph.edges_of_kind(EdgeKind::InternalLink).count(), 2);
    assert_eq!(outcome.dropped_links, 0);
    assert!(graph.validate().is_ok());
}

#[test]
fn test_unknown_targets_and_self_links_are_dropped() {
    let records = vec![
        post("1", "zones", r#"<a href="/missing/">gone</a> <a href="/zones/">self</a> <a href="/zones?ref=x">self again</a>"#),
        post("2", "rates", ""),
    ];

    let outcome = builder().build(&records).unwrap();
    assert_eq!(outcome.graph.edges_of_kind(EdgeKind::InternalLink).count(), 0);
    assert_eq!(outcome.dropped_links, 1);
}

#[test]
fn test_lookalike_host_is_not_an_internal_link() {
    let home = ContentRecord::new("0", "page")
        .with_title("Home")
        .with_url(format!("{SITE}/"));
    let records = vec![
        home,
        post(
            "1",
            "deals",
            r#"<p>Claim it at https://shop.example.evil.com/phish or <a href="https://shop.example.evil.com/">here</a></p>"#,
        ),
    ];

    let outcome = builder().build(&records).unwrap();
    assert_eq!(outcome.graph.edges_of_kind(EdgeKind::InternalLink).count(), 0);
    assert_eq!(outcome.graph.in_degree(0, EdgeKind::InternalLink), 0);
    assert_eq!(outcome.dropped_links, 0);
}

#[test]
fn test_duplicate_links_collapse_to_one_edge() {
    let body = r#"<a href="/rates/">a</a> <a href="/rates">b</a> https://shop.example/rates/"#;
    let records = vec![post("1", "zones", body), post("2", "rates", "")];

    let outcome = builder().build(&records).unwrap();
    assert_eq!(outcome.graph.edge_count(), 1);
}

#[test]
fn test_taxonomy_nodes_are_shared_case_insensitively() {
    let records = vec![
        post("1", "zones", "").with_categories(["Shipping"]).with_tags(["international"]),
        ContentRecord::new("about", "page")
            .with_url(format!("{SITE}/about/"))
            .with_categories(["shipping", "Company"]),
    ];

    let outcome = builder().build(&records).unwrap();
    let graph = &outcome.graph;

    let categories: Vec<_> = graph
        .nodes()
        .filter(|node| node.kind == NodeKind::Category)
        .collect();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].id, 2, "taxonomy ids follow content ids");
    assert_eq!(categories[0].title, "Shipping");

    assert!(graph.has_edge(0, 2, EdgeKind::CategoryMembership));
    assert!(graph.has_edge(1, 2, EdgeKind::CategoryMembership));
    assert_eq!(graph.edges_of_kind(EdgeKind::TagMembership).count(), 1);

    let page = graph.node(1).unwrap();
    assert!(page.categories.contains("Shipping"));
    assert!(page.categories.contains("Company"));
}

#[test]
fn test_malformed_record_is_skipped_and_counted() {
    let records: Vec<ContentRecord> = serde_json::from_str(
        r#"[
            {"id": 1, "type": "post", "title": "Zones", "link": "https://shop.example/zones/"},
            {"id": 2, "title": "No kind"},
            {"type": "page", "title": "No id"},
            {"id": 3, "type": "page", "title": "About", "link": "https://shop.example/about/"}
        ]"#,
    )
    .unwrap();

    let outcome = builder().build(&records).unwrap();

    assert_eq!(outcome.skipped_records(), 2);
    assert_eq!(
        outcome.skipped[0],
        RecordError::MissingField {
            index: 1,
            field: "kind"
        }
    );
    assert_eq!(outcome.graph.content_nodes().count(), 2);
    assert_eq!(outcome.graph.node(1).unwrap().title, "About");
}

#[test]
fn test_ill_typed_snapshot_entries_are_skipped_as_malformed() {
    let values: Vec<serde_json::Value> = serde_json::from_str(
        r#"[
            {"id": 1, "type": "post", "title": {"rendered": "Zones"}, "link": "https://shop.example/zones/"},
            {"id": 2, "type": 5},
            {"id": 3, "type": "page", "title": null, "content": {"rendered": "<p>About us</p>"}}
        ]"#,
    )
    .unwrap();

    let outcome = builder().build_snapshot(&decode_snapshot(values)).unwrap();

    assert_eq!(outcome.skipped_records(), 1);
    assert!(matches!(
        outcome.skipped[0],
        RecordError::Malformed { index: 1, .. }
    ));
    assert_eq!(outcome.graph.content_nodes().count(), 2);
    assert_eq!(outcome.graph.node(0).unwrap().title, "Zones");
    assert_eq!(outcome.graph.node(1).unwrap().body, "About us");
}

#[test]
fn test_bodies_are_cleaned_and_dates_parsed() {
    let mut record = post("1", "zones", "<h2>Zones</h2><p>Ship&nbsp;anywhere</p>");
    record.published = Some("2024-05-01T09:30:00".to_string());

    let outcome = builder().build(&[record]).unwrap();
    let node = outcome.graph.node(0).unwrap();
    assert_eq!(node.body, "Zones Ship anywhere");
    assert!(node.published.is_some());
}

#[test]
fn test_snapshot_id_is_stable() {
    let records = vec![post("1", "zones", "a"), post("2", "rates", "b")];
    let a = builder().build(&records).unwrap();
    let b = builder().build(&records).unwrap();
    assert_eq!(a.snapshot_id, b.snapshot_id);
    assert_eq!(a.snapshot_id.len(), 64);
}
