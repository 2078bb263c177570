use crate::extract::{
    canonical_path, clean_html, depth_score, extract_links, parse_published, resolve_internal,
    same_host, site_url_pattern,
};
use fanout_core::error::{ErrorCode, FanoutError};
use fanout_core::ingest::{ContentHash, ContentRecord, SnapshotEntry, TermRef};
use fanout_core::model::{ContentNode, Edge, EdgeKind, NodeId, NodeKind};
use graph::{ContentGraph, GraphError};
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// A record that could not become a node. Skipped and counted, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("record {index} has unsupported kind `{kind}`")]
    UnknownKind { index: usize, kind: String },
    #[error("record {index} repeats {key}")]
    Duplicate { index: usize, key: String },
    #[error("record {index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },
}

impl FanoutError for RecordError {
    fn error_code(&self) -> ErrorCode {
        ErrorCode::InvalidArgument
    }
}

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("invalid site url {url}: {source}")]
    InvalidSiteUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("site url {0} has no host")]
    MissingHost(String),
    #[error("link pattern error: {0}")]
    Pattern(#[from] regex::Error),
    #[error("graph invariant violated: {0}")]
    Graph(#[from] GraphError),
}

impl FanoutError for IngestionError {
    fn error_code(&self) -> ErrorCode {
        match self {
            IngestionError::InvalidSiteUrl { .. } | IngestionError::MissingHost(_) => {
                ErrorCode::InvalidArgument
            }
            IngestionError::Pattern(_) | IngestionError::Graph(_) => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub graph: ContentGraph,
    pub skipped: Vec<RecordError>,
    /// Same-site links whose target is not a known post or page.
    pub dropped_links: usize,
    /// SHA-256 over the whole record snapshot.
    pub snapshot_id: String,
}

impl BuildOutcome {
    pub fn skipped_records(&self) -> usize {
        self.skipped.len()
    }
}

struct Accepted<'a> {
    record: &'a ContentRecord,
    kind: NodeKind,
}

/// One taxonomy node per case-insensitive term, numbered after all content
/// nodes in first-reference order.
struct Taxonomy {
    next_id: NodeId,
    terms: HashMap<(NodeKind, String), (NodeId, String)>,
    nodes: Vec<ContentNode>,
}

impl Taxonomy {
    fn new(first_id: NodeId) -> Self {
        Self {
            next_id: first_id,
            terms: HashMap::new(),
            nodes: Vec::new(),
        }
    }

    fn intern(&mut self, kind: NodeKind, term: &TermRef) -> Option<(NodeId, String)> {
        let key = term.key();
        if key.is_empty() {
            return None;
        }
        if let Some(existing) = self.terms.get(&(kind, key.clone())) {
            return Some(existing.clone());
        }

        let id = self.next_id;
        self.next_id += 1;
        let label = term.label();
        self.nodes.push(ContentNode::new(id, kind, label.clone()));
        self.terms.insert((kind, key), (id, label.clone()));
        Some((id, label))
    }
}

pub struct ContentGraphBuilder {
    site: Url,
    site_host: String,
    site_pattern: Regex,
}

impl ContentGraphBuilder {
    pub fn new(site_url: &str) -> Result<Self, IngestionError> {
        let site = Url::parse(site_url.trim()).map_err(|source| IngestionError::InvalidSiteUrl {
            url: site_url.to_string(),
            source,
        })?;
        let site_host = site
            .host_str()
            .ok_or_else(|| IngestionError::MissingHost(site_url.to_string()))?
            .to_ascii_lowercase();
        let site_pattern = site_url_pattern(&site_host)?;

        Ok(Self {
            site,
            site_host,
            site_pattern,
        })
    }

    pub fn site(&self) -> &Url {
        &self.site
    }

    pub fn build(&self, records: &[ContentRecord]) -> Result<BuildOutcome, IngestionError> {
        self.assemble(records.iter().map(Ok), records.content_hash())
    }

    /// Like [`build`](Self::build), for a snapshot decoded entry by entry.
    /// Entries that failed to decode are skipped as malformed.
    pub fn build_snapshot(
        &self,
        entries: &[SnapshotEntry],
    ) -> Result<BuildOutcome, IngestionError> {
        let decoded = entries.iter().map(|entry| match entry {
            SnapshotEntry::Record(record) => Ok(record),
            SnapshotEntry::Rejected { reason, .. } => Err(reason.as_str()),
        });
        self.assemble(decoded, entries.content_hash())
    }

    fn assemble<'a, I>(
        &self,
        entries: I,
        snapshot_id: String,
    ) -> Result<BuildOutcome, IngestionError>
    where
        I: ExactSizeIterator<Item = Result<&'a ContentRecord, &'a str>>,
    {
        info!("Building content graph from {} records...", entries.len());

        let mut seen = HashSet::new();
        let mut accepted = Vec::with_capacity(entries.len());
        let mut skipped = Vec::new();
        for (index, entry) in entries.enumerate() {
            let checked = entry
                .map_err(|reason| RecordError::Malformed {
                    index,
                    reason: reason.to_string(),
                })
                .and_then(|record| {
                    validate_record(index, record, &mut seen).map(|kind| Accepted { record, kind })
                });
            match checked {
                Ok(item) => accepted.push(item),
                Err(err) => {
                    warn!("Skipping malformed record: {}", err);
                    skipped.push(err);
                }
            }
        }

        let mut graph = ContentGraph::new();
        let mut taxonomy = Taxonomy::new(accepted.len() as NodeId);
        let mut memberships = Vec::new();
        let mut by_path: HashMap<String, NodeId> = HashMap::new();
        let mut link_sources = Vec::with_capacity(accepted.len());

        for (idx, item) in accepted.iter().enumerate() {
            let id = idx as NodeId;
            let record = item.record;

            let body = clean_html(&record.body);
            let word_count = body.split_whitespace().count();
            let page_url = self.resolve_record_url(&record.url);
            if let Some(url) = &page_url {
                let path = canonical_path(url);
                if let Some(first) = by_path.get(&path) {
                    debug!("Node {} shares path {} with node {}", id, path, first);
                } else {
                    by_path.insert(path, id);
                }
            }

            let mut categories = BTreeSet::new();
            for term in &record.categories {
                if let Some((term_id, label)) = taxonomy.intern(NodeKind::Category, term) {
                    memberships.push(Edge::new(id, term_id, EdgeKind::CategoryMembership));
                    categories.insert(label);
                }
            }
            let mut tags = BTreeSet::new();
            for term in &record.tags {
                if let Some((term_id, label)) = taxonomy.intern(NodeKind::Tag, term) {
                    memberships.push(Edge::new(id, term_id, EdgeKind::TagMembership));
                    tags.insert(label);
                }
            }

            let mut node = ContentNode::new(id, item.kind, clean_html(&record.title))
                .with_body(body)
                .with_url(record.url.trim());
            node.categories = categories;
            node.tags = tags;
            node.published = record.published.as_deref().and_then(parse_published);
            node.depth_score = depth_score(&record.body, word_count);
            graph.add_node(node)?;

            link_sources.push((id, record.body.as_str(), page_url));
        }

        for node in taxonomy.nodes {
            graph.add_node(node)?;
        }
        for edge in memberships {
            graph.add_edge(edge)?;
        }

        let mut dropped_links = 0;
        for (id, raw, page_url) in link_sources {
            let base = page_url.as_ref().unwrap_or(&self.site);
            let mut targets = BTreeSet::new();
            for link in extract_links(raw, &self.site_pattern) {
                let Some(resolved) = resolve_internal(&link, base, &self.site_host) else {
                    continue;
                };
                match by_path.get(&canonical_path(&resolved)) {
                    Some(&target) if target != id => {
                        targets.insert(target);
                    }
                    Some(_) => {}
                    None => {
                        debug!("Dropping link from node {} to unknown target {}", id, resolved);
                        dropped_links += 1;
                    }
                }
            }
            for target in targets {
                graph.add_edge(Edge::new(id, target, EdgeKind::InternalLink))?;
            }
        }

        info!(
            "Content graph built with {} nodes and {} edges ({} records skipped, {} links dropped)",
            graph.node_count(),
            graph.edge_count(),
            skipped.len(),
            dropped_links
        );

        Ok(BuildOutcome {
            graph,
            skipped,
            dropped_links,
            snapshot_id,
        })
    }

    fn resolve_record_url(&self, raw: &str) -> Option<Url> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let url = self.site.join(raw).ok()?;
        let host = url.host_str()?;
        same_host(host, &self.site_host).then_some(url)
    }
}

fn validate_record(
    index: usize,
    record: &ContentRecord,
    seen: &mut HashSet<String>,
) -> Result<NodeKind, RecordError> {
    let id = record
        .id
        .as_ref()
        .map(|id| id.to_string())
        .filter(|id| !id.trim().is_empty())
        .ok_or(RecordError::MissingField { index, field: "id" })?;
    let raw_kind = record
        .kind
        .as_deref()
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .ok_or(RecordError::MissingField {
            index,
            field: "kind",
        })?;

    let kind = match raw_kind.to_ascii_lowercase().as_str() {
        "post" => NodeKind::Post,
        "page" => NodeKind::Page,
        _ => {
            return Err(RecordError::UnknownKind {
                index,
                kind: raw_kind.to_string(),
            })
        }
    };

    let key = format!("{}:{}", kind, id.trim());
    if !seen.insert(key.clone()) {
        return Err(RecordError::Duplicate { index, key });
    }
    Ok(kind)
}
