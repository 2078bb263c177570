use fanout_core::error::{ErrorCode, FanoutError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecompositionError {
    #[error("complex query must be a non-empty string")]
    EmptyQuery,
    #[error("query `{query}` has no sub-queries")]
    EmptyDecomposition { query: String },
    #[error("query `{query}` has an empty or non-string sub-query at position {index}")]
    InvalidSubQuery { query: String, index: usize },
    #[error("decomposition payload is not usable: {0}")]
    InvalidPayload(String),
}

impl FanoutError for DecompositionError {
    fn error_code(&self) -> ErrorCode {
        ErrorCode::InvalidArgument
    }
}

/// One decomposition entry as delivered, before any shape checks.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawComplexQuery {
    #[serde(default)]
    pub query: Value,
    #[serde(default, alias = "subqueries", alias = "decomposition")]
    pub sub_queries: Value,
}

impl RawComplexQuery {
    pub fn new(query: impl Into<Value>, sub_queries: impl Into<Value>) -> Self {
        Self {
            query: query.into(),
            sub_queries: sub_queries.into(),
        }
    }
}

/// A complex query and its ordered, non-empty list of sub-queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexQuery {
    query: String,
    sub_queries: Vec<String>,
}

impl ComplexQuery {
    pub fn new<I, S>(query: &str, sub_queries: I) -> Result<Self, DecompositionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let query = query.trim();
        if query.is_empty() {
            return Err(DecompositionError::EmptyQuery);
        }
        let mut subs = Vec::new();
        for (index, sub) in sub_queries.into_iter().enumerate() {
            let sub: String = sub.into();
            let sub = sub.trim();
            if sub.is_empty() {
                return Err(DecompositionError::InvalidSubQuery {
                    query: query.to_string(),
                    index,
                });
            }
            subs.push(sub.to_string());
        }
        if subs.is_empty() {
            return Err(DecompositionError::EmptyDecomposition {
                query: query.to_string(),
            });
        }
        Ok(Self {
            query: query.to_string(),
            sub_queries: subs,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sub_queries(&self) -> &[String] {
        &self.sub_queries
    }
}

impl TryFrom<RawComplexQuery> for ComplexQuery {
    type Error = DecompositionError;

    fn try_from(raw: RawComplexQuery) -> Result<Self, Self::Error> {
        let query = match &raw.query {
            Value::String(q) => q.as_str(),
            _ => return Err(DecompositionError::EmptyQuery),
        };
        let entries = match raw.sub_queries {
            Value::Array(entries) => entries,
            Value::Null => Vec::new(),
            _ => {
                return Err(DecompositionError::InvalidPayload(format!(
                    "sub_queries of `{}` is not a list",
                    query.trim()
                )))
            }
        };

        let mut subs = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match entry {
                Value::String(s) => subs.push(s),
                _ => {
                    return Err(DecompositionError::InvalidSubQuery {
                        query: query.trim().to_string(),
                        index,
                    })
                }
            }
        }
        ComplexQuery::new(query, subs)
    }
}

/// Valid queries in delivery order plus the entries that were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decompositions {
    pub queries: Vec<ComplexQuery>,
    pub dropped: Vec<DecompositionError>,
    /// Free-text optimization opportunities named by the model, echoed into
    /// the report unchanged.
    pub opportunities: Vec<String>,
}

impl Decompositions {
    pub fn from_raw(raw: impl IntoIterator<Item = RawComplexQuery>) -> Self {
        Self::from_entries(raw.into_iter().map(Ok))
    }

    /// Entries that already failed to parse are dropped alongside the ones
    /// that fail validation, keeping delivery order.
    pub fn from_entries(
        entries: impl IntoIterator<Item = Result<RawComplexQuery, DecompositionError>>,
    ) -> Self {
        let mut out = Self::default();
        let mut seen = HashSet::new();
        for entry in entries {
            match entry.and_then(ComplexQuery::try_from) {
                Ok(query) => {
                    if seen.insert(query.query().to_string()) {
                        out.queries.push(query);
                    } else {
                        debug!("Ignoring repeated complex query `{}`", query.query());
                    }
                }
                Err(err) => {
                    warn!("Dropping malformed decomposition: {}", err);
                    out.dropped.push(err);
                }
            }
        }
        out
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

#[derive(Debug, Default, Deserialize)]
struct LlmPayload {
    #[serde(default)]
    complex_queries: Vec<Value>,
    #[serde(default)]
    decompositions: Map<String, Value>,
    #[serde(default, alias = "recommendations")]
    opportunities: Vec<Value>,
}

/// Reads decomposition data from model output. Accepts the native payload
/// (`complex_queries` plus a `decompositions` map, optionally wrapped in a
/// Markdown code fence or surrounded by prose) or a plain JSON array of
/// `{query, sub_queries}` objects.
pub fn parse_llm_payload(text: &str) -> Result<Decompositions, DecompositionError> {
    let cleaned = strip_code_fence(text);

    if cleaned.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(cleaned)
            .map_err(|e| DecompositionError::InvalidPayload(e.to_string()))?;
        let entries = values.into_iter().map(|value| {
            RawComplexQuery::deserialize(value)
                .map_err(|e| DecompositionError::InvalidPayload(e.to_string()))
        });
        return Ok(Decompositions::from_entries(entries));
    }

    let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) else {
        return Err(DecompositionError::InvalidPayload(
            "no JSON object found".to_string(),
        ));
    };
    if end < start {
        return Err(DecompositionError::InvalidPayload(
            "no JSON object found".to_string(),
        ));
    }
    let payload: LlmPayload = serde_json::from_str(&cleaned[start..=end])
        .map_err(|e| DecompositionError::InvalidPayload(e.to_string()))?;

    let mut listed = HashSet::new();
    let mut raw = Vec::with_capacity(payload.complex_queries.len());
    for query in payload.complex_queries {
        let sub_queries = match &query {
            Value::String(q) => {
                listed.insert(q.clone());
                payload.decompositions.get(q).cloned().unwrap_or(Value::Null)
            }
            _ => Value::Null,
        };
        raw.push(RawComplexQuery { query, sub_queries });
    }
    // Decompositions for queries that were not listed, in key order.
    let mut unlisted: Vec<(String, Value)> = payload
        .decompositions
        .into_iter()
        .filter(|(query, _)| !listed.contains(query))
        .collect();
    unlisted.sort_by(|a, b| a.0.cmp(&b.0));
    for (query, sub_queries) in unlisted {
        raw.push(RawComplexQuery::new(query, sub_queries));
    }

    let mut parsed = Decompositions::from_raw(raw);
    for opportunity in payload.opportunities {
        match opportunity {
            Value::String(text) if !text.trim().is_empty() => {
                parsed.opportunities.push(text.trim().to_string())
            }
            other => debug!("Ignoring non-text opportunity {}", other),
        }
    }
    info!(
        "Parsed {} complex queries ({} dropped, {} opportunities)",
        parsed.queries.len(),
        parsed.dropped_count(),
        parsed.opportunities.len()
    );
    Ok(parsed)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}
