use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Record identifier as delivered by the crawler: REST sources give numbers,
/// sitemap sources give strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// Category or tag reference, either a numeric term id or a term name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermRef {
    Id(u64),
    Name(String),
}

impl TermRef {
    /// Case-insensitive key used to reuse one taxonomy node per term.
    pub fn key(&self) -> String {
        match self {
            TermRef::Id(id) => id.to_string(),
            TermRef::Name(name) => name.trim().to_lowercase(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            TermRef::Id(id) => id.to_string(),
            TermRef::Name(name) => name.trim().to_string(),
        }
    }
}

/// Text as the REST API renders it (`{"rendered": "..."}`) or as a plain
/// string from sitemap crawls.
#[derive(Deserialize)]
#[serde(untagged)]
enum RenderedText {
    Plain(String),
    Rendered { rendered: String },
}

fn rendered_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RenderedText>::deserialize(deserializer)? {
        Some(RenderedText::Plain(text)) | Some(RenderedText::Rendered { rendered: text }) => text,
        None => String::new(),
    })
}

/// One content record from the crawl collaborator. `id` and `kind` are
/// required but optional here so that malformed records can be counted
/// instead of failing deserialization of the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "rendered_text")]
    pub title: String,
    #[serde(default, alias = "content", deserialize_with = "rendered_text")]
    pub body: String,
    #[serde(default, alias = "link", deserialize_with = "rendered_text")]
    pub url: String,
    #[serde(default)]
    pub categories: Vec<TermRef>,
    #[serde(default)]
    pub tags: Vec<TermRef>,
    #[serde(default, alias = "date")]
    pub published: Option<String>,
}

impl ContentRecord {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: Some(RecordId::Text(id.into())),
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_categories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = names.into_iter().map(|n| TermRef::Name(n.into())).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = names.into_iter().map(|n| TermRef::Name(n.into())).collect();
        self
    }
}

/// One element of a delivered snapshot: a decoded record, or the raw value
/// that did not fit the record shape.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEntry {
    Record(ContentRecord),
    Rejected { value: Value, reason: String },
}

impl SnapshotEntry {
    pub fn from_value(value: Value) -> Self {
        match ContentRecord::deserialize(&value) {
            Ok(record) => SnapshotEntry::Record(record),
            Err(err) => SnapshotEntry::Rejected {
                value,
                reason: err.to_string(),
            },
        }
    }

    pub fn record(&self) -> Option<&ContentRecord> {
        match self {
            SnapshotEntry::Record(record) => Some(record),
            SnapshotEntry::Rejected { .. } => None,
        }
    }
}

/// Decodes each element on its own so one ill-typed record cannot sink the
/// rest of the snapshot.
pub fn decode_snapshot(values: Vec<Value>) -> Vec<SnapshotEntry> {
    values.into_iter().map(SnapshotEntry::from_value).collect()
}

pub trait ContentHash {
    fn content_hash(&self) -> String;
}

impl ContentHash for ContentRecord {
    fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        update_record(&mut hasher, self);
        format!("{:x}", hasher.finalize())
    }
}

impl ContentHash for [ContentRecord] {
    fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for record in self {
            update_record(&mut hasher, record);
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Same digest as the decoded records alone when nothing was rejected.
impl ContentHash for [SnapshotEntry] {
    fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for entry in self {
            match entry {
                SnapshotEntry::Record(record) => update_record(&mut hasher, record),
                SnapshotEntry::Rejected { value, .. } => {
                    // u64::MAX never occurs as a real length prefix.
                    hasher.update(u64::MAX.to_le_bytes());
                    update_field(&mut hasher, value.to_string().as_bytes());
                }
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

// Length-prefix every field and every list so adjacent ones cannot alias.
fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn update_terms(hasher: &mut Sha256, terms: &[TermRef]) {
    hasher.update((terms.len() as u64).to_le_bytes());
    for term in terms {
        update_field(hasher, term.key().as_bytes());
    }
}

fn update_record(hasher: &mut Sha256, record: &ContentRecord) {
    let id = record.id.as_ref().map(|id| id.to_string()).unwrap_or_default();
    update_field(hasher, id.as_bytes());
    update_field(hasher, record.kind.as_deref().unwrap_or("").as_bytes());
    update_field(hasher, record.title.as_bytes());
    update_field(hasher, record.body.as_bytes());
    update_field(hasher, record.url.as_bytes());
    update_terms(hasher, &record.categories);
    update_terms(hasher, &record.tags);
    update_field(hasher, record.published.as_deref().unwrap_or("").as_bytes());
}
