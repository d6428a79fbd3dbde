use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form document metadata, stored and returned verbatim.
pub type Metadata = Map<String, Value>;

/// A stored document. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

/// One hit of a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    /// Cosine similarity to the query (higher = closer).
    pub score: f32,
}

/// Hits ordered by descending score.
pub type RetrievalResult = Vec<RetrievedDocument>;

/// Listing entry, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub metadata: Metadata,
}

/// Caller-supplied ingestion input before an id and embedding are assigned.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDocument {
    pub text: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl NewDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
