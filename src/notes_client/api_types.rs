use std::fmt;

use serde::{Deserialize, Serialize};

/// Category a stored document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Note,
    Document,
}

impl DocType {
    /// Wire value used in multipart form fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Note => "note",
            DocType::Document => "document",
        }
    }

    /// Display label used when rendering results.
    pub fn label(&self) -> &'static str {
        match self {
            DocType::Note => "Note",
            DocType::Document => "Document",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter selecting which document category a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchTarget {
    Both,
    Notes,
    Documents,
}

impl SearchTarget {
    pub fn label(&self) -> &'static str {
        match self {
            SearchTarget::Both => "All Documents",
            SearchTarget::Notes => "Handwritten Notes",
            SearchTarget::Documents => "Reference Documents",
        }
    }
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            SearchTarget::Both => "both",
            SearchTarget::Notes => "notes",
            SearchTarget::Documents => "documents",
        };
        f.write_str(value)
    }
}

#[derive(Debug, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub search_target: SearchTarget,
    pub limit: u32,
}

#[derive(Debug, Serialize)]
pub struct SimilarRequest {
    pub document_id: String,
    pub search_target: SearchTarget,
    pub limit: u32,
}

/// One ranked hit from `/search` or `/similar`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredDocument {
    pub id: String,
    pub doc_type: DocType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<ScoredDocument>,
}

/// The document a similarity lookup started from.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    pub doc_type: DocType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SimilarResponse {
    #[serde(default)]
    pub source_document: Option<SourceDocument>,
    #[serde(default)]
    pub results: Vec<ScoredDocument>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractTextResponse {
    #[serde(default)]
    pub text: String,
}

/// Whatever the backend acknowledges an upload with; all fields optional
/// so acknowledgment shape changes never break the client.
#[derive(Debug, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub doc_type: Option<DocType>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error payload shape used by the backend for non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}
