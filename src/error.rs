//! Error types for schema translation

use thiserror::Error;

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslateError>;

/// Translation errors
///
/// Every variant is fatal for the document being processed. Batch callers
/// discard that document's output and continue with its siblings.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("Malformed reference '{identifier}': {reason}")]
    MalformedReference { identifier: String, reason: String },

    #[error("Unsupported schema construct at '{path}': {reason}")]
    UnsupportedSchemaConstruct { path: String, reason: String },

    #[error("Root type not found in type table: {0}")]
    DanglingRoot(String),

    #[error("Ambiguous local name {namespace}:{name} has {count} differing definitions")]
    AmbiguousLocalName { namespace: String, name: String, count: usize },

    #[error("Type {name} redefined with a different structure")]
    TypeConflict { name: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl TranslateError {
    pub fn malformed(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedReference {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedSchemaConstruct {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
