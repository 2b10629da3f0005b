use thiserror::Error;

/// Errors surfaced by the graph engine.
///
/// Lookups that find nothing are not errors; they return `Option::None`
/// or empty collections.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The underlying store failed to read or write.
    #[error("persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// A record could not be encoded for storage.
    #[error("encoding failure: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A previously stored record failed to decode. Bulk scans skip these
    /// with a warning; point lookups surface them.
    #[error("malformed stored record in {table} ({id}): {reason}")]
    MalformedRecord {
        table: &'static str,
        id: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, GraphError>;
