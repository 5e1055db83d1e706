///
/// Driver interface error types.
///
/// Every failure the registry, the materializer, the configuration loader,
/// and the backend drivers can report. Registry failures are plain values the
/// caller may recover from; materializer failures abort the call in progress
/// and never leave a partially built table behind.
///

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbiError {
    #[error("{class} table is full ({capacity} slots); close some before opening more")]
    Full { class: &'static str, capacity: usize },

    #[error("{class} handle {handle} does not refer to a live resource")]
    NotFound { class: &'static str, handle: i64 },

    #[error("{class} handle {handle} is stale (slot was reused)")]
    StaleHandle { class: &'static str, handle: i64 },

    #[error("could not allocate {requested} elements for column '{column}'")]
    AllocationFailure { column: String, requested: usize },

    #[error("unsupported data type code {code} for field '{field}'")]
    UnsupportedType { field: String, code: i32 },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("column '{column}' has {len} rows but the frame has {expected}")]
    RaggedFrame {
        column: String,
        len: usize,
        expected: usize,
    },

    #[error("Failed to read config at {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("{0}")]
    Driver(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl DbiError {
    /// True for failures the host should treat as fatal for the current call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DbiError::AllocationFailure { .. } | DbiError::UnsupportedType { .. }
        )
    }
}
