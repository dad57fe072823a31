#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to connect to graph store at {uri}: {message}")]
    Connection { uri: String, message: String },
    #[error("invalid store configuration: {0}")]
    Config(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("invalid relation type {0:?} (expected word characters only)")]
    InvalidRelationType(String),
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Connection-level failures abort a run; everything else is per-operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Connection { .. } | StoreError::Config(_) | StoreError::Closed)
    }
}
