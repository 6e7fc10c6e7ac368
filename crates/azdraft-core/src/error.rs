use thiserror::Error;

/// Rejected graph mutation. The store is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A connection endpoint does not name a current resource.
    #[error("connection endpoint '{id}' is not a resource in this diagram")]
    InvalidReference { id: String },

    /// A wholesale replacement would break referential integrity.
    #[error("invalid graph: {reason}")]
    InvalidGraph { reason: String },
}

impl GraphError {
    pub fn invalid_graph(reason: impl Into<String>) -> Self {
        Self::InvalidGraph {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
