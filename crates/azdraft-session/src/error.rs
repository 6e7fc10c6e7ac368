use azdraft_core::{GraphError, SettingsError};
use azdraft_ingest::IngestError;
use thiserror::Error;

/// Path the route guard sends unauthenticated users to.
pub const SIGN_IN_ROUTE: &str = "/auth/signin";

/// Shown when the generator stream cannot be opened or breaks.
pub const TRANSPORT_ERROR_MESSAGE: &str = "Failed to connect to the AI service. Please try again.";

/// Shown for any other generation failure.
pub const GENERATION_ERROR_MESSAGE: &str =
    "An error occurred while generating the architecture. Please try again.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("add at least one resource first")]
    NoResources,

    #[error("no deployment template has been generated")]
    NoTemplate,

    #[error("user not authenticated")]
    Unauthenticated,

    #[error("resource '{id}' not found")]
    ResourceNotFound { id: String },

    #[error("code generation is not supported for {resource_type}")]
    Unsupported { resource_type: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    /// Message for the user-facing error banner.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Ingest(e) if e.is_transport() => TRANSPORT_ERROR_MESSAGE.to_string(),
            SessionError::Ingest(_) => GENERATION_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Where the surface should navigate instead of showing the error.
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            SessionError::Unauthenticated => Some(SIGN_IN_ROUTE),
            _ => None,
        }
    }
}
