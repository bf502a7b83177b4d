//! Error types for podtekst-core

use thiserror::Error;

/// Main error type for the podtekst-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Conversation failed structural validation
    #[error("invalid conversation: {0}")]
    InvalidConversation(String),

    /// Stored analysis not found
    #[error("analysis not found: {0}")]
    AnalysisNotFound(String),
}

/// Result type alias for podtekst-core
pub type Result<T> = std::result::Result<T, Error>;
