//! Error types for Foundry RAG

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types shared across the workspace
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("Search service error: {0}")]
    Search(String),

    #[error("Translation error {code}: {message}")]
    Translation { code: String, message: String },

    #[error("Agent service error: {0}")]
    Agent(String),

    #[error("Scraper error: {0}")]
    Scraper(String),

    #[error("Deployment error: {0}")]
    Deployment(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// Whether the error came from a resource that does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Search(msg) | Error::Deployment(msg) | Error::Agent(msg) => {
                msg.contains("404") || msg.contains("not found") || msg.contains("NotFound")
            }
            _ => false,
        }
    }
}
