//! Ingestion configuration and reporting

use serde::{Deserialize, Serialize};

/// Result of an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub uploaded: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Configuration for document ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub batch_size: usize,
    /// Embedding input is cut to this many characters
    pub max_embed_chars: usize,
    pub with_embeddings: bool,
    /// File pattern relative to the data directory
    pub pattern: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            max_embed_chars: 16_000,
            with_embeddings: true,
            pattern: "**/*.txt".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.max_embed_chars, 16_000);
        assert!(config.with_embeddings);
        assert_eq!(config.pattern, "**/*.txt");
    }
}
