//! Azure AI Search configuration

use serde::{Deserialize, Serialize};
use frag_core::{env, Result};

/// Connection settings for an Azure AI Search service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchServiceConfig {
    pub endpoint: String,
    pub api_key: String,
    pub index_name: String,
    pub api_version: String,
}

impl SearchServiceConfig {
    pub const DEFAULT_INDEX: &'static str = "md-medicaid";
    pub const DEFAULT_API_VERSION: &'static str = "2024-07-01";

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let endpoint = env::require(&["AZURE_SEARCH_ENDPOINT", "AZURE_AI_SEARCH_ENDPOINT"])?;
        let api_key = env::require(&["AZURE_SEARCH_ADMIN_KEY", "AZURE_AI_SEARCH_API_KEY"])?;

        Ok(Self {
            endpoint,
            api_key,
            index_name: env::optional(&["AZURE_AI_SEARCH_INDEX_NAME"])
                .unwrap_or_else(|| Self::DEFAULT_INDEX.to_string()),
            api_version: env::optional(&["AZURE_SEARCH_API_VERSION"])
                .unwrap_or_else(|| Self::DEFAULT_API_VERSION.to_string()),
        })
    }

    /// Create configuration with explicit values
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            endpoint,
            api_key,
            index_name: Self::DEFAULT_INDEX.to_string(),
            api_version: Self::DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }
}
