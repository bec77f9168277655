//! Azure OpenAI configuration

use serde::{Deserialize, Serialize};
use frag_core::{env, Result};

/// Configuration for the Azure OpenAI client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub endpoint: String,
    pub api_key: String,
    /// API version for embedding calls
    pub api_version: String,
    /// API version for chat completion calls
    pub chat_api_version: String,
    pub chat_deployment: String,
    pub embed_deployment: String,
    pub embed_dims: usize,
    /// Separate resource for embeddings, when the embedding model lives elsewhere
    pub embed_endpoint: Option<String>,
    pub embed_api_key: Option<String>,
}

impl OpenAIConfig {
    pub const DEFAULT_API_VERSION: &'static str = "2024-06-01";
    pub const DEFAULT_CHAT_API_VERSION: &'static str = "2024-12-01-preview";
    pub const DEFAULT_CHAT_DEPLOYMENT: &'static str = "gpt-4o-mini";
    pub const DEFAULT_EMBED_DEPLOYMENT: &'static str = "text-embedding-3-small";
    pub const DEFAULT_EMBED_DIMS: usize = 1536;

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let endpoint = env::require(&["AZURE_OPENAI_ENDPOINT"])?;
        let api_key = env::require(&["AZURE_OPENAI_API_KEY"])?;

        Ok(Self {
            endpoint,
            api_key,
            api_version: env::optional(&["AZURE_OPENAI_API_VERSION"])
                .unwrap_or_else(|| Self::DEFAULT_API_VERSION.to_string()),
            chat_api_version: env::optional(&["AZURE_OPENAI_CHAT_API_VERSION"])
                .unwrap_or_else(|| Self::DEFAULT_CHAT_API_VERSION.to_string()),
            chat_deployment: env::optional(&["AZURE_OPENAI_CHAT_DEPLOYMENT"])
                .unwrap_or_else(|| Self::DEFAULT_CHAT_DEPLOYMENT.to_string()),
            embed_deployment: env::optional(&[
                "AZURE_OPENAI_EMBED_DEPLOYMENT",
                "AZURE_OPENAI_EMBED_MODEL_NAME",
            ])
            .unwrap_or_else(|| Self::DEFAULT_EMBED_DEPLOYMENT.to_string()),
            embed_dims: env::parse_or("AZURE_OPENAI_EMBED_DIMS", Self::DEFAULT_EMBED_DIMS)?,
            embed_endpoint: env::optional(&["AZURE_OPENAI_EMBEDDING_ENDPOINT"]),
            embed_api_key: env::optional(&["AZURE_OPENAI_EMBEDDING_KEY"]),
        })
    }

    /// Create configuration with explicit values
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            endpoint,
            api_key,
            api_version: Self::DEFAULT_API_VERSION.to_string(),
            chat_api_version: Self::DEFAULT_CHAT_API_VERSION.to_string(),
            chat_deployment: Self::DEFAULT_CHAT_DEPLOYMENT.to_string(),
            embed_deployment: Self::DEFAULT_EMBED_DEPLOYMENT.to_string(),
            embed_dims: Self::DEFAULT_EMBED_DIMS,
            embed_endpoint: None,
            embed_api_key: None,
        }
    }

    pub fn with_chat_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.chat_deployment = deployment.into();
        self
    }

    /// Endpoint that serves the embedding deployment
    pub fn embedding_endpoint(&self) -> &str {
        self.embed_endpoint.as_deref().unwrap_or(&self.endpoint)
    }

    /// Key for the embedding endpoint
    pub fn embedding_key(&self) -> &str {
        self.embed_api_key.as_deref().unwrap_or(&self.api_key)
    }
}
