//! Translator configuration

use serde::{Deserialize, Serialize};
use frag_core::{env, Result};

/// Configuration for the Azure AI Translator client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub endpoint: String,
    pub api_key: String,
    /// Region of the translator resource; required for regional keys
    pub region: String,
    /// Languages every answer is translated into
    pub target_languages: Vec<String>,
}

impl TranslatorConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.cognitive.microsofttranslator.com";
    pub const API_VERSION: &'static str = "3.0";

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::require(&["AZURE_TRANSLATOR_KEY"])?;
        let region = env::require(&["AZURE_TRANSLATOR_REGION"])?;
        let endpoint = env::optional(&["AZURE_TRANSLATOR_ENDPOINT"])
            .unwrap_or_else(|| Self::DEFAULT_ENDPOINT.to_string());

        Ok(Self {
            endpoint,
            api_key,
            region,
            target_languages: default_languages(),
        })
    }

    /// Create configuration with explicit values
    pub fn new(api_key: String, region: String) -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            api_key,
            region,
            target_languages: default_languages(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.target_languages = languages;
        self
    }
}

fn default_languages() -> Vec<String> {
    vec!["fr".to_string(), "es".to_string()]
}
