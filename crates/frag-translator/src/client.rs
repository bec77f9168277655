//! Translator v3 REST client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use frag_core::{Error, Result, TranslationResult, Translator};

use crate::config::TranslatorConfig;

/// Azure AI Translator client using key + region authentication
pub struct AzureTranslatorClient {
    config: TranslatorConfig,
    client: Client,
}

#[derive(Serialize)]
struct TextElement<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: serde_json::Value,
    message: String,
}

impl AzureTranslatorClient {
    /// Create a new client from configuration
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(TranslatorConfig::from_env()?)
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// URL of the translate operation for the given target languages
    pub fn translate_url(&self, to: &[String]) -> String {
        let base = self.config.endpoint.trim_end_matches('/');
        // Resource-specific endpoints route the text API under a path prefix
        let path = if base.contains(".cognitiveservices.azure.com") {
            "translator/text/v3.0/translate"
        } else {
            "translate"
        };

        let mut url = format!("{}/{}?api-version={}", base, path, TranslatorConfig::API_VERSION);
        for lang in to {
            url.push_str("&to=");
            url.push_str(lang);
        }
        url
    }
}

/// Decode a Translator error body into a typed error
fn service_error(status: StatusCode, body: &str) -> Error {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => Error::Translation {
            code: match envelope.error.code {
                serde_json::Value::String(code) => code,
                other => other.to_string(),
            },
            message: envelope.error.message,
        },
        Err(_) => Error::Translation {
            code: status.as_u16().to_string(),
            message: body.to_string(),
        },
    }
}

fn parse_translate_response(body: &str) -> Result<Vec<TranslationResult>> {
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl Translator for AzureTranslatorClient {
    async fn translate(&self, texts: &[String], to: &[String]) -> Result<Vec<TranslationResult>> {
        if to.is_empty() {
            return Err(Error::InvalidInput("No target languages given".to_string()));
        }

        let url = self.translate_url(to);
        let body: Vec<TextElement> = texts.iter().map(|t| TextElement { text: t }).collect();
        debug!(url = %url, count = texts.len(), "translator request");

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.config.api_key)
            .header("Ocp-Apim-Subscription-Region", &self.config.region)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(service_error(status, &text));
        }
        parse_translate_response(&text)
    }
}
