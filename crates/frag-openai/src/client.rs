//! Azure OpenAI client implementation

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use frag_core::{
    ChatMessage, EmbeddingProvider, Error, GenerationConfig, GenerationResult, LLMProvider,
    Result,
};

use crate::config::OpenAIConfig;

/// Azure OpenAI client serving one chat and one embedding deployment
pub struct AzureOpenAIClient {
    config: OpenAIConfig,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

impl AzureOpenAIClient {
    /// Create a new client from configuration
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = OpenAIConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// URL of the chat completions operation on the chat deployment
    pub fn chat_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            deployment,
            self.config.chat_api_version
        )
    }

    /// URL of the embeddings operation on the embedding deployment
    pub fn embeddings_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.config.embedding_endpoint().trim_end_matches('/'),
            self.config.embed_deployment,
            self.config.api_version
        )
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: &str, key: &str, body: &B) -> Result<String> {
        debug!(url, "azure openai request");
        let response = self
            .client
            .post(url)
            .header("api-key", key)
            .header("Content-Type", "application/json")
            .json(body)
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
        Ok(text)
    }

    async fn perform_chat(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let request = ChatRequest {
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        };
        let url = self.chat_url(&config.deployment);
        let body = self.post_json(&url, &self.config.api_key, &request).await?;
        parse_chat_response(&body, &config.deployment)
    }
}

/// Map a non-success response into a typed error
fn service_error(status: StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| match e.error.code {
            Some(code) => format!("{}: {}", code, e.error.message),
            None => e.error.message,
        })
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Authentication(format!("Azure OpenAI rejected the key ({}): {}", status, detail))
        }
        _ => Error::LLMProvider(format!(
            "Azure OpenAI request failed with status {}: {}",
            status, detail
        )),
    }
}

fn parse_chat_response(body: &str, deployment: &str) -> Result<GenerationResult> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::LLMProvider("Chat completion returned no choices".to_string()))?;

    let text = choice.message.content.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(Error::LLMProvider(format!(
            "Empty response from Azure OpenAI. Finish reason: {}",
            choice.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(GenerationResult {
        text,
        deployment: deployment.to_string(),
        tokens_used: response.usage.map(|u| u.total_tokens),
        finish_reason: choice.finish_reason,
    })
}

fn parse_embedding_response(body: &str) -> Result<Vec<f32>> {
    let response: EmbeddingResponse = serde_json::from_str(body)?;
    response
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| Error::LLMProvider("Embedding response contained no data".to_string()))
}

#[async_trait]
impl LLMProvider for AzureOpenAIClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        match timeout(config.timeout, self.perform_chat(messages, config)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout("Chat completion timed out".to_string())),
        }
    }

    fn deployment(&self) -> &str {
        &self.config.chat_deployment
    }
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAIClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.embeddings_url();
        let request = EmbeddingRequest { input: text };
        let body = self
            .post_json(&url, self.config.embedding_key(), &request)
            .await?;
        parse_embedding_response(&body)
    }

    fn dimensions(&self) -> usize {
        self.config.embed_dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AzureOpenAIClient {
        let config = OpenAIConfig::new(
            "https://example.openai.azure.com/".to_string(),
            "test_key".to_string(),
        );
        AzureOpenAIClient::new(config).unwrap()
    }

    #[test]
    fn test_chat_url() {
        assert_eq!(
            client().chat_url("gpt-4o-mini"),
            "https://example.openai.azure.com/openai/deployments/gpt-4o-mini/chat/completions?api-version=2024-12-01-preview"
        );
    }

    #[test]
    fn test_embeddings_url_prefers_embedding_endpoint() {
        let mut config = OpenAIConfig::new(
            "https://chat.openai.azure.com".to_string(),
            "k".to_string(),
        );
        config.embed_endpoint = Some("https://embed.openai.azure.com".to_string());
        let client = AzureOpenAIClient::new(config).unwrap();
        assert_eq!(
            client.embeddings_url(),
            "https://embed.openai.azure.com/openai/deployments/text-embedding-3-small/embeddings?api-version=2024-06-01"
        );
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Yes."}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        }"#;
        let result = parse_chat_response(body, "gpt-4o-mini").unwrap();
        assert_eq!(result.text, "Yes.");
        assert_eq!(result.tokens_used, Some(12));
        assert_eq!(result.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_parse_chat_response_filtered_content() {
        let body = r#"{"choices": [{"message": {"content": null}, "finish_reason": "content_filter"}]}"#;
        let err = parse_chat_response(body, "gpt-4o-mini").unwrap_err();
        assert!(err.to_string().contains("content_filter"));
    }

    #[test]
    fn test_parse_embedding_response() {
        let body = r#"{"data": [{"index": 0, "embedding": [0.5, -0.25]}]}"#;
        assert_eq!(parse_embedding_response(body).unwrap(), vec![0.5, -0.25]);
        assert!(parse_embedding_response(r#"{"data": []}"#).is_err());
    }

    #[test]
    fn test_service_error_mapping() {
        let body = r#"{"error": {"code": "DeploymentNotFound", "message": "The API deployment for this resource does not exist."}}"#;
        let err = service_error(StatusCode::NOT_FOUND, body);
        assert!(matches!(err, Error::LLMProvider(_)));
        assert!(err.to_string().contains("DeploymentNotFound"));

        let err = service_error(StatusCode::UNAUTHORIZED, "denied");
        assert!(matches!(err, Error::Authentication(_)));
    }
}
