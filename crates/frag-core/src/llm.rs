//! LLM provider traits and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Result;

/// Role of a chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Configuration for a chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Deployment name the request is routed to
    pub deployment: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            deployment: "gpt-4o-mini".to_string(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Result of a chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub deployment: String,
    pub tokens_used: Option<u32>,
    pub finish_reason: Option<String>,
}

/// Trait for chat-completion providers (e.g. Azure OpenAI deployments)
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a reply to a user prompt under a system instruction
    async fn generate(&self, system: &str, prompt: &str) -> Result<GenerationResult> {
        let config = GenerationConfig {
            deployment: self.deployment().to_string(),
            ..Default::default()
        };
        let messages = [ChatMessage::system(system), ChatMessage::user(prompt)];
        self.chat(&messages, &config).await
    }

    /// Run a chat completion over the given messages
    async fn chat(&self, messages: &[ChatMessage], config: &GenerationConfig)
    -> Result<GenerationResult>;

    /// Name of the chat deployment in use
    fn deployment(&self) -> &str;
}

/// Trait for embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single input text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Expected vector length
    fn dimensions(&self) -> usize;
}
