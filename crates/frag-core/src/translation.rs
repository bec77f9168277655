//! Translation trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Language detected for the source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLanguage {
    pub language: String,
    pub score: f32,
}

/// A single translated rendition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub text: String,
    pub to: String,
}

/// Translations of one input text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    #[serde(default)]
    pub detected_language: Option<DetectedLanguage>,
    pub translations: Vec<Translation>,
}

/// Trait for text translation services
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate each input text into every target language
    async fn translate(&self, texts: &[String], to: &[String]) -> Result<Vec<TranslationResult>>;
}
