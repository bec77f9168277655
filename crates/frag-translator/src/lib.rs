//! Azure AI Translator integration for Foundry RAG
//!
//! Implements the `Translator` trait against the Translator v3 REST API.

mod client;
mod config;

#[cfg(test)]
mod tests;

pub use client::AzureTranslatorClient;
pub use config::TranslatorConfig;

// Re-export core types for convenience
pub use frag_core::{DetectedLanguage, Error, Result, Translation, TranslationResult, Translator};
