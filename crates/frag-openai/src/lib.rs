//! Azure OpenAI integration for Foundry RAG
//!
//! This crate provides the Azure OpenAI implementation of the `LLMProvider` and
//! `EmbeddingProvider` traits.

mod client;
mod config;


pub use client::AzureOpenAIClient;
pub use config::OpenAIConfig;

// Re-export core types for convenience
pub use frag_core::{
    ChatMessage, EmbeddingProvider, Error, GenerationConfig, GenerationResult, LLMProvider,
    Result,
};
