//! Core traits and types for Foundry RAG
//!
//! This crate defines the fundamental traits and types shared by the deployment
//! orchestration and the client tools. Every managed service sits behind a trait here
//! (model inference, search index, translation, provider CLI), keeping the pipelines
//! test-friendly.

pub mod llm;
pub mod search;
pub mod rag;
pub mod document;
pub mod translation;
pub mod command;
pub mod error;
pub mod types;
pub mod env;

pub use error::{Error, Result};
pub use llm::{
    ChatMessage, ChatRole, EmbeddingProvider, GenerationConfig, GenerationResult, LLMProvider,
};
pub use search::{
    IndexDefinition, IndexField, IndexingStatus, SearchDocument, SearchHit, SearchIndex,
    SearchRequest, VectorQuery,
};
pub use rag::{RAGEngine, RAGQuery, RAGResult};
pub use document::{IngestConfig, IngestReport};
pub use translation::{DetectedLanguage, Translation, TranslationResult, Translator};
pub use command::{CommandOutput, CommandRunner};
pub use types::*;
