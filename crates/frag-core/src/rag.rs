//! RAG (Retrieval-Augmented Generation) engine trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, SearchHit};

/// Query for RAG retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGQuery {
    pub query: String,
    pub top_k: usize,
}

impl RAGQuery {
    pub fn new(query: impl Into<String>, top_k: usize) -> Self {
        Self {
            query: query.into(),
            top_k,
        }
    }
}

impl Default for RAGQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            top_k: 3,
        }
    }
}

/// Result from RAG retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGResult {
    pub documents: Vec<SearchHit>,
    pub context: String,
    /// Whether the hybrid (text + vector) path produced the documents
    pub hybrid: bool,
}

/// Trait for RAG engines
///
/// Retrieval is delegated to a managed search index; the engine only shapes the
/// request and turns the hits into prompt context.
#[async_trait]
pub trait RAGEngine: Send + Sync {
    /// Retrieve relevant documents for a query
    async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult>;

    /// Build context from retrieved documents
    fn build_context(&self, documents: &[SearchHit]) -> String;

    /// Build the full answer prompt for a question and its documents
    fn build_prompt(&self, question: &str, documents: &[SearchHit]) -> String;
}
