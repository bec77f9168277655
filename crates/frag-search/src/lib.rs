//! Azure AI Search integration for Foundry RAG
//!
//! This crate provides the search index client, the document ingestion pipeline and
//! the RAG engine that retrieves context for answers.

mod client;
mod config;
mod engine;
mod ingest;
mod schema;
mod text;

#[cfg(test)]
mod tests;

pub use client::AzureSearchClient;
pub use config::SearchServiceConfig;
pub use engine::{AzureRAGEngine, DEFAULT_SUBJECT};
pub use ingest::{document_id, file_to_document, Ingestor};
pub use schema::{document_index, HNSW_ALGORITHM, VECTOR_FIELD, VECTOR_PROFILE};
pub use text::truncate_chars;

// Re-export core types for convenience
pub use frag_core::{
    Error, IndexDefinition, IngestConfig, IngestReport, RAGEngine, RAGQuery, RAGResult, Result,
    SearchDocument, SearchHit, SearchIndex, SearchRequest,
};
