//! Search index trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A document stored in the search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    pub content: String,
    pub path: String,
    pub title: String,
    pub length: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// A ranked hit returned by the search service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "@search.score", default)]
    pub score: f64,
}

/// Vector part of a hybrid query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorQuery {
    pub vector: Vec<f32>,
    pub fields: String,
    pub k: usize,
}

/// A search request: full text, optionally combined with a vector query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub search_text: String,
    pub top: usize,
    pub select: Vec<String>,
    pub vector: Option<VectorQuery>,
}

impl SearchRequest {
    /// Text-only request selecting the standard document fields
    pub fn text(query: &str, top: usize) -> Self {
        Self {
            search_text: query.to_string(),
            top,
            select: ["id", "title", "content", "path", "length"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            vector: None,
        }
    }

    /// Add a vector query over the given field
    pub fn with_vector(mut self, vector: Vec<f32>, field: &str) -> Self {
        self.vector = Some(VectorQuery {
            vector,
            fields: field.to_string(),
            k: self.top,
        });
        self
    }
}

/// A field in an index schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub facetable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(rename = "vectorSearchProfile", skip_serializing_if = "Option::is_none")]
    pub vector_search_profile: Option<String>,
}

/// Index schema definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub fields: Vec<IndexField>,
    /// HNSW algorithm and profile names, when the index carries a vector field
    pub vector_profile: Option<(String, String)>,
}

/// Per-document outcome of an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingStatus {
    pub key: String,
    pub succeeded: bool,
    pub error_message: Option<String>,
}

/// Trait for managed search indexes (e.g. Azure AI Search)
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Check whether an index exists
    async fn index_exists(&self, name: &str) -> Result<bool>;

    /// Create an index from its definition
    async fn create_index(&self, definition: &IndexDefinition) -> Result<()>;

    /// Upload (merge-or-replace) a batch of documents
    async fn upload(&self, index: &str, documents: &[SearchDocument]) -> Result<Vec<IndexingStatus>>;

    /// Run a search request
    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<SearchHit>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_request_selects_document_fields() {
        let request = SearchRequest::text("disability", 3);
        assert_eq!(request.select, vec!["id", "title", "content", "path", "length"]);
        assert!(request.vector.is_none());
    }

    #[test]
    fn test_with_vector_uses_top_as_k() {
        let request = SearchRequest::text("q", 4).with_vector(vec![0.1, 0.2], "embedding");
        let vector = request.vector.unwrap();
        assert_eq!(vector.k, 4);
        assert_eq!(vector.fields, "embedding");
    }

    #[test]
    fn test_hit_deserializes_score() {
        let hit: SearchHit = serde_json::from_str(
            r#"{"@search.score": 1.5, "id": "a", "title": "t", "content": "c", "path": "/p"}"#,
        )
        .unwrap();
        assert_eq!(hit.score, 1.5);
        assert_eq!(hit.title, "t");
    }

    #[test]
    fn test_document_skips_missing_embedding() {
        let doc = SearchDocument {
            id: "1".to_string(),
            content: "text".to_string(),
            path: "/data/a.txt".to_string(),
            title: "a.txt".to_string(),
            length: 4,
            embedding: None,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("embedding").is_none());
    }
}
