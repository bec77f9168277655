//! RAG engine backed by Azure AI Search

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use frag_core::{
    EmbeddingProvider, Error, RAGEngine, RAGQuery, RAGResult, Result, SearchHit, SearchIndex,
    SearchRequest,
};

use crate::schema::VECTOR_FIELD;
use crate::text::truncate_chars;

/// Characters of each document's content carried into the prompt context
pub const CONTEXT_CHARS: usize = 1000;

pub const DEFAULT_SUBJECT: &str = "Medicaid";

/// Retrieves documents with a hybrid query, falling back to text-only search
pub struct AzureRAGEngine<S: SearchIndex> {
    index: Arc<S>,
    index_name: String,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    subject: String,
}

impl<S: SearchIndex> AzureRAGEngine<S> {
    pub fn new(index: Arc<S>, index_name: impl Into<String>) -> Self {
        Self {
            index,
            index_name: index_name.into(),
            embedder: None,
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Subject area named in the prompts
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// System instruction for answer generation
    pub fn system_prompt(&self) -> String {
        format!(
            "You are a helpful assistant that provides accurate information about {}.",
            self.subject
        )
    }

    async fn hybrid_search(&self, query: &RAGQuery) -> Result<Vec<SearchHit>> {
        let embedder = self.embedder.as_ref().ok_or_else(|| {
            Error::Configuration("No embedding deployment configured".to_string())
        })?;
        let vector = embedder.embed(&query.query).await?;
        let request = SearchRequest::text(&query.query, query.top_k).with_vector(vector, VECTOR_FIELD);
        self.index.search(&self.index_name, &request).await
    }

    async fn text_search(&self, query: &RAGQuery) -> Result<Vec<SearchHit>> {
        let request = SearchRequest::text(&query.query, query.top_k);
        self.index.search(&self.index_name, &request).await
    }
}

#[async_trait]
impl<S: SearchIndex + 'static> RAGEngine for AzureRAGEngine<S> {
    async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult> {
        let (documents, hybrid) = match self.hybrid_search(query).await {
            Ok(hits) => (hits, true),
            Err(e) => {
                warn!(error = %e, "Vector search failed, falling back to text-only search");
                match self.text_search(query).await {
                    Ok(hits) => (hits, false),
                    Err(e) => {
                        warn!(error = %e, "Text search also failed");
                        (Vec::new(), false)
                    }
                }
            }
        };

        debug!(count = documents.len(), hybrid, "retrieved documents");
        let context = self.build_context(&documents);
        Ok(RAGResult {
            documents,
            context,
            hybrid,
        })
    }

    fn build_context(&self, documents: &[SearchHit]) -> String {
        documents
            .iter()
            .map(|doc| {
                let content = truncate_chars(&doc.content, CONTEXT_CHARS);
                if content.len() < doc.content.len() {
                    format!("Document: {}\n{}...", doc.title, content)
                } else {
                    format!("Document: {}\n{}", doc.title, content)
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn build_prompt(&self, question: &str, documents: &[SearchHit]) -> String {
        format!(
            "You are a helpful assistant that answers questions about {subject} based on the provided context.\n\
             \n\
             Context from documents:\n\
             {context}\n\
             \n\
             User Question: {question}\n\
             \n\
             Please answer the question based on the context provided above. If the answer is not in the context, say so.",
            subject = self.subject,
            context = self.build_context(documents),
            question = question,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frag_core::{IndexDefinition, IndexingStatus, SearchDocument};
    use std::sync::Mutex;

    struct RecordingIndex {
        hits: Vec<SearchHit>,
        fail_vector: bool,
        fail_text: bool,
        requests: Mutex<Vec<SearchRequest>>,
    }

    impl RecordingIndex {
        fn new(hits: Vec<SearchHit>) -> Self {
            Self {
                hits,
                fail_vector: false,
                fail_text: false,
                requests: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl SearchIndex for RecordingIndex {
        async fn index_exists(&self, _name: &str) -> Result<bool> {
            Ok(true)
        }

        async fn create_index(&self, _definition: &IndexDefinition) -> Result<()> {
            Ok(())
        }

        async fn upload(&self, _index: &str, _documents: &[SearchDocument]) -> Result<Vec<IndexingStatus>> {
            Ok(vec![])
        }

        async fn search(&self, _index: &str, request: &SearchRequest) -> Result<Vec<SearchHit>> {
            self.requests.lock().unwrap().push(request.clone());
            let failing = if request.vector.is_some() {
                self.fail_vector
            } else {
                self.fail_text
            };
            if failing {
                return Err(Error::Search("status 400 Bad Request".to_string()));
            }
            Ok(self.hits.clone())
        }
    }

    struct UnitEmbedder;

    #[async_trait]
    impl EmbeddingProvider for UnitEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0, 0.0])
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn hit(title: &str, content: &str) -> SearchHit {
        SearchHit {
            id: title.to_string(),
            content: content.to_string(),
            title: title.to_string(),
            path: format!("/data/{}", title),
            score: 1.0,
        }
    }

    #[tokio::test]
    async fn test_retrieve_hybrid_when_embedder_present() {
        let index = Arc::new(RecordingIndex::new(vec![hit("a.txt", "alpha")]));
        let engine = AzureRAGEngine::new(index.clone(), "md-medicaid").with_embedder(Arc::new(UnitEmbedder));

        let result = engine.retrieve(&RAGQuery::new("eligibility", 3)).await.unwrap();
        assert!(result.hybrid);
        assert_eq!(result.documents.len(), 1);

        let requests = index.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let vector = requests[0].vector.as_ref().unwrap();
        assert_eq!(vector.fields, "embedding");
        assert_eq!(vector.k, 3);
    }

    #[tokio::test]
    async fn test_retrieve_falls_back_without_embedder() {
        let index = Arc::new(RecordingIndex::new(vec![hit("a.txt", "alpha")]));
        let engine = AzureRAGEngine::new(index.clone(), "md-medicaid");

        let result = engine.retrieve(&RAGQuery::new("eligibility", 3)).await.unwrap();
        assert!(!result.hybrid);
        assert_eq!(result.documents.len(), 1);
        assert!(index.requests.lock().unwrap()[0].vector.is_none());
    }

    #[tokio::test]
    async fn test_retrieve_falls_back_on_vector_error() {
        let mut index = RecordingIndex::new(vec![hit("a.txt", "alpha")]);
        index.fail_vector = true;
        let index = Arc::new(index);
        let engine = AzureRAGEngine::new(index.clone(), "md-medicaid").with_embedder(Arc::new(UnitEmbedder));

        let result = engine.retrieve(&RAGQuery::new("eligibility", 3)).await.unwrap();
        assert!(!result.hybrid);
        assert_eq!(result.documents.len(), 1);
        assert_eq!(index.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retrieve_empty_when_both_searches_fail() {
        let mut index = RecordingIndex::new(vec![hit("a.txt", "alpha")]);
        index.fail_vector = true;
        index.fail_text = true;
        let engine = AzureRAGEngine::new(Arc::new(index), "md-medicaid").with_embedder(Arc::new(UnitEmbedder));

        let result = engine.retrieve(&RAGQuery::new("eligibility", 3)).await.unwrap();
        assert!(result.documents.is_empty());
        assert!(result.context.is_empty());
    }

    #[test]
    fn test_context_cuts_long_content() {
        let engine = AzureRAGEngine::new(Arc::new(RecordingIndex::new(vec![])), "idx");
        let long = "y".repeat(1500);
        let context = engine.build_context(&[hit("long.txt", &long), hit("short.txt", "brief")]);

        let expected = format!(
            "Document: long.txt\n{}...\n\nDocument: short.txt\nbrief",
            "y".repeat(1000)
        );
        assert_eq!(context, expected);
    }

    #[test]
    fn test_context_keeps_exactly_limit_without_ellipsis() {
        let engine = AzureRAGEngine::new(Arc::new(RecordingIndex::new(vec![])), "idx");
        let exact = "z".repeat(1000);
        let context = engine.build_context(&[hit("exact.txt", &exact)]);
        assert!(!context.ends_with("..."));
    }

    #[test]
    fn test_prompt_names_subject() {
        let engine = AzureRAGEngine::new(Arc::new(RecordingIndex::new(vec![])), "idx").with_subject("SNAP");
        let prompt = engine.build_prompt("Who qualifies?", &[hit("a.txt", "alpha")]);
        assert!(prompt.starts_with("You are a helpful assistant that answers questions about SNAP"));
        assert!(prompt.contains("Document: a.txt\nalpha"));
        assert!(prompt.contains("User Question: Who qualifies?"));
        assert_eq!(
            engine.system_prompt(),
            "You are a helpful assistant that provides accurate information about SNAP."
        );
    }
}
