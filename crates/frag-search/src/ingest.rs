//! Document ingestion: text files → search documents → batched uploads

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tracing::{info, warn};

use frag_core::{
    EmbeddingProvider, Error, IngestConfig, IngestReport, Result, SearchDocument, SearchIndex,
};

use crate::schema::document_index;
use crate::text::truncate_chars;

/// Loads local text files into a managed search index
pub struct Ingestor<S: SearchIndex> {
    index: Arc<S>,
    index_name: String,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    config: IngestConfig,
}

impl<S: SearchIndex> Ingestor<S> {
    /// Create an ingestor that uploads plain text documents
    pub fn new(index: Arc<S>, index_name: impl Into<String>) -> Self {
        Self {
            index,
            index_name: index_name.into(),
            embedder: None,
            config: IngestConfig {
                with_embeddings: false,
                ..IngestConfig::default()
            },
        }
    }

    /// Attach an embedding provider; documents then carry vectors
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self.config.with_embeddings = true;
        self
    }

    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    fn embedder(&self) -> Option<&Arc<dyn EmbeddingProvider>> {
        if self.config.with_embeddings {
            self.embedder.as_ref()
        } else {
            None
        }
    }

    /// Create the index if it does not exist yet. Returns whether it was created.
    pub async fn ensure_index(&self) -> Result<bool> {
        if self.index.index_exists(&self.index_name).await? {
            info!(index = %self.index_name, "Index already exists");
            return Ok(false);
        }

        info!(index = %self.index_name, "Index does not exist. Creating it now");
        let dimensions = self.embedder().map(|e| e.dimensions());
        let definition = document_index(&self.index_name, dimensions);
        self.index.create_index(&definition).await?;
        info!(index = %self.index_name, vectors = dimensions.is_some(), "Created index");
        Ok(true)
    }

    /// All files under `dir` matching the configured pattern, sorted by path
    pub fn discover_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let pattern = dir.join(&self.config.pattern);
        let pattern = pattern.to_string_lossy();
        let mut paths = glob::glob(&pattern)
            .map_err(|e| Error::InvalidInput(format!("Bad file pattern {}: {}", pattern, e)))?
            .filter_map(|entry| match entry {
                Ok(path) if path.is_file() => Some(path),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable path");
                    None
                }
            })
            .collect::<Vec<_>>();
        paths.sort();
        Ok(paths)
    }

    /// Embed a document's content, checking the vector length
    pub async fn embed_document(&self, doc: &mut SearchDocument) -> Result<()> {
        let Some(embedder) = self.embedder() else {
            return Ok(());
        };

        let snippet = truncate_chars(&doc.content, self.config.max_embed_chars);
        let vector = embedder.embed(snippet).await.map_err(|e| {
            Error::LLMProvider(format!("Failed to create embedding for {}: {}", doc.path, e))
        })?;

        if vector.len() != embedder.dimensions() {
            return Err(Error::Configuration(format!(
                "Embedding length {} for {} does not match AZURE_OPENAI_EMBED_DIMS {}. \
                 Check your deployment and AZURE_OPENAI_EMBED_DIMS.",
                vector.len(),
                doc.path,
                embedder.dimensions()
            )));
        }

        doc.embedding = Some(vector);
        Ok(())
    }

    /// Upload one batch and fold the per-document outcomes into `report`
    async fn flush(&self, batch: &mut Vec<SearchDocument>, report: &mut IngestReport) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let statuses = self.index.upload(&self.index_name, batch).await?;
        for status in statuses {
            if status.succeeded {
                report.uploaded += 1;
            } else {
                report.failed += 1;
                report.errors.push(format!(
                    "{}: {}",
                    status.key,
                    status.error_message.unwrap_or_else(|| "unknown error".to_string())
                ));
            }
        }
        batch.clear();
        info!(total_uploaded = report.uploaded, "Uploaded batch");
        Ok(())
    }

    /// Upload already-built documents in batches
    pub async fn upload_documents(&self, documents: Vec<SearchDocument>) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut batch = Vec::with_capacity(self.config.batch_size);

        for doc in documents {
            batch.push(doc);
            if batch.len() >= self.config.batch_size {
                self.flush(&mut batch, &mut report).await?;
            }
        }
        self.flush(&mut batch, &mut report).await?;
        Ok(report)
    }

    /// Ensure the index, then load, embed and upload every file under `dir`
    pub async fn run(&self, dir: &Path) -> Result<IngestReport> {
        self.ensure_index().await?;

        let files = self.discover_files(dir)?;
        info!(count = files.len(), dir = %dir.display(), "Discovered documents");

        let mut report = IngestReport::default();
        let mut batch = Vec::with_capacity(self.config.batch_size);
        for path in files {
            let mut doc = file_to_document(&path)?;
            self.embed_document(&mut doc).await?;
            batch.push(doc);
            if batch.len() >= self.config.batch_size {
                self.flush(&mut batch, &mut report).await?;
            }
        }
        self.flush(&mut batch, &mut report).await?;
        Ok(report)
    }
}

/// Stable document id: unchanged files map to the same key across runs
pub fn document_id(path: &str, mtime_ns: u128, size: u64) -> String {
    format!("{:x}", md5::compute(format!("{}:{}:{}", path, mtime_ns, size)))
}

/// Read a text file into a search document (without embedding)
pub fn file_to_document(path: &Path) -> Result<SearchDocument> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();

    let metadata = std::fs::metadata(path)?;
    let mtime_ns = metadata
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let display_path = path.to_string_lossy();
    let absolute = std::path::absolute(path)?;
    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let length = i32::try_from(text.chars().count()).unwrap_or(i32::MAX);

    Ok(SearchDocument {
        id: document_id(&display_path, mtime_ns, metadata.len()),
        content: text,
        path: absolute.to_string_lossy().into_owned(),
        title,
        length,
        embedding: None,
    })
}
