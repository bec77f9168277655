//! Azure AI Search REST client

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use frag_core::{
    Error, IndexDefinition, IndexingStatus, Result, SearchDocument, SearchHit, SearchIndex,
    SearchRequest,
};

use crate::config::SearchServiceConfig;

/// Azure AI Search client authenticated with an admin key
pub struct AzureSearchClient {
    config: SearchServiceConfig,
    client: Client,
}

#[derive(Deserialize)]
struct UploadResponse {
    value: Vec<UploadItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadItem {
    key: String,
    status: bool,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    value: Vec<SearchHit>,
}

impl AzureSearchClient {
    /// Create a new client from configuration
    pub fn new(config: SearchServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(SearchServiceConfig::from_env()?)
    }

    pub fn config(&self) -> &SearchServiceConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            path,
            self.config.api_version
        )
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<(StatusCode, String)> {
        let url = self.url(path);
        debug!(%method, url = %url, "azure search request");

        let mut request = self
            .client
            .request(method, &url)
            .header("api-key", &self.config.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok((status, text))
    }

    async fn send_ok(&self, method: Method, path: &str, body: Option<&Value>) -> Result<String> {
        let (status, text) = self.send(method, path, body).await?;
        if !status.is_success() {
            return Err(Error::Search(format!(
                "Azure AI Search request to {} failed with status {}: {}",
                path, status, text
            )));
        }
        Ok(text)
    }
}

/// REST body for an index definition
pub(crate) fn index_body(definition: &IndexDefinition) -> Value {
    let mut body = json!({
        "name": definition.name,
        "fields": definition.fields,
    });
    if let Some((algorithm, profile)) = &definition.vector_profile {
        body["vectorSearch"] = json!({
            "algorithms": [{ "name": algorithm, "kind": "hnsw" }],
            "profiles": [{ "name": profile, "algorithm": algorithm }],
        });
    }
    body
}

/// REST body for a batch upload
pub(crate) fn upload_body(documents: &[SearchDocument]) -> Result<Value> {
    let actions = documents
        .iter()
        .map(|doc| {
            let mut value = serde_json::to_value(doc)?;
            value["@search.action"] = json!("upload");
            Ok(value)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(json!({ "value": actions }))
}

/// REST body for a search request
pub(crate) fn search_body(request: &SearchRequest) -> Value {
    let mut body = json!({
        "search": request.search_text,
        "top": request.top,
        "select": request.select.join(","),
    });
    if let Some(vector) = &request.vector {
        body["vectorQueries"] = json!([{
            "kind": "vector",
            "vector": vector.vector,
            "fields": vector.fields,
            "k": vector.k,
        }]);
    }
    body
}

pub(crate) fn parse_upload_response(body: &str) -> Result<Vec<IndexingStatus>> {
    let response: UploadResponse = serde_json::from_str(body)?;
    Ok(response
        .value
        .into_iter()
        .map(|item| IndexingStatus {
            key: item.key,
            succeeded: item.status,
            error_message: item.error_message,
        })
        .collect())
}

#[async_trait]
impl SearchIndex for AzureSearchClient {
    async fn index_exists(&self, name: &str) -> Result<bool> {
        let (status, text) = self
            .send(Method::GET, &format!("indexes/{}", name), None)
            .await?;
        match status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(Error::Search(format!(
                "Failed to look up index '{}' (status {}): {}",
                name, s, text
            ))),
        }
    }

    async fn create_index(&self, definition: &IndexDefinition) -> Result<()> {
        let body = index_body(definition);
        self.send_ok(Method::PUT, &format!("indexes/{}", definition.name), Some(&body))
            .await?;
        Ok(())
    }

    async fn upload(&self, index: &str, documents: &[SearchDocument]) -> Result<Vec<IndexingStatus>> {
        let body = upload_body(documents)?;
        let text = self
            .send_ok(Method::POST, &format!("indexes/{}/docs/index", index), Some(&body))
            .await?;
        parse_upload_response(&text)
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        let body = search_body(request);
        let text = self
            .send_ok(Method::POST, &format!("indexes/{}/docs/search", index), Some(&body))
            .await?;
        let response: SearchResponse = serde_json::from_str(&text)?;
        Ok(response.value)
    }
}
