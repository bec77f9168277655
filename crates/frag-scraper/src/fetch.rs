//! Page fetching

use async_trait::async_trait;
use reqwest::Client;
use scraper::ElementRef;
use std::time::Duration;
use tracing::debug;

use frag_core::{Error, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A fetched document and the URL it was finally served from
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub final_url: String,
    pub html: String,
}

/// Source of HTML pages
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Fetches pages over HTTP, following redirects
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        debug!(url, "fetching page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Scraper(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(Error::Scraper(format!("{} returned status {}", url, status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::Scraper(format!("Failed to read {}: {}", url, e)))?;
        Ok(FetchedPage { final_url, html })
    }
}

/// Visible text of an element with whitespace collapsed
pub fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a CSS selector
pub fn selector(css: &str) -> Result<scraper::Selector> {
    scraper::Selector::parse(css)
        .map_err(|e| Error::Scraper(format!("Invalid selector {}: {}", css, e)))
}
