//! Web scrapers for Foundry RAG
//!
//! Static-HTML scrapers: a news search scraper that follows aggregator links to
//! the full articles, and a contact-form scraper that inventories form fields.

pub mod fetch;
pub mod form;
pub mod news;


pub use fetch::{FetchedPage, HttpFetcher, PageSource};
pub use form::{FormField, FormScrapeResult, FormScraper, FormSummary};
pub use news::{ArticleContent, NewsConfig, NewsLink, NewsScraper, ScrapedArticle};

// Re-export core types for convenience
pub use frag_core::{Error, Result};
