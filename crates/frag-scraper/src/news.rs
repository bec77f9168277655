//! News search scraper

use chrono::{DateTime, Local};
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

use frag_core::{Error, Result};

use crate::fetch::{selector, text_of, PageSource};

pub const AGGREGATOR_BASE: &str = "https://news.google.com";

const TITLE_SELECTORS: [&str; 6] = [
    "h1",
    ".headline",
    ".article-title",
    ".post-title",
    ".entry-title",
    ".story-headline",
];

const CONTENT_SELECTORS: [&str; 10] = [
    "article",
    "[role=\"article\"]",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".story-body",
    ".article-body",
    "main",
    ".content",
    ".story-content",
];

/// Minimum length of a text block kept from an article
const MIN_BLOCK_CHARS: usize = 10;
/// A content container must yield more than this many characters
const MIN_CONTENT_CHARS: usize = 100;
/// Characters of content shown in previews
pub const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    pub query: String,
    pub max_results: usize,
    /// Pause between article fetches
    pub delay: Duration,
    /// Directory the report file is written to
    pub out_dir: PathBuf,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            query: "Medicaid Policy News".to_string(),
            max_results: 5,
            delay: Duration::from_secs(3),
            out_dir: PathBuf::from("."),
        }
    }
}

/// A search result on the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsLink {
    pub title: String,
    pub url: String,
    pub source: String,
}

/// Text extracted from one article page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleContent {
    pub url: String,
    pub title: String,
    pub content: String,
    pub word_count: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArticleContent {
    pub fn failed(url: &str, error: &Error) -> Self {
        Self {
            url: url.to_string(),
            title: "Error".to_string(),
            content: String::new(),
            word_count: 0,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedArticle {
    pub link: NewsLink,
    /// Publisher URL the aggregator link redirected to
    pub resolved_url: Option<String>,
    pub content: ArticleContent,
}

impl ScrapedArticle {
    /// Best URL to show for the article
    pub fn display_url(&self) -> &str {
        self.resolved_url.as_deref().unwrap_or(&self.content.url)
    }
}

/// Search URL on the aggregator for a query
pub fn search_url(query: &str) -> Result<String> {
    let url = Url::parse_with_params(
        &format!("{}/search", AGGREGATOR_BASE),
        &[("q", query), ("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")],
    )
    .map_err(|e| Error::InvalidInput(format!("Bad search query: {}", e)))?;
    Ok(url.to_string())
}

/// Absolute URL for a link found on the aggregator
pub fn resolve_link(href: &str) -> Option<String> {
    if let Some(rest) = href.strip_prefix('.') {
        if rest.starts_with('/') {
            return Some(format!("{}{}", AGGREGATOR_BASE, rest));
        }
    }
    Url::parse(AGGREGATOR_BASE)
        .ok()?
        .join(href)
        .ok()
        .map(|u| u.to_string())
}

/// Looks like a publication name: short, has a letter, not a URL
fn is_source_text(text: &str) -> bool {
    !text.is_empty()
        && text.chars().count() < 50
        && text.chars().any(|c| c.is_ascii_alphabetic())
        && !text.starts_with("http")
}

/// Parse up to `max_results` result cards from a search page
pub fn parse_search_results(html: &str, max_results: usize) -> Result<Vec<NewsLink>> {
    let document = Html::parse_document(html);
    let article_sel = selector("article")?;
    let link_sel = selector("a[href]")?;
    let heading_sel = selector("h3, h4")?;
    let div_sel = selector("div")?;

    let mut links = Vec::new();
    for (i, article) in document.select(&article_sel).take(max_results).enumerate() {
        let Some(href) = article
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            warn!(index = i, "Search result without a link, skipping");
            continue;
        };
        let Some(url) = resolve_link(href) else {
            warn!(index = i, href, "Could not resolve search result link, skipping");
            continue;
        };

        let title = article
            .select(&heading_sel)
            .next()
            .map(text_of)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Article {}", i + 1));

        let source = article
            .select(&div_sel)
            .map(text_of)
            .find(|t| is_source_text(t))
            .unwrap_or_else(|| "Unknown source".to_string());

        links.push(NewsLink { title, url, source });
    }
    Ok(links)
}

fn blocks_text(element: scraper::ElementRef<'_>, block_sel: &scraper::Selector) -> String {
    element
        .select(block_sel)
        .map(text_of)
        .filter(|t| t.chars().count() > MIN_BLOCK_CHARS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the title and body text of an article page
pub fn extract_article(url: &str, html: &str) -> Result<ArticleContent> {
    let document = Html::parse_document(html);

    let mut title = String::new();
    for css in TITLE_SELECTORS {
        if let Some(element) = document.select(&selector(css)?).next() {
            title = text_of(element);
            if !title.is_empty() {
                break;
            }
        }
    }

    let block_sel = selector("p, div")?;
    let mut content = String::new();
    for css in CONTENT_SELECTORS {
        if let Some(container) = document.select(&selector(css)?).next() {
            content = blocks_text(container, &block_sel);
            if content.chars().count() > MIN_CONTENT_CHARS {
                break;
            }
        }
    }

    if content.chars().count() <= MIN_CONTENT_CHARS {
        let paragraph_sel = selector("p")?;
        content = document
            .select(&paragraph_sel)
            .map(text_of)
            .filter(|t| t.chars().count() > MIN_BLOCK_CHARS)
            .collect::<Vec<_>>()
            .join(" ");
    }

    Ok(ArticleContent {
        url: url.to_string(),
        title: if title.is_empty() {
            "No title found".to_string()
        } else {
            title
        },
        word_count: content.split_whitespace().count(),
        success: !content.is_empty(),
        content,
        error: None,
    })
}

/// First `PREVIEW_CHARS` characters, with `...` when cut
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}

/// Report file name: `{slug}_news_{YYYYmmdd_HHMMSS}.txt`, slug from the query's first word
pub fn report_filename(query: &str, at: DateTime<Local>) -> String {
    let slug: String = query
        .split_whitespace()
        .next()
        .unwrap_or("search")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    let slug = if slug.is_empty() { "search".to_string() } else { slug };
    format!("{}_news_{}.txt", slug, at.format("%Y%m%d_%H%M%S"))
}

/// Full-text report of a scraping run
pub fn render_report(query: &str, articles: &[ScrapedArticle], at: DateTime<Local>) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();
    out.push_str(&format!("{} SCRAPING RESULTS\n", query.to_uppercase()));
    out.push_str(&format!("Scraped on: {}\n", at.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("{}\n\n", rule));

    for (i, article) in articles.iter().enumerate() {
        let content = if article.content.content.is_empty() {
            "No content available"
        } else {
            &article.content.content
        };
        out.push_str(&format!("ARTICLE {}:\n", i + 1));
        out.push_str(&format!("Title: {}\n", article.content.title));
        out.push_str(&format!("Source: {}\n", article.link.source));
        out.push_str(&format!("URL: {}\n", article.display_url()));
        out.push_str(&format!("Word Count: {}\n", article.content.word_count));
        out.push_str(&format!("Content:\n{}\n", content));
        out.push_str(&format!("\n{}\n\n", rule));
    }
    out
}

/// Write the report into `dir`, returning the file path
pub fn save_report(
    dir: &Path,
    query: &str,
    articles: &[ScrapedArticle],
    at: DateTime<Local>,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_filename(query, at));
    std::fs::write(&path, render_report(query, articles, at))?;
    Ok(path)
}

/// Searches the aggregator and scrapes each linked article
pub struct NewsScraper<P: PageSource> {
    source: P,
    config: NewsConfig,
}

impl<P: PageSource> NewsScraper<P> {
    pub fn new(source: P, config: NewsConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &NewsConfig {
        &self.config
    }

    /// Result links for the configured query
    pub async fn search(&self) -> Result<Vec<NewsLink>> {
        let url = search_url(&self.config.query)?;
        info!(query = %self.config.query, "Searching news");
        let page = self.source.fetch(&url).await?;
        let links = parse_search_results(&page.html, self.config.max_results)?;
        info!(count = links.len(), "Found articles");
        Ok(links)
    }

    /// Follow an aggregator link to the publisher URL
    pub async fn resolve(&self, url: &str) -> Option<String> {
        match self.source.fetch(url).await {
            Ok(page) if page.final_url != url => Some(page.final_url),
            Ok(_) => None,
            Err(e) => {
                warn!(url, error = %e, "Could not resolve article URL");
                None
            }
        }
    }

    /// Scrape one article; failures are recorded in the result
    pub async fn scrape_article(&self, url: &str) -> ArticleContent {
        info!(url, "Scraping article");
        let scraped = match self.source.fetch(url).await {
            Ok(page) => extract_article(url, &page.html),
            Err(e) => Err(e),
        };
        scraped.unwrap_or_else(|e| {
            warn!(url, error = %e, "Failed to scrape article");
            ArticleContent::failed(url, &e)
        })
    }

    /// Search, then resolve and scrape every result with a pause in between
    pub async fn run(&self) -> Result<Vec<ScrapedArticle>> {
        let links = self.search().await?;
        let total = links.len();
        let mut articles = Vec::with_capacity(total);

        for (i, link) in links.into_iter().enumerate() {
            info!(article = i + 1, total, title = %link.title, "Processing article");
            let resolved_url = self.resolve(&link.url).await;
            let target = resolved_url.as_deref().unwrap_or(&link.url);
            let content = self.scrape_article(target).await;
            articles.push(ScrapedArticle {
                link,
                resolved_url,
                content,
            });

            if i + 1 < total {
                sleep(self.config.delay).await;
            }
        }
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchedPage;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <article>
            <a href="./read/CBMiA">open</a>
            <div><div>https://example.com</div><div>Health News Daily</div></div>
            <h3>States revise Medicaid eligibility</h3>
          </article>
          <article>
            <div>1234</div>
            <a href="/read/CBMiB">open</a>
          </article>
          <article><h3>No link here</h3></article>
          <article><a href="https://publisher.example/story">x</a><h4>Fourth</h4></article>
        </body></html>
    "#;

    struct StaticPages {
        pages: HashMap<String, FetchedPage>,
    }

    #[async_trait]
    impl PageSource for StaticPages {
        async fn fetch(&self, url: &str) -> Result<FetchedPage> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Scraper(format!("{} returned status 404 Not Found", url)))
        }
    }

    fn page(final_url: &str, html: &str) -> FetchedPage {
        FetchedPage {
            final_url: final_url.to_string(),
            html: html.to_string(),
        }
    }

    #[test]
    fn test_search_url_encodes_query() {
        assert_eq!(
            search_url("Medicaid Policy News").unwrap(),
            "https://news.google.com/search?q=Medicaid+Policy+News&hl=en-US&gl=US&ceid=US%3Aen"
        );
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(
            resolve_link("./read/abc").as_deref(),
            Some("https://news.google.com/read/abc")
        );
        assert_eq!(
            resolve_link("/read/abc").as_deref(),
            Some("https://news.google.com/read/abc")
        );
        assert_eq!(
            resolve_link("https://publisher.example/a").as_deref(),
            Some("https://publisher.example/a")
        );
    }

    #[test]
    fn test_parse_search_results() {
        let links = parse_search_results(SEARCH_PAGE, 5).unwrap();
        assert_eq!(links.len(), 3);

        assert_eq!(links[0].title, "States revise Medicaid eligibility");
        assert_eq!(links[0].url, "https://news.google.com/read/CBMiA");
        assert_eq!(links[0].source, "Health News Daily");

        assert_eq!(links[1].title, "Article 2");
        assert_eq!(links[1].source, "Unknown source");

        assert_eq!(links[2].title, "Fourth");
    }

    #[test]
    fn test_parse_search_results_limits_cards() {
        let links = parse_search_results(SEARCH_PAGE, 2).unwrap();
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_extract_article_prefers_container() {
        let body = "Medicaid enrollment changed significantly this year across several states.";
        let html = format!(
            r#"<html><body>
                <nav><p>Subscribe to our newsletter today</p></nav>
                <h1></h1>
                <div class="headline">Big Policy Shift</div>
                <article><p>{body}</p><p>{body}</p><p>short</p></article>
            </body></html>"#
        );
        let article = extract_article("https://publisher.example/a", &html).unwrap();
        assert_eq!(article.title, "Big Policy Shift");
        assert_eq!(article.content, format!("{} {}", body, body));
        assert_eq!(article.word_count, 18);
        assert!(article.success);
    }

    #[test]
    fn test_extract_article_falls_back_to_paragraphs() {
        let html = r#"<html><body>
            <main><p>Too short to count as a body.</p></main>
            <p>First paragraph with enough words.</p>
            <p>tiny</p>
        </body></html>"#;
        let article = extract_article("u", html).unwrap();
        assert_eq!(article.title, "No title found");
        assert_eq!(
            article.content,
            "Too short to count as a body. First paragraph with enough words."
        );
    }

    #[test]
    fn test_extract_article_empty_page() {
        let article = extract_article("u", "<html><body></body></html>").unwrap();
        assert!(!article.success);
        assert_eq!(article.word_count, 0);
    }

    #[test]
    fn test_preview_cuts_at_limit() {
        let long = "a".repeat(600);
        let cut = preview(&long);
        assert_eq!(cut.len(), 503);
        assert!(cut.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_report_filename() {
        let at = Local.with_ymd_and_hms(2025, 1, 21, 9, 5, 7).unwrap();
        assert_eq!(
            report_filename("Medicaid Policy News", at),
            "medicaid_news_20250121_090507.txt"
        );
        assert_eq!(report_filename("   ", at), "search_news_20250121_090507.txt");
    }

    #[tokio::test]
    async fn test_run_resolves_and_records_failures() {
        let search = search_url("Medicaid").unwrap();
        let body = "Coverage rules for long-term care were updated by the state agency this week.";
        let mut pages = HashMap::new();
        pages.insert(
            search.clone(),
            page(
                &search,
                r#"<article><a href="./read/one"></a><h3>One</h3></article>
                   <article><a href="./read/two"></a><h3>Two</h3></article>"#,
            ),
        );
        // the first link redirects to the publisher, the second is dead
        pages.insert(
            "https://news.google.com/read/one".to_string(),
            page("https://publisher.example/one", ""),
        );
        pages.insert(
            "https://publisher.example/one".to_string(),
            page(
                "https://publisher.example/one",
                &format!("<h1>One headline</h1><article><p>{body}</p><p>{body}</p></article>"),
            ),
        );

        let config = NewsConfig {
            query: "Medicaid".to_string(),
            delay: Duration::ZERO,
            ..NewsConfig::default()
        };
        let scraper = NewsScraper::new(StaticPages { pages }, config);
        let articles = scraper.run().await.unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].display_url(), "https://publisher.example/one");
        assert_eq!(articles[0].content.title, "One headline");
        assert!(articles[0].content.success);

        assert!(articles[1].resolved_url.is_none());
        assert_eq!(articles[1].content.title, "Error");
        assert!(articles[1].content.error.as_deref().unwrap().contains("404"));
    }
}
