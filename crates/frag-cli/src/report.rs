//! Console rendering of command results

use frag_scraper::news::preview;
use frag_scraper::{FormScrapeResult, ScrapedArticle};

use crate::pipeline::{RagAnswer, TranslationOutcome};
use crate::ui;

pub fn print_answer(result: &RagAnswer) {
    ui::step("🔍", &format!("Searching for: '{}'", result.query));
    ui::rule();

    if result.documents.is_empty() {
        ui::error("No relevant documents found.");
        return;
    }

    let mode = if result.hybrid { "hybrid" } else { "text-only" };
    ui::success(&format!(
        "Found {} relevant documents ({} search):",
        result.documents.len(),
        mode
    ));
    for (i, doc) in result.documents.iter().enumerate() {
        println!("   {}. {} (score: {:.4})", i + 1, doc.title, doc.score);
    }

    if let Some(error) = &result.answer_error {
        ui::error(&format!("Error generating response: {}", error));
        return;
    }
    let Some(answer) = &result.answer else {
        return;
    };

    ui::header("💬 Answer:");
    println!("{}", answer.text);

    ui::header("📚 Sources:");
    for doc in &result.documents {
        ui::list_item(&format!("{} ({})", doc.title, doc.path));
    }

    match &result.translation {
        TranslationOutcome::Skipped => {}
        TranslationOutcome::Translated(translation) => {
            ui::header("🌐 Translated response:");
            if let Some(detected) = &translation.detected_language {
                println!(
                    "Detected language of the input text: {} with score: {}.",
                    detected.language, detected.score
                );
            }
            for t in &translation.translations {
                println!("Text was translated to: '{}' and the result is: '{}'.", t.to, t.text);
            }
        }
        TranslationOutcome::Failed { code, message } => {
            ui::warn("Translation failed");
            if let Some(code) = code {
                ui::kv("Error Code:", code);
            }
            ui::kv("Message:", message);
        }
    }
}

pub fn print_news_report(query: &str, articles: &[ScrapedArticle]) {
    ui::header(&format!("{} SCRAPING RESULTS", query.to_uppercase()));
    ui::rule();

    for (i, article) in articles.iter().enumerate() {
        ui::header(&format!("ARTICLE {}:", i + 1));
        ui::kv("Title:", &article.content.title);
        ui::kv("Source:", &article.link.source);
        ui::kv("URL:", article.display_url());
        ui::kv("Words:", article.content.word_count);
        if let Some(error) = &article.content.error {
            ui::warn(&format!("Could not scrape article: {}", error));
        } else if article.content.content.is_empty() {
            println!("No content available");
        } else {
            println!("{}", preview(&article.content.content));
        }
        ui::rule();
    }
}

pub fn print_form_summary(result: &FormScrapeResult) {
    let summary = result.summary();
    ui::header("CONTACT FORM ANALYSIS SUMMARY");
    ui::rule();
    ui::kv("URL:", &result.url);
    ui::kv("Total Fields Found:", summary.total);

    ui::header("Field Types:");
    for (field_type, count) in &summary.by_type {
        ui::list_item(&format!("{}: {}", field_type, count));
    }

    if !summary.required.is_empty() {
        ui::header(&format!("Required Fields ({}):", summary.required.len()));
        for field in &summary.required {
            ui::list_item(&format!("{}: {}", field.name, field.label));
        }
    }
}
