//! Terminal interface for Foundry RAG

mod form_filler;
mod pipeline;
mod report;
pub mod ui;

#[cfg(test)]
mod tests;

pub use form_filler::{FormFill, FormFiller, FORM_FILL_SYSTEM_PROMPT};
pub use pipeline::{PipelineConfig, RagAnswer, RagPipeline, TranslationOutcome};
pub use report::{print_answer, print_form_summary, print_news_report};
pub use ui::display_banner;

// Re-export core types
pub use frag_core::{Error, Result};
