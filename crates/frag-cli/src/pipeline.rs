//! Retrieval, answer generation and translation of the answer

use std::sync::Arc;
use tracing::{info, warn};

use frag_core::{
    ChatMessage, Error, GenerationConfig, GenerationResult, LLMProvider, RAGEngine, RAGQuery,
    Result, SearchHit, TranslationResult, Translator,
};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub top_k: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Target languages for the answer; empty disables translation
    pub languages: Vec<String>,
    pub system_prompt: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            temperature: 0.7,
            max_tokens: 500,
            languages: vec!["fr".to_string(), "es".to_string()],
            system_prompt: "You are a helpful assistant that provides accurate information about Medicaid."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutcome {
    Skipped,
    Translated(TranslationResult),
    Failed {
        code: Option<String>,
        message: String,
    },
}

impl TranslationOutcome {
    fn from_error(error: Error) -> Self {
        match error {
            Error::Translation { code, message } => Self::Failed {
                code: Some(code),
                message,
            },
            other => Self::Failed {
                code: None,
                message: other.to_string(),
            },
        }
    }
}

/// Everything one question produced
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub query: String,
    pub documents: Vec<SearchHit>,
    pub hybrid: bool,
    pub answer: Option<GenerationResult>,
    /// Generation failure, reported without failing the query
    pub answer_error: Option<String>,
    pub translation: TranslationOutcome,
}

impl RagAnswer {
    pub fn answer_text(&self) -> Option<&str> {
        self.answer.as_ref().map(|a| a.text.as_str())
    }
}

/// Question answering over the indexed documents
pub struct RagPipeline<L: LLMProvider, R: RAGEngine> {
    llm: L,
    rag: R,
    translator: Option<Arc<dyn Translator>>,
    config: PipelineConfig,
}

impl<L: LLMProvider, R: RAGEngine> RagPipeline<L, R> {
    pub fn new(llm: L, rag: R, config: PipelineConfig) -> Self {
        Self {
            llm,
            rag,
            translator: None,
            config,
        }
    }

    /// Translate answers with the given translator
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Retrieve, answer, and translate the answer
    pub async fn answer(&self, query: &str) -> Result<RagAnswer> {
        let retrieved = self
            .rag
            .retrieve(&RAGQuery::new(query, self.config.top_k))
            .await?;

        let mut result = RagAnswer {
            query: query.to_string(),
            documents: retrieved.documents,
            hybrid: retrieved.hybrid,
            answer: None,
            answer_error: None,
            translation: TranslationOutcome::Skipped,
        };
        if result.documents.is_empty() {
            info!(query, "No relevant documents found");
            return Ok(result);
        }

        let prompt = self.rag.build_prompt(query, &result.documents);
        let messages = [
            ChatMessage::system(self.config.system_prompt.as_str()),
            ChatMessage::user(prompt),
        ];
        let generation = GenerationConfig {
            deployment: self.llm.deployment().to_string(),
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            ..Default::default()
        };

        match self.llm.chat(&messages, &generation).await {
            Ok(answer) => result.answer = Some(answer),
            Err(e) => {
                warn!(error = %e, "Error generating response");
                result.answer_error = Some(e.to_string());
            }
        }

        if let Some(answer) = result.answer_text().map(str::to_string) {
            result.translation = self.translate(&answer).await;
        }
        Ok(result)
    }

    async fn translate(&self, text: &str) -> TranslationOutcome {
        let Some(translator) = &self.translator else {
            return TranslationOutcome::Skipped;
        };
        if self.config.languages.is_empty() {
            return TranslationOutcome::Skipped;
        }

        match translator
            .translate(&[text.to_string()], &self.config.languages)
            .await
        {
            Ok(results) => results
                .into_iter()
                .next()
                .map(TranslationOutcome::Translated)
                .unwrap_or(TranslationOutcome::Skipped),
            Err(e) => {
                warn!(error = %e, "Translation failed");
                TranslationOutcome::from_error(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use async_trait::async_trait;
    use std::sync::Mutex;

    use frag_core::{
        ChatMessage, DetectedLanguage, Error, GenerationConfig, GenerationResult, LLMProvider,
        RAGEngine, RAGQuery, RAGResult, Result, SearchHit, Translation, TranslationResult,
        Translator,
    };

    /// Replies with a fixed text and records each call
    pub struct FakeLlm {
        pub reply: std::result::Result<String, String>,
        pub calls: Mutex<Vec<(Vec<ChatMessage>, GenerationConfig)>>,
    }

    impl FakeLlm {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: Mutex::new(vec![]),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                calls: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for FakeLlm {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            config: &GenerationConfig,
        ) -> Result<GenerationResult> {
            self.calls
                .lock()
                .unwrap()
                .push((messages.to_vec(), config.clone()));
            match &self.reply {
                Ok(text) => Ok(GenerationResult {
                    text: text.clone(),
                    deployment: config.deployment.clone(),
                    tokens_used: Some(42),
                    finish_reason: Some("stop".to_string()),
                }),
                Err(message) => Err(Error::LLMProvider(message.clone())),
            }
        }

        fn deployment(&self) -> &str {
            "gpt-4o-mini"
        }
    }

    pub struct FakeRag {
        pub documents: Vec<SearchHit>,
    }

    #[async_trait]
    impl RAGEngine for FakeRag {
        async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult> {
            let documents: Vec<_> = self.documents.iter().take(query.top_k).cloned().collect();
            Ok(RAGResult {
                context: self.build_context(&documents),
                documents,
                hybrid: true,
            })
        }

        fn build_context(&self, documents: &[SearchHit]) -> String {
            documents
                .iter()
                .map(|d| d.title.clone())
                .collect::<Vec<_>>()
                .join(",")
        }

        fn build_prompt(&self, question: &str, documents: &[SearchHit]) -> String {
            format!("{} | {}", self.build_context(documents), question)
        }
    }

    pub struct FakeTranslator {
        pub fail: Option<Error>,
    }

    #[async_trait]
    impl Translator for FakeTranslator {
        async fn translate(&self, texts: &[String], to: &[String]) -> Result<Vec<TranslationResult>> {
            if let Some(Error::Translation { code, message }) = &self.fail {
                return Err(Error::Translation {
                    code: code.clone(),
                    message: message.clone(),
                });
            }
            Ok(texts
                .iter()
                .map(|text| TranslationResult {
                    detected_language: Some(DetectedLanguage {
                        language: "en".to_string(),
                        score: 1.0,
                    }),
                    translations: to
                        .iter()
                        .map(|lang| Translation {
                            text: format!("[{}] {}", lang, text),
                            to: lang.clone(),
                        })
                        .collect(),
                })
                .collect())
        }
    }

    pub fn hit(title: &str) -> SearchHit {
        SearchHit {
            id: title.to_string(),
            content: format!("content of {}", title),
            title: title.to_string(),
            path: format!("/data/{}", title),
            score: 2.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use frag_core::ChatRole;

    fn pipeline(llm: FakeLlm, documents: Vec<SearchHit>) -> RagPipeline<FakeLlm, FakeRag> {
        RagPipeline::new(llm, FakeRag { documents }, PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_answer_uses_generation_settings() {
        let p = pipeline(FakeLlm::replying("You may qualify."), vec![hit("a.txt"), hit("b.txt")]);
        let result = p.answer("Who qualifies?").await.unwrap();

        assert_eq!(result.answer_text(), Some("You may qualify."));
        assert_eq!(result.documents.len(), 2);

        let calls = p.llm.calls.lock().unwrap();
        let (messages, config) = &calls[0];
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.ends_with("information about Medicaid."));
        assert_eq!(messages[1].content, "a.txt,b.txt | Who qualifies?");
        assert_eq!(config.max_tokens, Some(500));
        assert_eq!(config.temperature, Some(0.7));
        assert_eq!(config.deployment, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_no_documents_skips_generation() {
        let p = pipeline(FakeLlm::replying("unused"), vec![])
            .with_translator(Arc::new(FakeTranslator { fail: None }));
        let result = p.answer("anything").await.unwrap();

        assert!(result.answer.is_none());
        assert_eq!(result.translation, TranslationOutcome::Skipped);
        assert!(p.llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retrieves_top_k() {
        let docs = vec![hit("1"), hit("2"), hit("3"), hit("4")];
        let result = pipeline(FakeLlm::replying("ok"), docs)
            .answer("q")
            .await
            .unwrap();
        assert_eq!(result.documents.len(), 3);
    }

    #[tokio::test]
    async fn test_answer_is_translated() {
        let p = pipeline(FakeLlm::replying("Hello"), vec![hit("a.txt")])
            .with_translator(Arc::new(FakeTranslator { fail: None }));
        let result = p.answer("q").await.unwrap();

        let TranslationOutcome::Translated(translation) = result.translation else {
            panic!("expected a translation");
        };
        assert_eq!(translation.translations.len(), 2);
        assert_eq!(translation.translations[1].text, "[es] Hello");
    }

    #[tokio::test]
    async fn test_translation_error_does_not_fail_query() {
        let translator = FakeTranslator {
            fail: Some(Error::Translation {
                code: "401000".to_string(),
                message: "The request is not authorized".to_string(),
            }),
        };
        let p = pipeline(FakeLlm::replying("Hello"), vec![hit("a.txt")])
            .with_translator(Arc::new(translator));
        let result = p.answer("q").await.unwrap();

        assert_eq!(result.answer_text(), Some("Hello"));
        assert_eq!(
            result.translation,
            TranslationOutcome::Failed {
                code: Some("401000".to_string()),
                message: "The request is not authorized".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_generation_error_is_reported() {
        let p = pipeline(FakeLlm::failing("deployment not found"), vec![hit("a.txt")])
            .with_translator(Arc::new(FakeTranslator { fail: None }));
        let result = p.answer("q").await.unwrap();

        assert!(result.answer.is_none());
        assert!(result.answer_error.unwrap().contains("deployment not found"));
        assert_eq!(result.translation, TranslationOutcome::Skipped);
    }
}
