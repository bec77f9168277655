//! Sample form filling with the chat model

use serde_json::Value;
use std::path::Path;
use tracing::info;

use frag_core::{Error, LLMProvider, Result};

pub const FORM_FILL_SYSTEM_PROMPT: &str = "\
You are a helpful assistant that can parse form fields and return array of field names.
You are going to be given a list of fields from a web scraper that parsed a contact us form.
Figure out which list of fields are likely to be real fillable elements. Some like cnd_language and description are not real fillable elements.
Extract the field names.

Next, pretend you are actually filling out the form.
You are a customer reaching out to support on behalf of the NY State Department of Transportation.
For each field in the form, create a sample value and return the filled out form in a JSON format.

Your response should only contain the final JSON. Don't write anything else.";

/// Model response to a form-fill request
#[derive(Debug, Clone, PartialEq)]
pub struct FormFill {
    pub raw: String,
    /// Parsed response, when the model returned JSON
    pub json: Option<Value>,
}

impl FormFill {
    pub fn from_response(raw: String) -> Self {
        let json = serde_json::from_str(strip_fences(&raw)).ok();
        Self { raw, json }
    }

    /// Pretty-printed JSON, or the raw text
    pub fn pretty(&self) -> String {
        self.json
            .as_ref()
            .and_then(|v| serde_json::to_string_pretty(v).ok())
            .unwrap_or_else(|| self.raw.clone())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.pretty())?;
        Ok(())
    }
}

/// Drop a surrounding ``` or ```json fence
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
    {
        Some(inner) => inner.trim(),
        None => trimmed,
    }
}

pub struct FormFiller<L: LLMProvider> {
    llm: L,
}

impl<L: LLMProvider> FormFiller<L> {
    pub fn new(llm: L) -> Self {
        Self { llm }
    }

    pub fn user_prompt(names: &[String]) -> String {
        format!("Here are the form fields I found: {}", names.join(", "))
    }

    /// Ask the model to pick the fillable fields and produce sample values
    pub async fn fill(&self, names: &[String]) -> Result<FormFill> {
        if names.is_empty() {
            return Err(Error::InvalidInput(
                "No named form fields to fill".to_string(),
            ));
        }
        info!(count = names.len(), "Requesting sample form values");
        let result = self
            .llm
            .generate(FORM_FILL_SYSTEM_PROMPT, &Self::user_prompt(names))
            .await?;
        Ok(FormFill::from_response(result.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fakes::FakeLlm;

    fn names() -> Vec<String> {
        vec!["FirstName".to_string(), "Email".to_string()]
    }

    #[tokio::test]
    async fn test_fill_sends_field_list() {
        let filler = FormFiller::new(FakeLlm::replying(r#"{"FirstName": "Dana"}"#));
        let fill = filler.fill(&names()).await.unwrap();

        assert_eq!(fill.json.unwrap()["FirstName"], "Dana");
        let calls = filler.llm.calls.lock().unwrap();
        let (messages, _) = &calls[0];
        assert_eq!(messages[0].content, FORM_FILL_SYSTEM_PROMPT);
        assert_eq!(
            messages[1].content,
            "Here are the form fields I found: FirstName, Email"
        );
    }

    #[tokio::test]
    async fn test_fill_requires_names() {
        let filler = FormFiller::new(FakeLlm::replying("{}"));
        assert!(matches!(
            filler.fill(&[]).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_fenced_json_is_parsed() {
        let fill = FormFill::from_response("```json\n{\"Email\": \"a@b.org\"}\n```".to_string());
        assert_eq!(fill.pretty(), "{\n  \"Email\": \"a@b.org\"\n}");
    }

    #[test]
    fn test_plain_text_is_kept() {
        let fill = FormFill::from_response("I cannot fill this form.".to_string());
        assert!(fill.json.is_none());
        assert_eq!(fill.pretty(), "I cannot fill this form.");
    }

    #[test]
    fn test_save_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filled.json");
        FormFill::from_response(r#"{"a":1}"#.to_string()).save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{\n  \"a\": 1\n}");
    }
}
