//! Contact-form field scraper

use chrono::Local;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::info;

use frag_core::{Error, Result};

use crate::fetch::{selector, text_of, PageSource};

pub const DEFAULT_URL: &str = "https://www.conduent.com/contact-us/";
pub const DEFAULT_OUTPUT: &str = "output/contact_form_fields.json";

const FIELD_SELECTOR: &str = "input, textarea, select, button";
/// Nearby text longer than this is not treated as a label
const MAX_LABEL_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
    pub selected: bool,
}

/// Form a field was found in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormContext {
    pub form_index: usize,
    pub form_action: String,
    pub form_method: String,
    pub form_id: String,
    pub form_class: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormField {
    pub tag_name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub name: String,
    pub id: String,
    pub placeholder: String,
    pub value: String,
    pub required: bool,
    pub disabled: bool,
    pub readonly: bool,
    pub class: String,
    pub aria_label: String,
    pub label: String,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cols: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxlength: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minlength: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(flatten)]
    pub form: Option<FormContext>,
}

impl FormField {
    /// Name, falling back to id
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.id.is_empty() {
            &self.id
        } else {
            "unnamed"
        }
    }
}

/// Scraped fields as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormScrapeResult {
    pub url: String,
    pub timestamp: String,
    pub total_fields: usize,
    pub fields: Vec<FormField>,
}

impl FormScrapeResult {
    pub fn new(url: &str, fields: Vec<FormField>) -> Self {
        Self {
            url: url.to_string(),
            timestamp: Local::now().format("%Y-%m-%d").to_string(),
            total_fields: fields.len(),
            fields,
        }
    }

    pub fn summary(&self) -> FormSummary {
        FormSummary::of(&self.fields)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequiredField {
    pub name: String,
    pub label: String,
}

/// Field counts by type and the required fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSummary {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub required: Vec<RequiredField>,
}

impl FormSummary {
    pub fn of(fields: &[FormField]) -> Self {
        let mut by_type = BTreeMap::new();
        for field in fields {
            *by_type.entry(field.field_type.clone()).or_insert(0) += 1;
        }
        let required = fields
            .iter()
            .filter(|f| f.required)
            .map(|f| RequiredField {
                name: f.display_name().to_string(),
                label: if f.label.is_empty() {
                    "no label".to_string()
                } else {
                    f.label.clone()
                },
            })
            .collect();
        Self {
            total: fields.len(),
            by_type,
            required,
        }
    }
}

fn attr(element: ElementRef<'_>, name: &str) -> String {
    element.value().attr(name).unwrap_or_default().to_string()
}

fn has_attr(element: ElementRef<'_>, name: &str) -> bool {
    element.value().attr(name).is_some()
}

fn short_text(text: String) -> Option<String> {
    (!text.is_empty() && text.chars().count() < MAX_LABEL_CHARS).then_some(text)
}

/// Label text for a field: `label[for]`, enclosing label, then nearby text
fn find_label(document: &Html, element: ElementRef<'_>, id: &str) -> Result<String> {
    if !id.is_empty() {
        let label_sel = selector("label")?;
        if let Some(label) = document
            .select(&label_sel)
            .find(|l| l.value().attr("for") == Some(id))
        {
            return Ok(text_of(label));
        }
    }

    if let Some(label) = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|a| a.value().name() != "body")
        .find(|a| a.value().name() == "label")
    {
        let text = text_of(label);
        if !text.is_empty() {
            return Ok(text);
        }
    }

    if let Some(prev) = element.prev_siblings().find_map(ElementRef::wrap) {
        if matches!(prev.value().name(), "span" | "div" | "p") {
            if let Some(text) = short_text(text_of(prev)) {
                return Ok(text);
            }
        }
    }

    // loose text and span/label children of the parent
    if let Some(parent) = element.parent().and_then(ElementRef::wrap) {
        let mut parts = Vec::new();
        for child in parent.children() {
            if let Some(text) = child.value().as_text() {
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
            } else if let Some(child) = ElementRef::wrap(child) {
                if matches!(child.value().name(), "span" | "label") {
                    let text = text_of(child);
                    if !text.is_empty() {
                        parts.push(text);
                    }
                }
            }
        }
        if let Some(text) = short_text(parts.join(" ")) {
            return Ok(text);
        }
    }

    Ok(String::new())
}

fn field_info(document: &Html, element: ElementRef<'_>) -> Result<FormField> {
    let tag_name = element.value().name().to_string();
    let field_type = element
        .value()
        .attr("type")
        .filter(|t| !t.is_empty())
        .unwrap_or("text")
        .to_string();
    let id = attr(element, "id");

    let mut field = FormField {
        label: find_label(document, element, &id)?,
        tag_name,
        field_type,
        name: attr(element, "name"),
        placeholder: attr(element, "placeholder"),
        value: attr(element, "value"),
        required: has_attr(element, "required"),
        disabled: has_attr(element, "disabled"),
        readonly: has_attr(element, "readonly"),
        class: attr(element, "class"),
        aria_label: attr(element, "aria-label"),
        id,
        ..FormField::default()
    };

    match field.tag_name.as_str() {
        "select" => {
            let option_sel = selector("option")?;
            field.options = element
                .select(&option_sel)
                .map(|option| SelectOption {
                    value: attr(option, "value"),
                    text: text_of(option),
                    selected: has_attr(option, "selected"),
                })
                .collect();
        }
        "textarea" => {
            field.rows = Some(attr(element, "rows"));
            field.cols = Some(attr(element, "cols"));
            field.value = element.text().collect::<String>().trim().to_string();
        }
        "input" => {
            field.min = Some(attr(element, "min"));
            field.max = Some(attr(element, "max"));
            field.step = Some(attr(element, "step"));
            field.pattern = Some(attr(element, "pattern"));
            field.maxlength = Some(attr(element, "maxlength"));
            field.minlength = Some(attr(element, "minlength"));
            if matches!(field.field_type.as_str(), "radio" | "checkbox") {
                field.checked = Some(has_attr(element, "checked"));
            }
        }
        _ => {}
    }

    Ok(field)
}

/// Extract every field of every form, or every field on the page when there is no form
pub fn extract_fields(html: &str) -> Result<Vec<FormField>> {
    let document = Html::parse_document(html);
    let form_sel = selector("form")?;
    let field_sel = selector(FIELD_SELECTOR)?;

    let forms: Vec<_> = document.select(&form_sel).collect();
    info!(count = forms.len(), "Found forms on the page");

    let mut fields = Vec::new();
    if forms.is_empty() {
        for element in document.select(&field_sel) {
            fields.push(field_info(&document, element)?);
        }
    } else {
        for (form_index, form) in forms.into_iter().enumerate() {
            let context = FormContext {
                form_index,
                form_action: attr(form, "action"),
                form_method: form
                    .value()
                    .attr("method")
                    .filter(|m| !m.is_empty())
                    .unwrap_or("get")
                    .to_string(),
                form_id: attr(form, "id"),
                form_class: attr(form, "class"),
            };
            for element in form.select(&field_sel) {
                let mut field = field_info(&document, element)?;
                field.form = Some(context.clone());
                fields.push(field);
            }
        }
    }

    let total = fields.len();
    let mut seen = HashSet::new();
    fields.retain(|f| seen.insert((f.name.clone(), f.id.clone(), f.field_type.clone())));
    info!(total, unique = fields.len(), "Extracted form fields");
    Ok(fields)
}

/// Write the result as pretty JSON, creating parent directories
pub fn save_result(path: &Path, result: &FormScrapeResult) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(result)?)?;
    Ok(())
}

#[derive(Deserialize)]
struct SavedFields {
    #[serde(default)]
    fields: Vec<SavedField>,
}

#[derive(Deserialize)]
struct SavedField {
    #[serde(default)]
    name: String,
}

/// Non-empty field names from a saved scrape
pub fn load_field_names(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::InvalidInput(format!(
            "{} does not exist, run `frag form-scrape` first to generate it",
            path.display()
        )));
    }
    let saved: SavedFields = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    Ok(saved
        .fields
        .into_iter()
        .map(|f| f.name)
        .filter(|name| !name.is_empty())
        .collect())
}

pub struct FormScraper<P: PageSource> {
    source: P,
}

impl<P: PageSource> FormScraper<P> {
    pub fn new(source: P) -> Self {
        Self { source }
    }

    pub async fn scrape(&self, url: &str) -> Result<FormScrapeResult> {
        info!(url, "Scraping contact form");
        let page = self.source.fetch(url).await?;
        let fields = extract_fields(&page.html)?;
        Ok(FormScrapeResult::new(url, fields))
    }
}
