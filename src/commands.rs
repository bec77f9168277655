//! Subcommand handlers

use anyhow::{bail, Context};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use frag_agents::{AgentsClient, AgentsConfig, DEFAULT_PROMPT};
use frag_azure::{Deployer, DeploymentConfig, DeploymentPlan, ProcessRunner, ValidationReport};
use frag_cli::{
    display_banner, print_answer, print_form_summary, print_news_report, ui, FormFiller,
    PipelineConfig, RagPipeline,
};
use frag_core::{env, EmbeddingProvider, IngestConfig, Translator};
use frag_openai::{AzureOpenAIClient, OpenAIConfig};
use frag_scraper::form::{load_field_names, save_result};
use frag_scraper::news::save_report;
use frag_scraper::{FormScraper, HttpFetcher, NewsConfig, NewsScraper};
use frag_search::{AzureRAGEngine, AzureSearchClient, Ingestor, SearchServiceConfig, DEFAULT_SUBJECT};
use frag_translator::AzureTranslatorClient;

const DEFAULT_QUESTION: &str =
    "Which disability benefits are available if I become disabled while working?";

fn deployer(config: DeploymentConfig) -> Deployer {
    Deployer::new(Arc::new(ProcessRunner::new()), config)
}

fn print_validation(report: &ValidationReport) {
    ui::header("Validation");
    for check in &report.checks {
        let state = check.state.as_deref().unwrap_or("missing");
        if check.succeeded() {
            ui::success(&format!("{} ({}): {}", check.module, check.resource, state));
        } else {
            ui::error(&format!("{} ({}): {}", check.module, check.resource, state));
        }
    }
}

pub async fn deploy(
    env_name: Option<String>,
    location: Option<String>,
    skip_configure: bool,
    skip_validate: bool,
) -> anyhow::Result<()> {
    let mut config = DeploymentConfig::from_env()?;
    if let Some(env_name) = env_name {
        config = config.with_env_name(env_name);
    }
    if let Some(location) = location {
        config = config.with_location(location);
    }

    display_banner("Foundry RAG deployment", &format!("{} in {}", config.env_name, config.location));
    let deployer = deployer(config);

    let account = deployer.preflight().await?;
    ui::success("Signed in to Azure");
    ui::kv("user:", &account.user);
    ui::kv("subscription:", format!("{} ({})", account.subscription_name, account.subscription_id));
    ui::kv("resource group:", &deployer.config().resource_group);

    let plan = DeploymentPlan::standard()?;
    ui::header("Plan");
    print!("{}", plan);

    let outputs = deployer.deploy(&plan).await?;
    ui::success(&format!("Applied {} modules", plan.len()));

    if skip_configure {
        ui::hint("Skipped configuration; run `frag deploy` again without --skip-configure to export .env");
    } else {
        let exported = deployer.configure(&outputs).await?;
        ui::success(&format!(
            "Exported {} variables to {}",
            exported.len(),
            deployer.config().env_file.display()
        ));
        for key in &exported {
            ui::list_item(key);
        }
    }

    if !skip_validate {
        let report = deployer.validate().await?;
        print_validation(&report);
        if !report.succeeded() {
            bail!("Validation failed for: {:?}", report.failures());
        }
    }

    ui::success("Deployment complete");
    Ok(())
}

pub async fn validate() -> anyhow::Result<()> {
    let deployer = deployer(DeploymentConfig::from_env()?);
    let report = deployer.validate().await?;
    print_validation(&report);
    if !report.succeeded() {
        bail!("{} modules are not in the Succeeded state", report.failures().len());
    }
    ui::success("All resources provisioned");
    Ok(())
}

pub async fn teardown(purge: bool, yes: bool) -> anyhow::Result<()> {
    let deployer = deployer(DeploymentConfig::from_env()?);
    let rg = deployer.config().resource_group.clone();

    if !yes && !ui::confirm(&format!("Delete resource group {} and everything in it?", rg))? {
        ui::warn("Teardown cancelled");
        return Ok(());
    }

    let report = deployer.teardown(purge).await?;
    if report.existed {
        ui::success(&format!("Deleted resource group {}", report.resource_group));
    } else {
        ui::warn(&format!("Resource group {} did not exist", report.resource_group));
    }
    for name in &report.purged {
        ui::success(&format!("Purged {}", name));
    }
    Ok(())
}

pub fn plan() -> anyhow::Result<()> {
    let plan = DeploymentPlan::standard()?;
    print!("{}", plan);
    Ok(())
}

pub async fn ingest(
    data_dir: &Path,
    index: Option<String>,
    batch_size: usize,
    no_embeddings: bool,
) -> anyhow::Result<()> {
    let mut search_config = SearchServiceConfig::from_env()?;
    if let Some(index) = index {
        search_config = search_config.with_index(index);
    }
    let index_name = search_config.index_name.clone();
    let client = Arc::new(AzureSearchClient::new(search_config)?);

    let mut ingestor = Ingestor::new(client, index_name.as_str());
    if !no_embeddings {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(AzureOpenAIClient::from_env()?);
        ingestor = ingestor.with_embedder(embedder);
    }
    let ingestor = ingestor.with_config(IngestConfig {
        batch_size,
        with_embeddings: !no_embeddings,
        ..IngestConfig::default()
    });

    ui::step("📂", &format!("Ingesting {} into {}", data_dir.display(), index_name));
    let report = ingestor.run(data_dir).await?;

    ui::success(&format!("Uploaded {} documents", report.uploaded));
    if report.failed > 0 {
        ui::warn(&format!("{} documents failed", report.failed));
        for error in &report.errors {
            ui::list_item(error);
        }
    }
    Ok(())
}

pub async fn ask(
    query: &str,
    top_k: usize,
    no_translate: bool,
    languages: Vec<String>,
) -> anyhow::Result<()> {
    let query = if query.trim().is_empty() {
        DEFAULT_QUESTION
    } else {
        query
    };

    let subject = env::optional(&["RAG_SUBJECT"]).unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
    display_banner(&format!("🏥 {} RAG System", subject), "Azure AI Search + Azure OpenAI");

    let openai_config = OpenAIConfig::from_env()?;
    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(AzureOpenAIClient::new(openai_config.clone())?);
    let llm = AzureOpenAIClient::new(openai_config)?;

    let search_config = SearchServiceConfig::from_env()?;
    let index_name = search_config.index_name.clone();
    let search = Arc::new(AzureSearchClient::new(search_config)?);
    let engine = AzureRAGEngine::new(search, index_name)
        .with_embedder(embedder)
        .with_subject(subject);

    let mut config = PipelineConfig {
        top_k,
        system_prompt: engine.system_prompt(),
        ..PipelineConfig::default()
    };

    let mut translator: Option<Arc<dyn Translator>> = None;
    if !no_translate {
        match AzureTranslatorClient::from_env() {
            Ok(client) => {
                config.languages = if languages.is_empty() {
                    client.config().target_languages.clone()
                } else {
                    languages
                };
                translator = Some(Arc::new(client));
            }
            Err(e) => ui::warn(&format!("Translation disabled: {}", e)),
        }
    }

    let mut pipeline = RagPipeline::new(llm, engine, config);
    if let Some(translator) = translator {
        pipeline = pipeline.with_translator(translator);
    }

    let result = pipeline.answer(query).await?;
    print_answer(&result);
    Ok(())
}

pub async fn agent(prompt: &str) -> anyhow::Result<()> {
    let prompt = if prompt.trim().is_empty() {
        DEFAULT_PROMPT
    } else {
        prompt
    };

    let mut config = AgentsConfig::from_env()?;
    if config.access_token.is_none() {
        let token = deployer(DeploymentConfig::from_env()?)
            .access_token(AgentsConfig::TOKEN_RESOURCE)
            .await?;
        config = config.with_access_token(token);
    }
    let client = AgentsClient::new(config)?;

    ui::step("🤖", "Running agent");
    let conversation = client.run_prompt(prompt).await?;
    ui::kv("agent:", conversation.agent.name.as_deref().unwrap_or(&conversation.agent.id));
    ui::kv("thread:", &conversation.thread.id);
    ui::kv("run status:", format!("{:?}", conversation.run.status));

    if conversation.failed() {
        let reason = conversation
            .run
            .last_error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no error details".to_string());
        bail!("Run failed: {}", reason);
    }

    ui::rule();
    for message in &conversation.messages {
        if let Some(text) = message.last_text() {
            println!("{}: {}", message.role, text);
        }
    }
    Ok(())
}

pub async fn news(
    query: String,
    max_results: usize,
    delay_secs: u64,
    out_dir: PathBuf,
) -> anyhow::Result<()> {
    let config = NewsConfig {
        query,
        max_results,
        delay: Duration::from_secs(delay_secs),
        out_dir,
    };
    let scraper = NewsScraper::new(HttpFetcher::new()?, config);
    let config = scraper.config();

    ui::step("📰", &format!("Searching news for: '{}'", config.query));
    let articles = scraper.run().await?;
    if articles.is_empty() {
        ui::warn("No articles found");
        return Ok(());
    }

    print_news_report(&config.query, &articles);
    let path = save_report(&config.out_dir, &config.query, &articles, Local::now())?;
    ui::success(&format!("Saved {} articles to {}", articles.len(), path.display()));
    Ok(())
}

pub async fn form_scrape(url: &str, out: &Path) -> anyhow::Result<()> {
    let scraper = FormScraper::new(HttpFetcher::new()?);
    let result = scraper.scrape(url).await?;
    if result.fields.is_empty() {
        ui::warn("No form fields were found on the page.");
        return Ok(());
    }

    save_result(out, &result)?;
    print_form_summary(&result);
    ui::success(&format!("Results saved to: {}", out.display()));
    Ok(())
}

pub async fn form_fill(fields: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let names = load_field_names(fields)?;
    ui::step("📝", &format!("Found {} form fields: {}", names.len(), names.join(", ")));

    let filler = FormFiller::new(AzureOpenAIClient::from_env()?);
    let fill = filler.fill(&names).await?;
    println!("{}", fill.pretty());

    if let Some(out) = out {
        fill.save(out)
            .with_context(|| format!("Could not write {}", out.display()))?;
        ui::success(&format!("Saved to {}", out.display()));
    }
    Ok(())
}
