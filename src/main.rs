//! frag - deploy and query a RAG stack on Azure AI Foundry

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use frag_cli::ui;

mod commands;

#[derive(Parser)]
#[command(name = "frag")]
#[command(about = "Deploy and query a Retrieval-Augmented-Generation stack on Azure AI Foundry", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug logs (FRAG_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Provision every module, configure access and export the environment
    Deploy {
        #[arg(long, env = "AZURE_ENV_NAME")]
        env_name: Option<String>,
        #[arg(long, env = "AZURE_LOCATION")]
        location: Option<String>,
        /// Skip role assignments and the .env export
        #[arg(long)]
        skip_configure: bool,
        #[arg(long)]
        skip_validate: bool,
    },
    /// Check the provisioning state of every deployed resource
    Validate,
    /// Delete the resource group and wait for it to disappear
    Teardown {
        /// Also purge soft-deleted Key Vault and Cognitive Services accounts
        #[arg(long)]
        purge: bool,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the resolved module order
    Plan,
    /// Upload local text files into the search index
    Ingest {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        #[arg(long, env = "AZURE_AI_SEARCH_INDEX_NAME")]
        index: Option<String>,
        #[arg(long, default_value_t = 500)]
        batch_size: usize,
        /// Upload text only, without vectors
        #[arg(long)]
        no_embeddings: bool,
    },
    /// Answer a question from the indexed documents
    Ask {
        query: Vec<String>,
        #[arg(long, default_value_t = 3)]
        top_k: usize,
        #[arg(long)]
        no_translate: bool,
        /// Target language for the answer (repeatable)
        #[arg(long = "to")]
        languages: Vec<String>,
    },
    /// Send a prompt to the configured Foundry agent
    Agent { prompt: Vec<String> },
    /// Search news and scrape the linked articles
    News {
        #[arg(long, default_value = "Medicaid Policy News")]
        query: String,
        #[arg(long, default_value_t = 5)]
        max_results: usize,
        #[arg(long, default_value_t = 3)]
        delay_secs: u64,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Inventory the fields of a contact form
    FormScrape {
        #[arg(long, default_value = frag_scraper::form::DEFAULT_URL)]
        url: String,
        #[arg(long, default_value = frag_scraper::form::DEFAULT_OUTPUT)]
        out: PathBuf,
    },
    /// Ask the chat model to fill a scraped form with sample values
    FormFill {
        #[arg(long, default_value = frag_scraper::form::DEFAULT_OUTPUT)]
        fields: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("FRAG_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("foundry_rag=debug,frag=debug")
        } else {
            EnvFilter::new("foundry_rag=info,frag=info")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .init();

    if let Err(e) = run(cli.command).await {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Deploy {
            env_name,
            location,
            skip_configure,
            skip_validate,
        } => commands::deploy(env_name, location, skip_configure, skip_validate).await,
        Command::Validate => commands::validate().await,
        Command::Teardown { purge, yes } => commands::teardown(purge, yes).await,
        Command::Plan => commands::plan(),
        Command::Ingest {
            data_dir,
            index,
            batch_size,
            no_embeddings,
        } => commands::ingest(&data_dir, index, batch_size, no_embeddings).await,
        Command::Ask {
            query,
            top_k,
            no_translate,
            languages,
        } => commands::ask(&query.join(" "), top_k, no_translate, languages).await,
        Command::Agent { prompt } => commands::agent(&prompt.join(" ")).await,
        Command::News {
            query,
            max_results,
            delay_secs,
            out_dir,
        } => commands::news(query, max_results, delay_secs, out_dir).await,
        Command::FormScrape { url, out } => commands::form_scrape(&url, &out).await,
        Command::FormFill { fields, out } => commands::form_fill(&fields, out.as_deref()).await,
    }
}
