//! Azure AI Foundry agent service integration for Foundry RAG
//!
//! Drives a hosted agent (one configured with a web-search tool) through the
//! thread / message / run protocol of the agents REST API.

mod client;
mod config;
mod types;


pub use client::{poll_run, AgentConversation, AgentsClient};
pub use config::AgentsConfig;
pub use types::{Agent, MessageContent, Run, RunError, RunStatus, Thread, ThreadMessage};

// Re-export core types for convenience
pub use frag_core::{Error, PollConfig, Result};

/// Prompt used when none is given on the command line
pub const DEFAULT_PROMPT: &str = "Search the web with Bing for the latest news on changes to Medicaid policy. \
List out 5 sources you searched and summarize their contents. Please also include the urls.";
