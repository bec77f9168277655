//! Agent service configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use frag_core::{env, PollConfig, Result};

/// Configuration for the agents client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Project endpoint, e.g. `https://<account>.services.ai.azure.com/api/projects/<project>`
    pub project_endpoint: String,
    pub agent_id: String,
    pub api_version: String,
    /// Bearer token; resolved through the Azure CLI when absent
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub poll: PollConfig,
}

impl AgentsConfig {
    pub const DEFAULT_API_VERSION: &'static str = "v1";
    /// Token audience for the agent service
    pub const TOKEN_RESOURCE: &'static str = "https://ai.azure.com";

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let project_endpoint = env::require(&["FOUNDRY_PROJECT_ENDPOINT"])?;
        let agent_id = env::require(&["FOUNDRY_AGENT_ID"])?;

        Ok(Self {
            project_endpoint,
            agent_id,
            api_version: env::optional(&["FOUNDRY_API_VERSION"])
                .unwrap_or_else(|| Self::DEFAULT_API_VERSION.to_string()),
            access_token: env::optional(&["FOUNDRY_ACCESS_TOKEN"]),
            poll: default_poll(),
        })
    }

    /// Create configuration with explicit values
    pub fn new(project_endpoint: String, agent_id: String) -> Self {
        Self {
            project_endpoint,
            agent_id,
            api_version: Self::DEFAULT_API_VERSION.to_string(),
            access_token: None,
            poll: default_poll(),
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

/// Runs are polled every second for up to five minutes
fn default_poll() -> PollConfig {
    PollConfig::new(Duration::from_secs(1), 300)
}
