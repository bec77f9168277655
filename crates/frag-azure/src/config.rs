//! Deployment configuration and resource naming

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use frag_core::{env, PollConfig, Result, RetryConfig};

/// Settings for one environment deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub env_name: String,
    pub location: String,
    pub resource_group: String,
    pub subscription_id: Option<String>,
    pub chat_model: String,
    pub chat_model_version: String,
    pub embed_model: String,
    pub embed_model_version: String,
    /// SKU of both model deployments
    pub deployment_sku: String,
    pub chat_capacity: u32,
    pub embed_capacity: u32,
    pub search_sku: String,
    /// Blob container for source documents
    pub container: String,
    /// File the environment export step merges into
    pub env_file: PathBuf,
    pub retry: RetryConfig,
    pub poll: PollConfig,
}

impl DeploymentConfig {
    pub const DEFAULT_ENV_NAME: &'static str = "ragdemo";
    pub const DEFAULT_LOCATION: &'static str = "eastus2";

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let env_name = env::optional(&["AZURE_ENV_NAME"])
            .unwrap_or_else(|| Self::DEFAULT_ENV_NAME.to_string());
        let location = env::optional(&["AZURE_LOCATION"])
            .unwrap_or_else(|| Self::DEFAULT_LOCATION.to_string());

        let mut config = Self::new(env_name, location);
        if let Some(group) = env::optional(&["AZURE_RESOURCE_GROUP"]) {
            config.resource_group = group;
        }
        config.subscription_id = env::optional(&["AZURE_SUBSCRIPTION_ID"]);
        if let Some(model) = env::optional(&["AZURE_CHAT_MODEL"]) {
            config.chat_model = model;
        }
        if let Some(version) = env::optional(&["AZURE_CHAT_MODEL_VERSION"]) {
            config.chat_model_version = version;
        }
        if let Some(model) = env::optional(&["AZURE_EMBED_MODEL"]) {
            config.embed_model = model;
        }
        if let Some(version) = env::optional(&["AZURE_EMBED_MODEL_VERSION"]) {
            config.embed_model_version = version;
        }
        config.chat_capacity = env::parse_or("AZURE_CHAT_CAPACITY", config.chat_capacity)?;
        config.embed_capacity = env::parse_or("AZURE_EMBED_CAPACITY", config.embed_capacity)?;

        Ok(config)
    }

    /// Create configuration with explicit values
    pub fn new(env_name: impl Into<String>, location: impl Into<String>) -> Self {
        let env_name = env_name.into();
        Self {
            resource_group: format!("rg-{}", env_name),
            env_name,
            location: location.into(),
            subscription_id: None,
            chat_model: "gpt-4o-mini".to_string(),
            chat_model_version: "2024-07-18".to_string(),
            embed_model: "text-embedding-3-small".to_string(),
            embed_model_version: "1".to_string(),
            deployment_sku: "GlobalStandard".to_string(),
            chat_capacity: 10,
            embed_capacity: 10,
            search_sku: "basic".to_string(),
            container: "documents".to_string(),
            env_file: PathBuf::from(".env"),
            retry: RetryConfig::default(),
            poll: PollConfig::default(),
        }
    }

    /// Rename the environment; the resource group follows unless it was set explicitly
    pub fn with_env_name(mut self, env_name: impl Into<String>) -> Self {
        let env_name = env_name.into();
        if self.resource_group == format!("rg-{}", self.env_name) {
            self.resource_group = format!("rg-{}", env_name);
        }
        self.env_name = env_name;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn names(&self) -> ResourceNames {
        ResourceNames::derive(self)
    }
}

/// Names of every resource in one environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNames {
    pub resource_group: String,
    pub log_analytics: String,
    pub key_vault: String,
    pub storage_account: String,
    pub ai_hub: String,
    pub ai_project: String,
    pub ai_services: String,
    pub search: String,
    pub translator: String,
}

impl ResourceNames {
    /// Derive names from the environment name plus a short token unique to
    /// subscription, environment and location
    pub fn derive(config: &DeploymentConfig) -> Self {
        let env = sanitize(&config.env_name);
        let token = resource_token(config);
        let dashed = |prefix: &str, max: usize| clip(&format!("{}-{}-{}", prefix, env, token), max);

        Self {
            resource_group: config.resource_group.clone(),
            log_analytics: dashed("log", 63),
            key_vault: dashed("kv", 24),
            storage_account: format!("{}{}", compact("st", &env, 18), token),
            ai_hub: dashed("hub", 32),
            ai_project: dashed("proj", 32),
            ai_services: dashed("ais", 64),
            search: dashed("srch", 60),
            translator: dashed("tr", 64),
        }
    }
}

fn resource_token(config: &DeploymentConfig) -> String {
    let seed = format!(
        "{}:{}:{}",
        config.subscription_id.as_deref().unwrap_or_default(),
        config.env_name,
        config.location
    );
    format!("{:x}", md5::compute(seed))[..6].to_string()
}

/// Lowercase alphanumerics and single dashes
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Prefix plus the dashless environment name, at most `max` characters
fn compact(prefix: &str, env: &str, max: usize) -> String {
    format!("{}{}", prefix, env.replace('-', ""))
        .chars()
        .take(max)
        .collect()
}

/// Cut a name to `max` characters, keeping the trailing token
fn clip(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    let token_start = name.len() - 6;
    let head_len = max.saturating_sub(7);
    let head = name[..head_len].trim_end_matches('-');
    format!("{}-{}", head, &name[token_start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_group_follows_env_name() {
        let config = DeploymentConfig::new("ragdemo", "eastus2").with_env_name("medicaid");
        assert_eq!(config.resource_group, "rg-medicaid");
    }

    #[test]
    fn test_explicit_resource_group_is_kept() {
        let mut config = DeploymentConfig::new("ragdemo", "eastus2");
        config.resource_group = "shared-rg".to_string();
        let config = config.with_env_name("other");
        assert_eq!(config.resource_group, "shared-rg");
    }

    #[test]
    fn test_names_are_stable_and_bounded() {
        let config = DeploymentConfig::new("A Very Long_Environment Name", "westeurope");
        let names = config.names();
        assert_eq!(names, config.names());
        assert!(names.key_vault.len() <= 24);
        assert!(names.storage_account.len() <= 24);
        assert!(names.storage_account.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert!(names.key_vault.starts_with("kv-a-very-long"));
        assert!(!names.key_vault.contains("--"));
    }

    #[test]
    fn test_names_differ_by_location() {
        let east = DeploymentConfig::new("ragdemo", "eastus2").names();
        let west = DeploymentConfig::new("ragdemo", "westus").names();
        assert_ne!(east.search, west.search);
        assert_eq!(east.resource_group, west.resource_group);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Rag Demo__1"), "rag-demo-1");
        assert_eq!(sanitize("-x-"), "x");
    }
}
