//! Orchestration: preflight, module application, configuration, validation, teardown

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{info, warn};

use frag_core::{CommandRunner, Error, Result};

use crate::az::{provisioning_state, string_at, AzCli};
use crate::config::DeploymentConfig;
use crate::env_file::merge_env_file;
use crate::modules::{apply, secret_env_var, DeploymentOutputs, ModuleKind, ModuleOutputs};
use crate::plan::DeploymentPlan;

const BLOB_CONTRIBUTOR_ROLE: &str = "Storage Blob Data Contributor";

/// Signed-in account reported by the preflight check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub user: String,
    pub subscription_id: String,
    pub subscription_name: String,
}

/// Post-provision configuration steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigureStep {
    GrantVaultAccess,
    GrantStorageAccess,
    ExportEnvironment,
}

impl ConfigureStep {
    pub const ALL: [ConfigureStep; 3] = [
        ConfigureStep::GrantVaultAccess,
        ConfigureStep::GrantStorageAccess,
        ConfigureStep::ExportEnvironment,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConfigureStep::GrantVaultAccess => "grant-vault-access",
            ConfigureStep::GrantStorageAccess => "grant-storage-access",
            ConfigureStep::ExportEnvironment => "export-environment",
        }
    }
}

/// Provisioning state of one module's resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleCheck {
    pub module: ModuleKind,
    pub resource: String,
    /// `None` when the resource does not exist
    pub state: Option<String>,
}

impl ModuleCheck {
    pub fn succeeded(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("Succeeded"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub checks: Vec<ModuleCheck>,
}

impl ValidationReport {
    /// True only when every module succeeded
    pub fn succeeded(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(ModuleCheck::succeeded)
    }

    pub fn failures(&self) -> Vec<ModuleKind> {
        self.checks
            .iter()
            .filter(|c| !c.succeeded())
            .map(|c| c.module)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeardownReport {
    pub resource_group: String,
    /// Whether the group existed when teardown started
    pub existed: bool,
    pub polls: u32,
    pub purged: Vec<String>,
}

/// Drives the Azure CLI through a whole environment lifecycle
pub struct Deployer {
    az: AzCli,
    config: DeploymentConfig,
}

impl Deployer {
    pub fn new(runner: Arc<dyn CommandRunner>, config: DeploymentConfig) -> Self {
        Self {
            az: AzCli::new(runner),
            config,
        }
    }

    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    /// Check the CLI is installed and signed in, selecting the subscription if configured
    pub async fn preflight(&self) -> Result<AccountInfo> {
        let version = self.az.output(&["version", "-o", "json"]).await?;
        if !version.success {
            return Err(Error::Configuration(format!(
                "Azure CLI is installed but not working: {}",
                version.stderr.trim()
            )));
        }

        if let Some(subscription) = &self.config.subscription_id {
            self.az
                .run(&["account", "set", "--subscription", subscription])
                .await?;
        }

        let account = self
            .az
            .json(&["account", "show"])
            .await
            .map_err(|_| Error::Authentication("Not signed in to Azure. Run `az login` first".to_string()))?;

        Ok(AccountInfo {
            user: string_at(&account, "/user/name").unwrap_or_default(),
            subscription_id: string_at(&account, "/id").unwrap_or_default(),
            subscription_name: string_at(&account, "/name").unwrap_or_default(),
        })
    }

    /// Apply every module of the plan in order; the first module to exhaust its
    /// retries stops the run
    pub async fn deploy(&self, plan: &DeploymentPlan) -> Result<DeploymentOutputs> {
        let mut outputs = DeploymentOutputs::default();
        for (i, kind) in plan.modules().iter().enumerate() {
            info!(module = %kind, step = i + 1, total = plan.len(), "Applying module");
            let module = self.apply_with_retry(*kind, &outputs).await?;
            outputs.insert(*kind, module);
        }
        Ok(outputs)
    }

    async fn apply_with_retry(&self, kind: ModuleKind, outputs: &DeploymentOutputs) -> Result<ModuleOutputs> {
        let retry = &self.config.retry;
        let mut attempt = 1;
        loop {
            match apply(&self.az, kind, &self.config, outputs).await {
                Ok(module) => return Ok(module),
                Err(e) if attempt < retry.max_attempts => {
                    warn!(
                        module = %kind,
                        attempt,
                        max_attempts = retry.max_attempts,
                        error = %e,
                        "Module failed, retrying in {}s",
                        retry.delay.as_secs()
                    );
                    sleep(retry.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(Error::Deployment(format!(
                        "Module {} failed after {} attempts: {}",
                        kind, attempt, e
                    )));
                }
            }
        }
    }

    /// Run the post-provision steps; returns the variables exported to the env file
    pub async fn configure(&self, outputs: &DeploymentOutputs) -> Result<Vec<String>> {
        let principal = self
            .az
            .tsv(&["ad", "signed-in-user", "show", "--query", "id"])
            .await?;
        let vault = outputs.get(ModuleKind::KeyVault)?;
        let storage = outputs.get(ModuleKind::Storage)?;
        let rg = self.config.resource_group.as_str();

        let mut exported = Vec::new();
        for step in ConfigureStep::ALL {
            info!(step = step.name(), "Running configuration step");
            match step {
                ConfigureStep::GrantVaultAccess => {
                    self.az
                        .run(&[
                            "keyvault", "set-policy", "--name", &vault.name, "-g", rg,
                            "--object-id", &principal, "--secret-permissions", "get", "list", "set",
                            "-o", "none",
                        ])
                        .await?;
                }
                ConfigureStep::GrantStorageAccess => {
                    let output = self
                        .az
                        .output(&[
                            "role", "assignment", "create", "--assignee-object-id", &principal,
                            "--assignee-principal-type", "User", "--role", BLOB_CONTRIBUTOR_ROLE,
                            "--scope", &storage.id, "-o", "none",
                        ])
                        .await?;
                    if !output.success && !output.stderr.contains("RoleAssignmentExists") {
                        return Err(Error::Deployment(format!(
                            "Failed to grant {} on {}: {}",
                            BLOB_CONTRIBUTOR_ROLE,
                            storage.name,
                            output.stderr.trim()
                        )));
                    }
                }
                ConfigureStep::ExportEnvironment => {
                    let updates = self.environment_values(outputs, &vault.name).await?;
                    merge_env_file(&self.config.env_file, &updates)?;
                    info!(path = %self.config.env_file.display(), count = updates.len(), "Exported environment");
                    exported = updates.into_iter().map(|(key, _)| key).collect();
                }
            }
        }
        Ok(exported)
    }

    /// Variables for the env file: deployment settings plus every module secret
    async fn environment_values(
        &self,
        outputs: &DeploymentOutputs,
        vault: &str,
    ) -> Result<Vec<(String, String)>> {
        let mut values = vec![
            ("AZURE_ENV_NAME".to_string(), self.config.env_name.clone()),
            ("AZURE_LOCATION".to_string(), self.config.location.clone()),
            ("AZURE_RESOURCE_GROUP".to_string(), self.config.resource_group.clone()),
            ("AZURE_KEY_VAULT_NAME".to_string(), vault.to_string()),
        ];

        if let Ok(storage) = outputs.get(ModuleKind::Storage) {
            values.push(("AZURE_STORAGE_ACCOUNT".to_string(), storage.name.clone()));
            if let Some(container) = storage.extra.get("container") {
                values.push(("AZURE_STORAGE_CONTAINER".to_string(), container.clone()));
            }
        }
        if let Ok(hub) = outputs.get(ModuleKind::AiHub) {
            if let Some(project) = hub.extra.get("project") {
                values.push(("AZURE_AI_PROJECT_NAME".to_string(), project.clone()));
            }
        }
        if let Ok(models) = outputs.get(ModuleKind::ModelHosting) {
            if let Some(chat) = models.extra.get("chat_deployment") {
                values.push(("AZURE_OPENAI_CHAT_DEPLOYMENT".to_string(), chat.clone()));
            }
            if let Some(embed) = models.extra.get("embed_deployment") {
                values.push(("AZURE_OPENAI_EMBED_DEPLOYMENT".to_string(), embed.clone()));
            }
        }

        for kind in outputs.modules.keys() {
            for secret in kind.secrets() {
                let Some(var) = secret_env_var(secret) else {
                    continue;
                };
                let value = self
                    .az
                    .tsv(&["keyvault", "secret", "show", "--vault-name", vault, "--name", secret, "--query", "value"])
                    .await?;
                values.push((var.to_string(), value));
            }
        }
        Ok(values)
    }

    /// Check every module's resource reports a successful provisioning state
    pub async fn validate(&self) -> Result<ValidationReport> {
        let names = self.config.names();
        let mut report = ValidationReport::default();

        for kind in ModuleKind::ALL {
            let args = kind.show_args(&names);
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let state = self
                .az
                .show(&args)
                .await?
                .and_then(|resource| provisioning_state(&resource));

            let check = ModuleCheck {
                module: kind,
                resource: kind.resource_name(&names).to_string(),
                state,
            };
            if check.succeeded() {
                info!(module = %kind, "Validated");
            } else {
                warn!(module = %kind, state = ?check.state, "Module not in Succeeded state");
            }
            report.checks.push(check);
        }
        Ok(report)
    }

    async fn group_exists(&self) -> Result<bool> {
        let exists = self
            .az
            .tsv(&["group", "exists", "-n", &self.config.resource_group])
            .await?;
        Ok(exists.eq_ignore_ascii_case("true"))
    }

    /// Delete the resource group and wait for it to disappear
    pub async fn teardown(&self, purge: bool) -> Result<TeardownReport> {
        let rg = self.config.resource_group.as_str();
        let mut report = TeardownReport {
            resource_group: rg.to_string(),
            existed: self.group_exists().await?,
            ..Default::default()
        };

        if report.existed {
            self.az
                .run(&["group", "delete", "-n", rg, "--yes", "--no-wait"])
                .await?;
            info!(resource_group = rg, "Deletion started");

            let poll = &self.config.poll;
            let mut gone = false;
            while report.polls < poll.max_polls {
                sleep(poll.interval).await;
                report.polls += 1;
                if !self.group_exists().await? {
                    gone = true;
                    break;
                }
                info!(resource_group = rg, poll = report.polls, "Still deleting");
            }
            if !gone {
                return Err(Error::Timeout(format!(
                    "Resource group {} still exists after {} seconds",
                    rg,
                    poll.max_wait().as_secs()
                )));
            }
        } else {
            info!(resource_group = rg, "Resource group does not exist");
        }

        if purge {
            report.purged = self.purge_soft_deleted().await;
        }
        Ok(report)
    }

    /// Purge soft-deleted vault and cognitive accounts; returns what was purged
    async fn purge_soft_deleted(&self) -> Vec<String> {
        let names = self.config.names();
        let location = self.config.location.as_str();
        let rg = self.config.resource_group.as_str();
        let mut purged = Vec::new();

        let vault = self
            .az
            .run(&["keyvault", "purge", "--name", &names.key_vault, "--location", location])
            .await;
        match vault {
            Ok(_) => purged.push(names.key_vault.clone()),
            Err(e) => warn!(resource = %names.key_vault, error = %e, "Nothing purged"),
        }

        for account in [&names.ai_services, &names.translator] {
            let result = self
                .az
                .run(&[
                    "cognitiveservices", "account", "purge", "--name", account, "--resource-group",
                    rg, "--location", location,
                ])
                .await;
            match result {
                Ok(_) => purged.push(account.clone()),
                Err(e) => warn!(resource = %account, error = %e, "Nothing purged"),
            }
        }
        purged
    }

    /// Entra ID bearer token for the given resource audience
    pub async fn access_token(&self, resource: &str) -> Result<String> {
        let token = self
            .az
            .tsv(&["account", "get-access-token", "--resource", resource, "--query", "accessToken"])
            .await
            .map_err(|e| Error::Authentication(format!("Could not obtain an access token: {}", e)))?;
        if token.is_empty() {
            return Err(Error::Authentication("Azure CLI returned an empty access token".to_string()));
        }
        Ok(token)
    }
}
