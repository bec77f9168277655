//! Provisioning modules: one managed resource (plus its vault secrets) each

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use frag_core::{Error, Result};

use crate::az::{string_at, AzCli};
use crate::config::{DeploymentConfig, ResourceNames};

/// The eight provisioning modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    ResourceGroup,
    Monitoring,
    KeyVault,
    Storage,
    AiHub,
    ModelHosting,
    Search,
    Translation,
}

impl ModuleKind {
    /// Declaration order of the standard graph
    pub const ALL: [ModuleKind; 8] = [
        ModuleKind::ResourceGroup,
        ModuleKind::Monitoring,
        ModuleKind::KeyVault,
        ModuleKind::Storage,
        ModuleKind::AiHub,
        ModuleKind::ModelHosting,
        ModuleKind::Search,
        ModuleKind::Translation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModuleKind::ResourceGroup => "resource-group",
            ModuleKind::Monitoring => "monitoring",
            ModuleKind::KeyVault => "key-vault",
            ModuleKind::Storage => "storage",
            ModuleKind::AiHub => "ai-hub",
            ModuleKind::ModelHosting => "model-hosting",
            ModuleKind::Search => "search",
            ModuleKind::Translation => "translation",
        }
    }

    pub fn depends_on(self) -> &'static [ModuleKind] {
        use ModuleKind::*;
        match self {
            ResourceGroup => &[],
            Monitoring => &[ResourceGroup],
            KeyVault => &[Monitoring],
            Storage => &[Monitoring],
            AiHub => &[KeyVault, Storage],
            ModelHosting | Search | Translation => &[AiHub, KeyVault],
        }
    }

    /// Vault secrets written by the module
    pub fn secrets(self) -> &'static [&'static str] {
        match self {
            ModuleKind::ModelHosting => &["azure-openai-endpoint", "azure-openai-api-key"],
            ModuleKind::Search => &["azure-search-endpoint", "azure-search-admin-key"],
            ModuleKind::Translation => &[
                "azure-translator-endpoint",
                "azure-translator-key",
                "azure-translator-region",
            ],
            _ => &[],
        }
    }

    pub fn spec(self) -> ModuleSpec {
        ModuleSpec {
            kind: self,
            depends_on: self.depends_on().to_vec(),
        }
    }

    /// Name of the resource the module declares
    pub fn resource_name(self, names: &ResourceNames) -> &str {
        match self {
            ModuleKind::ResourceGroup => &names.resource_group,
            ModuleKind::Monitoring => &names.log_analytics,
            ModuleKind::KeyVault => &names.key_vault,
            ModuleKind::Storage => &names.storage_account,
            ModuleKind::AiHub => &names.ai_hub,
            ModuleKind::ModelHosting => &names.ai_services,
            ModuleKind::Search => &names.search,
            ModuleKind::Translation => &names.translator,
        }
    }

    /// CLI arguments that show the module's primary resource
    pub fn show_args(self, names: &ResourceNames) -> Vec<String> {
        let rg = names.resource_group.as_str();
        let name = self.resource_name(names);
        let args: Vec<&str> = match self {
            ModuleKind::ResourceGroup => vec!["group", "show", "-n", rg],
            ModuleKind::Monitoring => {
                vec!["monitor", "log-analytics", "workspace", "show", "-g", rg, "-n", name]
            }
            ModuleKind::KeyVault => vec!["keyvault", "show", "-n", name, "-g", rg],
            ModuleKind::Storage => vec!["storage", "account", "show", "-n", name, "-g", rg],
            ModuleKind::AiHub => vec!["ml", "workspace", "show", "-n", name, "-g", rg],
            ModuleKind::ModelHosting | ModuleKind::Translation => {
                vec!["cognitiveservices", "account", "show", "-n", name, "-g", rg]
            }
            ModuleKind::Search => vec!["search", "service", "show", "-n", name, "-g", rg],
        };
        args.into_iter().map(str::to_string).collect()
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModuleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ModuleKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown module: {}", s)))
    }
}

/// A node of the deployment graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub kind: ModuleKind,
    pub depends_on: Vec<ModuleKind>,
}

/// What a module hands to the modules that depend on it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleOutputs {
    pub name: String,
    pub id: String,
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ModuleOutputs {
    fn from_resource(name: &str, value: &Value, endpoint_pointer: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            id: string_at(value, "/id").unwrap_or_default(),
            endpoint: endpoint_pointer.and_then(|p| string_at(value, p)),
            extra: BTreeMap::new(),
        }
    }

    fn with_extra(mut self, key: &str, value: impl Into<String>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// Outputs of every applied module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentOutputs {
    pub modules: BTreeMap<ModuleKind, ModuleOutputs>,
}

impl DeploymentOutputs {
    pub fn insert(&mut self, kind: ModuleKind, outputs: ModuleOutputs) {
        self.modules.insert(kind, outputs);
    }

    /// Outputs of an applied module
    pub fn get(&self, kind: ModuleKind) -> Result<&ModuleOutputs> {
        self.modules.get(&kind).ok_or_else(|| {
            Error::Deployment(format!("Module {} has not been applied", kind))
        })
    }
}

/// Environment variable the clients read a vault secret from
pub fn secret_env_var(secret: &str) -> Option<&'static str> {
    Some(match secret {
        "azure-openai-endpoint" => "AZURE_OPENAI_ENDPOINT",
        "azure-openai-api-key" => "AZURE_OPENAI_API_KEY",
        "azure-search-endpoint" => "AZURE_SEARCH_ENDPOINT",
        "azure-search-admin-key" => "AZURE_SEARCH_ADMIN_KEY",
        "azure-translator-endpoint" => "AZURE_TRANSLATOR_ENDPOINT",
        "azure-translator-key" => "AZURE_TRANSLATOR_KEY",
        "azure-translator-region" => "AZURE_TRANSLATOR_REGION",
        _ => return None,
    })
}

fn strs(args: &[String]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}

/// Show the resource; create it when missing
async fn ensure(az: &AzCli, label: &str, show: &[String], create: &[&str]) -> Result<(Value, bool)> {
    if let Some(existing) = az.show(&strs(show)).await? {
        info!(resource = label, "Resource exists, reusing");
        return Ok((existing, false));
    }
    info!(resource = label, "Creating resource");
    Ok((az.json(create).await?, true))
}

async fn write_secrets(az: &AzCli, vault: &str, secrets: &[(&str, String)]) -> Result<()> {
    for (name, value) in secrets {
        az.run(&[
            "keyvault", "secret", "set", "--vault-name", vault, "--name", name, "--value", value,
            "-o", "none",
        ])
        .await?;
        info!(vault, secret = *name, "Stored secret");
    }
    Ok(())
}

/// Apply one module. Existing resources are reused; secrets are always rewritten.
pub async fn apply(
    az: &AzCli,
    kind: ModuleKind,
    config: &DeploymentConfig,
    outputs: &DeploymentOutputs,
) -> Result<ModuleOutputs> {
    let names = config.names();
    let rg = names.resource_group.as_str();
    let location = config.location.as_str();
    let name = kind.resource_name(&names);
    let show = kind.show_args(&names);

    match kind {
        ModuleKind::ResourceGroup => {
            let tag = format!("azd-env-name={}", config.env_name);
            let (group, _) = ensure(
                az,
                name,
                &show,
                &["group", "create", "-n", rg, "-l", location, "--tags", &tag],
            )
            .await?;
            Ok(ModuleOutputs::from_resource(name, &group, None))
        }

        ModuleKind::Monitoring => {
            let (workspace, _) = ensure(
                az,
                name,
                &show,
                &[
                    "monitor", "log-analytics", "workspace", "create", "-g", rg, "-n", name, "-l",
                    location,
                ],
            )
            .await?;
            Ok(ModuleOutputs::from_resource(name, &workspace, None))
        }

        ModuleKind::KeyVault => {
            let workspace = outputs.get(ModuleKind::Monitoring)?;
            let (vault, created) = ensure(
                az,
                name,
                &show,
                &[
                    "keyvault", "create", "-n", name, "-g", rg, "-l", location,
                    "--enable-rbac-authorization", "false",
                ],
            )
            .await?;
            let vault = ModuleOutputs::from_resource(name, &vault, Some("/properties/vaultUri"));

            if created {
                az.run(&[
                    "monitor", "diagnostic-settings", "create", "--name", "kv-diagnostics",
                    "--resource", &vault.id, "--workspace", &workspace.id, "--logs",
                    r#"[{"categoryGroup":"allLogs","enabled":true}]"#, "-o", "none",
                ])
                .await?;
            }
            Ok(vault)
        }

        ModuleKind::Storage => {
            let (account, _) = ensure(
                az,
                name,
                &show,
                &[
                    "storage", "account", "create", "-n", name, "-g", rg, "-l", location, "--sku",
                    "Standard_LRS", "--kind", "StorageV2", "--allow-blob-public-access", "false",
                ],
            )
            .await?;
            az.run(&[
                "storage", "container", "create", "--name", &config.container, "--account-name",
                name, "--auth-mode", "key", "-o", "none",
            ])
            .await?;
            Ok(
                ModuleOutputs::from_resource(name, &account, Some("/primaryEndpoints/blob"))
                    .with_extra("container", config.container.as_str()),
            )
        }

        ModuleKind::AiHub => {
            let vault = outputs.get(ModuleKind::KeyVault)?;
            let storage = outputs.get(ModuleKind::Storage)?;
            let (hub, _) = ensure(
                az,
                name,
                &show,
                &[
                    "ml", "workspace", "create", "--kind", "hub", "-n", name, "-g", rg, "-l",
                    location, "--key-vault", &vault.id, "--storage-account", &storage.id,
                ],
            )
            .await?;
            let hub = ModuleOutputs::from_resource(name, &hub, None);

            let project_show: Vec<String> = ["ml", "workspace", "show", "-n", &names.ai_project, "-g", rg]
                .iter()
                .map(|s| s.to_string())
                .collect();
            let (project, _) = ensure(
                az,
                &names.ai_project,
                &project_show,
                &[
                    "ml", "workspace", "create", "--kind", "project", "-n", &names.ai_project, "-g",
                    rg, "--hub-id", &hub.id,
                ],
            )
            .await?;
            let project_id = string_at(&project, "/id").unwrap_or_default();
            Ok(hub
                .with_extra("project", names.ai_project.as_str())
                .with_extra("project_id", project_id))
        }

        ModuleKind::ModelHosting => {
            let vault = outputs.get(ModuleKind::KeyVault)?;
            outputs.get(ModuleKind::AiHub)?;
            let (account, _) = ensure(
                az,
                name,
                &show,
                &[
                    "cognitiveservices", "account", "create", "-n", name, "-g", rg, "-l", location,
                    "--kind", "AIServices", "--sku", "S0", "--custom-domain", name, "--yes",
                ],
            )
            .await?;
            let account = ModuleOutputs::from_resource(name, &account, Some("/properties/endpoint"));

            let models = [
                (&config.chat_model, &config.chat_model_version, config.chat_capacity),
                (&config.embed_model, &config.embed_model_version, config.embed_capacity),
            ];
            for (model, version, capacity) in models {
                let deployment_show: Vec<String> = [
                    "cognitiveservices", "account", "deployment", "show", "-n", name, "-g", rg,
                    "--deployment-name", model,
                ]
                .iter()
                .map(|s| s.to_string())
                .collect();
                let capacity = capacity.to_string();
                ensure(
                    az,
                    model,
                    &deployment_show,
                    &[
                        "cognitiveservices", "account", "deployment", "create", "-n", name, "-g",
                        rg, "--deployment-name", model, "--model-name", model, "--model-version",
                        version, "--model-format", "OpenAI", "--sku-name", &config.deployment_sku,
                        "--sku-capacity", &capacity,
                    ],
                )
                .await?;
            }

            let key = az
                .tsv(&["cognitiveservices", "account", "keys", "list", "-n", name, "-g", rg, "--query", "key1"])
                .await?;
            let endpoint = account.endpoint.clone().ok_or_else(|| {
                Error::Deployment(format!("Account {} reported no endpoint", name))
            })?;
            let secrets: Vec<(&str, String)> =
                kind.secrets().iter().copied().zip([endpoint, key]).collect();
            write_secrets(az, &vault.name, &secrets).await?;

            Ok(account
                .with_extra("chat_deployment", config.chat_model.as_str())
                .with_extra("embed_deployment", config.embed_model.as_str()))
        }

        ModuleKind::Search => {
            let vault = outputs.get(ModuleKind::KeyVault)?;
            outputs.get(ModuleKind::AiHub)?;
            let (service, _) = ensure(
                az,
                name,
                &show,
                &[
                    "search", "service", "create", "-n", name, "-g", rg, "-l", location, "--sku",
                    &config.search_sku,
                ],
            )
            .await?;
            let mut service = ModuleOutputs::from_resource(name, &service, None);
            let endpoint = format!("https://{}.search.windows.net", name);
            service.endpoint = Some(endpoint.clone());

            let key = az
                .tsv(&["search", "admin-key", "show", "--service-name", name, "-g", rg, "--query", "primaryKey"])
                .await?;
            let secrets: Vec<(&str, String)> =
                kind.secrets().iter().copied().zip([endpoint, key]).collect();
            write_secrets(az, &vault.name, &secrets).await?;
            Ok(service)
        }

        ModuleKind::Translation => {
            let vault = outputs.get(ModuleKind::KeyVault)?;
            outputs.get(ModuleKind::AiHub)?;
            let (account, _) = ensure(
                az,
                name,
                &show,
                &[
                    "cognitiveservices", "account", "create", "-n", name, "-g", rg, "-l", location,
                    "--kind", "TextTranslation", "--sku", "S1", "--custom-domain", name, "--yes",
                ],
            )
            .await?;
            let account = ModuleOutputs::from_resource(name, &account, Some("/properties/endpoint"));

            let key = az
                .tsv(&["cognitiveservices", "account", "keys", "list", "-n", name, "-g", rg, "--query", "key1"])
                .await?;
            let endpoint = account
                .endpoint
                .clone()
                .unwrap_or_else(|| "https://api.cognitive.microsofttranslator.com".to_string());
            let secrets: Vec<(&str, String)> = kind
                .secrets()
                .iter()
                .copied()
                .zip([endpoint, key, location.to_string()])
                .collect();
            write_secrets(az, &vault.name, &secrets).await?;
            Ok(account.with_extra("region", location))
        }
    }
}
