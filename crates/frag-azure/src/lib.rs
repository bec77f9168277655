//! Azure AI Foundry provisioning for Foundry RAG
//!
//! This crate declares the eight provisioning modules, resolves them into a
//! deployment plan and drives the Azure CLI through deploy, configure, validate
//! and teardown.

mod az;
mod config;
mod deployer;
mod env_file;
mod modules;
mod plan;
mod runner;

#[cfg(test)]
mod fake;

pub use az::AzCli;
pub use config::{DeploymentConfig, ResourceNames};
pub use deployer::{
    AccountInfo, ConfigureStep, Deployer, ModuleCheck, TeardownReport, ValidationReport,
};
pub use env_file::merge_env_file;
pub use modules::{secret_env_var, DeploymentOutputs, ModuleKind, ModuleOutputs, ModuleSpec};
pub use plan::DeploymentPlan;
pub use runner::ProcessRunner;

// Re-export core types for convenience
pub use frag_core::{CommandOutput, CommandRunner, Error, PollConfig, Result, RetryConfig};
