//! Thin wrapper over the Azure CLI

use serde_json::Value;
use std::sync::Arc;

use frag_core::{CommandOutput, CommandRunner, Error, Result};

/// Azure CLI invocations with JSON / TSV decoding
#[derive(Clone)]
pub struct AzCli {
    runner: Arc<dyn CommandRunner>,
}

impl AzCli {
    pub const PROGRAM: &'static str = "az";

    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Run `az` with the given arguments, returning the raw output
    pub async fn output(&self, args: &[&str]) -> Result<CommandOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runner.run(Self::PROGRAM, &args).await
    }

    /// Run `az`, failing on a non-zero exit
    pub async fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args).await?;
        if !output.success {
            return Err(command_error(args, &output));
        }
        Ok(output.stdout)
    }

    /// Run `az ... -o json` and decode the result
    pub async fn json(&self, args: &[&str]) -> Result<Value> {
        let stdout = self.run(&with_output(args, "json")).await?;
        parse_json(&stdout)
    }

    /// Run `az ... -o tsv` and return the trimmed value
    pub async fn tsv(&self, args: &[&str]) -> Result<String> {
        let stdout = self.run(&with_output(args, "tsv")).await?;
        Ok(stdout.trim().to_string())
    }

    /// Run a `show` command; a missing resource yields `None`
    pub async fn show(&self, args: &[&str]) -> Result<Option<Value>> {
        let full = with_output(args, "json");
        let output = self.output(&full).await?;
        if output.success {
            return parse_json(&output.stdout).map(Some);
        }
        if is_not_found(&output.stderr) {
            return Ok(None);
        }
        Err(command_error(&full, &output))
    }
}

fn with_output<'a>(args: &[&'a str], format: &'a str) -> Vec<&'a str> {
    let mut full = args.to_vec();
    full.extend(["-o", format]);
    full
}

fn parse_json(stdout: &str) -> Result<Value> {
    if stdout.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(stdout)?)
}

fn command_error(args: &[&str], output: &CommandOutput) -> Error {
    let command: Vec<&str> = args.iter().copied().take_while(|a| !a.starts_with('-')).collect();
    Error::Deployment(format!(
        "az {} failed: {}",
        command.join(" "),
        output.stderr.trim()
    ))
}

/// Whether CLI error output reports a resource that does not exist
pub fn is_not_found(stderr: &str) -> bool {
    ["ResourceNotFound", "ResourceGroupNotFound", "NotFound", "was not found", "could not be found"]
        .iter()
        .any(|marker| stderr.contains(marker))
}

/// Read a string at a JSON pointer, e.g. `/properties/endpoint`
pub fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Provisioning state of a resource, wherever the CLI places it
pub fn provisioning_state(value: &Value) -> Option<String> {
    string_at(value, "/properties/provisioningState")
        .or_else(|| string_at(value, "/provisioningState"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::ScriptedRunner;
    use serde_json::json;

    #[tokio::test]
    async fn test_show_missing_resource() {
        let runner = Arc::new(ScriptedRunner::new().on(
            "search service show",
            CommandOutput::failed("ERROR: (ResourceNotFound) The Resource 'srch-x' was not found."),
        ));
        let az = AzCli::new(runner.clone());
        let shown = az.show(&["search", "service", "show", "-n", "srch-x"]).await.unwrap();
        assert!(shown.is_none());
        assert_eq!(runner.calls()[0], "search service show -n srch-x -o json");
    }

    #[tokio::test]
    async fn test_show_other_failure_is_error() {
        let runner = Arc::new(ScriptedRunner::new().on(
            "group show",
            CommandOutput::failed("ERROR: AADSTS700082: The refresh token has expired"),
        ));
        let err = AzCli::new(runner).show(&["group", "show", "-n", "rg"]).await.unwrap_err();
        assert!(err.to_string().contains("az group show failed"));
    }

    #[tokio::test]
    async fn test_tsv_trims() {
        let runner = Arc::new(ScriptedRunner::new().on("group exists", CommandOutput::ok("false\n")));
        let value = AzCli::new(runner).tsv(&["group", "exists", "-n", "rg"]).await.unwrap();
        assert_eq!(value, "false");
    }

    #[test]
    fn test_provisioning_state_locations() {
        assert_eq!(
            provisioning_state(&json!({"properties": {"provisioningState": "Succeeded"}})).as_deref(),
            Some("Succeeded")
        );
        assert_eq!(
            provisioning_state(&json!({"provisioningState": "Creating"})).as_deref(),
            Some("Creating")
        );
        assert!(provisioning_state(&json!({})).is_none());
    }
}
