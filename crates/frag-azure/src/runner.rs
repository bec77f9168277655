//! Process-backed command runner

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use frag_core::{CommandOutput, CommandRunner, Error, Result};

/// Runs programs as child processes and captures their output
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!(program, args = %redact(args).join(" "), "running command");

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::Configuration(format!(
                    "{} not found on PATH. Install it and try again",
                    program
                )),
                _ => Error::Io(e),
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Hide the value following `--value` so secrets stay out of logs
pub fn redact(args: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut hide_next = false;
    for arg in args {
        if hide_next {
            out.push("***".to_string());
            hide_next = false;
        } else {
            hide_next = arg == "--value";
            out.push(arg.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_secret_values() {
        let args: Vec<String> = ["keyvault", "secret", "set", "--name", "k", "--value", "s3cret"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            redact(&args).join(" "),
            "keyvault secret set --name k --value ***"
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_configuration_error() {
        let err = ProcessRunner::new()
            .run("frag-definitely-missing-binary", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
