//! Scripted command runner for orchestration tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use frag_core::{CommandOutput, CommandRunner, Result};

struct Rule {
    prefix: String,
    outputs: VecDeque<CommandOutput>,
}

/// Answers commands by argument prefix and records every call
///
/// Rules match in insertion order. A rule with several outputs hands them out in
/// turn and repeats the last one. Unmatched commands succeed with `{}`.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, prefix: &str, output: CommandOutput) -> Self {
        self.on_seq(prefix, vec![output])
    }

    pub fn on_seq(self, prefix: &str, outputs: Vec<CommandOutput>) -> Self {
        self.rules.lock().unwrap().push(Rule {
            prefix: prefix.to_string(),
            outputs: outputs.into(),
        });
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose arguments start with `prefix`
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, _program: &str, args: &[String]) -> Result<CommandOutput> {
        let joined = args.join(" ");
        self.calls.lock().unwrap().push(joined.clone());

        let mut rules = self.rules.lock().unwrap();
        for rule in rules.iter_mut() {
            if joined.starts_with(&rule.prefix) {
                let output = if rule.outputs.len() > 1 {
                    rule.outputs.pop_front()
                } else {
                    rule.outputs.front().cloned()
                };
                return Ok(output.unwrap_or_default());
            }
        }
        Ok(CommandOutput::ok("{}"))
    }
}
