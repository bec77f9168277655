//! Agent service REST client

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use frag_core::{Error, PollConfig, Result};

use crate::config::AgentsConfig;
use crate::types::{Agent, ListResponse, Run, RunStatus, Thread, ThreadMessage};

/// Client for the Foundry agent service, authenticated with a bearer token
pub struct AgentsClient {
    config: AgentsConfig,
    token: String,
    client: Client,
}

/// Everything produced by one prompt round-trip
#[derive(Debug, Clone)]
pub struct AgentConversation {
    pub agent: Agent,
    pub thread: Thread,
    pub run: Run,
    /// Thread messages in ascending order; empty when the run failed
    pub messages: Vec<ThreadMessage>,
}

impl AgentConversation {
    pub fn failed(&self) -> bool {
        self.run.status != RunStatus::Completed
    }
}

impl AgentsClient {
    /// Create a new client; the configuration must carry an access token
    pub fn new(config: AgentsConfig) -> Result<Self> {
        let token = config.access_token.clone().ok_or_else(|| {
            Error::Authentication(
                "No access token for the agent service. Set FOUNDRY_ACCESS_TOKEN or sign in with `az login`"
                    .to_string(),
            )
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            token,
            client,
        })
    }

    pub fn config(&self) -> &AgentsConfig {
        &self.config
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}/{}?api-version={}",
            self.config.project_endpoint.trim_end_matches('/'),
            path,
            self.config.api_version
        );
        for (key, value) in query {
            url.push_str(&format!("&{}={}", key, value));
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<T> {
        let url = self.url(path, query);
        debug!(%method, url = %url, "agent service request");

        let mut request = self.client.request(method, &url).bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(service_error(status, path, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.send(Method::GET, &format!("assistants/{}", agent_id), &[], None)
            .await
    }

    pub async fn create_thread(&self) -> Result<Thread> {
        self.send(Method::POST, "threads", &[], Some(json!({}))).await
    }

    pub async fn create_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage> {
        self.send(
            Method::POST,
            &format!("threads/{}/messages", thread_id),
            &[],
            Some(json!({ "role": "user", "content": content })),
        )
        .await
    }

    pub async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run> {
        self.send(
            Method::POST,
            &format!("threads/{}/runs", thread_id),
            &[],
            Some(json!({ "assistant_id": agent_id })),
        )
        .await
    }

    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.send(
            Method::GET,
            &format!("threads/{}/runs/{}", thread_id, run_id),
            &[],
            None,
        )
        .await
    }

    /// Messages of a thread, oldest first
    pub async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let response: ListResponse<ThreadMessage> = self
            .send(
                Method::GET,
                &format!("threads/{}/messages", thread_id),
                &[("order", "asc")],
                None,
            )
            .await?;
        Ok(response.data)
    }

    /// Send one prompt to the configured agent and wait for its reply
    pub async fn run_prompt(&self, prompt: &str) -> Result<AgentConversation> {
        let agent = self.get_agent(&self.config.agent_id).await?;
        let thread = self.create_thread().await?;
        info!(thread_id = %thread.id, "Created thread");

        self.create_message(&thread.id, prompt).await?;
        let run = self.create_run(&thread.id, &agent.id).await?;
        info!(run_id = %run.id, "Started run");

        let run = poll_run(&self.config.poll, || self.get_run(&thread.id, &run.id)).await?;
        let messages = if run.status == RunStatus::Completed {
            self.list_messages(&thread.id).await?
        } else {
            Vec::new()
        };

        Ok(AgentConversation {
            agent,
            thread,
            run,
            messages,
        })
    }
}

fn service_error(status: StatusCode, path: &str, body: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication(format!(
            "Agent service rejected the token ({}): {}",
            status, body
        )),
        _ => Error::Agent(format!(
            "Request to {} failed with status {}: {}",
            path, status, body
        )),
    }
}

/// Poll a run until it reaches a terminal status
///
/// `requires_action` stops polling with an error: tool outputs are not submitted
/// by this client.
pub async fn poll_run<F, Fut>(poll: &PollConfig, mut fetch: F) -> Result<Run>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Run>>,
{
    for attempt in 1..=poll.max_polls {
        let run = fetch().await?;
        if run.status == RunStatus::RequiresAction {
            return Err(Error::Agent(format!(
                "Run {} requires client action, which is not supported",
                run.id
            )));
        }
        if run.status.is_terminal() {
            return Ok(run);
        }

        debug!(attempt, status = ?run.status, "run still in progress");
        if attempt < poll.max_polls {
            sleep(poll.interval).await;
        }
    }

    Err(Error::Timeout(format!(
        "Run did not finish within {} seconds",
        poll.max_wait().as_secs()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn run_with(status: RunStatus) -> Run {
        Run {
            id: "run_1".to_string(),
            thread_id: "thread_1".to_string(),
            status,
            last_error: None,
        }
    }

    fn fast_poll(max_polls: u32) -> PollConfig {
        PollConfig::new(Duration::from_millis(1), max_polls)
    }

    #[test]
    fn test_new_requires_token() {
        let config = AgentsConfig::new("https://a.services.ai.azure.com/api/projects/p".to_string(), "asst_1".to_string());
        let err = AgentsClient::new(config).err().unwrap();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn test_url_with_query() {
        let config = AgentsConfig::new(
            "https://a.services.ai.azure.com/api/projects/p/".to_string(),
            "asst_1".to_string(),
        )
        .with_access_token("t");
        let client = AgentsClient::new(config).unwrap();
        assert_eq!(
            client.url("threads/thread_1/messages", &[("order", "asc")]),
            "https://a.services.ai.azure.com/api/projects/p/threads/thread_1/messages?api-version=v1&order=asc"
        );
    }

    #[test]
    fn test_service_error_not_found() {
        let err = service_error(StatusCode::NOT_FOUND, "assistants/asst_x", "{}");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_poll_run_until_completed() {
        let calls = AtomicU32::new(0);
        let run = poll_run(&fast_poll(10), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(run_with(if n < 2 {
                    RunStatus::InProgress
                } else {
                    RunStatus::Completed
                }))
            }
        })
        .await
        .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_run_returns_failed_run() {
        let run = poll_run(&fast_poll(5), || async { Ok(run_with(RunStatus::Failed)) })
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_poll_run_times_out() {
        let calls = AtomicU32::new(0);
        let err = poll_run(&fast_poll(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(run_with(RunStatus::Queued)) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_run_rejects_requires_action() {
        let err = poll_run(&fast_poll(5), || async { Ok(run_with(RunStatus::RequiresAction)) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Agent(_)));
    }
}
