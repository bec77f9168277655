//! Agent service resources

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
}

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

impl RunStatus {
    /// Whether polling can stop at this status
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::Incomplete
                | RunStatus::RequiresAction
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextValue {
    pub value: String,
}

/// One content part of a message; only text parts are rendered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Value of the last text part, if any
    pub fn last_text(&self) -> Option<&str> {
        self.content.iter().rev().find_map(|part| match part {
            MessageContent::Text { text } => Some(text.value.as_str()),
            MessageContent::Other => None,
        })
    }
}

/// Envelope of list operations
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub data: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_terminal() {
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::InProgress.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::RequiresAction.is_terminal());
    }

    #[test]
    fn test_run_deserializes_last_error() {
        let run: Run = serde_json::from_str(
            r#"{"id": "run_1", "thread_id": "thread_1", "status": "failed",
                "last_error": {"code": "rate_limit_exceeded", "message": "Rate limit is exceeded."}}"#,
        )
        .unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(
            run.last_error.unwrap().to_string(),
            "rate_limit_exceeded: Rate limit is exceeded."
        );
    }

    #[test]
    fn test_last_text_skips_non_text_parts() {
        let message: ThreadMessage = serde_json::from_str(
            r#"{"id": "msg_1", "role": "assistant", "content": [
                {"type": "text", "text": {"value": "first", "annotations": []}},
                {"type": "text", "text": {"value": "second", "annotations": []}},
                {"type": "image_file", "image_file": {"file_id": "f"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(message.last_text(), Some("second"));
    }
}
