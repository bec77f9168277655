//! Common types used across Foundry RAG

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Linear retry behaviour: fixed delay between attempts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Fixed-interval polling behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_polls: u32,
}

impl PollConfig {
    pub fn new(interval: Duration, max_polls: u32) -> Self {
        Self {
            interval,
            max_polls,
        }
    }

    /// Upper bound on the total time spent polling
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_polls
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            max_polls: 80,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_max_wait() {
        let poll = PollConfig::new(Duration::from_secs(2), 10);
        assert_eq!(poll.max_wait(), Duration::from_secs(20));
    }

    #[test]
    fn test_retry_default() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.delay, Duration::from_secs(5));
    }
}
