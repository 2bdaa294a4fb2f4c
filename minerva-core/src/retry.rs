//! Retry policy shared by every orchestrator activity, generalized from the
//! teacher's inline stage-retry handling into a reusable type.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub backoff_coefficient: f64,
    pub max_interval: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// The default policy for LLM-backed and graph-write activities:
    /// 2s initial, doubling, capped at 5 minutes, 3 attempts.
    pub fn activity_default() -> Self {
        Self {
            initial_interval: Duration::from_secs(2),
            backoff_coefficient: 2.0,
            max_interval: Duration::from_secs(5 * 60),
            max_attempts: 3,
        }
    }

    /// The interval to wait before retrying the given 1-indexed attempt
    /// number, or `None` if attempts are exhausted.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let scaled = self.initial_interval.as_secs_f64() * self.backoff_coefficient.powi(attempt as i32 - 1);
        let capped = scaled.min(self.max_interval.as_secs_f64());
        Some(Duration::from_secs_f64(capped.max(0.0)))
    }

    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backs_off_and_caps() {
        let policy = RetryPolicy::activity_default();
        assert_eq!(policy.backoff_for_attempt(1), Some(Duration::from_secs(2)));
        assert_eq!(policy.backoff_for_attempt(2), Some(Duration::from_secs(4)));
        assert_eq!(policy.backoff_for_attempt(3), None);
    }
}
