use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::attempt::JobAttempts;
use crate::hub::ImportOutcome;

/// Per-job retry states.
///
/// A job starts in `Attempting`. A failed attempt within budget moves through
/// `CheckingHealth` (one liveness probe), optionally `AwaitingRecovery`, then
/// `AwaitingBackoff` before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryState {
    Attempting,
    CheckingHealth,
    AwaitingRecovery,
    AwaitingBackoff,
    Succeeded,
    ExhaustedFailure,
    AbortedDown,
}

impl RetryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RetryState::Succeeded | RetryState::ExhaustedFailure | RetryState::AbortedDown
        )
    }
}

impl fmt::Display for RetryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryState::Attempting => write!(f, "ATTEMPTING"),
            RetryState::CheckingHealth => write!(f, "CHECKING_HEALTH"),
            RetryState::AwaitingRecovery => write!(f, "AWAITING_RECOVERY"),
            RetryState::AwaitingBackoff => write!(f, "AWAITING_BACKOFF"),
            RetryState::Succeeded => write!(f, "SUCCEEDED"),
            RetryState::ExhaustedFailure => write!(f, "EXHAUSTED_FAILURE"),
            RetryState::AbortedDown => write!(f, "ABORTED_DOWN"),
        }
    }
}

/// Inputs that drive a job's retry state forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryEvent {
    /// The import attempt finished with this outcome.
    Outcome(ImportOutcome),
    /// Answer of the single liveness probe after a failed attempt.
    Probe { healthy: bool },
    /// Result of the long recovery wait.
    Recovery { recovered: bool },
    /// The backoff sleep has been served.
    BackoffElapsed,
}

/// Retry budget and exponential backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Base delay; attempt `n` backs off `base_delay * 2^(n-1)`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Backoff served after failed attempt `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Apply `event` to the job and return the new state.
    ///
    /// Events that do not apply to the current state (including anything
    /// after a terminal state) leave the job untouched.
    pub fn next(&self, job: &mut JobAttempts, event: RetryEvent) -> RetryState {
        let next = match (job.state, event) {
            (RetryState::Attempting, RetryEvent::Outcome(outcome)) => {
                let state = if outcome.is_success() {
                    RetryState::Succeeded
                } else if job.attempt > self.max_retries {
                    RetryState::ExhaustedFailure
                } else {
                    RetryState::CheckingHealth
                };
                job.last_outcome = Some(outcome);
                state
            }
            (RetryState::CheckingHealth, RetryEvent::Probe { healthy: true }) => {
                RetryState::AwaitingBackoff
            }
            (RetryState::CheckingHealth, RetryEvent::Probe { healthy: false }) => {
                RetryState::AwaitingRecovery
            }
            (RetryState::AwaitingRecovery, RetryEvent::Recovery { recovered: true }) => {
                RetryState::AwaitingBackoff
            }
            (RetryState::AwaitingRecovery, RetryEvent::Recovery { recovered: false }) => {
                RetryState::AbortedDown
            }
            (RetryState::AwaitingBackoff, RetryEvent::BackoffElapsed) => {
                job.attempt += 1;
                RetryState::Attempting
            }
            (state, event) => {
                tracing::debug!(%state, ?event, "ignoring event that does not apply");
                return state;
            }
        };

        job.history.push(job.state);
        job.state = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_secs(1))
    }

    fn http_500() -> ImportOutcome {
        ImportOutcome::HttpError {
            status: 500,
            body_excerpt: "boom".into(),
        }
    }

    #[test]
    fn success_on_first_attempt() {
        let policy = policy(2);
        let mut job = JobAttempts::new();
        let state = policy.next(&mut job, RetryEvent::Outcome(ImportOutcome::Success(Default::default())));
        assert_eq!(state, RetryState::Succeeded);
        assert!(state.is_terminal());
        assert_eq!(job.attempt, 1);
    }

    #[test]
    fn failure_within_budget_checks_health_then_backs_off() {
        let policy = policy(2);
        let mut job = JobAttempts::new();

        assert_eq!(
            policy.next(&mut job, RetryEvent::Outcome(http_500())),
            RetryState::CheckingHealth
        );
        assert_eq!(
            policy.next(&mut job, RetryEvent::Probe { healthy: true }),
            RetryState::AwaitingBackoff
        );
        assert_eq!(
            policy.next(&mut job, RetryEvent::BackoffElapsed),
            RetryState::Attempting
        );
        assert_eq!(job.attempt, 2);
        assert_eq!(job.last_outcome, Some(http_500()));
    }

    #[test]
    fn exhausts_after_max_retries_plus_one_attempts() {
        let policy = policy(2);
        let mut job = JobAttempts::new();

        for _ in 0..2 {
            policy.next(&mut job, RetryEvent::Outcome(ImportOutcome::Timeout));
            policy.next(&mut job, RetryEvent::Probe { healthy: true });
            policy.next(&mut job, RetryEvent::BackoffElapsed);
        }
        assert_eq!(job.attempt, 3);

        let state = policy.next(&mut job, RetryEvent::Outcome(http_500()));
        assert_eq!(state, RetryState::ExhaustedFailure);
        assert_eq!(job.last_outcome, Some(http_500()));
    }

    #[test]
    fn zero_retries_fails_immediately() {
        let policy = policy(0);
        let mut job = JobAttempts::new();
        let state = policy.next(&mut job, RetryEvent::Outcome(ImportOutcome::Timeout));
        assert_eq!(state, RetryState::ExhaustedFailure);
    }

    #[test]
    fn unhealthy_probe_enters_recovery() {
        let policy = policy(2);
        let mut job = JobAttempts::new();
        policy.next(&mut job, RetryEvent::Outcome(ImportOutcome::Timeout));

        assert_eq!(
            policy.next(&mut job, RetryEvent::Probe { healthy: false }),
            RetryState::AwaitingRecovery
        );
        assert_eq!(
            policy.next(&mut job, RetryEvent::Recovery { recovered: true }),
            RetryState::AwaitingBackoff
        );
    }

    #[test]
    fn failed_recovery_aborts_the_job() {
        let policy = policy(2);
        let mut job = JobAttempts::new();
        policy.next(&mut job, RetryEvent::Outcome(ImportOutcome::Timeout));
        policy.next(&mut job, RetryEvent::Probe { healthy: false });

        let state = policy.next(&mut job, RetryEvent::Recovery { recovered: false });
        assert_eq!(state, RetryState::AbortedDown);
        assert!(state.is_terminal());
    }

    #[test]
    fn terminal_states_ignore_further_events() {
        let policy = policy(0);
        let mut job = JobAttempts::new();
        policy.next(&mut job, RetryEvent::Outcome(ImportOutcome::Timeout));

        let state = policy.next(&mut job, RetryEvent::BackoffElapsed);
        assert_eq!(state, RetryState::ExhaustedFailure);
        assert_eq!(job.attempt, 1);
    }

    #[test]
    fn mismatched_event_leaves_state_unchanged() {
        let policy = policy(2);
        let mut job = JobAttempts::new();
        let state = policy.next(&mut job, RetryEvent::Probe { healthy: true });
        assert_eq!(state, RetryState::Attempting);
        assert!(job.history.is_empty());
    }

    #[test]
    fn history_records_departed_states() {
        let policy = policy(2);
        let mut job = JobAttempts::new();
        policy.next(&mut job, RetryEvent::Outcome(ImportOutcome::Timeout));
        policy.next(&mut job, RetryEvent::Probe { healthy: false });
        policy.next(&mut job, RetryEvent::Recovery { recovered: true });
        policy.next(&mut job, RetryEvent::BackoffElapsed);

        assert_eq!(
            job.history,
            vec![
                RetryState::Attempting,
                RetryState::CheckingHealth,
                RetryState::AwaitingRecovery,
                RetryState::AwaitingBackoff,
            ]
        );
    }

    #[test]
    fn backoff_is_exponential_in_base_delay() {
        let policy = RetryPolicy::new(5, Duration::from_secs(3));
        assert_eq!(policy.backoff_for(1), Duration::from_secs(3));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(6));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(12));
        assert_eq!(policy.backoff_for(4), Duration::from_secs(24));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.backoff_for(64), Duration::from_secs(u32::MAX as u64));
    }

    #[test]
    fn state_display() {
        assert_eq!(RetryState::Attempting.to_string(), "ATTEMPTING");
        assert_eq!(RetryState::AbortedDown.to_string(), "ABORTED_DOWN");
    }
}
