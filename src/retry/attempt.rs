use std::time::Duration;

use super::state::{RetryPolicy, RetryState};
use crate::hub::{AssetSummary, ImportOutcome};

/// Progress of a single job through the retry states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobAttempts {
    /// Current attempt, 1-based.
    pub attempt: u32,
    pub state: RetryState,
    /// States left behind, in order.
    pub history: Vec<RetryState>,
    pub last_outcome: Option<ImportOutcome>,
}

impl Default for JobAttempts {
    fn default() -> Self {
        Self::new()
    }
}

/// What the driver has to do next for a job in a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    Invoke,
    ProbeHealth,
    WaitForRecovery,
    Backoff(Duration),
    Done(JobVerdict),
}

/// Terminal result of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobVerdict {
    Imported(AssetSummary),
    /// Retry budget exhausted; carries the last attempt's outcome.
    Exhausted(ImportOutcome),
    /// The server stayed down through the recovery wait.
    ServerDown,
}

impl JobVerdict {
    pub fn is_success(&self) -> bool {
        matches!(self, JobVerdict::Imported(_))
    }
}

impl JobAttempts {
    pub fn new() -> Self {
        Self {
            attempt: 1,
            state: RetryState::Attempting,
            history: Vec::new(),
            last_outcome: None,
        }
    }

    pub fn next_step(&self, policy: &RetryPolicy) -> NextStep {
        match self.state {
            RetryState::Attempting => NextStep::Invoke,
            RetryState::CheckingHealth => NextStep::ProbeHealth,
            RetryState::AwaitingRecovery => NextStep::WaitForRecovery,
            RetryState::AwaitingBackoff => NextStep::Backoff(policy.backoff_for(self.attempt)),
            RetryState::Succeeded => match &self.last_outcome {
                Some(ImportOutcome::Success(asset)) => NextStep::Done(JobVerdict::Imported(asset.clone())),
                _ => NextStep::Done(JobVerdict::Imported(AssetSummary::default())),
            },
            RetryState::ExhaustedFailure => NextStep::Done(JobVerdict::Exhausted(
                self.last_outcome.clone().unwrap_or(ImportOutcome::UnknownError {
                    message: "Unknown".into(),
                }),
            )),
            RetryState::AbortedDown => NextStep::Done(JobVerdict::ServerDown),
        }
    }
}

/// One failed attempt, emitted as soon as the failure is observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub label: String,
    pub attempt_number: u32,
    pub outcome: ImportOutcome,
    /// Backoff scheduled before the next attempt; zero once the budget is spent.
    /// Not served if the server stays down through the recovery wait.
    pub backoff_applied_seconds: u64,
}
