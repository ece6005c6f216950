mod attempt;
mod state;

pub use attempt::{AttemptRecord, JobAttempts, JobVerdict, NextStep};
pub use state::{RetryEvent, RetryPolicy, RetryState};
