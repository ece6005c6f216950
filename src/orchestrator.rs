use std::time::Duration;

use tokio::time::sleep;

use crate::config::{ImportJob, RunConfig};
use crate::error::ImportError;
use crate::hub::{HealthProbe, ImportInvoker};
use crate::report::{BatchReport, ReportAggregator};
use crate::retry::{
    AttemptRecord, JobAttempts, JobVerdict, NextStep, RetryEvent, RetryPolicy, RetryState,
};
use crate::waiter::ServerWaiter;

/// Hooks for following a batch as it runs. Every method defaults to a no-op.
pub trait BatchObserver {
    fn batch_started(&mut self, _total: usize) {}
    fn job_started(&mut self, _index: usize, _total: usize, _label: &str) {}
    fn attempt_failed(&mut self, _record: &AttemptRecord) {}
    fn recovery_wait(&mut self, _label: &str, _max_wait: Duration) {}
    fn backoff(&mut self, _label: &str, _delay: Duration) {}
    fn job_finished(&mut self, _index: usize, _label: &str, _verdict: &JobVerdict) {}
    fn paced(&mut self, _delay: Duration) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Drives the job list one job at a time, in order, through the retry states.
pub struct BatchOrchestrator<'a, P, I> {
    probe: &'a P,
    invoker: &'a I,
}

impl<'a, P: HealthProbe, I: ImportInvoker> BatchOrchestrator<'a, P, I> {
    pub fn new(probe: &'a P, invoker: &'a I) -> Self {
        Self { probe, invoker }
    }

    /// Run the whole batch.
    ///
    /// Fails only for configuration errors (before any network call) or when
    /// the server is not reachable within the startup deadline. Every per-job
    /// failure ends up in the returned report.
    pub async fn run(
        &self,
        config: &RunConfig,
        observer: &mut impl BatchObserver,
    ) -> Result<BatchReport, ImportError> {
        config.validate()?;

        let waiter = ServerWaiter::new(self.probe, config.poll_interval());
        tracing::info!(base_url = %config.base_url, "waiting for server");
        if !waiter.wait_until_healthy(config.startup_wait()).await {
            return Err(ImportError::ServerUnavailable {
                base_url: config.base_url.clone(),
                waited_secs: config.startup_wait_seconds,
            });
        }

        let policy = RetryPolicy::new(config.max_retries, config.delay());
        let total = config.imports.len();
        let mut report = ReportAggregator::new();

        tracing::info!(total, "starting batch import");
        observer.batch_started(total);

        for (i, job) in config.imports.iter().enumerate() {
            let index = i + 1;
            let label = job.label();
            tracing::info!(index, total, job = label, "importing");
            observer.job_started(index, total, label);

            let verdict = self
                .run_job(job, &policy, &waiter, config.recovery_wait(), &mut *observer)
                .await;

            match &verdict {
                JobVerdict::Imported(asset) => tracing::info!(
                    job = label,
                    name = %asset.name,
                    asset_type = %asset.asset_type,
                    files = asset.file_count,
                    "imported"
                ),
                JobVerdict::Exhausted(outcome) => tracing::error!(
                    job = label,
                    error = %outcome,
                    attempts = config.max_retries + 1,
                    "import failed after all attempts"
                ),
                // Recorded as a failure; the batch moves on to the next job.
                JobVerdict::ServerDown => {
                    tracing::error!(job = label, "server did not recover, recording failure")
                }
            }

            report.record(job, &verdict);
            observer.job_finished(index, label, &verdict);

            if index < total {
                observer.paced(config.delay());
                sleep(config.delay()).await;
            }
        }

        let report = report.finalize();
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            total = report.total,
            "import complete"
        );
        Ok(report)
    }

    async fn run_job(
        &self,
        job: &ImportJob,
        policy: &RetryPolicy,
        waiter: &ServerWaiter<'_, P>,
        recovery_wait: Duration,
        observer: &mut impl BatchObserver,
    ) -> JobVerdict {
        let label = job.label();
        let mut attempts = JobAttempts::new();

        loop {
            match attempts.next_step(policy) {
                NextStep::Invoke => {
                    let outcome = self.invoker.invoke(job).await;
                    if !outcome.is_success() {
                        tracing::warn!(
                            job = label,
                            attempt = attempts.attempt,
                            error = %outcome,
                            "attempt failed"
                        );
                    }
                    let state = policy.next(&mut attempts, RetryEvent::Outcome(outcome));
                    if let Some(record) = failed_attempt(label, &attempts, policy, state) {
                        observer.attempt_failed(&record);
                    }
                }
                NextStep::ProbeHealth => {
                    let healthy = self.probe.check().await;
                    policy.next(&mut attempts, RetryEvent::Probe { healthy });
                }
                NextStep::WaitForRecovery => {
                    tracing::warn!(
                        job = label,
                        max_wait_secs = recovery_wait.as_secs(),
                        "server appears down, waiting for recovery"
                    );
                    observer.recovery_wait(label, recovery_wait);
                    let recovered = waiter.wait_until_healthy(recovery_wait).await;
                    policy.next(&mut attempts, RetryEvent::Recovery { recovered });
                }
                NextStep::Backoff(delay) => {
                    tracing::info!(
                        job = label,
                        attempt = attempts.attempt,
                        backoff_secs = delay.as_secs(),
                        "retrying after backoff"
                    );
                    observer.backoff(label, delay);
                    sleep(delay).await;
                    policy.next(&mut attempts, RetryEvent::BackoffElapsed);
                }
                NextStep::Done(verdict) => return verdict,
            }
        }
    }
}

/// Record for an attempt that just failed. The backoff is the one it is
/// scheduled for; zero when the retry budget is spent.
fn failed_attempt(
    label: &str,
    attempts: &JobAttempts,
    policy: &RetryPolicy,
    state: RetryState,
) -> Option<AttemptRecord> {
    let backoff = match state {
        RetryState::Succeeded => return None,
        RetryState::CheckingHealth => policy.backoff_for(attempts.attempt),
        _ => Duration::ZERO,
    };
    attempts.last_outcome.as_ref().map(|outcome| AttemptRecord {
        label: label.to_string(),
        attempt_number: attempts.attempt,
        outcome: outcome.clone(),
        backoff_applied_seconds: backoff.as_secs(),
    })
}
