use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::hub::HealthProbe;

/// Polls a [`HealthProbe`] on a fixed interval until it answers or a deadline passes.
pub struct ServerWaiter<'a, P> {
    probe: &'a P,
    poll_interval: Duration,
}

impl<'a, P: HealthProbe> ServerWaiter<'a, P> {
    pub fn new(probe: &'a P, poll_interval: Duration) -> Self {
        Self {
            probe,
            poll_interval,
        }
    }

    /// Returns `true` as soon as a probe succeeds, `false` once `max_wait`
    /// has elapsed since the call began. Probes are only issued while the
    /// elapsed time is still below the deadline.
    pub async fn wait_until_healthy(&self, max_wait: Duration) -> bool {
        let start = Instant::now();
        let mut probes = 0u32;
        while start.elapsed() < max_wait {
            probes += 1;
            if self.probe.check().await {
                tracing::debug!(probes, "server is healthy");
                return true;
            }
            sleep(self.poll_interval).await;
        }
        tracing::warn!(
            probes,
            waited_secs = start.elapsed().as_secs(),
            "server did not become healthy before the deadline"
        );
        false
    }
}
