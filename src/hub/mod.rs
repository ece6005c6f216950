pub mod client;
pub mod types;

pub use client::HubClient;
pub use types::{AssetSummary, ImportOutcome, ImportRequest, ImportResponse};

use crate::config::ImportJob;

/// Single liveness check against the hub. Any error maps to `false`.
#[allow(async_fn_in_trait)]
pub trait HealthProbe {
    async fn check(&self) -> bool;
}

/// Issues exactly one import request and classifies the result.
/// Retrying is the caller's job.
#[allow(async_fn_in_trait)]
pub trait ImportInvoker {
    async fn invoke(&self, job: &ImportJob) -> ImportOutcome;
}
