use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ImportJob;
use crate::hub::types::excerpt;
use crate::retry::JobVerdict;

const REPORT_DETAIL_EXCERPT: usize = 200;

/// A job that ended in failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub item: String,
    pub error: String,
    pub detail: String,
}

/// A job that was imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedEntry {
    pub item: String,
    pub name: String,
    pub asset_type: String,
    pub file_count: u64,
}

/// Summary of a whole batch run. `succeeded + failed == total`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub imported: Vec<ImportedEntry>,
    pub failures: Vec<FailureEntry>,
}

/// Accumulates job verdicts in processing order. Purely additive.
pub struct ReportAggregator {
    run_id: String,
    started_at: DateTime<Utc>,
    succeeded: usize,
    imported: Vec<ImportedEntry>,
    failures: Vec<FailureEntry>,
}

impl Default for ReportAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            succeeded: 0,
            imported: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, job: &ImportJob, verdict: &JobVerdict) {
        let item = job.label().to_string();
        match verdict {
            JobVerdict::Imported(asset) => {
                self.succeeded += 1;
                self.imported.push(ImportedEntry {
                    item,
                    name: asset.name.clone(),
                    asset_type: asset.asset_type.clone(),
                    file_count: asset.file_count,
                });
            }
            JobVerdict::Exhausted(outcome) => self.failures.push(FailureEntry {
                item,
                error: outcome.to_string(),
                detail: excerpt(outcome.detail(), REPORT_DETAIL_EXCERPT),
            }),
            JobVerdict::ServerDown => self.failures.push(FailureEntry {
                item,
                error: "Server down".to_string(),
                detail: String::new(),
            }),
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    pub fn finalize(self) -> BatchReport {
        let failed = self.failures.len();
        BatchReport {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            total: self.succeeded + failed,
            succeeded: self.succeeded,
            failed,
            imported: self.imported,
            failures: self.failures,
        }
    }
}
