use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{Result, SharePushError};
use crate::flatten::flatten;
use crate::format::format_work;
use crate::records::{RecordStore, WORKS};
use crate::submit::GraphSubmitter;

/// Format and flatten one work into its `@graph` records.
pub fn build_payload(store: &RecordStore, key: &str) -> Result<Vec<serde_json::Value>> {
    let work = format_work(store, key)?;
    Ok(flatten(&work))
}

/// Keys of every work, in key order. A store with no records at all is a
/// setup problem; a `works` collection with zero rows is not.
pub fn work_keys(store: &RecordStore) -> Result<Vec<String>> {
    if store.is_empty() {
        return Err(SharePushError::EmptySource(
            "record store holds no records".into(),
        ));
    }
    let works = store.require_collection(WORKS)?;
    Ok(works.keys().map(String::from).collect())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub works_submitted: usize,
    pub records_submitted: usize,
}

/// Push every work in `store` through `submitter`, one work at a time.
/// The first formatting or submission failure stops the run.
pub async fn push_all(store: &RecordStore, submitter: &dyn GraphSubmitter) -> Result<RunSummary> {
    let keys = work_keys(store)?;
    info!(works = keys.len(), submitter = submitter.name(), "Starting push");

    let mut summary = RunSummary::default();
    for key in keys {
        let payload = build_payload(store, &key).map_err(|e| {
            error!(work = %key, error = %e, "Failed to format work");
            e
        })?;
        let records = payload.len();

        let receipt = submitter.submit(&payload).await.map_err(|e| {
            error!(work = %key, error = %e, "Submission failed");
            e
        })?;
        info!(work = %key, records, status = receipt.status, "Submitted work");

        summary.works_submitted += 1;
        summary.records_submitted += records;
    }

    info!(
        works = summary.works_submitted,
        records = summary.records_submitted,
        "Push complete"
    );
    Ok(summary)
}
