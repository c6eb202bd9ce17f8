use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use sharepush_core::envelope::NormalizedDataEnvelope;
use sharepush_core::error::Result;
use sharepush_core::submit::{GraphSubmitter, SubmissionReceipt};

/// Writes each envelope as pretty JSON instead of posting it. Needs no
/// credentials.
pub struct DryRunSubmitter<W: Write + Send> {
    out: Mutex<W>,
}

impl DryRunSubmitter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> DryRunSubmitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<W: Write + Send> GraphSubmitter for DryRunSubmitter<W> {
    fn name(&self) -> &str {
        "dry_run"
    }

    async fn submit(&self, graph: &[serde_json::Value]) -> Result<SubmissionReceipt> {
        let envelope = NormalizedDataEnvelope::new(graph.to_vec());
        let rendered = serde_json::to_string_pretty(&envelope)?;
        {
            let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            writeln!(out, "{rendered}")?;
        }
        info!(records = graph.len(), "Dry run, envelope written instead of posted");
        Ok(SubmissionReceipt {
            status: 200,
            body: serde_json::Value::Null,
        })
    }
}
