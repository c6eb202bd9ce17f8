use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the remote service said about an accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub status: u16,
    pub body: serde_json::Value,
}

/// Delivers one flattened work graph upstream.
#[async_trait]
pub trait GraphSubmitter: Send + Sync {
    fn name(&self) -> &str;

    /// Returns an error for missing credentials and any non-2xx response.
    async fn submit(&self, graph: &[serde_json::Value]) -> Result<SubmissionReceipt>;
}
