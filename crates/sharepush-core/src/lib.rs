pub mod config;
pub mod envelope;
pub mod error;
pub mod flatten;
pub mod format;
pub mod node;
pub mod pipeline;
pub mod records;
pub mod source;
pub mod submit;

pub use config::AppConfig;
pub use envelope::NormalizedDataEnvelope;
pub use error::{Result, SharePushError};
pub use flatten::{flatten, flatten_from};
pub use format::{format_work, Contribution, WorkGraph};
pub use node::{AttrValue, Graph, Node, NodeId, Scalar};
pub use pipeline::{build_payload, push_all, work_keys, RunSummary};
pub use records::{split_multi, Collection, Record, RecordStore};
pub use source::RecordSource;
pub use submit::{GraphSubmitter, SubmissionReceipt};
