mod client;
mod dry_run;

pub use client::{ShareClient, JSON_API_CONTENT_TYPE};
pub use dry_run::DryRunSubmitter;
