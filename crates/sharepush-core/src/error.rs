use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharePushError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No access token for {source_name}; refusing to submit")]
    MissingCredential { source_name: String },

    #[error("No input records found: {0}")]
    EmptySource(String),

    #[error("Missing collection: {0}")]
    MissingCollection(String),

    #[error("Work {work}: no record '{key}' in collection '{collection}'")]
    LookupFailed {
        collection: String,
        key: String,
        work: String,
    },

    #[error("Record '{key}' in '{collection}' has no '{field}' column")]
    MissingField {
        collection: String,
        key: String,
        field: String,
    },

    #[error("Invalid value {value:?} for '{field}': {reason}")]
    InvalidField {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Parse error in {source_name} line {line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("Submission rejected with HTTP {status}: {body}; payload: {payload}")]
    Rejected {
        status: u16,
        body: String,
        payload: serde_json::Value,
    },

    #[error("Remote service returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, SharePushError>;
