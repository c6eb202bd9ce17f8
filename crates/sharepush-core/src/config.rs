use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SharePushError};

const DEFAULT_SHARE_URL: &str = "https://staging-share.osf.io/api/v2/";
const NORMALIZED_DATA_PATH: &str = "normalizeddata/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub share_url: String,
    pub access_token: Option<String>,
    pub source_name: String,
    pub data_dir: String,
    pub request_timeout_secs: u64,
    pub dry_run: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            share_url: DEFAULT_SHARE_URL.into(),
            access_token: None,
            source_name: "sharepush".into(),
            data_dir: "data".into(),
            request_timeout_secs: 30,
            dry_run: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            share_url: std::env::var("SHARE_URL").unwrap_or(defaults.share_url),
            access_token: std::env::var("SHARE_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            source_name: std::env::var("SHARE_SOURCE_NAME").unwrap_or(defaults.source_name),
            data_dir: std::env::var("SHAREPUSH_DATA_DIR").unwrap_or(defaults.data_dir),
            request_timeout_secs: std::env::var("SHAREPUSH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            dry_run: std::env::var("SHAREPUSH_DRY_RUN")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    /// The `normalizeddata/` endpoint under the configured API root.
    pub fn submission_url(&self) -> Result<Url> {
        let mut base = self.share_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)
            .map_err(|e| SharePushError::Config(format!("invalid SHARE_URL {base:?}: {e}")))?;
        base.join(NORMALIZED_DATA_PATH)
            .map_err(|e| SharePushError::Config(format!("cannot build submission URL: {e}")))
    }

    pub fn require_token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .ok_or_else(|| SharePushError::MissingCredential {
                source_name: self.source_name.clone(),
            })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_url_appends_endpoint() {
        let config = AppConfig::default();
        assert_eq!(
            config.submission_url().unwrap().as_str(),
            "https://staging-share.osf.io/api/v2/normalizeddata/"
        );
    }

    #[test]
    fn submission_url_tolerates_missing_trailing_slash() {
        let config = AppConfig {
            share_url: "https://share.osf.io/api/v2".into(),
            ..AppConfig::default()
        };
        assert_eq!(
            config.submission_url().unwrap().as_str(),
            "https://share.osf.io/api/v2/normalizeddata/"
        );
    }

    #[test]
    fn invalid_share_url_is_config_error() {
        let config = AppConfig {
            share_url: "not a url".into(),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.submission_url(),
            Err(SharePushError::Config(_))
        ));
    }

    #[test]
    fn missing_token_is_reported() {
        let config = AppConfig {
            source_name: "osf".into(),
            ..AppConfig::default()
        };
        match config.require_token() {
            Err(SharePushError::MissingCredential { source_name }) => {
                assert_eq!(source_name, "osf")
            }
            other => panic!("expected MissingCredential, got {other:?}"),
        }
    }

    #[test]
    fn token_is_returned_when_present() {
        let config = AppConfig {
            access_token: Some("abc".into()),
            ..AppConfig::default()
        };
        assert_eq!(config.require_token().unwrap(), "abc");
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
