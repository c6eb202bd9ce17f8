use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, error, info};
use url::Url;

use sharepush_core::config::AppConfig;
use sharepush_core::envelope::NormalizedDataEnvelope;
use sharepush_core::error::{Result, SharePushError};
use sharepush_core::submit::{GraphSubmitter, SubmissionReceipt};

pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// Posts flattened work graphs to the SHARE `normalizeddata/` endpoint.
pub struct ShareClient {
    client: Client,
    endpoint: Url,
    access_token: Option<String>,
    source_name: String,
}

impl ShareClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Self::client_builder(config).build()?;
        Self::with_client(config, client)
    }

    fn client_builder(config: &AppConfig) -> reqwest::ClientBuilder {
        Client::builder()
            .user_agent(concat!("sharepush/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
    }

    pub fn with_client(config: &AppConfig, client: Client) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: config.submission_url()?,
            access_token: config.access_token.clone(),
            source_name: config.source_name.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .ok_or_else(|| SharePushError::MissingCredential {
                source_name: self.source_name.clone(),
            })
    }
}

#[async_trait]
impl GraphSubmitter for ShareClient {
    fn name(&self) -> &str {
        "share"
    }

    async fn submit(&self, graph: &[serde_json::Value]) -> Result<SubmissionReceipt> {
        let token = self.token()?;
        let envelope = NormalizedDataEnvelope::new(graph.to_vec());

        debug!(endpoint = %self.endpoint, records = graph.len(), "Posting normalized data");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, JSON_API_CONTENT_TYPE)
            .body(serde_json::to_vec(&envelope)?)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        info!(status = status.as_u16(), body = %body, "SHARE responded");

        if status.is_client_error() {
            let payload = serde_json::to_value(&envelope)?;
            error!(
                status = status.as_u16(),
                body = %body,
                payload = %payload,
                "SHARE rejected the submitted graph"
            );
            return Err(SharePushError::Rejected {
                status: status.as_u16(),
                body,
                payload,
            });
        }
        if !status.is_success() {
            return Err(SharePushError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let body = serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body));
        Ok(SubmissionReceipt {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one request with a canned response; yields the raw
    /// request text.
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}/api/v2/"), handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    fn local_client(config: &AppConfig) -> ShareClient {
        let client = ShareClient::client_builder(config).no_proxy().build().unwrap();
        ShareClient::with_client(config, client).unwrap()
    }

    fn config(share_url: String, token: Option<&str>) -> AppConfig {
        AppConfig {
            share_url,
            access_token: token.map(String::from),
            source_name: "test-source".into(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn endpoint_is_derived_from_config() {
        let client = ShareClient::new(&config("https://share.osf.io/api/v2/".into(), None)).unwrap();
        assert_eq!(client.endpoint().as_str(), "https://share.osf.io/api/v2/normalizeddata/");
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_request() {
        // Nothing listens here; reaching the network would surface an Http error.
        let client = local_client(&config("http://127.0.0.1:9/".into(), None));
        let result = client.submit(&[json!({"@id": "_:a", "@type": "tag"})]).await;
        assert!(matches!(
            result,
            Err(SharePushError::MissingCredential { ref source_name }) if source_name == "test-source"
        ));
    }

    #[tokio::test]
    async fn successful_submission_sends_envelope_and_headers() {
        let (url, server) = one_shot_server("202 Accepted", r#"{"data":{"id":"42"}}"#).await;
        let client = local_client(&config(url, Some("secret")));

        let receipt = client
            .submit(&[json!({"@id": "_:a", "@type": "tag", "name": "rust"})])
            .await
            .unwrap();
        assert_eq!(receipt.status, 202);
        assert_eq!(receipt.body["data"]["id"], "42");

        let request = server.await.unwrap();
        let lower = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /api/v2/normalizeddata/ HTTP/1.1"));
        assert!(lower.contains("authorization: bearer secret"));
        assert!(lower.contains("content-type: application/vnd.api+json"));
        assert!(request.contains(r#""@graph":[{"#));
        assert!(request.contains(r#""type":"NormalizedData""#));
    }

    #[tokio::test]
    async fn client_error_is_a_rejection_with_context() {
        let (url, server) = one_shot_server("400 Bad Request", r#"{"errors":["bad graph"]}"#).await;
        let client = local_client(&config(url, Some("secret")));

        let result = client.submit(&[json!({"@id": "_:a", "@type": "tag"})]).await;
        match result {
            Err(SharePushError::Rejected {
                status,
                body,
                payload,
            }) => {
                assert_eq!(status, 400);
                assert!(body.contains("bad graph"));
                assert_eq!(payload["data"]["attributes"]["data"]["@graph"][0]["@id"], "_:a");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn rejection_message_shows_body_and_sent_graph() {
        let (url, server) = one_shot_server("422 Unprocessable Entity", r#"{"errors":["dangling ref"]}"#).await;
        let client = local_client(&config(url, Some("secret")));

        let result = client.submit(&[json!({"@id": "_:marked-node", "@type": "tag"})]).await;
        match result {
            Err(e @ SharePushError::Rejected { .. }) => {
                let message = e.to_string();
                assert!(message.contains("422"));
                assert!(message.contains("dangling ref"));
                assert!(message.contains("_:marked-node"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn server_error_is_a_remote_error() {
        let (url, server) = one_shot_server("503 Service Unavailable", "down").await;
        let client = local_client(&config(url, Some("secret")));

        let result = client.submit(&[]).await;
        assert!(matches!(result, Err(SharePushError::Remote { status: 503, .. })));
        server.await.unwrap();
    }
}
