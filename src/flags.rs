//! Client for the external feature flag service.
//!
//! Flag evaluation guards the assistant endpoint, so this client fails
//! closed: any transport error, non-success status, malformed body, timeout,
//! or missing service credential reports the flag as disabled rather than
//! surfacing an error to the caller. The `source` field records where the
//! answer came from so the degraded path is visible in logs and responses.

use std::time::Duration;

use crate::{config::AppConfig, errors::Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How long a flag evaluation may take before it counts as disabled.
const FLAG_TIMEOUT: Duration = Duration::from_secs(5);

/// The outcome of evaluating one flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagStatus {
    pub enabled: bool,
    /// Where the verdict came from: the service's own label, or `"error"`
    /// when evaluation failed and the flag defaulted to disabled
    pub source: String,
}

impl FlagStatus {
    fn failed_closed() -> Self {
        Self {
            enabled: false,
            source: "error".to_string(),
        }
    }
}

/// Evaluates flags against the flag service over HTTP.
#[derive(Debug, Clone)]
pub struct FeatureFlagClient {
    http: reqwest::Client,
    base_url: String,
    service_secret: Option<String>,
}

impl FeatureFlagClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(FLAG_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: config.flag_service_url.clone(),
            service_secret: config.flag_service_secret.clone(),
        })
    }

    /// Evaluates `flag_name` for `user_id`, so per-user overrides on the
    /// service side apply. Never returns an error: every failure mode
    /// collapses to `{ enabled: false, source: "error" }`.
    pub async fn is_feature_enabled(&self, flag_name: &str, user_id: &str) -> FlagStatus {
        let Some(secret) = &self.service_secret else {
            warn!("Flag '{flag_name}' evaluated without a service token; failing closed");
            return FlagStatus::failed_closed();
        };

        let url = format!("{}/flags/evaluate", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("user_id", user_id), ("feature_name", flag_name)])
            .header("X-Service-Token", secret)
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(
                    "Flag service returned {} for '{flag_name}'; failing closed",
                    response.status()
                );
                return FlagStatus::failed_closed();
            }
            Err(err) => {
                warn!("Flag service unreachable for '{flag_name}': {err}; failing closed");
                return FlagStatus::failed_closed();
            }
        };

        match response.json::<FlagStatus>().await {
            Ok(status) => status,
            Err(err) => {
                warn!("Flag service sent a malformed body for '{flag_name}': {err}; failing closed");
                FlagStatus::failed_closed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn config_with_flag_service(url: &str, secret: Option<&str>) -> AppConfig {
        AppConfig {
            port: 5000,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            model_api_key: None,
            model_base_url: "http://127.0.0.1:9".to_string(),
            model_name: "test-model".to_string(),
            flag_service_url: url.to_string(),
            flag_service_secret: secret.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_closed() -> Result<()> {
        // Port 9 (discard) is never listening
        let config = config_with_flag_service("http://127.0.0.1:9", Some("token"));
        let client = FeatureFlagClient::new(&config)?;

        let status = client.is_feature_enabled("ai_chat_assistant", "42").await;
        assert!(!status.enabled);
        assert_eq!(status.source, "error");

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_secret_fails_closed_without_a_request() -> Result<()> {
        let config = config_with_flag_service("http://127.0.0.1:9", None);
        let client = FeatureFlagClient::new(&config)?;

        let status = client.is_feature_enabled("ai_chat_assistant", "42").await;
        assert!(!status.enabled);
        assert_eq!(status.source, "error");

        Ok(())
    }

    #[tokio::test]
    async fn test_evaluation_sends_user_and_feature_params() -> Result<()> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        // One-shot server that records the request and answers with a verdict
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buffer = vec![0_u8; 4096];
            let read = socket.read(&mut buffer).await.expect("read request");
            let request = String::from_utf8_lossy(&buffer[..read]).to_string();

            let body = r#"{"feature_key":"ai_chat_assistant","enabled":true,"source":"override"}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            request
        });

        let config = config_with_flag_service(&format!("http://{addr}"), Some("service-token"));
        let client = FeatureFlagClient::new(&config)?;

        let status = client.is_feature_enabled("ai_chat_assistant", "42").await;
        assert!(status.enabled);
        assert_eq!(status.source, "override");

        let request = server.await.expect("server task");
        let request_line = request.lines().next().expect("request line");
        assert!(request_line.starts_with("GET /flags/evaluate?"));
        assert!(request_line.contains("user_id=42"));
        assert!(request_line.contains("feature_name=ai_chat_assistant"));
        assert!(request.contains("x-service-token: service-token"));

        Ok(())
    }
}
