//! Transport to the remote analysis proxy.
//!
//! One POST, JSON in, plain text out. The trait exists so the orchestrator
//! can be tested against recorded replies without a server.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("proxy returned HTTP {status}")]
    Http { status: u16 },
    #[error("proxy transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisRequestBody<'a> {
    text_segment: &'a str,
    user_goal: &'a str,
}

#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    /// False when the endpoint is missing or still a placeholder.
    fn is_configured(&self) -> bool;

    /// Send text and goal to the proxy; the reply body is the raw
    /// tag-delimited blob, not JSON.
    async fn request_analysis(&self, text: &str, goal: &str) -> Result<String, ProxyError>;
}

pub struct HttpProxy {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpProxy {
    /// `timeout` bounds the whole call; the host's default would be
    /// effectively unbounded, which doesn't mix with a 15s sampler cooldown.
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client, endpoint }
    }
}

#[async_trait]
impl AnalysisTransport for HttpProxy {
    fn is_configured(&self) -> bool {
        let endpoint = self.endpoint.trim();
        !endpoint.is_empty() && !endpoint.contains("YOUR_") && endpoint.starts_with("http")
    }

    async fn request_analysis(&self, text: &str, goal: &str) -> Result<String, ProxyError> {
        let body = AnalysisRequestBody {
            text_segment: text,
            user_goal: goal,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Http {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(endpoint: &str) -> HttpProxy {
        HttpProxy::new(endpoint.to_string(), Duration::from_secs(10))
    }

    #[test]
    fn empty_endpoint_is_unconfigured() {
        assert!(!proxy("").is_configured());
        assert!(!proxy("   ").is_configured());
    }

    #[test]
    fn placeholder_endpoint_is_unconfigured() {
        assert!(!proxy("https://YOUR_PROXY_HERE.example.com/analyze").is_configured());
    }

    #[test]
    fn non_http_endpoint_is_unconfigured() {
        assert!(!proxy("not-a-url").is_configured());
    }

    #[test]
    fn real_endpoint_is_configured() {
        assert!(proxy("https://proxy.example.com/analyze").is_configured());
    }

    #[test]
    fn request_body_uses_wire_field_names() {
        let body = AnalysisRequestBody {
            text_segment: "some text",
            user_goal: "reduce_biases",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["textSegment"], "some text");
        assert_eq!(json["userGoal"], "reduce_biases");
    }
}
