//! Async HTTP client for the OpenAI API.

use crate::OPENAI_BASE_URL;
use crate::action::ProviderRequest;
use crate::error::Fault;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Boxed future returned by [`Remote::call`].
///
/// Type alias to keep trait signatures and implementations readable.
pub type CallFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, Fault>> + Send + 'a>>;

/// The seam between the dispatcher and the remote service: one
/// request-object-in / raw-response-out async operation.
///
/// [`OpenAiClient`] is the production implementation; dispatcher tests
/// substitute stubs that return canned responses or faults.
pub trait Remote: Send + Sync {
    fn call<'a>(&'a self, request: &'a ProviderRequest) -> CallFuture<'a>;
}

/// Immutable handle to the OpenAI API: credentials, optional organization,
/// and base endpoint. Built once per node, shared by all in-flight envelopes.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    organization: Option<String>,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client against the default endpoint.
    pub fn new(
        api_key: impl Into<String>,
        organization: Option<String>,
    ) -> Result<Self, Fault> {
        let client = reqwest::Client::builder()
            .user_agent("relay-rs/0.1")
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Fault::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            organization,
            base_url: OPENAI_BASE_URL.to_string(),
        })
    }

    /// Point the client at an alternate endpoint.
    ///
    /// A bare host URL gets `/v1` appended. An unparseable value is a
    /// [`Fault::InvalidBaseUrl`] — callers keep the client usable with the
    /// default endpoint and surface a misconfiguration status instead of
    /// failing setup.
    pub fn set_base_url(&mut self, base_url: &str) -> Result<(), Fault> {
        let mut url = reqwest::Url::parse(base_url)
            .map_err(|_| Fault::InvalidBaseUrl(base_url.to_string()))?;
        if url.path() == "/" {
            url.set_path("/v1");
        }
        self.base_url = url.to_string().trim_end_matches('/').to_string();
        Ok(())
    }

    /// The endpoint currently in use.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, request: &ProviderRequest) -> Result<Value, Fault> {
        let endpoint = request.endpoint();
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("OpenAI request: POST {endpoint}");
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(request).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request);
        if let Some(org) = &self.organization {
            builder = builder.header("OpenAI-Organization", org);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| Fault::Transport(format!("request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Fault::Transport(format!("failed to read response: {e}")))?;

        debug!(
            "OpenAI response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            // A response arrived, so this is the service speaking — keep the
            // body structured when it parses, verbatim otherwise.
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(Fault::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| Fault::Transport(format!("failed to parse response: {e}")))
    }
}

impl Remote for OpenAiClient {
    fn call<'a>(&'a self, request: &'a ProviderRequest) -> CallFuture<'a> {
        Box::pin(self.post(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiClient {
        OpenAiClient::new("sk-test", None).unwrap()
    }

    #[test]
    fn defaults_to_the_openai_endpoint() {
        assert_eq!(client().base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn bare_host_gets_v1_appended() {
        let mut c = client();
        c.set_base_url("https://proxy.example.com").unwrap();
        assert_eq!(c.base_url(), "https://proxy.example.com/v1");
    }

    #[test]
    fn explicit_path_is_kept() {
        let mut c = client();
        c.set_base_url("https://proxy.example.com/openai/v1/").unwrap();
        assert_eq!(c.base_url(), "https://proxy.example.com/openai/v1");
    }

    #[test]
    fn invalid_base_url_is_a_config_fault_and_keeps_default() {
        let mut c = client();
        let err = c.set_base_url("not a url").unwrap_err();
        assert!(matches!(err, Fault::InvalidBaseUrl(_)));
        assert_eq!(c.base_url(), "https://api.openai.com/v1");
    }
}
