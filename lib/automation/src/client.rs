//! HTTP client for the remote Automation API.
//!
//! One endpoint per step kind, all POST. The response body is opaque to the
//! engine and stored verbatim in the run log; bodies that are not valid JSON
//! are preserved as JSON strings.

use crate::driver::{StepClient, StepResponse};
use crate::error::StepCallError;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{debug, instrument};

/// Client for the Automation API.
#[derive(Debug, Clone)]
pub struct AutomationClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl AutomationClient {
    /// Creates a client against the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            bearer_token: None,
        }
    }

    /// Attaches a bearer credential to every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

#[async_trait]
impl StepClient for AutomationClient {
    #[instrument(skip(self, payload))]
    async fn invoke(
        &self,
        endpoint: &str,
        payload: &JsonValue,
    ) -> Result<StepResponse, StepCallError> {
        let url = self.url_for(endpoint);
        let mut request = self.http.post(&url).json(payload);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| StepCallError::Transport {
            details: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| StepCallError::Transport {
                details: e.to_string(),
            })?;
        let body = serde_json::from_str(&text).unwrap_or(JsonValue::String(text));

        debug!(status, "automation api responded");
        Ok(StepResponse { status, body })
    }
}
