//! Gemini REST client.
//!
//! `POST {endpoint}/models/{model}:generateContent` with the key in the
//! `x-goog-api-key` header. Non-2xx responses become
//! [`BackendError::Status`] carrying the response body, so quota errors (429)
//! surface with the service's own explanation.

use super::{BackendError, GenerateRequest, GenerateResponse, GenerativeBackend};
use crate::config::ApiConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub struct GeminiBackend {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiBackend {
    /// Build a client from config, reading the key from `api.api_key_env`.
    pub fn from_config(api: &ApiConfig) -> Result<Self, BackendError> {
        let api_key = std::env::var(&api.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| BackendError::MissingApiKey(api.api_key_env.clone()))?;
        Self::new(&api.endpoint, api_key, Duration::from_secs(api.timeout_secs))
    }

    pub fn new(
        endpoint: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, BackendError> {
        let url = self.url(model);
        debug!(%url, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
