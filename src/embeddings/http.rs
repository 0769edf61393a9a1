//! OpenAI-compatible HTTP embedding provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::types::RetrievalError;

/// Embedding provider backed by an OpenAI-compatible `/embeddings` endpoint.
///
/// Provider failures are fatal for the current call and are never retried
/// internally; a timeout, when wanted, belongs on the injected
/// [`reqwest::Client`], not in this core.
#[derive(Clone, Debug)]
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbeddingProvider {
    /// Creates a provider for `base_url` (e.g. `https://api.openai.com/v1`)
    /// and the given model identifier.
    pub fn new(base_url: impl AsRef<str>, model: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, model)
    }

    /// Creates a provider reusing an existing HTTP client, so callers can
    /// configure timeouts, proxies, or connection pooling.
    pub fn with_client(
        client: Client,
        base_url: impl AsRef<str>,
        model: impl Into<String>,
    ) -> Self {
        let endpoint = format!("{}/embeddings", base_url.as_ref().trim_end_matches('/'));
        Self {
            client,
            endpoint,
            model: model.into(),
            api_key: None,
        }
    }

    /// Attaches a bearer token sent with every request.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request_embeddings(
        &self,
        inputs: &[String],
    ) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RetrievalError::Provider(format!(
                "embedding request failed with status {status}: {detail}"
            )));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|err| {
            RetrievalError::Provider(format!("malformed embedding response: {err}"))
        })?;

        // Providers may reorder entries; the index field restores input order.
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != inputs.len() {
            return Err(RetrievalError::Provider(format!(
                "provider returned {} embeddings for {} inputs",
                parsed.data.len(),
                inputs.len()
            )));
        }
        if parsed.data.iter().any(|entry| entry.embedding.is_empty()) {
            return Err(RetrievalError::Provider(
                "provider returned an empty embedding vector".into(),
            ));
        }

        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        if text.trim().is_empty() {
            return Err(RetrievalError::Validation(
                "cannot embed empty text".into(),
            ));
        }
        let mut embeddings = self.request_embeddings(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| RetrievalError::Provider("provider returned no embeddings".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|text| text.trim().is_empty()) {
            return Err(RetrievalError::Validation(
                "cannot embed empty text".into(),
            ));
        }
        self.request_embeddings(texts).await
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}
