use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::EmbeddingConfig;
use crate::errors::ProviderError;
use crate::providers::EmbeddingProvider;

/// Ollama client for the embeddings endpoint
#[derive(Debug)]
pub struct OllamaEmbedder {
    /// Base URL of the Ollama API
    base_url: String,
    /// Embedding model name
    model: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
    /// Requests in flight at once
    concurrent_requests: usize,
}

/// Embeddings request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Model name to use
    model: String,
    /// Text to embed
    prompt: String,
    /// How long to keep the model loaded in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
}

/// Embeddings response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// Embedding vector
    pub embedding: Vec<f32>,
}

impl OllamaEmbedder {
    /// Create a client for `base_url` with default retry settings
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let config = EmbeddingConfig {
            endpoint: base_url.into(),
            model: model.into(),
            ..EmbeddingConfig::default()
        };
        Self::from_config(&config)
    }

    /// Create a client from the embedding configuration
    ///
    /// Keeps connections alive so that many small embedding requests reuse them.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let base_url = url::Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid Ollama endpoint: {}", config.endpoint))?
            .as_str()
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            // Ollama speaks HTTP/1.1
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(config.concurrent_requests.max(1))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url,
            model: config.model.clone(),
            client,
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_ms,
            concurrent_requests: config.concurrent_requests.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Embed one text with retry logic
    ///
    /// Server and network errors are retried with exponential backoff; client
    /// errors fail at once.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
            keep_alive: None,
        };

        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            match self.client.post(&url).json(&request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response
                            .text()
                            .await
                            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;
                        return parse_embedding(&body);
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    let api_error = ProviderError::ApiError {
                        status_code: status.as_u16(),
                        message: error_text,
                    };
                    if !status.is_server_error() {
                        error!("Ollama API error: {}", api_error);
                        return Err(api_error);
                    }
                    warn!(
                        "Ollama API error: {} - attempt {}/{}",
                        api_error,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    last_error = Some(api_error);
                }
                Err(e) => {
                    warn!(
                        "Ollama API network error: {} - attempt {}/{}",
                        e,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    last_error = Some(if e.is_connect() || e.is_timeout() {
                        ProviderError::ConnectionError(e.to_string())
                    } else {
                        ProviderError::RequestFailed(e.to_string())
                    });
                }
            }

            attempt += 1;

            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1).min(16));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        let err = last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!(
                "Ollama API request failed after {} attempts",
                self.max_retries + 1
            ))
        });
        error!("Giving up on embedding request: {}", err);
        Err(err)
    }
}

/// Parse an embeddings response body, rejecting empty vectors
fn parse_embedding(body: &str) -> Result<Vec<f32>, ProviderError> {
    let response: EmbeddingResponse = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(500).collect();
        error!(
            "Failed to parse Ollama API embeddings response: {}. Raw response (first 500 chars): {}",
            e, preview
        );
        ProviderError::ParseError(e.to_string())
    })?;

    if response.embedding.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "Ollama returned an empty embedding".to_string(),
        ));
    }
    Ok(response.embedding)
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        debug!(
            "Requesting {} embeddings from {} ({} concurrent)",
            texts.len(),
            self.base_url,
            self.concurrent_requests
        );
        stream::iter(texts.to_vec())
            .map(|text| async move { self.embed_one(&text).await })
            .buffered(self.concurrent_requests)
            .try_collect()
            .await
    }
}
