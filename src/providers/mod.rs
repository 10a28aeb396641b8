/*!
 * Embedding provider implementations.
 *
 * This module contains the clients that turn span texts into vectors:
 * - Ollama: Local embedding server
 * - Hashing: Offline character n-gram hashing, no model needed
 * - Cache: Memoising wrapper around any other provider
 * - Mock: Deterministic embedders for tests
 */

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::errors::ProviderError;

/// Common trait for all embedding providers
///
/// Implementations must return exactly one vector per input text, in input
/// order, and all vectors of one call must share a dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Name of the model behind the vectors
    fn model_name(&self) -> &str;

    /// Embed a batch of texts
    ///
    /// # Arguments
    /// * `texts` - The texts to embed
    ///
    /// # Returns
    /// * `Result<Vec<Vec<f32>>, ProviderError>` - One vector per text or an error
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

#[async_trait]
impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<P> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        (**self).embed(texts).await
    }
}

/// Build the provider selected by the configuration, cached when enabled
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingProviderKind::Ollama => Arc::new(ollama::OllamaEmbedder::from_config(config)?),
        EmbeddingProviderKind::Hashing => Arc::new(hashing::HashingEmbedder::new(config.hashing_dimensions)),
    };
    info!(
        "Embedding provider: {} ({})",
        config.provider.display_name(),
        provider.model_name()
    );

    if config.cache {
        Ok(Arc::new(cache::CachedEmbedder::new(provider)))
    } else {
        Ok(provider)
    }
}

pub mod cache;
pub mod hashing;
pub mod mock;
pub mod ollama;
