/*!
 * Embedding caching functionality.
 *
 * The source document is embedded once per target language pair unless its
 * vectors are memoised, so the cache sits in front of the real provider.
 */

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::EmbeddingProvider;

/// Memoising wrapper keyed by exact text
#[derive(Debug)]
pub struct CachedEmbedder {
    /// Provider that computes misses
    inner: Arc<dyn EmbeddingProvider>,

    /// Internal cache storage
    cache: RwLock<HashMap<String, Vec<f32>>>,

    /// Cache hit counter
    hits: RwLock<usize>,

    /// Cache miss counter
    misses: RwLock<usize>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            hits: RwLock::new(0),
            misses: RwLock::new(0),
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Number of cached vectors
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.cache.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;
        debug!("Embedding cache cleared");
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbedder {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let mut found: Vec<Option<Vec<f32>>> = {
            let cache = self.cache.read();
            texts.iter().map(|t| cache.get(t).cloned()).collect()
        };

        let missing: Vec<String> = texts
            .iter()
            .zip(found.iter())
            .filter(|(_, hit)| hit.is_none())
            .map(|(t, _)| t.clone())
            .collect();
        *self.hits.write() += texts.len() - missing.len();
        *self.misses.write() += missing.len();
        debug!(
            "Embedding cache: {} hits, {} misses",
            texts.len() - missing.len(),
            missing.len()
        );

        if !missing.is_empty() {
            let computed = self.inner.embed(&missing).await?;
            if computed.len() != missing.len() {
                return Err(ProviderError::InvalidResponse(format!(
                    "expected {} vectors, got {}",
                    missing.len(),
                    computed.len()
                )));
            }

            let mut cache = self.cache.write();
            let mut fresh = missing.into_iter().zip(computed);
            for slot in found.iter_mut().filter(|slot| slot.is_none()) {
                if let Some((text, vector)) = fresh.next() {
                    cache.insert(text, vector.clone());
                    *slot = Some(vector);
                }
            }
        }

        Ok(found.into_iter().flatten().collect())
    }
}
