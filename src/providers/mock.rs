/*!
 * Mock embedding providers for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockEmbedder::concept()` - One axis per uppercase letter, so "A." and
 *   "A'." are identical and "A." and "B." are orthogonal
 * - `MockEmbedder::failing()` - Always fails with a connection error
 * - `MockEmbedder::fixed_dimension(n)` - Concept vectors cut or padded to `n`
 * - `MockEmbedder::short_response()` - Returns one vector too few
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::EmbeddingProvider;

/// Dimension of concept vectors
pub const CONCEPT_DIM: usize = 26;

/// Behavior mode for the mock embedder
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Counts of the letters A-Z
    Concept,
    /// Always fails with an error
    Failing,
    /// Concept vectors resized to the given dimension
    FixedDimension(usize),
    /// Drops the last vector of every batch
    ShortResponse,
}

/// Deterministic embedder for tests
#[derive(Debug)]
pub struct MockEmbedder {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of `embed` calls
    calls: AtomicUsize,
    /// Number of texts embedded so far
    texts: AtomicUsize,
}

impl MockEmbedder {
    /// Create a new mock embedder with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            texts: AtomicUsize::new(0),
        }
    }

    pub fn concept() -> Self {
        Self::new(MockBehavior::Concept)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn fixed_dimension(dim: usize) -> Self {
        Self::new(MockBehavior::FixedDimension(dim))
    }

    pub fn short_response() -> Self {
        Self::new(MockBehavior::ShortResponse)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

/// Letter-count vector of a text; texts without capitals map to the last axis
pub fn concept_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; CONCEPT_DIM];
    for b in text.bytes().filter(u8::is_ascii_uppercase) {
        v[(b - b'A') as usize] += 1.0;
    }
    if v.iter().all(|x| *x == 0.0) {
        v[CONCEPT_DIM - 1] = 1.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    fn model_name(&self) -> &str {
        "mock-concepts"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Concept => Ok(texts.iter().map(|t| concept_vector(t)).collect()),
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "mock provider is offline".to_string(),
            )),
            MockBehavior::FixedDimension(dim) => Ok(texts
                .iter()
                .map(|t| {
                    let mut v = concept_vector(t);
                    v.resize(dim, 1.0);
                    v
                })
                .collect()),
            MockBehavior::ShortResponse => {
                let mut vectors: Vec<Vec<f32>> = texts.iter().map(|t| concept_vector(t)).collect();
                vectors.pop();
                Ok(vectors)
            }
        }
    }
}
