/*!
 * Offline embedder based on signed character n-gram hashing.
 *
 * Vectors only capture surface overlap, so alignment quality depends on the
 * languages sharing script and cognates. Useful for smoke runs and for
 * near-identical texts where no embedding server is available.
 */

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::providers::EmbeddingProvider;

const BOS: char = '\u{0002}';
const EOS: char = '\u{0003}';

/// 32-bit FNV-1a over characters
fn fnv1a(chars: &[char]) -> u32 {
    let mut h: u32 = 0x811c_9dc5;
    for &c in chars {
        h ^= c as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    h
}

/// Hashes lowercase uni-, bi- and trigrams into a fixed number of buckets
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Raw, unnormalised vector of one text
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        let mut chars: Vec<char> = Vec::with_capacity(text.len() + 2);
        chars.push(BOS);
        chars.extend(text.to_lowercase().chars());
        chars.push(EOS);

        for n in [3usize, 2, 1] {
            if chars.len() < n {
                continue;
            }
            for gram in chars.windows(n) {
                let h = fnv1a(gram);
                let sign = if h >> 31 == 0 { 1.0 } else { -1.0 };
                v[h as usize % self.dimensions] += sign;
            }
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn model_name(&self) -> &str {
        "char-ngram-hashing"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
