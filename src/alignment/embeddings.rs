/*!
 * Span embedding table.
 *
 * A span is a run of 1..=max_span consecutive sentences joined with a single
 * space. Every distinct span text is embedded once; vectors are stored
 * L2-normalised so that a dot product is the cosine similarity.
 */

use log::debug;
use std::collections::HashMap;

use crate::errors::{AlignError, ProviderError};
use crate::providers::EmbeddingProvider;

/// Placeholder embedded in place of an empty sentence
pub const BLANK_LINE: &str = "BLANK_LINE";

/// Trim a sentence; blank sentences become [`BLANK_LINE`]
pub fn preprocess_sentence(sentence: &str) -> String {
    let trimmed = sentence.trim();
    if trimmed.is_empty() {
        BLANK_LINE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Dot product of two vectors of equal length
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Unit-length copy of `v`, or `None` when it has no direction
pub fn normalize(v: &[f32]) -> Option<Vec<f32>> {
    let norm = dot(v, v).sqrt();
    if !norm.is_finite() || norm < f32::EPSILON {
        return None;
    }
    Some(v.iter().map(|x| x / norm).collect())
}

/// Which distinct text backs each span, before any embedding happens
#[derive(Debug)]
struct SpanLayout {
    /// Distinct span texts, in first-seen order
    texts: Vec<String>,
    /// `slots[l - 1][start]` is the index into `texts` of span (l, start)
    slots: Vec<Vec<usize>>,
    /// UTF-8 byte length of each span text
    byte_lens: Vec<Vec<usize>>,
}

impl SpanLayout {
    fn new(sentences: &[String], max_span: usize, max_chars: usize) -> Self {
        let lines: Vec<String> = sentences.iter().map(|s| preprocess_sentence(s)).collect();
        let mut texts = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut slots = Vec::with_capacity(max_span);
        let mut byte_lens = Vec::with_capacity(max_span);

        for span_len in 1..=max_span {
            let count = (lines.len() + 1).saturating_sub(span_len);
            let mut layer_slots = Vec::with_capacity(count);
            let mut layer_lens = Vec::with_capacity(count);
            for start in 0..count {
                let joined = lines[start..start + span_len].join(" ");
                let text: String = if joined.chars().count() > max_chars {
                    joined.chars().take(max_chars).collect()
                } else {
                    joined
                };
                layer_lens.push(text.len());
                let slot = match seen.get(&text) {
                    Some(&slot) => slot,
                    None => {
                        let slot = texts.len();
                        seen.insert(text.clone(), slot);
                        texts.push(text);
                        slot
                    }
                };
                layer_slots.push(slot);
            }
            slots.push(layer_slots);
            byte_lens.push(layer_lens);
        }

        Self { texts, slots, byte_lens }
    }
}

/// Embeddings and byte lengths of every span of one sentence sequence
#[derive(Debug, Clone, PartialEq)]
pub struct SpanEmbeddingTable {
    len: usize,
    max_span: usize,
    dim: usize,
    /// One flat row-major block per span length
    layers: Vec<Vec<f32>>,
    byte_lens: Vec<Vec<usize>>,
}

impl SpanEmbeddingTable {
    /// Embed every span of `sentences` through `provider`
    pub async fn build<P>(
        provider: &P,
        sentences: &[String],
        max_span: usize,
        max_chars: usize,
    ) -> Result<Self, AlignError>
    where
        P: EmbeddingProvider + ?Sized,
    {
        let layout = SpanLayout::new(sentences, max_span, max_chars);
        debug!(
            "Embedding {} distinct spans of {} sentences with {}",
            layout.texts.len(),
            sentences.len(),
            provider.model_name()
        );
        let vectors = if layout.texts.is_empty() {
            Vec::new()
        } else {
            provider.embed(&layout.texts).await?
        };
        Self::assemble(layout, sentences.len(), max_span, vectors)
    }

    /// Same as [`SpanEmbeddingTable::build`] with a synchronous embedding function
    pub fn from_embeddings<F>(
        sentences: &[String],
        max_span: usize,
        max_chars: usize,
        embed: F,
    ) -> Result<Self, AlignError>
    where
        F: FnOnce(&[String]) -> Result<Vec<Vec<f32>>, ProviderError>,
    {
        let layout = SpanLayout::new(sentences, max_span, max_chars);
        let vectors = if layout.texts.is_empty() {
            Vec::new()
        } else {
            embed(&layout.texts)?
        };
        Self::assemble(layout, sentences.len(), max_span, vectors)
    }

    fn assemble(
        layout: SpanLayout,
        len: usize,
        max_span: usize,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, AlignError> {
        if max_span < 1 {
            return Err(AlignError::InvalidConfig(
                "span tables need a maximum span of at least 1".to_string(),
            ));
        }
        if vectors.len() != layout.texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                layout.texts.len(),
                vectors.len()
            ))
            .into());
        }

        let dim = vectors.first().map(Vec::len).unwrap_or(0);
        let mut unit_vectors = Vec::with_capacity(vectors.len());
        for (text, vector) in layout.texts.iter().zip(vectors.iter()) {
            if vector.len() != dim {
                return Err(AlignError::DimensionMismatch {
                    expected: dim,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(degenerate(text, "contains non-finite values"));
            }
            let unit = normalize(vector).ok_or_else(|| degenerate(text, "has zero norm"))?;
            unit_vectors.push(unit);
        }
        if dim == 0 && !unit_vectors.is_empty() {
            return Err(degenerate(&layout.texts[0], "is empty"));
        }

        let layers = layout
            .slots
            .iter()
            .map(|layer| {
                layer
                    .iter()
                    .flat_map(|&slot| unit_vectors[slot].iter().copied())
                    .collect()
            })
            .collect();

        Ok(Self {
            len,
            max_span,
            dim,
            layers,
            byte_lens: layout.byte_lens,
        })
    }

    /// Number of sentences
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Longest span stored
    pub fn max_span(&self) -> usize {
        self.max_span
    }

    /// Vector dimension (0 for an empty sequence)
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Unit vector of the span of `span_len` sentences starting at `start`
    pub fn vector(&self, span_len: usize, start: usize) -> Option<&[f32]> {
        if span_len == 0 || span_len > self.max_span || start + span_len > self.len {
            return None;
        }
        let layer = &self.layers[span_len - 1];
        layer.get(start * self.dim..(start + 1) * self.dim)
    }

    /// Unit vector of the span of `span_len` sentences ending before `end`
    pub fn vector_ending_at(&self, span_len: usize, end: usize) -> Option<&[f32]> {
        end.checked_sub(span_len)
            .and_then(|start| self.vector(span_len, start))
    }

    /// Byte length of the span of `span_len` sentences starting at `start`
    pub fn byte_len(&self, span_len: usize, start: usize) -> Option<usize> {
        if span_len == 0 || span_len > self.max_span {
            return None;
        }
        self.byte_lens[span_len - 1].get(start).copied()
    }

    /// Total byte length of the single sentences
    pub fn total_bytes(&self) -> usize {
        self.byte_lens.first().map(|l| l.iter().sum()).unwrap_or(0)
    }
}

fn degenerate(text: &str, reason: &str) -> AlignError {
    AlignError::DegenerateEmbedding {
        span: text.chars().take(40).collect(),
        reason: reason.to_string(),
    }
}

/// Expected ratio of source to target byte length
pub fn char_ratio(src: &SpanEmbeddingTable, tgt: &SpanEmbeddingTable) -> f32 {
    let src_bytes = src.total_bytes();
    let tgt_bytes = tgt.total_bytes();
    if src_bytes == 0 || tgt_bytes == 0 {
        1.0
    } else {
        src_bytes as f32 / tgt_bytes as f32
    }
}
