/*!
 * Candidate retrieval: the k most similar sentences on the other side.
 */

use std::cmp::Ordering;

use super::embeddings::{dot, SpanEmbeddingTable};

/// A retrieved sentence and its cosine similarity to the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub similarity: f32,
}

/// Top-k candidates in both directions
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CandidateSet {
    /// For each source sentence, the best target sentences
    pub src_to_tgt: Vec<Vec<Candidate>>,
    /// For each target sentence, the best source sentences
    pub tgt_to_src: Vec<Vec<Candidate>>,
}

impl CandidateSet {
    /// Compute the top `k` single-sentence candidates in both directions
    pub fn retrieve(src: &SpanEmbeddingTable, tgt: &SpanEmbeddingTable, k: usize) -> Self {
        Self {
            src_to_tgt: top_k(src, tgt, k),
            tgt_to_src: top_k(tgt, src, k),
        }
    }

    /// Similarity of the pair when `tgt_index` is among the candidates of `src_index`
    pub fn similarity(&self, src_index: usize, tgt_index: usize) -> Option<f32> {
        self.src_to_tgt
            .get(src_index)?
            .iter()
            .find(|c| c.index == tgt_index)
            .map(|c| c.similarity)
    }

    /// Every candidate pair as (source, target), both directions
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let forward = self
            .src_to_tgt
            .iter()
            .enumerate()
            .flat_map(|(s, cands)| cands.iter().map(move |c| (s, c.index)));
        let backward = self
            .tgt_to_src
            .iter()
            .enumerate()
            .flat_map(|(t, cands)| cands.iter().map(move |c| (c.index, t)));
        forward.chain(backward)
    }
}

/// Descending by similarity, ascending by index on ties
fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then(a.index.cmp(&b.index))
}

fn top_k(queries: &SpanEmbeddingTable, db: &SpanEmbeddingTable, k: usize) -> Vec<Vec<Candidate>> {
    let k = k.min(db.len());
    (0..queries.len())
        .map(|q| {
            let Some(query) = queries.vector(1, q) else {
                return Vec::new();
            };
            let mut scored: Vec<Candidate> = (0..db.len())
                .filter_map(|d| {
                    db.vector(1, d).map(|v| Candidate {
                        index: d,
                        similarity: dot(query, v),
                    })
                })
                .collect();
            if k < scored.len() {
                scored.select_nth_unstable_by(k, rank);
                scored.truncate(k);
            }
            scored.sort_by(rank);
            scored
        })
        .collect()
}
