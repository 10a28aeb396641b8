/*!
 * Per-bead scores reported next to an alignment.
 */

use super::embeddings::{dot, SpanEmbeddingTable};
use super::types::{Bead, ScoreRecord};

/// Byte length of a bead side; 0 for an empty span
fn span_bytes(table: &SpanEmbeddingTable, span: &std::ops::Range<usize>) -> usize {
    if span.is_empty() {
        return 0;
    }
    table.byte_len(span.len(), span.start).unwrap_or(0)
}

/// Source bytes over char-ratio-scaled target bytes
pub fn length_ratio(src: &SpanEmbeddingTable, tgt: &SpanEmbeddingTable, bead: &Bead, char_ratio: f32) -> f32 {
    let tgt_bytes = span_bytes(tgt, &bead.tgt) as f32 * char_ratio;
    if tgt_bytes <= 0.0 {
        return 0.0;
    }
    span_bytes(src, &bead.src) as f32 / tgt_bytes
}

/// Raw cosine similarity of the two spans; 0 for gap beads
pub fn cosine(src: &SpanEmbeddingTable, tgt: &SpanEmbeddingTable, bead: &Bead) -> f32 {
    if bead.alignment_type().is_gap() {
        return 0.0;
    }
    match (
        src.vector(bead.src.len(), bead.src.start),
        tgt.vector(bead.tgt.len(), bead.tgt.start),
    ) {
        (Some(s), Some(t)) => dot(s, t),
        _ => 0.0,
    }
}

/// Score records for beads paired with their incremental costs
pub fn score_beads(
    src: &SpanEmbeddingTable,
    tgt: &SpanEmbeddingTable,
    beads: &[(Bead, f32)],
    char_ratio: f32,
    with_cosine: bool,
) -> Vec<ScoreRecord> {
    beads
        .iter()
        .map(|(bead, cost)| ScoreRecord {
            cost: *cost,
            length_ratio: length_ratio(src, tgt, bead, char_ratio),
            cosine: with_cosine.then(|| cosine(src, tgt, bead)),
        })
        .collect()
}
