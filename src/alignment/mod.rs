/*!
 * Sentence alignment engine.
 *
 * This module contains the two-pass bead aligner and everything it needs:
 * - `catalog`: Bead shapes and their tie-break order
 * - `embeddings`: Span embedding tables
 * - `candidates`: Top-k retrieval that seeds the first pass
 * - `search_path`: Bands and windows limiting the DP
 * - `dp`: The banded dynamic program and its transition costs
 * - `scoring`: Per-bead scores
 * - `aligner`: The two passes put together
 * - `multi`: Multi-way merge across language pairs
 * - `service`: Document pipeline over an embedding provider
 */

pub mod aligner;
pub mod candidates;
pub mod catalog;
pub mod dp;
pub mod embeddings;
pub mod multi;
pub mod scoring;
pub mod search_path;
pub mod service;
pub mod types;

pub use aligner::Aligner;
pub use catalog::AlignmentCatalog;
pub use embeddings::SpanEmbeddingTable;
pub use multi::{AlignmentGraph, MergePolicy, MultiAlignment, MultiGroup, SentenceNode};
pub use search_path::SearchPath;
pub use service::{AlignmentService, DocumentAlignment, PairAlignment};
pub use types::{Alignment, AlignmentRecord, AlignmentType, Bead, ScoreRecord};
