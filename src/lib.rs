/*!
 * # beadalign - multilingual sentence aligner
 *
 * A Rust library that aligns sentence-split translations of the same text
 * and merges the pairwise results into multi-parallel sentence groups.
 *
 * ## Features
 *
 * - Two-pass alignment over cross-lingual span embeddings:
 *   - A cheap first pass that follows top-k nearest-neighbour anchors
 *   - A windowed second pass with margin, length penalty and gap costs
 * - Beads covering up to `max_align` sentences on either side
 * - Per-bead cosine and length-ratio scores
 * - Multi-way merge of pairwise alignments through a shared source language
 * - Embedding providers:
 *   - Ollama (local embedding server)
 *   - Character n-gram hashing (offline)
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `alignment`: The alignment engine:
 *   - `alignment::aligner`: The two passes put together
 *   - `alignment::dp`: Banded dynamic program
 *   - `alignment::multi`: Multi-way merge
 *   - `alignment::service`: Document pipeline over a provider
 * - `file_utils`: Corpus and output file handling
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Embedding provider clients
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod alignment;
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;

// Re-export main types for easier usage
pub use alignment::{Aligner, Alignment, AlignmentService, Bead, MultiAlignment};
pub use app_config::Config;
pub use errors::{AlignError, ProviderError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use providers::EmbeddingProvider;
