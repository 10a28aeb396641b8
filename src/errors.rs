/*!
 * Error types for the beadalign application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with embedding providers
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The provider answered, but with something that is not usable as embeddings
    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Errors raised by the alignment engine
#[derive(Error, Debug)]
pub enum AlignError {
    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The embedding provider failed for this document
    #[error("Embedding provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Source and target embeddings do not live in the same space
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the reference side
        expected: usize,
        /// Dimension that was found
        actual: usize,
    },

    /// A vector that cannot be compared by cosine similarity
    #[error("Degenerate embedding for span '{span}': {reason}")]
    DegenerateEmbedding {
        /// Text (possibly truncated) of the offending span
        span: String,
        /// What is wrong with the vector
        reason: String,
    },

    /// The embedding table does not cover the spans the catalog asks for
    #[error("Embedding table covers spans of up to {available} sentences, but {required} are required")]
    SpanTableTooSmall {
        /// Longest span in the table
        available: usize,
        /// Longest span the alignment catalog needs
        required: usize,
    },

    /// The search band does not connect the origin with the terminal cell
    #[error(
        "Terminal cell ({src_len}, {tgt_len}) is unreachable inside the search window of radius {win}; retry with a larger `win`"
    )]
    UnreachableTerminal {
        /// Number of source sentences
        src_len: usize,
        /// Number of target sentences
        tgt_len: usize,
        /// Window radius used to build the band
        win: usize,
    },

    /// Backpointers did not lead back to the origin
    #[error("Backtracking stopped at cell ({i}, {j}) before reaching the origin")]
    BacktrackFailed {
        /// Row where the walk stopped
        i: usize,
        /// Column where the walk stopped
        j: usize,
    },

    /// A bead references a sentence past the end of its sequence
    #[error("Sentence index {index} is out of bounds for language '{language}' ({len} sentences)")]
    IndexOutOfBounds {
        /// Language of the offending sequence
        language: String,
        /// The index found in a bead
        index: usize,
        /// Length of the sequence
        len: usize,
    },

    /// Input structures that contradict each other
    #[error("Inconsistent input: {0}")]
    InconsistentInput(String),

    /// A background alignment task panicked or was cancelled
    #[error("Alignment task failed: {0}")]
    TaskFailed(String),
}

impl AlignError {
    /// Whether retrying with a different configuration can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AlignError::UnreachableTerminal { .. })
    }
}
