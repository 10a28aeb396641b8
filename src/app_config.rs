use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

use crate::errors::AlignError;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO), shared by every pairwise alignment
    pub source_language: String,

    /// Target language codes; empty means every other language of the corpus
    #[serde(default)]
    pub target_languages: Vec<String>,

    /// Alignment engine parameters
    #[serde(default)]
    pub aligner: AlignerConfig,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Multi-way merge export policy
    #[serde(default)]
    pub merge: MergeConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Preference between alignment types whose accumulated costs are equal
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The type listed first in the catalog wins
    #[default]
    CatalogOrder,
    /// The type consuming more sentences wins, then catalog order
    LargerSpan,
}

/// Band parameters of the coarse first pass
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FirstPassConfig {
    /// Lower bound of the band half-width, in target sentences
    #[serde(default = "default_min_half_width")]
    pub min_half_width: usize,

    /// Half-width as a fraction of the longer sequence
    #[serde(default = "default_width_ratio")]
    pub width_ratio: f32,

    /// Extra columns added around the farthest candidate pair
    #[serde(default = "default_band_slack")]
    pub slack: usize,
}

impl Default for FirstPassConfig {
    fn default() -> Self {
        Self {
            min_half_width: default_min_half_width(),
            width_ratio: default_width_ratio(),
            slack: default_band_slack(),
        }
    }
}

/// Largest accepted `max_align`
pub const MAX_ALIGN_LIMIT: usize = 64;

/// Alignment engine configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AlignerConfig {
    /// Maximum number of sentences on one side of a bead
    #[serde(default = "default_max_align")]
    pub max_align: usize,

    /// Candidates kept per sentence in the first pass
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Window radius of the second pass
    #[serde(default = "default_win")]
    pub win: usize,

    /// Score of an insertion or deletion; its negation is the gap cost
    #[serde(default = "default_skip")]
    pub skip: f32,

    /// Normalise match similarity by the neighbouring sentences
    #[serde(default = "default_true")]
    pub margin: bool,

    /// Scale match similarity by the agreement of span lengths
    #[serde(default = "default_true")]
    pub len_penalty: bool,

    /// Report raw cosine similarity per bead
    #[serde(default = "default_true")]
    pub cos_similarity: bool,

    /// Rule for equal-cost predecessors
    #[serde(default)]
    pub tie_break: TieBreak,

    /// Coarse band parameters
    #[serde(default)]
    pub first_pass: FirstPassConfig,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            max_align: default_max_align(),
            top_k: default_top_k(),
            win: default_win(),
            skip: default_skip(),
            margin: true,
            len_penalty: true,
            cos_similarity: true,
            tie_break: TieBreak::default(),
            first_pass: FirstPassConfig::default(),
        }
    }
}

impl AlignerConfig {
    /// Check every option once, before any alignment runs
    pub fn validate(&self) -> Result<(), AlignError> {
        if self.max_align < 1 {
            return Err(AlignError::InvalidConfig(
                "max_align must be at least 1".to_string(),
            ));
        }
        if self.max_align > MAX_ALIGN_LIMIT {
            return Err(AlignError::InvalidConfig(format!(
                "max_align must be at most {}, got {}",
                MAX_ALIGN_LIMIT, self.max_align
            )));
        }
        if self.top_k < 1 {
            return Err(AlignError::InvalidConfig(
                "top_k must be at least 1".to_string(),
            ));
        }
        if !self.skip.is_finite() {
            return Err(AlignError::InvalidConfig(format!(
                "skip must be a finite number, got {}",
                self.skip
            )));
        }
        if !self.first_pass.width_ratio.is_finite() || self.first_pass.width_ratio < 0.0 {
            return Err(AlignError::InvalidConfig(format!(
                "first_pass.width_ratio must be a non-negative number, got {}",
                self.first_pass.width_ratio
            )));
        }
        Ok(())
    }
}

/// Embedding provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    // @provider: Ollama embeddings endpoint
    #[default]
    Ollama,
    // @provider: Offline character n-gram hashing
    Hashing,
}

impl EmbeddingProviderKind {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::Hashing => "Hashing",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Hashing => "hashing".to_string(),
        }
    }
}

impl std::fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for EmbeddingProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "hashing" => Ok(Self::Hashing),
            _ => Err(anyhow!("Invalid embedding provider: {}", s)),
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// Which provider computes span embeddings
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    /// Cross-lingual embedding model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Service endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Maximum number of concurrent requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Span texts are cut to this many characters before embedding
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// Memoise vectors per text across language pairs
    #[serde(default = "default_true")]
    pub cache: bool,

    /// Vector size of the hashing provider
    #[serde(default = "default_hashing_dimensions")]
    pub hashing_dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: default_embedding_model(),
            endpoint: default_ollama_endpoint(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            concurrent_requests: default_concurrent_requests(),
            max_text_chars: default_max_text_chars(),
            cache: true,
            hashing_dimensions: default_hashing_dimensions(),
        }
    }
}

/// Export policy for multi-parallel groups
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MergeConfig {
    /// Groups whose confidence is below this value are not exported
    #[serde(default = "default_min_confidence")]
    pub min_confidence: Option<f32>,

    /// Only export groups with exactly one sentence per language
    #[serde(default = "default_true")]
    pub one_to_one_only: bool,

    /// Documents aligned at the same time
    #[serde(default = "default_concurrent_documents")]
    pub concurrent_documents: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            one_to_one_only: true,
            concurrent_documents: default_concurrent_documents(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_max_align() -> usize {
    5
}

fn default_top_k() -> usize {
    3
}

fn default_win() -> usize {
    5
}

fn default_skip() -> f32 {
    -0.1
}

fn default_min_half_width() -> usize {
    250
}

fn default_width_ratio() -> f32 {
    0.06
}

fn default_band_slack() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_embedding_model() -> String {
    "bge-m3".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_max_text_chars() -> usize {
    10_000
}

fn default_hashing_dimensions() -> usize {
    256
}

fn default_min_confidence() -> Option<f32> {
    Some(0.8)
}

fn default_concurrent_documents() -> usize {
    2
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        for target in &self.target_languages {
            let _target_name = crate::language_utils::get_language_name(target)?;
            if crate::language_utils::language_codes_match(target, &self.source_language) {
                return Err(anyhow!(
                    "Target language '{}' is the source language",
                    target
                ));
            }
        }

        self.aligner.validate()?;

        if self.embedding.provider == EmbeddingProviderKind::Ollama {
            url::Url::parse(&self.embedding.endpoint).with_context(|| {
                format!("Invalid embedding endpoint: {}", self.embedding.endpoint)
            })?;
            if self.embedding.model.trim().is_empty() {
                return Err(anyhow!("An embedding model name is required for Ollama"));
            }
        }
        if self.embedding.concurrent_requests == 0 {
            return Err(anyhow!("embedding.concurrent_requests must be at least 1"));
        }
        if self.embedding.max_text_chars == 0 {
            return Err(anyhow!("embedding.max_text_chars must be at least 1"));
        }
        if self.embedding.provider == EmbeddingProviderKind::Hashing
            && self.embedding.hashing_dimensions == 0
        {
            return Err(anyhow!("embedding.hashing_dimensions must be at least 1"));
        }

        if let Some(threshold) = self.merge.min_confidence {
            if !threshold.is_finite() {
                return Err(anyhow!("merge.min_confidence must be a finite number"));
            }
        }
        if self.merge.concurrent_documents == 0 {
            return Err(anyhow!("merge.concurrent_documents must be at least 1"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_languages: Vec::new(),
            aligner: AlignerConfig::default(),
            embedding: EmbeddingConfig::default(),
            merge: MergeConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
