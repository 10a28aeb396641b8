/*!
 * Tests for application configuration functionality
 */

use beadalign::alignment::Aligner;
use beadalign::app_config::{AlignerConfig, Config, EmbeddingProviderKind, LogLevel, TieBreak, MAX_ALIGN_LIMIT};
use beadalign::errors::AlignError;
use std::str::FromStr;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert!(config.target_languages.is_empty());
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
    assert_eq!(config.embedding.concurrent_requests, 4);
    assert!(config.embedding.cache);
    assert_eq!(config.aligner.max_align, 5);
    assert_eq!(config.aligner.top_k, 3);
    assert_eq!(config.aligner.win, 5);
    assert_eq!(config.merge.min_confidence, Some(0.8));
    assert!(config.merge.one_to_one_only);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Invalid source language
    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();

    // Target that is the source under another code
    config.target_languages = vec!["de".to_string(), "eng".to_string()];
    assert!(config.validate().is_err());
    config.target_languages = vec!["de".to_string(), "fra".to_string()];
    assert!(config.validate().is_ok());

    // Broken endpoint only matters for Ollama
    config.embedding.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
    config.embedding.provider = EmbeddingProviderKind::Hashing;
    assert!(config.validate().is_ok());

    config.embedding.hashing_dimensions = 0;
    assert!(config.validate().is_err());
    config.embedding.hashing_dimensions = 32;

    config.merge.min_confidence = Some(f32::INFINITY);
    assert!(config.validate().is_err());
    config.merge.min_confidence = None;
    assert!(config.validate().is_ok());
}

/// Test that aligner options are checked before anything runs
#[test]
fn test_config_validation_withBadAlignerOptions_shouldFail() {
    let mut config = Config::default();
    config.aligner.top_k = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.aligner.first_pass.width_ratio = -1.0;
    assert!(config.validate().is_err());
}

/// Test that max_align is bounded so catalog positions fit the DP backpointers
#[test]
fn test_alignerConfig_validate_withMaxAlignAboveLimit_shouldFail() {
    let at_limit = AlignerConfig {
        max_align: MAX_ALIGN_LIMIT,
        ..AlignerConfig::default()
    };
    assert!(at_limit.validate().is_ok());

    let too_wide = AlignerConfig {
        max_align: MAX_ALIGN_LIMIT + 1,
        ..AlignerConfig::default()
    };
    assert!(matches!(too_wide.validate(), Err(AlignError::InvalidConfig(_))));
    assert!(matches!(Aligner::new(too_wide), Err(AlignError::InvalidConfig(_))));
}

/// Test that a saved configuration loads back with the same values
#[test]
fn test_config_serialization_withCustomValues_shouldRoundTrip() -> anyhow::Result<()> {
    let mut config = Config::default();
    config.source_language = "de".to_string();
    config.aligner.tie_break = TieBreak::LargerSpan;
    config.embedding.provider = EmbeddingProviderKind::Hashing;
    config.log_level = LogLevel::Debug;

    let json = serde_json::to_string_pretty(&config)?;
    assert!(json.contains("\"larger_span\""));
    assert!(json.contains("\"hashing\""));

    let loaded: Config = serde_json::from_str(&json)?;
    assert_eq!(loaded.source_language, "de");
    assert_eq!(loaded.aligner.tie_break, TieBreak::LargerSpan);
    assert_eq!(loaded.embedding.provider, EmbeddingProviderKind::Hashing);
    assert_eq!(loaded.log_level, LogLevel::Debug);
    Ok(())
}

/// Test that a minimal file gets every default filled in
#[test]
fn test_config_deserialize_withOnlySourceLanguage_shouldUseDefaults() -> anyhow::Result<()> {
    let config: Config = serde_json::from_str(r#"{"source_language": "fr"}"#)?;
    assert_eq!(config.source_language, "fr");
    assert_eq!(config.aligner, AlignerConfig::default());
    assert_eq!(config.embedding.model, Config::default().embedding.model);
    Ok(())
}

/// Test provider name parsing and display
#[test]
fn test_providerKind_fromStr_withMixedCase_shouldParse() {
    assert_eq!(
        EmbeddingProviderKind::from_str("Ollama").ok(),
        Some(EmbeddingProviderKind::Ollama)
    );
    assert_eq!(
        EmbeddingProviderKind::from_str("HASHING").ok(),
        Some(EmbeddingProviderKind::Hashing)
    );
    assert!(EmbeddingProviderKind::from_str("openai").is_err());
    assert_eq!(EmbeddingProviderKind::Hashing.to_string(), "hashing");
    assert_eq!(EmbeddingProviderKind::Ollama.display_name(), "Ollama");
}
