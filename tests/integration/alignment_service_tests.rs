/*!
 * Integration tests for the document alignment pipeline
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use beadalign::alignment::AlignmentService;
use beadalign::app_config::{AlignerConfig, EmbeddingConfig};
use beadalign::errors::{AlignError, ProviderError};
use beadalign::providers::cache::CachedEmbedder;
use beadalign::providers::mock::MockEmbedder;
use beadalign::providers::EmbeddingProvider;
use crate::common;

fn service(provider: Arc<dyn EmbeddingProvider>, max_align: usize) -> AlignmentService {
    let config = AlignerConfig {
        max_align,
        ..AlignerConfig::default()
    };
    AlignmentService::new(provider, config, &EmbeddingConfig::default()).expect("valid service")
}

fn document(languages: &[(&str, Vec<&str>)]) -> BTreeMap<String, Vec<String>> {
    languages
        .iter()
        .map(|(lang, texts)| (lang.to_string(), common::sentences(texts)))
        .collect()
}

/// Test a pair alignment straight from sentences
#[tokio::test]
async fn test_alignPair_withConceptProvider_shouldMergeSplitSentence() -> Result<(), AlignError> {
    let service = service(Arc::new(MockEmbedder::concept()), 2);

    let alignment = service
        .align_pair(&common::sentences(&["A.", "B.", "C."]), &common::sentences(&["A'.", "B'C'."]))
        .await?;

    let record = alignment.to_record();
    assert_eq!(record.src, vec![vec![0], vec![1, 2]]);
    assert_eq!(record.tgt, vec![vec![0], vec![1]]);
    Ok(())
}

/// Test a three-language document end to end
#[tokio::test]
async fn test_alignDocument_withTwoTargets_shouldMergeThroughSource() -> Result<(), AlignError> {
    common::init_test_logging();
    let service = service(Arc::new(MockEmbedder::concept()), 2);
    let doc = document(&[
        ("en", vec!["A.", "B.", "C."]),
        ("de", vec!["A.", "B. C."]),
        ("fr", vec!["A.", "B.", "C."]),
    ]);
    let targets = common::sentences(&["de", "fr"]);

    let result = service.align_document(&doc, "en", &targets).await?;

    assert_eq!(result.source_len, 3);
    assert_eq!(result.pairs.len(), 2);
    assert_eq!(result.pairs["fr"].alignment.len(), 3);
    assert_eq!(result.pairs["de"].target_len, 2);

    let lists = result.merged.index_lists();
    assert_eq!(lists["en"], vec![vec![0], vec![1, 2]]);
    assert_eq!(lists["de"], vec![vec![0], vec![1]]);
    assert_eq!(lists["fr"], vec![vec![0], vec![1, 2]]);
    Ok(())
}

/// Test that a target language missing from the document is skipped
#[tokio::test]
async fn test_alignDocument_withMissingTarget_shouldSkipIt() -> Result<(), AlignError> {
    let service = service(Arc::new(MockEmbedder::concept()), 2);
    let doc = document(&[("en", vec!["A.", "B."]), ("de", vec!["A.", "B."])]);
    let targets = common::sentences(&["de", "it"]);

    let result = service.align_document(&doc, "en", &targets).await?;

    assert_eq!(result.pairs.keys().collect::<Vec<_>>(), vec!["de"]);
    assert_eq!(result.merged.len(), 2);
    Ok(())
}

/// Test that a document without the source language is rejected
#[tokio::test]
async fn test_alignDocument_withoutSourceLanguage_shouldFail() {
    let service = service(Arc::new(MockEmbedder::concept()), 2);
    let doc = document(&[("de", vec!["A."])]);

    let result = service.align_document(&doc, "en", &common::sentences(&["de"])).await;

    assert!(matches!(result, Err(AlignError::InconsistentInput(_))));
}

/// Test that provider failures reach the caller
#[tokio::test]
async fn test_alignPair_withFailingProvider_shouldReturnProviderError() {
    let service = service(Arc::new(MockEmbedder::failing()), 2);

    let result = service
        .align_pair(&common::sentences(&["A."]), &common::sentences(&["A."]))
        .await;

    assert!(matches!(
        result,
        Err(AlignError::Provider(ProviderError::ConnectionError(_)))
    ));
}

/// Test that a provider returning too few vectors is caught
#[tokio::test]
async fn test_alignPair_withShortResponse_shouldReturnInvalidResponse() {
    let service = service(Arc::new(MockEmbedder::short_response()), 2);

    let result = service
        .align_pair(&common::sentences(&["A.", "B."]), &common::sentences(&["A.", "B."]))
        .await;

    assert!(matches!(
        result,
        Err(AlignError::Provider(ProviderError::InvalidResponse(_)))
    ));
}

/// Test that source vectors are reused across target languages
#[tokio::test]
async fn test_alignDocument_withCachedProvider_shouldEmbedSharedSpansOnce() -> Result<(), AlignError> {
    let inner = Arc::new(MockEmbedder::concept());
    let cached = Arc::new(CachedEmbedder::new(inner.clone()));
    let service = service(cached.clone(), 1);
    let doc = document(&[("en", vec!["A.", "B."]), ("de", vec!["A.", "B."]), ("fr", vec!["A.", "B."])]);

    service
        .align_document(&doc, "en", &common::sentences(&["de", "fr"]))
        .await?;

    // Identical texts in every language: two distinct spans in total
    assert_eq!(inner.texts_embedded(), 2);
    assert_eq!(cached.len(), 2);
    Ok(())
}

/// Test that a service rejects a configuration it cannot run
#[test]
fn test_service_new_withZeroMaxAlign_shouldFail() {
    let config = AlignerConfig {
        max_align: 0,
        ..AlignerConfig::default()
    };

    let result = AlignmentService::new(Arc::new(MockEmbedder::concept()), config, &EmbeddingConfig::default());

    assert!(matches!(result, Err(AlignError::InvalidConfig(_))));
}
