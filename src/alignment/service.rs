/*!
 * Document-level alignment pipeline.
 *
 * One document holds the same text in several languages. The source side is
 * embedded once and shared read-only; every target language is embedded and
 * aligned independently, then all pairwise results meet in the multi-way
 * merge.
 */

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::app_config::{AlignerConfig, EmbeddingConfig};
use crate::errors::AlignError;
use crate::language_utils;
use crate::providers::EmbeddingProvider;

use super::aligner::Aligner;
use super::embeddings::SpanEmbeddingTable;
use super::multi::{AlignmentGraph, MultiAlignment};
use super::types::Alignment;

/// Alignment of the source against one target language
#[derive(Debug, Clone, PartialEq)]
pub struct PairAlignment {
    pub target_language: String,
    /// Number of target sentences
    pub target_len: usize,
    pub alignment: Alignment,
}

/// Every pairwise alignment of one document plus their merge
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentAlignment {
    pub source_language: String,
    /// Number of source sentences
    pub source_len: usize,
    /// Keyed by target language
    pub pairs: BTreeMap<String, PairAlignment>,
    pub merged: MultiAlignment,
}

/// Aligns documents with a shared embedding provider
#[derive(Debug, Clone)]
pub struct AlignmentService {
    provider: Arc<dyn EmbeddingProvider>,
    aligner: Arc<Aligner>,
    max_text_chars: usize,
    concurrency: usize,
}

impl AlignmentService {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        aligner_config: AlignerConfig,
        embedding_config: &EmbeddingConfig,
    ) -> Result<Self, AlignError> {
        Ok(Self {
            provider,
            aligner: Arc::new(Aligner::new(aligner_config)?),
            max_text_chars: embedding_config.max_text_chars,
            concurrency: embedding_config.concurrent_requests.max(1),
        })
    }

    pub fn aligner(&self) -> &Aligner {
        &self.aligner
    }

    /// Embed all spans of one sentence sequence
    pub async fn embed(&self, sentences: &[String]) -> Result<SpanEmbeddingTable, AlignError> {
        SpanEmbeddingTable::build(
            self.provider.as_ref(),
            sentences,
            self.aligner.config().max_align,
            self.max_text_chars,
        )
        .await
    }

    /// Align two sentence sequences
    pub async fn align_pair(&self, src: &[String], tgt: &[String]) -> Result<Alignment, AlignError> {
        let src_table = Arc::new(self.embed(src).await?);
        self.align_embedded(src_table, tgt).await
    }

    /// Align pre-embedded source sentences with target sentences
    async fn align_embedded(
        &self,
        src_table: Arc<SpanEmbeddingTable>,
        tgt: &[String],
    ) -> Result<Alignment, AlignError> {
        let tgt_table = self.embed(tgt).await?;
        let aligner = self.aligner.clone();
        tokio::task::spawn_blocking(move || aligner.align(&src_table, &tgt_table))
            .await
            .map_err(|e| AlignError::TaskFailed(e.to_string()))?
    }

    /// Align the source language of a document with each target language.
    ///
    /// Target languages missing from the document are skipped. The merge
    /// runs only after every pairwise alignment has finished.
    pub async fn align_document(
        &self,
        document: &BTreeMap<String, Vec<String>>,
        source_language: &str,
        target_languages: &[String],
    ) -> Result<DocumentAlignment, AlignError> {
        let src = document.get(source_language).ok_or_else(|| {
            AlignError::InconsistentInput(format!(
                "document has no sentences for source language '{}'",
                source_language
            ))
        })?;
        info!(
            "Source language: {}, Number of sentences: {}",
            language_utils::display_name(source_language),
            src.len()
        );

        let src_table = Arc::new(self.embed(src).await?);

        let mut targets = Vec::new();
        for language in target_languages {
            match document.get(language) {
                Some(sentences) => targets.push((language.clone(), sentences)),
                None => warn!("Document has no '{}' sentences, skipping", language),
            }
        }

        let results: Vec<Result<PairAlignment, AlignError>> = stream::iter(targets)
            .map(|(language, sentences)| {
                let src_table = src_table.clone();
                async move {
                    info!(
                        "Target language: {}, Number of sentences: {}",
                        language_utils::display_name(&language),
                        sentences.len()
                    );
                    let alignment = self.align_embedded(src_table, sentences).await?;
                    debug!("Aligned {} beads for '{}'", alignment.len(), language);
                    Ok(PairAlignment {
                        target_language: language,
                        target_len: sentences.len(),
                        alignment,
                    })
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut pairs = BTreeMap::new();
        for result in results {
            let pair = result?;
            pairs.insert(pair.target_language.clone(), pair);
        }

        let merged = merge_pairs(source_language, src.len(), &pairs)?;
        Ok(DocumentAlignment {
            source_language: source_language.to_string(),
            source_len: src.len(),
            pairs,
            merged,
        })
    }
}

/// Multi-way merge of finished pairwise alignments
pub fn merge_pairs(
    source_language: &str,
    source_len: usize,
    pairs: &BTreeMap<String, PairAlignment>,
) -> Result<MultiAlignment, AlignError> {
    let mut graph = AlignmentGraph::new(source_language);
    for pair in pairs.values() {
        graph.add_alignment(
            (source_language, source_len),
            (&pair.target_language, pair.target_len),
            &pair.alignment,
        )?;
    }
    Ok(graph.components())
}
