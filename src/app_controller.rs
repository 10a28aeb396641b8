use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::alignment::{AlignmentGraph, AlignmentService, DocumentAlignment, MergePolicy, MultiAlignment};
use crate::app_config::Config;
use crate::errors::AlignError;
use crate::file_utils::{
    AlignmentFile, BitextFile, BitextRecord, Corpus, FileManager, MultiAlignmentFile, MultiSentenceFile, OutputKind, ScoreFile,
    SentenceFile, MULTI_ALIGNMENTS_FILE, MULTI_SCORES_FILE, MULTI_SENTENCES_FILE,
};
use crate::language_utils;
use crate::providers::{self, EmbeddingProvider};

// @module: Application controller for corpus alignment

const RUN_LOG_FILE: &str = "beadalign.log";

/// Outcome of one `align` run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub documents: usize,
    pub aligned: usize,
    pub failed: usize,
}

/// Outcome of one `merge` run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub documents: usize,
    pub groups: usize,
    pub kept: usize,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Shared embedding provider
    provider: Arc<dyn EmbeddingProvider>,
}

impl Controller {
    // @method: Create a new controller with the provider named by the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let provider = providers::create_provider(&config.embedding)?;
        Ok(Self { config, provider })
    }

    // @method: Create a new controller around an existing provider
    pub fn with_provider(config: Config, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Target languages of a corpus: the configured ones, or every non-source language found
    fn target_languages(&self, corpus: &Corpus) -> Vec<String> {
        if !self.config.target_languages.is_empty() {
            return self.config.target_languages.clone();
        }
        let found: BTreeSet<&String> = corpus.values().flat_map(|doc| doc.keys()).collect();
        found
            .into_iter()
            .filter(|lang| {
                lang.as_str() != self.config.source_language
                    && !language_utils::language_codes_match(lang, &self.config.source_language)
            })
            .cloned()
            .collect()
    }

    /// Align every document of `input_file` and write the results to `output_dir`
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, merge: bool) -> Result<RunSummary> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        FileManager::ensure_dir(&output_dir)?;

        let corpus = FileManager::read_corpus(&input_file)?;
        let source = self.config.source_language.clone();
        let targets = self.target_languages(&corpus);
        if targets.is_empty() {
            return Err(anyhow!("No target languages found in {:?}", input_file));
        }
        info!(
            "Aligning {} documents: {} -> {}",
            corpus.len(),
            language_utils::display_name(&source),
            targets
                .iter()
                .map(|t| language_utils::display_name(t))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let service = AlignmentService::new(self.provider.clone(), self.config.aligner.clone(), &self.config.embedding)?;

        let progress_bar = ProgressBar::new(corpus.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let results: Vec<(String, Result<DocumentAlignment, AlignError>)> = stream::iter(corpus.iter())
            .map(|(key, document)| {
                let service = &service;
                let source = &source;
                let targets = &targets;
                let progress_bar = &progress_bar;
                async move {
                    let result = service.align_document(document, source, targets).await;
                    progress_bar.inc(1);
                    progress_bar.set_message(key.clone());
                    (key.clone(), result)
                }
            })
            .buffer_unordered(self.config.merge.concurrent_documents.max(1))
            .collect()
            .await;
        progress_bar.finish_and_clear();

        let mut summary = RunSummary {
            documents: corpus.len(),
            ..RunSummary::default()
        };
        let mut aligned: BTreeMap<String, DocumentAlignment> = BTreeMap::new();
        for (key, result) in results {
            match result {
                Ok(document) => {
                    summary.aligned += 1;
                    aligned.insert(key, document);
                }
                Err(e) if e.is_recoverable() => {
                    summary.failed += 1;
                    warn!("Skipping document '{}': {}", key, e);
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("Failed to align document '{}': {}", key, e);
                }
            }
        }

        self.write_pairwise_outputs(&output_dir, &corpus, &aligned)?;

        if merge {
            let merged: BTreeMap<String, MultiAlignment> = aligned
                .iter()
                .map(|(key, doc)| (key.clone(), doc.merged.clone()))
                .collect();
            let sentences: BTreeMap<String, HashMap<String, Vec<String>>> = corpus
                .iter()
                .map(|(key, doc)| (key.clone(), doc.iter().map(|(l, s)| (l.clone(), s.clone())).collect()))
                .collect();
            let policy = MergePolicy::from(&self.config.merge);
            export_multi(&output_dir, &merged, &sentences, &policy)?;
        }

        let message = format!(
            "Aligned {}/{} documents ({} failed) in {}",
            summary.aligned,
            summary.documents,
            summary.failed,
            Self::format_duration(start_time.elapsed())
        );
        info!("{}", message);
        if let Err(e) = FileManager::append_to_log_file(output_dir.join(RUN_LOG_FILE), &message) {
            warn!("Failed to write run log: {}", e);
        }

        Ok(summary)
    }

    /// Sentence files for every language, alignment, score and bitext files per target
    fn write_pairwise_outputs(
        &self,
        output_dir: &Path,
        corpus: &Corpus,
        aligned: &BTreeMap<String, DocumentAlignment>,
    ) -> Result<()> {
        let mut sentence_files: BTreeMap<&str, SentenceFile> = BTreeMap::new();
        for (key, document) in corpus {
            for (language, sentences) in document {
                sentence_files
                    .entry(language.as_str())
                    .or_default()
                    .insert(key.clone(), sentences.clone());
            }
        }
        for (language, file) in &sentence_files {
            FileManager::write_json(FileManager::output_path(output_dir, language, OutputKind::Sentences), file)?;
        }

        let mut alignment_files: BTreeMap<&str, AlignmentFile> = BTreeMap::new();
        let mut score_files: BTreeMap<&str, ScoreFile> = BTreeMap::new();
        let mut bitext_files: BTreeMap<&str, BitextFile> = BTreeMap::new();
        for (key, document) in aligned {
            let languages = corpus.get(key);
            let src_sents = languages
                .and_then(|l| l.get(&document.source_language))
                .map(Vec::as_slice)
                .unwrap_or_default();
            for (language, pair) in &document.pairs {
                let tgt_sents = languages
                    .and_then(|l| l.get(language))
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let (src, tgt) = pair.alignment.bead_texts(src_sents, tgt_sents);
                bitext_files
                    .entry(language.as_str())
                    .or_default()
                    .insert(key.clone(), BitextRecord { src, tgt });
                alignment_files
                    .entry(language.as_str())
                    .or_default()
                    .insert(key.clone(), pair.alignment.to_record());
                score_files
                    .entry(language.as_str())
                    .or_default()
                    .insert(key.clone(), pair.alignment.confidences());
            }
        }
        for (language, file) in &alignment_files {
            FileManager::write_json(FileManager::output_path(output_dir, language, OutputKind::Alignments), file)?;
        }
        for (language, file) in &score_files {
            FileManager::write_json(FileManager::output_path(output_dir, language, OutputKind::Scores), file)?;
        }
        for (language, file) in &bitext_files {
            FileManager::write_json(FileManager::output_path(output_dir, language, OutputKind::Bitext), file)?;
        }

        Ok(())
    }

    /// Merge the pairwise files found in `dir` into multi-way outputs
    pub fn run_merge(&self, dir: &Path, source_language: &str) -> Result<MergeSummary> {
        if !FileManager::dir_exists(dir) {
            return Err(anyhow!("Directory does not exist: {:?}", dir));
        }

        let listing = FileManager::scan_output_dir(dir)?;
        let has = |language: &str, kind: OutputKind| listing.get(language).is_some_and(|k| k.contains(&kind));
        if !has(source_language, OutputKind::Sentences) {
            return Err(anyhow!(
                "No {} in {:?}",
                OutputKind::Sentences.file_name(source_language),
                dir
            ));
        }

        let targets: Vec<&String> = listing
            .keys()
            .filter(|lang| lang.as_str() != source_language)
            .filter(|lang| {
                let lang = lang.as_str();
                has(lang, OutputKind::Sentences) && has(lang, OutputKind::Alignments) && has(lang, OutputKind::Scores)
            })
            .collect();
        info!(
            "Merging {} with {} target languages",
            language_utils::display_name(source_language),
            targets.len()
        );

        let read_sentences = |lang: &str| -> Result<SentenceFile> {
            FileManager::read_json(FileManager::output_path(dir, lang, OutputKind::Sentences))
        };
        let source_sentences = read_sentences(source_language)?;

        let mut target_files = Vec::with_capacity(targets.len());
        for lang in &targets {
            let alignments: AlignmentFile =
                FileManager::read_json(FileManager::output_path(dir, lang, OutputKind::Alignments))?;
            let scores: ScoreFile = FileManager::read_json(FileManager::output_path(dir, lang, OutputKind::Scores))?;
            target_files.push((lang.as_str(), read_sentences(lang.as_str())?, alignments, scores));
        }

        let mut merged: BTreeMap<String, MultiAlignment> = BTreeMap::new();
        let mut sentences: BTreeMap<String, HashMap<String, Vec<String>>> = BTreeMap::new();
        for (key, src) in &source_sentences {
            let mut graph = AlignmentGraph::new(source_language);
            let mut doc_sentences = HashMap::new();
            doc_sentences.insert(source_language.to_string(), src.clone());

            for &(lang, ref tgt_sentences, ref alignments, ref scores) in &target_files {
                let (Some(tgt), Some(record), Some(weights)) =
                    (tgt_sentences.get(key), alignments.get(key), scores.get(key))
                else {
                    continue;
                };
                graph
                    .add_record((source_language, src.len()), (lang, tgt.len()), record, weights)
                    .with_context(|| format!("Invalid '{}' alignment for document '{}'", lang, key))?;
                doc_sentences.insert(lang.to_string(), tgt.clone());
            }

            merged.insert(key.clone(), graph.components());
            sentences.insert(key.clone(), doc_sentences);
        }

        let policy = MergePolicy::from(&self.config.merge);
        export_multi(dir, &merged, &sentences, &policy)
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Write the three multi-way files; sentence rows only for groups `policy` keeps
fn export_multi(
    dir: &Path,
    merged: &BTreeMap<String, MultiAlignment>,
    sentences: &BTreeMap<String, HashMap<String, Vec<String>>>,
    policy: &MergePolicy,
) -> Result<MergeSummary> {
    let mut summary = MergeSummary {
        documents: merged.len(),
        ..MergeSummary::default()
    };
    let mut alignments = MultiAlignmentFile::new();
    let mut scores = ScoreFile::new();
    let mut rows = MultiSentenceFile::new();

    for (key, multi) in merged {
        alignments.insert(key.clone(), multi.index_lists());
        scores.insert(key.clone(), multi.confidences());
        summary.groups += multi.len();

        let empty = HashMap::new();
        let corpora = sentences.get(key).unwrap_or(&empty);
        let kept: Vec<_> = multi.filtered(policy).map(|g| g.sentence_row(corpora)).collect();
        summary.kept += kept.len();
        rows.insert(key.clone(), kept);
    }

    FileManager::write_json(dir.join(MULTI_ALIGNMENTS_FILE), &alignments)?;
    FileManager::write_json(dir.join(MULTI_SCORES_FILE), &scores)?;
    FileManager::write_json(dir.join(MULTI_SENTENCES_FILE), &rows)?;
    info!(
        "Merged {} documents into {} groups, {} kept for export",
        summary.documents, summary.groups, summary.kept
    );

    Ok(summary)
}
