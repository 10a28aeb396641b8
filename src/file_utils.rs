use anyhow::{anyhow, Context, Result};
use chrono::Local;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::alignment::AlignmentRecord;

// @module: File and directory utilities

/// Input corpus: document key -> language -> sentences
pub type Corpus = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// `<lang>_sentences.json`: document key -> sentences
pub type SentenceFile = BTreeMap<String, Vec<String>>;

/// `<lang>_alignments.json`: document key -> beads
pub type AlignmentFile = BTreeMap<String, AlignmentRecord>;

/// One document of a `<lang>_bitext.json` file: bead texts, source and target side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitextRecord {
    pub src: Vec<String>,
    pub tgt: Vec<String>,
}

/// `<lang>_bitext.json`: document key -> bead texts
pub type BitextFile = BTreeMap<String, BitextRecord>;

/// `<lang>_scores.json` and `multi-scores.json`: document key -> scores
pub type ScoreFile = BTreeMap<String, Vec<f32>>;

/// `multi-alignments.json`: document key -> language -> index list per group
pub type MultiAlignmentFile = BTreeMap<String, BTreeMap<String, Vec<Vec<usize>>>>;

/// `multi-sentences.json`: document key -> one `{language: text}` row per kept group
pub type MultiSentenceFile = BTreeMap<String, Vec<BTreeMap<String, String>>>;

pub const MULTI_ALIGNMENTS_FILE: &str = "multi-alignments.json";
pub const MULTI_SCORES_FILE: &str = "multi-scores.json";
pub const MULTI_SENTENCES_FILE: &str = "multi-sentences.json";

// @enum: Per-language output files
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutputKind {
    Sentences,
    Alignments,
    Scores,
    Bitext,
}

impl OutputKind {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Sentences => "sentences",
            Self::Alignments => "alignments",
            Self::Scores => "scores",
            Self::Bitext => "bitext",
        }
    }

    /// `<language>_<kind>.json`
    pub fn file_name(&self, language: &str) -> String {
        format!("{}_{}.json", language, self.suffix())
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "sentences" => Some(Self::Sentences),
            "alignments" => Some(Self::Alignments),
            "scores" => Some(Self::Scores),
            "bitext" => Some(Self::Bitext),
            _ => None,
        }
    }
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Deserialize a JSON file
    pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
        let content = Self::read_to_string(&path)?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON file: {:?}", path.as_ref()))
    }

    /// Serialize a value as pretty-printed JSON
    pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize JSON for: {:?}", path.as_ref()))?;
        Self::write_to_file(path, &content)
    }

    /// Read the input corpus and reject documents without any sentences
    pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Corpus> {
        let corpus: Corpus = Self::read_json(&path)?;
        if let Some((doc, _)) = corpus.iter().find(|(_, languages)| languages.is_empty()) {
            return Err(anyhow!("Document '{}' in {:?} has no languages", doc, path.as_ref()));
        }
        Ok(corpus)
    }

    /// Path of a per-language output file
    pub fn output_path<P: AsRef<Path>>(dir: P, language: &str, kind: OutputKind) -> PathBuf {
        dir.as_ref().join(kind.file_name(language))
    }

    /// Per-language output files found directly inside `dir`
    pub fn scan_output_dir<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, Vec<OutputKind>>> {
        let pattern = Regex::new(r"^([a-z]{2,3})_(sentences|alignments|scores|bitext)\.json$")
            .context("Invalid output file pattern")?;
        let mut found: BTreeMap<String, Vec<OutputKind>> = BTreeMap::new();

        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let Some(caps) = pattern.captures(&name) else {
                continue;
            };
            if let Some(kind) = OutputKind::from_suffix(&caps[2]) {
                let kinds = found.entry(caps[1].to_string()).or_default();
                kinds.push(kind);
                kinds.sort();
            }
        }

        Ok(found)
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Get current timestamp
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        // Open file in append mode, create if it doesn't exist
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
