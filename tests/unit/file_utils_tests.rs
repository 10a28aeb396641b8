/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

use beadalign::alignment::AlignmentRecord;
use beadalign::file_utils::{AlignmentFile, FileManager, OutputKind};
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that dir_exists returns false for non-existent directories
#[test]
fn test_dir_exists_withNonExistentDir_shouldReturnFalse() {
    assert!(!FileManager::dir_exists("./non_existent_directory_12345"));
}

/// Test that write_to_file creates missing parent directories
#[test]
fn test_write_to_file_withNestedPath_shouldCreateParents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b").join("out.txt");

    FileManager::write_to_file(&nested, "content")?;

    assert_eq!(FileManager::read_to_string(&nested)?, "content");
    Ok(())
}

/// Test output file naming
#[test]
fn test_output_path_withLanguageAndKind_shouldFollowNamingScheme() {
    let dir = Path::new("/tmp/out");
    assert_eq!(
        FileManager::output_path(dir, "de", OutputKind::Alignments),
        Path::new("/tmp/out/de_alignments.json")
    );
    assert_eq!(OutputKind::Sentences.file_name("en"), "en_sentences.json");
    assert_eq!(OutputKind::Scores.file_name("fr"), "fr_scores.json");
    assert_eq!(OutputKind::Bitext.file_name("de"), "de_bitext.json");
}

/// Test that alignment files keep their parallel-array layout on disk
#[test]
fn test_write_json_withAlignmentFile_shouldReadBackIdentical() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = FileManager::output_path(temp_dir.path(), "de", OutputKind::Alignments);

    let mut file = AlignmentFile::new();
    file.insert(
        "doc1".to_string(),
        AlignmentRecord {
            src: vec![vec![0], vec![1, 2], vec![]],
            tgt: vec![vec![0], vec![1], vec![2]],
        },
    );
    FileManager::write_json(&path, &file)?;

    let raw: serde_json::Value = serde_json::from_str(&FileManager::read_to_string(&path)?)?;
    assert_eq!(raw["doc1"]["src"][1], serde_json::json!([1, 2]));
    assert_eq!(raw["doc1"]["src"][2], serde_json::json!([]));

    let loaded: AlignmentFile = FileManager::read_json(&path)?;
    assert_eq!(loaded, file);
    Ok(())
}

/// Test corpus loading
#[test]
fn test_read_corpus_withValidFile_shouldReturnDocuments() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_corpus(temp_dir.path(), "corpus.json")?;

    let corpus = FileManager::read_corpus(&path)?;

    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus["doc1"]["de"].len(), 3);
    assert_eq!(corpus["doc2"]["fr"], vec!["Delta.".to_string(), "Echo.".to_string()]);
    Ok(())
}

/// Test that a document without languages is rejected
#[test]
fn test_read_corpus_withEmptyDocument_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "corpus.json", r#"{"doc1": {}}"#)?;

    let result = FileManager::read_corpus(&path);

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("doc1"));
    Ok(())
}

/// Test that malformed JSON is reported with the file name
#[test]
fn test_read_json_withMalformedContent_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;

    let result: Result<BTreeMap<String, Vec<String>>> = FileManager::read_json(&path);

    assert!(result.is_err());
    Ok(())
}

/// Test that scanning finds per-language outputs and ignores other files
#[test]
fn test_scan_output_dir_withMixedFiles_shouldGroupKindsByLanguage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    for name in [
        "en_sentences.json",
        "de_sentences.json",
        "de_scores.json",
        "de_alignments.json",
        "de_bitext.json",
        "multi-alignments.json",
        "notes.txt",
        "EN_sentences.json",
    ] {
        common::create_test_file(dir, name, "{}")?;
    }
    FileManager::ensure_dir(dir.join("fr_sentences.json"))?;

    let found = FileManager::scan_output_dir(dir)?;

    assert_eq!(found.len(), 2);
    assert_eq!(found["en"], vec![OutputKind::Sentences]);
    assert_eq!(
        found["de"],
        vec![OutputKind::Sentences, OutputKind::Alignments, OutputKind::Scores, OutputKind::Bitext]
    );
    Ok(())
}

/// Test that log lines are appended with a timestamp
#[test]
fn test_append_to_log_file_withTwoMessages_shouldKeepBoth() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("run.log");

    FileManager::append_to_log_file(&path, "first")?;
    FileManager::append_to_log_file(&path, "second")?;

    let content = FileManager::read_to_string(&path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
    assert!(lines[1].ends_with("second"));
    Ok(())
}
