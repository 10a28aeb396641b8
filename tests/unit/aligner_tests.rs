/*!
 * Tests for the two-pass aligner on hand-built embedding tables
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use beadalign::alignment::dp::{MarginCost, TransitionCost};
use beadalign::alignment::embeddings::char_ratio;
use beadalign::alignment::{Aligner, Alignment, AlignmentType, Bead, SpanEmbeddingTable};
use beadalign::app_config::{AlignerConfig, TieBreak};
use beadalign::errors::{AlignError, ProviderError};
use beadalign::providers::hashing::HashingEmbedder;
use beadalign::providers::mock::concept_vector;
use crate::common;

fn aligner(max_align: usize) -> Aligner {
    Aligner::new(AlignerConfig {
        max_align,
        ..AlignerConfig::default()
    })
    .expect("valid aligner config")
}

fn index_pairs(alignment: &Alignment) -> Vec<(Vec<usize>, Vec<usize>)> {
    alignment
        .beads
        .iter()
        .map(|b| (b.src_indices(), b.tgt_indices()))
        .collect()
}

/// Beads must tile both sequences in order
fn assert_partition(alignment: &Alignment, src_len: usize, tgt_len: usize, max_align: usize) {
    let mut cursor = (0, 0);
    for bead in &alignment.beads {
        assert_eq!((bead.src.start, bead.tgt.start), cursor, "bead {} leaves a hole", bead);
        let kind = bead.alignment_type();
        assert!(kind.size() > 0, "empty bead {}", bead);
        assert!(kind.src <= max_align && kind.tgt <= max_align, "bead {} is too wide", bead);
        cursor = (bead.src.end, bead.tgt.end);
    }
    assert_eq!(cursor, (src_len, tgt_len));
    assert_eq!(alignment.scores.len(), alignment.beads.len());
}

/// Test that a merged target sentence is matched by a 2-1 bead
#[test]
fn test_align_withMergedTargetSentence_shouldEmitTwoToOneBead() -> Result<(), AlignError> {
    let src = common::concept_table(&["A.", "B.", "C."], 2)?;
    let tgt = common::concept_table(&["A'.", "B'C'."], 2)?;

    let alignment = aligner(2).align(&src, &tgt)?;

    assert_eq!(
        index_pairs(&alignment),
        vec![(vec![0], vec![0]), (vec![1, 2], vec![1])]
    );
    assert_partition(&alignment, 3, 2, 2);
    for score in &alignment.scores {
        let cosine = score.cosine.expect("cosine is reported by default");
        assert!((cosine - 1.0).abs() < 1e-4, "cosine {}", cosine);
        assert!(score.cost < 0.0);
    }
    assert!((alignment.scores[1].length_ratio - 5.0 / 3.75).abs() < 1e-4);
    Ok(())
}

/// Test that the 2-1 bead is cheaper than a 1-1 match plus a gap in either order
#[test]
fn test_marginCost_withMergedTargetSentence_shouldPreferTwoToOne() -> Result<(), AlignError> {
    let src = common::concept_table(&["A.", "B.", "C."], 2)?;
    let tgt = common::concept_table(&["A'.", "B'C'."], 2)?;
    let config = AlignerConfig {
        max_align: 2,
        ..AlignerConfig::default()
    };
    let costs = MarginCost::new(&src, &tgt, char_ratio(&src, &tgt), &config);

    let merged = costs.cost(AlignmentType::new(2, 1), 3, 2);
    let match_then_delete =
        costs.cost(AlignmentType::ONE_TO_ONE, 2, 2) + costs.cost(AlignmentType::DELETION, 3, 2);
    let delete_then_match =
        costs.cost(AlignmentType::DELETION, 2, 1) + costs.cost(AlignmentType::ONE_TO_ONE, 3, 2);

    assert!(merged < match_then_delete, "{} vs {}", merged, match_then_delete);
    assert!(merged < delete_then_match, "{} vs {}", merged, delete_then_match);

    let alignment = aligner(2).align(&src, &tgt)?;
    assert!((alignment.scores[1].cost - merged).abs() < 1e-5);
    Ok(())
}

/// Test that unrelated sentences collapse into one zero-similarity bead.
///
/// With the default `skip` every gap costs 0.1, so an orthogonal match at
/// cost 0 is cheaper than deleting and inserting.
#[test]
fn test_align_withUnrelatedSentences_shouldEmitZeroConfidenceBead() -> Result<(), AlignError> {
    let src = common::concept_table(&["X.", "Y."], 2)?;
    let tgt = common::concept_table(&["Z."], 2)?;

    let alignment = aligner(2).align(&src, &tgt)?;

    assert_eq!(alignment.beads, vec![Bead::new(0..2, 0..1)]);
    let score = &alignment.scores[0];
    assert!(score.cost.abs() < 1e-6, "cost {}", score.cost);
    assert!(score.cosine.expect("cosine is reported by default").abs() < 1e-6);
    assert!(score.confidence().abs() < 1e-6);
    Ok(())
}

/// Test that a gap bonus turns unrelated sentences into gap beads
#[test]
fn test_align_withUnrelatedSentencesAndGapBonus_shouldEmitOnlyGaps() -> Result<(), AlignError> {
    let src = common::concept_table(&["X.", "Y."], 2)?;
    let tgt = common::concept_table(&["Z."], 2)?;
    let aligner = Aligner::new(AlignerConfig {
        max_align: 2,
        skip: 0.1,
        ..AlignerConfig::default()
    })?;

    let alignment = aligner.align(&src, &tgt)?;

    assert_eq!(alignment.len(), 3);
    assert!(alignment.beads.iter().all(|b| b.alignment_type().is_gap()));
    assert_partition(&alignment, 2, 1, 2);
    assert!((alignment.total_cost() + 0.3).abs() < 1e-5);
    Ok(())
}

/// Test identical sequences align one to one
#[test]
fn test_align_withIdenticalSequences_shouldAlignOneToOne() -> Result<(), AlignError> {
    let texts = ["A.", "B.", "C.", "D.", "E.", "F."];
    let src = common::concept_table(&texts, 5)?;
    let tgt = common::concept_table(&texts, 5)?;

    let alignment = aligner(5).align(&src, &tgt)?;

    let expected: Vec<(Vec<usize>, Vec<usize>)> = (0..texts.len()).map(|i| (vec![i], vec![i])).collect();
    assert_eq!(index_pairs(&alignment), expected);
    Ok(())
}

/// Test empty sides
#[test]
fn test_align_withEmptySide_shouldEmitOnlyGapBeads() -> Result<(), AlignError> {
    let empty = common::concept_table(&[], 2)?;
    let two = common::concept_table(&["A.", "B."], 2)?;
    let aligner = aligner(2);

    let insertions = aligner.align(&empty, &two)?;
    assert_eq!(insertions.beads, vec![Bead::insertion(0, 0), Bead::insertion(0, 1)]);
    assert!(insertions.scores.iter().all(|s| (s.cost - 0.1).abs() < 1e-6));

    let deletions = aligner.align(&two, &empty)?;
    assert_eq!(deletions.beads, vec![Bead::deletion(0, 0), Bead::deletion(1, 0)]);

    let nothing = aligner.align(&empty, &empty)?;
    assert!(nothing.is_empty());
    Ok(())
}

/// Test that tables from different embedding spaces are rejected
#[test]
fn test_align_withDifferentDimensions_shouldFail() -> Result<(), AlignError> {
    let src = common::concept_table(&["A.", "B."], 2)?;
    let tgt = SpanEmbeddingTable::from_embeddings(&common::sentences(&["A.", "B."]), 2, 100, |spans| {
        Ok::<_, ProviderError>(
            spans
                .iter()
                .map(|s| {
                    let mut v = concept_vector(s);
                    v.truncate(8);
                    v.push(1.0);
                    v
                })
                .collect(),
        )
    })?;

    let result = aligner(2).align(&src, &tgt);

    assert!(matches!(
        result,
        Err(AlignError::DimensionMismatch { expected: 26, actual: 9 })
    ));
    Ok(())
}

/// Test that a table with too short spans is rejected
#[test]
fn test_align_withSpanTableTooSmall_shouldFail() -> Result<(), AlignError> {
    let src = common::concept_table(&["A.", "B."], 1)?;
    let tgt = common::concept_table(&["A.", "B."], 1)?;

    let result = aligner(2).align(&src, &tgt);

    assert!(matches!(
        result,
        Err(AlignError::SpanTableTooSmall { available: 1, required: 2 })
    ));
    Ok(())
}

/// Test that a window that cannot reach the last cell is reported
#[test]
fn test_secondPass_withWindowTooNarrow_shouldReportUnreachableTerminal() -> Result<(), AlignError> {
    let src_texts = vec!["s."; 11];
    let tgt_texts = vec!["t."; 41];
    let src = common::concept_table(&src_texts, 2)?;
    let tgt = common::concept_table(&tgt_texts, 2)?;
    let first: Vec<Bead> = (0..=10).map(|i| Bead::new(i..i + 1, i..i + 1)).collect();

    let result = aligner(2).second_pass(&src, &tgt, &first);

    match result {
        Err(error @ AlignError::UnreachableTerminal { .. }) => {
            assert!(error.is_recoverable());
            assert!(matches!(
                error,
                AlignError::UnreachableTerminal { src_len: 11, tgt_len: 41, win: 5 }
            ));
        }
        other => panic!("expected an unreachable terminal, got {:?}", other),
    }
    Ok(())
}

/// Test that a first pass with holes is refused
#[test]
fn test_secondPass_withNonContiguousFirstPass_shouldFail() -> Result<(), AlignError> {
    let src = common::concept_table(&["A.", "B.", "C."], 2)?;
    let tgt = common::concept_table(&["A.", "B.", "C."], 2)?;
    let first = vec![Bead::new(0..1, 0..1), Bead::new(2..3, 2..3)];

    let result = aligner(2).second_pass(&src, &tgt, &first);

    assert!(matches!(result, Err(AlignError::InconsistentInput(_))));
    Ok(())
}

/// Test that the first pass only uses its three bead shapes
#[test]
fn test_firstPass_withMergedSentence_shouldUseSmallBeadsOnly() -> Result<(), AlignError> {
    let src = common::concept_table(&["A.", "B.", "C."], 2)?;
    let tgt = common::concept_table(&["A'.", "B'C'."], 2)?;

    let beads = aligner(2).first_pass(&src, &tgt)?;

    let allowed = [AlignmentType::INSERTION, AlignmentType::DELETION, AlignmentType::ONE_TO_ONE];
    assert!(beads.iter().all(|b| allowed.contains(&b.alignment_type())));
    let consumed = beads.last().map(|b| (b.src.end, b.tgt.end));
    assert_eq!(consumed, Some((3, 2)));
    Ok(())
}

/// Test that every tie-break rule still yields a valid partition
#[test]
fn test_align_withLargerSpanTieBreak_shouldStillPartition() -> Result<(), AlignError> {
    let texts = ["A.", "A.", "B.", "B."];
    let src = common::concept_table(&texts, 2)?;
    let tgt = common::concept_table(&["A.", "B."], 2)?;
    let aligner = Aligner::new(AlignerConfig {
        max_align: 2,
        tie_break: TieBreak::LargerSpan,
        ..AlignerConfig::default()
    })?;

    let alignment = aligner.align(&src, &tgt)?;

    assert_partition(&alignment, 4, 2, 2);
    Ok(())
}

/// Test that random inputs always give an ordered, complete partition
#[test]
fn test_align_withRandomSequences_shouldAlwaysPartitionBothSides() -> Result<(), AlignError> {
    let words = [
        "river", "stone", "light", "paper", "window", "garden", "letter", "music", "winter", "bridge",
    ];
    let embedder = HashingEmbedder::new(64);
    let mut rng = StdRng::seed_from_u64(7);
    let aligner = aligner(3);

    for _ in 0..20 {
        let src_len = rng.random_range(1..12);
        let tgt_len = rng.random_range(1..12);
        let mut random_sentences = |count: usize| -> Vec<String> {
            (0..count)
                .map(|_| {
                    let len = rng.random_range(1..6);
                    let mut sentence: Vec<&str> = (0..len).map(|_| words[rng.random_range(0..words.len())]).collect();
                    sentence.push(".");
                    sentence.join(" ")
                })
                .collect()
        };
        let src_sents = random_sentences(src_len);
        let tgt_sents = random_sentences(tgt_len);

        let embed = |spans: &[String]| -> Result<Vec<Vec<f32>>, ProviderError> {
            Ok(spans.iter().map(|s| embedder.embed_text(s)).collect())
        };
        let src = SpanEmbeddingTable::from_embeddings(&src_sents, 3, 1000, embed)?;
        let tgt = SpanEmbeddingTable::from_embeddings(&tgt_sents, 3, 1000, embed)?;

        let alignment = aligner.align(&src, &tgt)?;
        assert_partition(&alignment, src_len, tgt_len, 3);

        let again = aligner.align(&src, &tgt)?;
        assert_eq!(again, alignment);
    }
    Ok(())
}
