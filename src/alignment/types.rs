/*!
 * Value types shared by the alignment passes.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Shape of a bead: `src` source sentences aligned to `tgt` target sentences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlignmentType {
    /// Number of source sentences
    pub src: usize,
    /// Number of target sentences
    pub tgt: usize,
}

impl AlignmentType {
    /// Target sentence with no source counterpart
    pub const INSERTION: AlignmentType = AlignmentType { src: 0, tgt: 1 };
    /// Source sentence with no target counterpart
    pub const DELETION: AlignmentType = AlignmentType { src: 1, tgt: 0 };
    /// One sentence on each side
    pub const ONE_TO_ONE: AlignmentType = AlignmentType { src: 1, tgt: 1 };

    pub const fn new(src: usize, tgt: usize) -> Self {
        Self { src, tgt }
    }

    /// True for insertions and deletions
    pub fn is_gap(&self) -> bool {
        self.src == 0 || self.tgt == 0
    }

    /// Sentences consumed on both sides together
    pub fn size(&self) -> usize {
        self.src + self.tgt
    }
}

impl fmt::Display for AlignmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.src, self.tgt)
    }
}

/// One unit of an alignment: a contiguous source span matched to a contiguous
/// target span. Either side may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bead {
    /// Source sentence indices
    pub src: Range<usize>,
    /// Target sentence indices
    pub tgt: Range<usize>,
}

impl Bead {
    pub fn new(src: Range<usize>, tgt: Range<usize>) -> Self {
        Self { src, tgt }
    }

    /// Target-only bead at the given source position
    pub fn insertion(src_pos: usize, tgt_index: usize) -> Self {
        Self::new(src_pos..src_pos, tgt_index..tgt_index + 1)
    }

    /// Source-only bead at the given target position
    pub fn deletion(src_index: usize, tgt_pos: usize) -> Self {
        Self::new(src_index..src_index + 1, tgt_pos..tgt_pos)
    }

    pub fn alignment_type(&self) -> AlignmentType {
        AlignmentType::new(self.src.len(), self.tgt.len())
    }

    pub fn src_indices(&self) -> Vec<usize> {
        self.src.clone().collect()
    }

    pub fn tgt_indices(&self) -> Vec<usize> {
        self.tgt.clone().collect()
    }
}

impl fmt::Display for Bead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?})", self.src_indices(), self.tgt_indices())
    }
}

/// Scores of one bead
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Incremental search cost of the bead; lower is better
    pub cost: f32,
    /// Source bytes / (target bytes * char_ratio); 0 for an empty target
    pub length_ratio: f32,
    /// Cosine similarity of the concatenated spans, when requested
    pub cosine: Option<f32>,
}

impl ScoreRecord {
    /// Weight of the bead where higher means more trustworthy
    pub fn confidence(&self) -> f32 {
        self.cosine.unwrap_or(-self.cost)
    }
}

/// Persisted form of a bead list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlignmentRecord {
    /// Source indices of each bead
    pub src: Vec<Vec<usize>>,
    /// Target indices of each bead, parallel to `src`
    pub tgt: Vec<Vec<usize>>,
}

impl AlignmentRecord {
    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    /// Pairs of index lists, one per bead
    pub fn pairs(&self) -> impl Iterator<Item = (&[usize], &[usize])> {
        self.src
            .iter()
            .zip(self.tgt.iter())
            .map(|(s, t)| (s.as_slice(), t.as_slice()))
    }
}

/// Result of one pairwise alignment run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Alignment {
    /// Beads in source order
    pub beads: Vec<Bead>,
    /// One record per bead
    pub scores: Vec<ScoreRecord>,
}

impl Alignment {
    pub fn len(&self) -> usize {
        self.beads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beads.is_empty()
    }

    /// Sum of the incremental bead costs
    pub fn total_cost(&self) -> f32 {
        self.scores.iter().map(|s| s.cost).sum()
    }

    /// Per-bead weights as written to the scores file
    pub fn confidences(&self) -> Vec<f32> {
        self.scores.iter().map(ScoreRecord::confidence).collect()
    }

    pub fn to_record(&self) -> AlignmentRecord {
        AlignmentRecord {
            src: self.beads.iter().map(Bead::src_indices).collect(),
            tgt: self.beads.iter().map(Bead::tgt_indices).collect(),
        }
    }

    /// Joined sentence text of every bead, source and target side
    pub fn bead_texts(&self, src_sents: &[String], tgt_sents: &[String]) -> (Vec<String>, Vec<String>) {
        let src_lines = self.beads.iter().map(|b| join_span(src_sents, &b.src)).collect();
        let tgt_lines = self.beads.iter().map(|b| join_span(tgt_sents, &b.tgt)).collect();
        (src_lines, tgt_lines)
    }
}

fn join_span(sents: &[String], span: &Range<usize>) -> String {
    sents
        .get(span.clone())
        .map(|s| s.join(" "))
        .unwrap_or_default()
}
