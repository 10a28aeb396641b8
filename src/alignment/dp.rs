/*!
 * Banded dynamic program over bead paths.
 *
 * Cell (i, j) holds the lowest accumulated cost of aligning the first `i`
 * source and first `j` target sentences. A transition of type (a, b) moves
 * from (i - a, j - b) to (i, j). Cells outside the search path, and cells no
 * finite-cost transition reaches, hold `f32::INFINITY`.
 */

use crate::app_config::{AlignerConfig, TieBreak};
use crate::errors::AlignError;

use super::candidates::CandidateSet;
use super::catalog::AlignmentCatalog;
use super::embeddings::{dot, SpanEmbeddingTable};
use super::search_path::SearchPath;
use super::types::{AlignmentType, Bead};

/// Cost of entering cell (i, j) with a bead of the given type
pub trait TransitionCost {
    fn cost(&self, kind: AlignmentType, i: usize, j: usize) -> f32;
}

/// Filled cost and backpointer matrix, stored row by row over the band
#[derive(Debug, Clone)]
pub struct DpTable {
    path: SearchPath,
    /// Start of each row in `costs` and `pointers`
    offsets: Vec<usize>,
    costs: Vec<f32>,
    /// Catalog index of the winning transition
    pointers: Vec<Option<u32>>,
}

impl DpTable {
    /// Fill every cell of `path` in row-major order
    pub fn fill<C>(path: &SearchPath, catalog: &AlignmentCatalog, tie_break: TieBreak, cost_fn: &C) -> Self
    where
        C: TransitionCost + ?Sized,
    {
        let mut offsets = Vec::with_capacity(path.rows());
        let mut total = 0;
        for i in 0..path.rows() {
            offsets.push(total);
            if let Some((lo, hi)) = path.bounds(i) {
                total += hi + 1 - lo;
            }
        }

        let mut table = Self {
            path: path.clone(),
            offsets,
            costs: vec![f32::INFINITY; total],
            pointers: vec![None; total],
        };
        if let Some(origin) = table.index(0, 0) {
            table.costs[origin] = 0.0;
        }

        for i in 0..path.rows() {
            let Some((lo, hi)) = path.bounds(i) else { continue };
            for j in lo..=hi {
                if i == 0 && j == 0 {
                    continue;
                }
                let mut best: Option<(f32, usize, AlignmentType)> = None;
                for (idx, kind) in catalog.iter() {
                    if kind.src > i || kind.tgt > j {
                        continue;
                    }
                    let prev = table.cost(i - kind.src, j - kind.tgt);
                    if !prev.is_finite() {
                        continue;
                    }
                    let candidate = prev + cost_fn.cost(kind, i, j);
                    if !candidate.is_finite() {
                        continue;
                    }
                    let better = match best {
                        None => true,
                        Some((cost, _, winner)) => {
                            candidate < cost
                                || (candidate == cost
                                    && tie_break == TieBreak::LargerSpan
                                    && kind.size() > winner.size())
                        }
                    };
                    if better {
                        best = Some((candidate, idx, kind));
                    }
                }
                // A cell only gets a finite cost together with its pointer
                if let (Some((cost, idx, _)), Some(cell)) = (best, table.index(i, j)) {
                    if let Ok(pointer) = u32::try_from(idx) {
                        table.costs[cell] = cost;
                        table.pointers[cell] = Some(pointer);
                    }
                }
            }
        }

        table
    }

    fn index(&self, i: usize, j: usize) -> Option<usize> {
        let (lo, hi) = self.path.bounds(i)?;
        if j < lo || j > hi {
            return None;
        }
        Some(self.offsets[i] + j - lo)
    }

    /// Accumulated cost of cell (i, j), infinite outside the band
    pub fn cost(&self, i: usize, j: usize) -> f32 {
        self.index(i, j)
            .map(|cell| self.costs[cell])
            .unwrap_or(f32::INFINITY)
    }

    /// Winning transition into cell (i, j)
    pub fn pointer(&self, i: usize, j: usize) -> Option<u32> {
        self.index(i, j).and_then(|cell| self.pointers[cell])
    }

    /// Cost of the terminal cell when a finite-cost path reaches it
    pub fn terminal_cost(&self) -> Option<f32> {
        let n = self.path.rows().checked_sub(1)?;
        let cost = self.cost(n, self.path.tgt_len());
        cost.is_finite().then_some(cost)
    }

    /// Walk backpointers from the terminal cell to the origin.
    ///
    /// Returns the beads in source order with the incremental cost of each.
    pub fn backtrack(&self, catalog: &AlignmentCatalog) -> Result<Vec<(Bead, f32)>, AlignError> {
        let mut i = self.path.rows().saturating_sub(1);
        let mut j = self.path.tgt_len();
        let mut beads = Vec::new();

        while i > 0 || j > 0 {
            let kind = self
                .pointer(i, j)
                .and_then(|idx| catalog.get(idx as usize))
                .filter(|kind| kind.src <= i && kind.tgt <= j)
                .ok_or(AlignError::BacktrackFailed { i, j })?;
            let (pi, pj) = (i - kind.src, j - kind.tgt);
            beads.push((Bead::new(pi..i, pj..j), self.cost(i, j) - self.cost(pi, pj)));
            i = pi;
            j = pj;
        }

        beads.reverse();
        Ok(beads)
    }
}

/// Coarse pass: a 1-1 step onto a retrieved candidate earns its similarity
#[derive(Debug)]
pub struct FirstPassCost<'a> {
    candidates: &'a CandidateSet,
}

impl<'a> FirstPassCost<'a> {
    pub fn new(candidates: &'a CandidateSet) -> Self {
        Self { candidates }
    }
}

impl TransitionCost for FirstPassCost<'_> {
    fn cost(&self, kind: AlignmentType, i: usize, j: usize) -> f32 {
        if kind != AlignmentType::ONE_TO_ONE {
            return 0.0;
        }
        self.candidates
            .similarity(i - 1, j - 1)
            .map(|sim| -sim)
            .unwrap_or(0.0)
    }
}

/// Fine pass: margin-adjusted span similarity scaled by length agreement
#[derive(Debug)]
pub struct MarginCost<'a> {
    src: &'a SpanEmbeddingTable,
    tgt: &'a SpanEmbeddingTable,
    char_ratio: f32,
    skip: f32,
    margin: bool,
    len_penalty: bool,
}

impl<'a> MarginCost<'a> {
    pub fn new(
        src: &'a SpanEmbeddingTable,
        tgt: &'a SpanEmbeddingTable,
        char_ratio: f32,
        config: &AlignerConfig,
    ) -> Self {
        Self {
            src,
            tgt,
            char_ratio,
            skip: config.skip,
            margin: config.margin,
            len_penalty: config.len_penalty,
        }
    }

    /// Adjusted similarity of the bead of type `kind` ending at (i, j)
    pub fn score(&self, kind: AlignmentType, i: usize, j: usize) -> Option<f32> {
        if kind.is_gap() {
            return Some(self.skip);
        }
        let src_v = self.src.vector_ending_at(kind.src, i)?;
        let tgt_v = self.tgt.vector_ending_at(kind.tgt, j)?;
        let mut sim = dot(src_v, tgt_v);

        if self.margin {
            let tgt_side = neighbour_similarity(src_v, self.tgt, j - kind.tgt, j);
            let src_side = neighbour_similarity(tgt_v, self.src, i - kind.src, i);
            sim -= (tgt_side + src_side) / 2.0;
        }

        if self.len_penalty {
            let src_bytes = self.src.byte_len(kind.src, i - kind.src)? as f32;
            let tgt_bytes = self.tgt.byte_len(kind.tgt, j - kind.tgt)? as f32 * self.char_ratio;
            sim *= length_penalty(src_bytes, tgt_bytes);
        }

        Some(sim)
    }
}

impl TransitionCost for MarginCost<'_> {
    fn cost(&self, kind: AlignmentType, i: usize, j: usize) -> f32 {
        self.score(kind, i, j).map(|s| -s).unwrap_or(f32::INFINITY)
    }
}

/// Mean similarity of `v` to the sentences just outside `start..end`
fn neighbour_similarity(v: &[f32], table: &SpanEmbeddingTable, start: usize, end: usize) -> f32 {
    let left = start
        .checked_sub(1)
        .and_then(|idx| table.vector(1, idx))
        .map(|n| dot(v, n));
    let right = table.vector(1, end).map(|n| dot(v, n));
    match (left, right) {
        (Some(l), Some(r)) => (l + r) / 2.0,
        (Some(s), None) | (None, Some(s)) => s,
        (None, None) => 0.0,
    }
}

/// log2(1 + shorter / longer); 1 when both sides are empty
pub fn length_penalty(src_len: f32, tgt_len: f32) -> f32 {
    let longer = src_len.max(tgt_len);
    if longer <= 0.0 {
        return 1.0;
    }
    (1.0 + src_len.min(tgt_len) / longer).log2()
}
