/*!
 * Search paths: the band of DP cells each pass is allowed to visit.
 *
 * Row `i` of a path is the inclusive range of target positions `j` such that
 * cell (i, j), "i source and j target sentences consumed", may be filled.
 */

use crate::app_config::FirstPassConfig;
use crate::errors::AlignError;

use super::candidates::CandidateSet;
use super::types::Bead;

/// Inclusive column range for every row 0..=src_len
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    bounds: Vec<(usize, usize)>,
    tgt_len: usize,
}

impl SearchPath {
    /// Every cell of the (src_len + 1) x (tgt_len + 1) matrix
    pub fn full(src_len: usize, tgt_len: usize) -> Self {
        Self {
            bounds: vec![(0, tgt_len); src_len + 1],
            tgt_len,
        }
    }

    /// Diagonal band wide enough to hold every candidate pair.
    ///
    /// The band is centred on round(i * m / n). Its half-width is the largest
    /// of the configured minimum, `width_ratio * max(n, m)` and the farthest
    /// candidate pair plus `slack`. Adjacent rows always overlap, so the
    /// terminal cell stays reachable.
    pub fn first_pass(
        src_len: usize,
        tgt_len: usize,
        candidates: &CandidateSet,
        config: &FirstPassConfig,
    ) -> Self {
        if src_len == 0 {
            return Self::full(0, tgt_len);
        }

        let centre = |i: usize| -> usize {
            ((i as f64) * (tgt_len as f64) / (src_len as f64)).round() as usize
        };

        let longest = src_len.max(tgt_len) as f64;
        let ratio_width = (config.width_ratio as f64 * longest).ceil() as usize;
        let deviation = candidates
            .pairs()
            .filter(|&(s, t)| s < src_len && t < tgt_len)
            .map(|(s, t)| (t + 1).abs_diff(centre(s + 1)))
            .max()
            .map(|d| d + config.slack)
            .unwrap_or(0);
        let half_width = config.min_half_width.max(ratio_width).max(deviation);

        let mut bounds: Vec<(usize, usize)> = (0..=src_len)
            .map(|i| {
                let c = centre(i);
                (c.saturating_sub(half_width), (c + half_width).min(tgt_len))
            })
            .collect();

        for i in 1..bounds.len() {
            if bounds[i].0 > bounds[i - 1].1 {
                bounds[i - 1].1 = bounds[i].0;
            }
        }
        bounds[0].0 = 0;
        bounds[src_len].1 = tgt_len;

        Self { bounds, tgt_len }
    }

    /// Band of radius `win` around the cells visited by a bead path.
    ///
    /// Beads must lie inside the matrix and follow each other without gaps
    /// from the origin. They need not reach the terminal cell, in which case
    /// the second pass reports it unreachable.
    pub fn from_alignment(
        beads: &[Bead],
        win: usize,
        src_len: usize,
        tgt_len: usize,
    ) -> Result<Self, AlignError> {
        let mut rows: Vec<Option<(usize, usize)>> = vec![None; src_len + 1];
        let mut extend = |row: usize, lo: usize, hi: usize| {
            rows[row] = Some(match rows[row] {
                Some((a, b)) => (a.min(lo), b.max(hi)),
                None => (lo, hi),
            });
        };

        let mut cursor = (0usize, 0usize);
        for bead in beads {
            if bead.src.end > src_len || bead.tgt.end > tgt_len {
                return Err(AlignError::InconsistentInput(format!(
                    "bead {} lies outside a {}x{} matrix",
                    bead, src_len, tgt_len
                )));
            }
            if (bead.src.start, bead.tgt.start) != cursor {
                return Err(AlignError::InconsistentInput(format!(
                    "bead {} does not start where the previous bead ends ({}, {})",
                    bead, cursor.0, cursor.1
                )));
            }

            let (s0, t0) = (bead.src.start, bead.tgt.start);
            let (s1, t1) = (bead.src.end, bead.tgt.end);
            extend(s0, t0, if s0 == s1 { t1 } else { t0 });
            for row in s0 + 1..s1 {
                extend(row, t0, t1);
            }
            if s1 > s0 {
                extend(s1, t1, t1);
            }
            cursor = (s1, t1);
        }

        let mut last = 0;
        let bounds = rows
            .into_iter()
            .map(|row| {
                let (lo, hi) = row.unwrap_or((last, last));
                last = hi;
                (lo.saturating_sub(win), (hi + win).min(tgt_len))
            })
            .collect();

        Ok(Self { bounds, tgt_len })
    }

    /// Column range of row `i`
    pub fn bounds(&self, i: usize) -> Option<(usize, usize)> {
        self.bounds.get(i).copied()
    }

    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.bounds(i).is_some_and(|(lo, hi)| lo <= j && j <= hi)
    }

    /// Number of rows, src_len + 1
    pub fn rows(&self) -> usize {
        self.bounds.len()
    }

    pub fn tgt_len(&self) -> usize {
        self.tgt_len
    }

    /// Cells inside the band
    pub fn cell_count(&self) -> usize {
        self.bounds.iter().map(|(lo, hi)| hi + 1 - lo).sum()
    }
}
