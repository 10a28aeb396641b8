/*!
 * Two-pass sentence aligner.
 *
 * Pass one runs a cheap DP over a wide diagonal band seeded by top-k
 * candidates, with only insertion, deletion and 1-1 beads. Pass two searches
 * a narrow window around that path with the full catalog and the
 * margin-adjusted cost.
 */

use log::debug;

use crate::app_config::AlignerConfig;
use crate::errors::AlignError;

use super::candidates::CandidateSet;
use super::catalog::AlignmentCatalog;
use super::dp::{DpTable, FirstPassCost, MarginCost};
use super::embeddings::{char_ratio, SpanEmbeddingTable};
use super::scoring::score_beads;
use super::search_path::SearchPath;
use super::types::{Alignment, Bead};

/// Aligns two embedded sentence sequences
#[derive(Debug, Clone)]
pub struct Aligner {
    config: AlignerConfig,
    catalog: AlignmentCatalog,
    first_catalog: AlignmentCatalog,
}

impl Aligner {
    /// Validate the configuration and build the catalogs once
    pub fn new(config: AlignerConfig) -> Result<Self, AlignError> {
        config.validate()?;
        let catalog = AlignmentCatalog::new(config.max_align)?;
        Ok(Self {
            config,
            catalog,
            first_catalog: AlignmentCatalog::first_pass(),
        })
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Catalog of the second pass
    pub fn catalog(&self) -> &AlignmentCatalog {
        &self.catalog
    }

    /// Run both passes and score the result
    pub fn align(&self, src: &SpanEmbeddingTable, tgt: &SpanEmbeddingTable) -> Result<Alignment, AlignError> {
        self.check_tables(src, tgt)?;

        if src.is_empty() || tgt.is_empty() {
            return Ok(self.gap_alignment(src, tgt));
        }

        let first = self.first_pass(src, tgt)?;
        self.second_pass(src, tgt, &first)
    }

    fn check_tables(&self, src: &SpanEmbeddingTable, tgt: &SpanEmbeddingTable) -> Result<(), AlignError> {
        if !src.is_empty() && !tgt.is_empty() && src.dim() != tgt.dim() {
            return Err(AlignError::DimensionMismatch {
                expected: src.dim(),
                actual: tgt.dim(),
            });
        }
        for table in [src, tgt] {
            if table.max_span() < self.config.max_align {
                return Err(AlignError::SpanTableTooSmall {
                    available: table.max_span(),
                    required: self.config.max_align,
                });
            }
        }
        Ok(())
    }

    /// Only insertions or only deletions, for an empty side
    fn gap_alignment(&self, src: &SpanEmbeddingTable, tgt: &SpanEmbeddingTable) -> Alignment {
        let gap_cost = -self.config.skip;
        let beads: Vec<(Bead, f32)> = if src.is_empty() {
            (0..tgt.len()).map(|j| (Bead::insertion(0, j), gap_cost)).collect()
        } else {
            (0..src.len()).map(|i| (Bead::deletion(i, 0), gap_cost)).collect()
        };
        debug!("One side is empty, emitting {} gap beads", beads.len());
        self.finish(src, tgt, beads)
    }

    /// Coarse alignment with insertion, deletion and 1-1 beads
    pub fn first_pass(&self, src: &SpanEmbeddingTable, tgt: &SpanEmbeddingTable) -> Result<Vec<Bead>, AlignError> {
        let (n, m) = (src.len(), tgt.len());
        debug!("Performing first-step alignment ({} x {})", n, m);

        let candidates = CandidateSet::retrieve(src, tgt, self.config.top_k);
        let path = SearchPath::first_pass(n, m, &candidates, &self.config.first_pass);
        debug!("First-pass band holds {} cells", path.cell_count());

        let table = DpTable::fill(
            &path,
            &self.first_catalog,
            self.config.tie_break,
            &FirstPassCost::new(&candidates),
        );
        if table.terminal_cost().is_none() {
            return Err(AlignError::BacktrackFailed { i: n, j: m });
        }
        let beads = table.backtrack(&self.first_catalog)?;
        Ok(beads.into_iter().map(|(bead, _)| bead).collect())
    }

    /// Refined alignment inside a window around `first`
    pub fn second_pass(
        &self,
        src: &SpanEmbeddingTable,
        tgt: &SpanEmbeddingTable,
        first: &[Bead],
    ) -> Result<Alignment, AlignError> {
        let (n, m) = (src.len(), tgt.len());
        debug!("Performing second-step alignment with window {}", self.config.win);

        let path = SearchPath::from_alignment(first, self.config.win, n, m)?;
        let ratio = char_ratio(src, tgt);
        let cost = MarginCost::new(src, tgt, ratio, &self.config);
        let table = DpTable::fill(&path, &self.catalog, self.config.tie_break, &cost);

        if table.terminal_cost().is_none() {
            return Err(AlignError::UnreachableTerminal {
                src_len: n,
                tgt_len: m,
                win: self.config.win,
            });
        }
        let beads = table.backtrack(&self.catalog)?;
        debug!("Second pass produced {} beads", beads.len());
        Ok(self.finish(src, tgt, beads))
    }

    fn finish(&self, src: &SpanEmbeddingTable, tgt: &SpanEmbeddingTable, beads: Vec<(Bead, f32)>) -> Alignment {
        let scores = score_beads(src, tgt, &beads, char_ratio(src, tgt), self.config.cos_similarity);
        Alignment {
            beads: beads.into_iter().map(|(bead, _)| bead).collect(),
            scores,
        }
    }
}
