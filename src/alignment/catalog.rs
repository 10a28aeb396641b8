/*!
 * Alignment-type catalog.
 *
 * The catalog lists the bead shapes a pass may use. Its order is the
 * tie-break priority of the dynamic program.
 */

use crate::errors::AlignError;

use super::types::AlignmentType;

/// Ordered set of alignment types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentCatalog {
    types: Vec<AlignmentType>,
    max_span: usize,
}

impl AlignmentCatalog {
    /// Catalog for at most `max_span` sentences per side.
    ///
    /// Contains the insertion and deletion types followed by every (a, b)
    /// with a, b >= 1 and a + b <= max_span + 1, ordered by a then b.
    pub fn new(max_span: usize) -> Result<Self, AlignError> {
        if max_span < 1 {
            return Err(AlignError::InvalidConfig(format!(
                "maximum span count must be at least 1, got {}",
                max_span
            )));
        }

        let mut types = vec![AlignmentType::INSERTION, AlignmentType::DELETION];
        for src in 1..=max_span {
            for tgt in 1..=max_span {
                if src + tgt <= max_span + 1 {
                    types.push(AlignmentType::new(src, tgt));
                }
            }
        }

        Ok(Self { types, max_span })
    }

    /// Insertion, deletion and 1-1: the coarse pass catalog
    pub fn first_pass() -> Self {
        Self {
            types: vec![
                AlignmentType::INSERTION,
                AlignmentType::DELETION,
                AlignmentType::ONE_TO_ONE,
            ],
            max_span: 1,
        }
    }

    /// Longest span on either side
    pub fn max_span(&self) -> usize {
        self.max_span
    }

    pub fn types(&self) -> &[AlignmentType] {
        &self.types
    }

    pub fn get(&self, index: usize) -> Option<AlignmentType> {
        self.types.get(index).copied()
    }

    pub fn position(&self, kind: AlignmentType) -> Option<usize> {
        self.types.iter().position(|t| *t == kind)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, AlignmentType)> + '_ {
        self.types.iter().copied().enumerate()
    }
}
