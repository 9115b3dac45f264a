//! Jacobian building blocks: which market quotes a curve's parameters
//! depend on, and how strongly.
//!
//! Each calibrated curve records a [`CurveBuildingBlock`] (the ordered
//! curves whose quotes it depends on, with their ranges in the stacked
//! quote vector) and the matrix `d(parameters) / d(quotes)` over exactly
//! those columns. The pair is the unit of risk propagation: bump a quote,
//! read the parameter move straight off the matrix.

use nalgebra::DMatrix;

use crate::error::{CurveError, CurveResult};

/// Ordered (curve name, (start, count)) ranges into a stacked market
/// quote vector.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveBuildingBlock {
    entries: Vec<(String, (usize, usize))>,
}

impl CurveBuildingBlock {
    /// Creates a block from ordered ranges.
    ///
    /// # Errors
    ///
    /// Fails unless the ranges are contiguous from zero in declared
    /// order, i.e. they partition `[0, total)` with no gaps or overlaps.
    pub fn new(entries: Vec<(String, (usize, usize))>) -> CurveResult<Self> {
        let total: usize = entries.iter().map(|(_, (_, count))| count).sum();
        let mut expected = 0;
        for (name, (start, count)) in &entries {
            if *start != expected {
                return Err(CurveError::BlockPartition {
                    total,
                    detail: format!("curve '{name}' starts at {start}, expected {expected}"),
                });
            }
            if *count == 0 {
                return Err(CurveError::BlockPartition {
                    total,
                    detail: format!("curve '{name}' has zero parameters"),
                });
            }
            expected += count;
        }
        Ok(Self { entries })
    }

    /// The ordered entries.
    #[must_use]
    pub fn entries(&self) -> &[(String, (usize, usize))] {
        &self.entries
    }

    /// Start of the named curve's range.
    #[must_use]
    pub fn start(&self, curve: &str) -> Option<usize> {
        self.range(curve).map(|(start, _)| start)
    }

    /// Parameter count of the named curve.
    #[must_use]
    pub fn parameter_count(&self, curve: &str) -> Option<usize> {
        self.range(curve).map(|(_, count)| count)
    }

    /// The named curve's `(start, count)` range.
    #[must_use]
    pub fn range(&self, curve: &str) -> Option<(usize, usize)> {
        self.entries
            .iter()
            .find(|(name, _)| name == curve)
            .map(|(_, range)| *range)
    }

    /// Total quote count across all entries.
    #[must_use]
    pub fn total_parameters(&self) -> usize {
        self.entries.iter().map(|(_, (_, count))| count).sum()
    }
}

/// Building blocks and inverse-Jacobian matrices for a set of calibrated
/// curves, in calibration order.
#[derive(Debug, Clone, Default)]
pub struct CurveBuildingBlockBundle {
    entries: Vec<(String, (CurveBuildingBlock, DMatrix<f64>))>,
}

impl CurveBuildingBlockBundle {
    /// An empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the block and matrix for `curve`. Re-recording a curve
    /// replaces its entry in place, preserving order.
    pub fn add(&mut self, curve: impl Into<String>, block: CurveBuildingBlock, jacobian: DMatrix<f64>) {
        let curve = curve.into();
        match self.entries.iter_mut().find(|(name, _)| *name == curve) {
            Some((_, entry)) => *entry = (block, jacobian),
            None => self.entries.push((curve, (block, jacobian))),
        }
    }

    /// Appends every entry of `other`, replacing same-named entries.
    pub fn extend_from(&mut self, other: &Self) {
        for (name, (block, jacobian)) in &other.entries {
            self.add(name.clone(), block.clone(), jacobian.clone());
        }
    }

    /// The recorded (block, matrix) pair for `curve`.
    #[must_use]
    pub fn get(&self, curve: &str) -> Option<&(CurveBuildingBlock, DMatrix<f64>)> {
        self.entries
            .iter()
            .find(|(name, _)| name == curve)
            .map(|(_, entry)| entry)
    }

    /// Recorded curve names in calibration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of recorded curves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bundle is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_accepted() {
        let block = CurveBuildingBlock::new(vec![
            ("USD-OIS".into(), (0, 3)),
            ("USD-3M".into(), (3, 4)),
        ])
        .unwrap();
        assert_eq!(block.total_parameters(), 7);
        assert_eq!(block.start("USD-3M"), Some(3));
        assert_eq!(block.parameter_count("USD-OIS"), Some(3));
        assert_eq!(block.range("USD-6M"), None);
    }

    #[test]
    fn test_gap_rejected() {
        let result = CurveBuildingBlock::new(vec![
            ("USD-OIS".into(), (0, 3)),
            ("USD-3M".into(), (4, 2)),
        ]);
        assert!(matches!(result, Err(CurveError::BlockPartition { .. })));
    }

    #[test]
    fn test_overlap_rejected() {
        let result = CurveBuildingBlock::new(vec![
            ("USD-OIS".into(), (0, 3)),
            ("USD-3M".into(), (2, 2)),
        ]);
        assert!(result.is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn contiguous_entries(counts: &[usize]) -> Vec<(String, (usize, usize))> {
            let mut entries = Vec::with_capacity(counts.len());
            let mut start = 0;
            for (i, count) in counts.iter().enumerate() {
                entries.push((format!("CURVE-{i}"), (start, *count)));
                start += count;
            }
            entries
        }

        proptest! {
            #[test]
            fn prop_contiguous_ranges_always_accepted(
                counts in proptest::collection::vec(1usize..8, 1..6)
            ) {
                let block = CurveBuildingBlock::new(contiguous_entries(&counts)).unwrap();
                prop_assert_eq!(block.total_parameters(), counts.iter().sum::<usize>());
            }

            #[test]
            fn prop_shifted_final_range_rejected(
                counts in proptest::collection::vec(1usize..8, 2..6),
                shift in 1usize..3
            ) {
                let mut entries = contiguous_entries(&counts);
                let last = entries.len() - 1;
                entries[last].1 .0 += shift;
                prop_assert!(CurveBuildingBlock::new(entries).is_err());
            }
        }
    }

    #[test]
    fn test_bundle_replaces_in_place() {
        let mut bundle = CurveBuildingBlockBundle::new();
        let block = CurveBuildingBlock::new(vec![("A".into(), (0, 2))]).unwrap();
        bundle.add("A", block.clone(), DMatrix::identity(2, 2));
        bundle.add("B", block.clone(), DMatrix::identity(2, 2));
        bundle.add("A", block, DMatrix::zeros(2, 2));
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.names().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(bundle.get("A").unwrap().1[(0, 0)], 0.0);
    }
}
