//! Per-class positive counts over a multi-label indicator matrix

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Result, XrayError};

/// Positive-sample count of every class.
///
/// Majority and minority lookups break ties by the lowest class index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBins {
    counts: Vec<usize>,
}

impl ClassBins {
    /// Column sums of a 0/1 label matrix.
    pub fn from_labels(labels: &Array2<f64>) -> Result<Self> {
        validate_labels(labels)?;
        let counts = labels
            .columns()
            .into_iter()
            .map(|col| col.iter().filter(|&&v| v == 1.0).count())
            .collect();
        Ok(Self { counts })
    }

    pub fn from_counts(counts: Vec<usize>) -> Self {
        Self { counts }
    }

    pub fn num_classes(&self) -> usize {
        self.counts.len()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.counts
    }

    /// Index of the class with the most positives
    pub fn majority_index(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (i, &c) in self.counts.iter().enumerate() {
            if best.map_or(true, |(_, b)| c > b) {
                best = Some((i, c));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Index of the class with the fewest positives
    pub fn minority_index(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (i, &c) in self.counts.iter().enumerate() {
            if best.map_or(true, |(_, b)| c < b) {
                best = Some((i, c));
            }
        }
        best.map(|(i, _)| i)
    }

    pub fn majority_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn minority_count(&self) -> usize {
        self.counts.iter().copied().min().unwrap_or(0)
    }
}

/// Reject any label that is not exactly 0 or 1.
pub fn validate_labels(labels: &Array2<f64>) -> Result<()> {
    for ((row, col), &value) in labels.indexed_iter() {
        if value != 0.0 && value != 1.0 {
            return Err(XrayError::InvalidLabel { row, col, value });
        }
    }
    Ok(())
}

/// True when `label_row` has a single positive and it is `class`.
pub fn is_pure(label_row: ArrayView1<'_, f64>, class: usize) -> bool {
    label_row.sum() == 1.0 && label_row.get(class).copied() == Some(1.0)
}

/// Rows whose only positive label is `class`, in input order.
pub fn pure_rows(labels: &Array2<f64>, class: usize) -> Vec<usize> {
    labels
        .rows()
        .into_iter()
        .enumerate()
        .filter(|(_, row)| is_pure(row.view(), class))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_class_bins_multi_label() {
        let y = array![[1.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 1.0]];
        let bins = ClassBins::from_labels(&y).unwrap();
        assert_eq!(bins.as_slice(), &[3, 1, 2]);
        assert_eq!(bins.majority_index(), Some(0));
        assert_eq!(bins.minority_index(), Some(1));
        assert_eq!(bins.majority_count(), 3);
        assert_eq!(bins.minority_count(), 1);
    }

    #[test]
    fn test_ties_pick_first_index() {
        let bins = ClassBins::from_counts(vec![4, 2, 4, 2]);
        assert_eq!(bins.majority_index(), Some(0));
        assert_eq!(bins.minority_index(), Some(1));
    }

    #[test]
    fn test_empty_bins() {
        let bins = ClassBins::from_counts(vec![]);
        assert_eq!(bins.majority_index(), None);
        assert_eq!(bins.minority_index(), None);
        assert_eq!(bins.majority_count(), 0);
    }

    #[test]
    fn test_non_binary_label_rejected() {
        let y = array![[1.0, 0.0], [0.0, 2.0]];
        let err = ClassBins::from_labels(&y).unwrap_err();
        assert!(matches!(err, XrayError::InvalidLabel { row: 1, col: 1, .. }));
    }

    #[test]
    fn test_pure_rows() {
        let y = array![[0.0, 1.0], [1.0, 1.0], [0.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
        assert_eq!(pure_rows(&y, 1), vec![0, 2]);
        assert_eq!(pure_rows(&y, 0), vec![3]);
    }
}
