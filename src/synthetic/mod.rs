//! Synthetic data generation module
//!
//! Oversampling for imbalanced multi-label datasets:
//! - Multi-label SMOTE over pure minority samples
//! - Class balance accounting over indicator matrices
//! - Exact k-d tree neighbor search
//! - A container adapter so arrays and tables go through the same code

pub mod balance;
pub mod dataset;
pub mod multi_smote;
pub mod neighbors;

pub use balance::ClassBins;
pub use dataset::{ContainerFamily, Dataset};
pub use multi_smote::{
    BalanceReport, BalanceResult, MultiSmote, MultiSmoteConfig, Resampled, RoundOutcome, RoundStatus,
    SkipReason, SyntheticSamples,
};
pub use neighbors::KdTree;

use crate::error::Result;

/// Number of classes (label columns)
pub fn num_classes(y: &Dataset) -> usize {
    y.n_cols()
}

/// Positive count per class of a label matrix
pub fn class_sums(y: &Dataset) -> Result<ClassBins> {
    ClassBins::from_labels(&*y.to_array()?)
}
