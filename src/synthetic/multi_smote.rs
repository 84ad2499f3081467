//! Multi-label SMOTE
//!
//! Extends SMOTE to multi-label data. Each round targets the current minority
//! class and only uses samples whose sole positive label is that class, so the
//! synthetic rows raise its count without touching any other class.

use std::fmt;
use std::path::Path;

use ndarray::{Array2, Zip};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, XrayError};
use crate::synthetic::balance::{pure_rows, validate_labels, ClassBins};
use crate::synthetic::dataset::{ensure_aligned, Dataset};
use crate::synthetic::neighbors::KdTree;

/// Multi-label SMOTE configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiSmoteConfig {
    /// Number of nearest neighbors, the sample itself included
    pub k_neighbors: usize,
    /// Random seed
    pub seed: Option<u64>,
}

impl Default for MultiSmoteConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: None,
        }
    }
}

impl MultiSmoteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.k_neighbors == 0 {
            return Err(XrayError::ConfigError("k_neighbors must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Why a balancing round produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// At most one sample belongs exclusively to the class
    InsufficientSamples { found: usize },
    /// Fewer than two neighbors per sample, so no neighbor besides the sample itself
    InsufficientNeighbors { k: usize },
}

/// What a round did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundStatus {
    Generated { n_synthetic: usize, k: usize },
    Skipped(SkipReason),
}

/// Diagnostics for one balancing round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round: usize,
    /// Minority class targeted by the round
    pub class_index: usize,
    pub minority_count: usize,
    pub majority_count: usize,
    /// Pure samples of the minority class
    pub pure_samples: usize,
    /// Set when this round lowered the neighbor count; later rounds keep the lower value
    pub degraded_k: Option<usize>,
    pub status: RoundStatus,
}

/// Per-round diagnostics of a full balancing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub rounds: Vec<RoundOutcome>,
}

impl BalanceReport {
    /// Total synthetic rows appended
    pub fn n_synthetic(&self) -> usize {
        self.rounds
            .iter()
            .map(|r| match r.status {
                RoundStatus::Generated { n_synthetic, .. } => n_synthetic,
                RoundStatus::Skipped(_) => 0,
            })
            .sum()
    }

    /// Classes whose round was skipped, with the reason
    pub fn skipped(&self) -> Vec<(usize, SkipReason)> {
        self.rounds
            .iter()
            .filter_map(|r| match r.status {
                RoundStatus::Skipped(reason) => Some((r.class_index, reason)),
                RoundStatus::Generated { .. } => None,
            })
            .collect()
    }

    pub fn is_partial(&self) -> bool {
        self.rounds.iter().any(|r| matches!(r.status, RoundStatus::Skipped(_)))
    }
}

/// Synthetic rows produced by one round
#[derive(Debug, Clone)]
pub struct SyntheticSamples {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
}

/// Result of a single round: diagnostics plus the rows, if any were produced
#[derive(Debug, Clone)]
pub struct Resampled {
    pub outcome: RoundOutcome,
    /// `None` when the round was skipped. An empty set means nothing was needed.
    pub samples: Option<SyntheticSamples>,
}

/// Balanced dataset
#[derive(Debug, Clone)]
pub struct BalanceResult {
    pub x: Dataset,
    pub y: Dataset,
    pub report: BalanceReport,
}

struct Accumulator {
    x: Dataset,
    y: Dataset,
    /// Neighbor count for the next round, only ever lowered
    k: usize,
    report: BalanceReport,
}

struct MinoritySelection {
    bins: ClassBins,
    class_index: usize,
    rows: Vec<usize>,
}

/// Multi-label synthetic minority oversampler
#[derive(Debug, Clone, Default)]
pub struct MultiSmote {
    config: MultiSmoteConfig,
}

impl MultiSmote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MultiSmoteConfig) -> Self {
        Self { config }
    }

    /// Set number of neighbors
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.config.k_neighbors = k.max(1);
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &MultiSmoteConfig {
        &self.config
    }

    pub fn k_neighbors(&self) -> usize {
        self.config.k_neighbors
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Current minority class of `y` and the rows that carry only that class.
    fn select_minority(y: &Dataset) -> Result<Option<MinoritySelection>> {
        let labels = y.to_array()?;
        let bins = ClassBins::from_labels(&labels)?;
        Ok(bins.minority_index().map(|class_index| MinoritySelection {
            rows: pure_rows(&labels, class_index),
            class_index,
            bins,
        }))
    }

    /// Samples and labels of the rows belonging only to the current minority class.
    ///
    /// Returns `None` when fewer than two such rows exist.
    pub fn minority_samples(&self, x: &Dataset, y: &Dataset) -> Result<Option<(Dataset, Dataset)>> {
        ensure_aligned(x, y)?;
        match Self::select_minority(y)? {
            Some(selection) if selection.rows.len() > 1 => {
                Ok(Some((x.select_rows(&selection.rows)?, y.select_rows(&selection.rows)?)))
            }
            _ => Ok(None),
        }
    }

    /// Neighbor index matrix of `x_sub`, `k` columns, nearest first.
    pub fn nearest_neighbours(&self, x_sub: &Array2<f64>, k: usize) -> Result<Array2<usize>> {
        KdTree::build(x_sub.to_owned())?.kneighbors(k)
    }

    /// Run one round against the current minority class of `y` with the configured k.
    pub fn resample(&self, x: &Dataset, y: &Dataset) -> Result<Resampled> {
        ensure_aligned(x, y)?;
        self.resample_round(x, y, self.config.k_neighbors, 0, &mut self.rng())
    }

    fn resample_round(&self, x: &Dataset, y: &Dataset, k: usize, round: usize, rng: &mut StdRng) -> Result<Resampled> {
        let MinoritySelection { bins, class_index: minority, rows } = Self::select_minority(y)?
            .ok_or_else(|| XrayError::ValidationError("label matrix has no classes".to_string()))?;

        let mut outcome = RoundOutcome {
            round,
            class_index: minority,
            minority_count: bins.minority_count(),
            majority_count: bins.majority_count(),
            pure_samples: rows.len(),
            degraded_k: None,
            status: RoundStatus::Skipped(SkipReason::InsufficientSamples { found: rows.len() }),
        };

        let mut k = k;
        if k > rows.len() && rows.len() > 1 {
            info!(
                class = minority,
                previous_k = k,
                new_k = rows.len(),
                "Fewer minority samples than neighbors, reducing the neighbor count"
            );
            k = rows.len();
            outcome.degraded_k = Some(k);
        }

        if rows.len() <= 1 {
            warn!(
                class = minority,
                found = rows.len(),
                "Too few samples belong only to the minority class to find neighbors, skipping class"
            );
            return Ok(Resampled { outcome, samples: None });
        }

        if k < 2 {
            warn!(class = minority, k, "Need at least two neighbors per sample, skipping class");
            outcome.status = RoundStatus::Skipped(SkipReason::InsufficientNeighbors { k });
            return Ok(Resampled { outcome, samples: None });
        }

        let (subset_x, subset_y) = (x.select_rows(&rows)?, y.select_rows(&rows)?);
        let (x_sub, y_sub) = (subset_x.to_array()?, subset_y.to_array()?);
        let indices = self.nearest_neighbours(&x_sub, k)?;

        let num_samples = bins.majority_count().saturating_sub(bins.minority_count());
        let samples = Self::generate(&x_sub, &y_sub, &indices, num_samples, rng);

        debug!(class = minority, k, n_synthetic = num_samples, "Generated synthetic samples");
        outcome.status = RoundStatus::Generated { n_synthetic: num_samples, k };
        Ok(Resampled { outcome, samples: Some(samples) })
    }

    /// Interpolate `num_samples` rows from random samples and one of their neighbors.
    ///
    /// `x_new = x[i] + r * (x[i] - x[neighbour])` with `r` in `[0, 1)`. Every
    /// label row is a copy of the first pure sample's labels.
    fn generate(
        x_sub: &Array2<f64>,
        y_sub: &Array2<f64>,
        indices: &Array2<usize>,
        num_samples: usize,
        rng: &mut StdRng,
    ) -> SyntheticSamples {
        let k = indices.ncols();
        let mut gen_x = Array2::<f64>::zeros((num_samples, x_sub.ncols()));

        for out in gen_x.rows_mut() {
            let n_n = rng.gen_range(0..x_sub.nrows());
            let neighbour = indices[[n_n, rng.gen_range(1..k)]];
            let ratio: f64 = rng.gen();

            Zip::from(out)
                .and(x_sub.row(n_n))
                .and(x_sub.row(neighbour))
                .for_each(|o, &s, &n| *o = s + ratio * (s - n));
        }

        let label = y_sub.row(0);
        let gen_y = Array2::from_shape_fn((num_samples, label.len()), |(_, j)| label[j]);

        SyntheticSamples { x: gen_x, y: gen_y }
    }

    fn balance_round(&self, mut acc: Accumulator, round: usize, rng: &mut StdRng) -> Result<Accumulator> {
        let resampled = self.resample_round(&acc.x, &acc.y, acc.k, round, rng)?;
        if let Some(k) = resampled.outcome.degraded_k {
            acc.k = k;
        }
        if let Some(samples) = resampled.samples {
            acc.x = acc.x.append_rows(&samples.x)?;
            acc.y = acc.y.append_rows(&samples.y)?;
        }
        acc.report.rounds.push(resampled.outcome);
        Ok(acc)
    }

    /// Oversample every non-majority class.
    ///
    /// Runs one round per class except one, recomputing the minority class each
    /// time. A neighbor count lowered for a small class stays lowered for the
    /// remaining rounds of the call. Rounds without enough pure samples are skipped and recorded in the
    /// report, so the output may stay imbalanced. Returns `Ok(None)` without
    /// touching anything when `x` is not a numeric container. Inputs are
    /// cloned; the caller's datasets are never modified.
    pub fn multi_smote(&self, x: &Dataset, y: &Dataset) -> Result<Option<BalanceResult>> {
        if !x.is_supported() {
            warn!(family = %x.family(), "Not supported type of the data, aborting");
            return Ok(None);
        }

        ensure_aligned(x, y)?;
        let n_classes = {
            let labels = y.to_array()?;
            validate_labels(&labels)?;
            labels.ncols()
        };

        let mut rng = self.rng();
        let init = Accumulator {
            x: x.clone(),
            y: y.clone(),
            k: self.config.k_neighbors,
            report: BalanceReport::default(),
        };

        // One round per class, the majority excluded
        let acc = (0..n_classes.saturating_sub(1))
            .try_fold(init, |acc, round| self.balance_round(acc, round, &mut rng))?;

        info!(
            rows_before = x.n_rows(),
            rows_after = acc.x.n_rows(),
            n_synthetic = acc.report.n_synthetic(),
            skipped = acc.report.skipped().len(),
            "Multi-label SMOTE finished"
        );

        Ok(Some(BalanceResult {
            x: acc.x,
            y: acc.y,
            report: acc.report,
        }))
    }
}

impl fmt::Display for MultiSmote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multi Label Smote Object. Default k is {}", self.config.k_neighbors)
    }
}
