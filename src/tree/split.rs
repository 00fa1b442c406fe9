//! Exact-greedy split search over one feature column.
//!
//! Two gain conventions share the sweep:
//!
//! * [`TreeKind::Plain`] scores a boundary with
//!   `-SL²/nL - SR²/nR + S²/n` over the raw targets and keeps the minimum,
//!   starting from `+∞`.
//! * [`TreeKind::Regularized`] scores it with
//!   `0.5 * (GL²/(HL+λ) + GR²/(HR+λ) - G²/(H+λ)) - γ/2` and keeps the
//!   maximum, starting from `0`, so only positive gains split.

use crate::core::error::{GbtuneError, Result};
use crate::core::types::{FeatureIndex, RowIndex};
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Threshold between two distinct sorted values such that `lo < t <= hi`.
///
/// Halves are added separately so large magnitudes cannot overflow; when the
/// midpoint rounds onto `lo` (adjacent floats) the upper value is used.
fn split_point(lo: f64, hi: f64) -> f64 {
    let mid = lo / 2.0 + hi / 2.0;
    if mid > lo && mid <= hi {
        mid
    } else {
        hi
    }
}

/// Gain and leaf-value convention of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TreeKind {
    /// Variance-reduction splits on targets, leaf value = mean target.
    Plain,
    /// XGBoost-style splits on gradient/hessian pairs.
    Regularized {
        /// L2 regularization on leaf values
        lambda: f64,
        /// Split penalty
        gamma: f64,
    },
}

impl TreeKind {
    /// Gain a node starts from before any candidate is tried. A node whose
    /// score is still this value after the search is a leaf.
    pub fn initial_score(&self) -> f64 {
        match self {
            TreeKind::Plain => f64::INFINITY,
            TreeKind::Regularized { .. } => 0.0,
        }
    }

    /// Whether `gain` beats `best` under this convention.
    pub fn improves(&self, gain: f64, best: f64) -> bool {
        match self {
            TreeKind::Plain => gain < best,
            TreeKind::Regularized { .. } => gain > best,
        }
    }

    /// Whether this is the regularized convention.
    pub fn is_regularized(&self) -> bool {
        matches!(self, TreeKind::Regularized { .. })
    }
}

/// Per-row statistics a tree is grown from.
#[derive(Debug, Clone, Copy)]
pub enum SampleStats<'a> {
    /// Raw targets (plain boosting grows on negative gradients).
    Targets(ArrayView1<'a, f64>),
    /// Gradient and hessian of every row.
    GradHess {
        /// First derivatives
        gradients: ArrayView1<'a, f64>,
        /// Second derivatives
        hessians: ArrayView1<'a, f64>,
    },
}

impl SampleStats<'_> {
    /// Number of rows covered.
    pub fn len(&self) -> usize {
        match self {
            SampleStats::Targets(t) => t.len(),
            SampleStats::GradHess { gradients, .. } => gradients.len(),
        }
    }

    /// Whether no rows are covered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(first, second)` statistic of a row. For targets the second
    /// statistic is a unit count.
    #[inline]
    fn pair(&self, row: RowIndex) -> (f64, f64) {
        match self {
            SampleStats::Targets(t) => (t[row], 1.0),
            SampleStats::GradHess {
                gradients,
                hessians,
            } => (gradients[row], hessians[row]),
        }
    }
}

/// Best threshold found for a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    /// Feature to split on
    pub feature: FeatureIndex,
    /// Rows with a value below this go left
    pub threshold: f64,
    /// Gain of the split under the tree's convention
    pub gain: f64,
}

/// Finds the best split of a node under one [`TreeKind`].
#[derive(Debug, Clone, Copy)]
pub struct SplitFinder {
    kind: TreeKind,
    min_child_weight: f64,
}

impl SplitFinder {
    /// Create a split finder.
    pub fn new(kind: TreeKind, min_child_weight: f64) -> Self {
        SplitFinder {
            kind,
            min_child_weight,
        }
    }

    /// The gain convention in use.
    pub fn kind(&self) -> TreeKind {
        self.kind
    }

    fn check_stats(&self, stats: &SampleStats<'_>) -> Result<()> {
        match (self.kind, stats) {
            (TreeKind::Plain, SampleStats::Targets(_)) => Ok(()),
            (TreeKind::Regularized { .. }, SampleStats::GradHess { .. }) => Ok(()),
            (TreeKind::Plain, _) => Err(GbtuneError::training(
                "plain trees are grown from targets, got gradient/hessian pairs",
            )),
            (TreeKind::Regularized { .. }, _) => Err(GbtuneError::training(
                "regularized trees are grown from gradient/hessian pairs, got targets",
            )),
        }
    }

    /// Prediction value of a node holding `indices`.
    ///
    /// Plain: mean target. Regularized: `-ΣG / (ΣH + λ)`.
    pub fn leaf_value(&self, indices: &[RowIndex], stats: &SampleStats<'_>) -> Result<f64> {
        self.check_stats(stats)?;
        if indices.is_empty() {
            return Err(GbtuneError::numerical(
                "cannot compute the value of a node without samples",
            ));
        }
        let (sum_first, sum_second) = indices.iter().fold((0.0, 0.0), |(a, b), &row| {
            let (f, s) = stats.pair(row);
            (a + f, b + s)
        });
        match self.kind {
            TreeKind::Plain => Ok(sum_first / indices.len() as f64),
            TreeKind::Regularized { lambda, .. } => {
                let denom = sum_second + lambda;
                if !(denom > 0.0) {
                    return Err(GbtuneError::numerical(format!(
                        "non-positive hessian sum {} with lambda {}",
                        sum_second, lambda
                    )));
                }
                Ok(-sum_first / denom)
            }
        }
    }

    /// Best split of `feature` for the rows in `indices`, or `None` when no
    /// boundary improves on the initial score.
    pub fn best_split(
        &self,
        features: ArrayView2<'_, f64>,
        feature: FeatureIndex,
        indices: &[RowIndex],
        stats: &SampleStats<'_>,
    ) -> Result<Option<SplitCandidate>> {
        self.check_stats(stats)?;
        let n = indices.len();
        if n < 2 {
            return Ok(None);
        }

        let column = features.column(feature);
        let mut sorted: Vec<(f64, f64, f64)> = indices
            .iter()
            .map(|&row| {
                let (f, s) = stats.pair(row);
                (column[row], f, s)
            })
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let (total_first, total_second) = sorted
            .iter()
            .fold((0.0, 0.0), |(a, b), &(_, f, s)| (a + f, b + s));

        let mut best = self.kind.initial_score();
        let mut best_threshold = None;
        let mut left_first = 0.0;
        let mut left_second = 0.0;

        for i in 0..n - 1 {
            let (x, f, s) = sorted[i];
            left_first += f;
            left_second += s;
            let n_left = i + 1;
            let n_right = n - n_left;
            let x_next = sorted[i + 1].0;

            if (n_left as f64) < self.min_child_weight || x == x_next {
                continue;
            }
            if (n_right as f64) < self.min_child_weight {
                break;
            }

            let right_first = total_first - left_first;
            let right_second = total_second - left_second;

            let gain = match self.kind {
                TreeKind::Plain => {
                    -(left_first * left_first) / n_left as f64
                        - (right_first * right_first) / n_right as f64
                        + (total_first * total_first) / n as f64
                }
                TreeKind::Regularized { lambda, gamma } => {
                    let hl = left_second + lambda;
                    let hr = right_second + lambda;
                    let h = total_second + lambda;
                    if !(hl > 0.0 && hr > 0.0 && h > 0.0) {
                        continue;
                    }
                    0.5 * (left_first * left_first / hl + right_first * right_first / hr
                        - total_first * total_first / h)
                        - gamma / 2.0
                }
            };

            if self.kind.improves(gain, best) {
                best = gain;
                best_threshold = Some(split_point(x, x_next));
            }
        }

        Ok(best_threshold.map(|threshold| SplitCandidate {
            feature,
            threshold,
            gain: best,
        }))
    }
}
