//! Output transforms applied to the raw-score matrix.

use crate::core::error::{GbtuneError, Result};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transform from raw scores (one column per class) to predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// Row-wise softmax, used for classification
    Softmax,
    /// No transform, used for regression
    Identity,
}

impl Activation {
    /// Apply the transform to every row of `raw`.
    pub fn apply(&self, raw: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = raw.to_owned();
        self.apply_inplace(&mut out);
        out
    }

    /// Apply the transform in place.
    pub fn apply_inplace(&self, scores: &mut Array2<f64>) {
        match self {
            Activation::Identity => {}
            Activation::Softmax => {
                for mut row in scores.axis_iter_mut(Axis(0)) {
                    let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    row.mapv_inplace(|v| (v - max).exp());
                    let sum = row.sum();
                    if sum > 0.0 {
                        row.mapv_inplace(|v| v / sum);
                    }
                }
            }
        }
    }

    /// Name stored in model files.
    pub fn name(&self) -> &'static str {
        match self {
            Activation::Softmax => "softmax",
            Activation::Identity => "identity",
        }
    }

    /// Look up an activation by its model-file name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "softmax" => Ok(Activation::Softmax),
            "identity" => Ok(Activation::Identity),
            other => Err(GbtuneError::serialization(format!(
                "unknown activation function '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
