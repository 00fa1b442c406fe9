//! Core data types for gbtune.
//!
//! Index aliases and the small enumerations that select between the two
//! boosting flavours, the learning task and the loss function.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::GbtuneError;

/// Row index into a sample matrix.
pub type RowIndex = usize;

/// Feature (column) index into a sample matrix.
pub type FeatureIndex = usize;

/// Categorical class label as found in the input data.
pub type ClassLabel = i32;

/// Boosting round number.
pub type RoundIndex = usize;

/// Which boosting flavour drives tree construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoostingKind {
    /// Classic gradient boosting: variance-reduction splits on negative
    /// gradients, leaves refined to `Σgradient/Σhessian` after construction.
    Plain,
    /// XGBoost-style boosting with L2 leaf regularization (lambda) and a
    /// split penalty (gamma).
    Regularized,
}

impl Default for BoostingKind {
    fn default() -> Self {
        BoostingKind::Regularized
    }
}

impl fmt::Display for BoostingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoostingKind::Plain => write!(f, "gradient boosting"),
            BoostingKind::Regularized => write!(f, "xgboost"),
        }
    }
}

/// Learning task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Task {
    /// Multi-class (one-vs-rest) classification on integer labels
    Classification,
    /// Single-target regression on float labels
    Regression,
}

impl Default for Task {
    fn default() -> Self {
        Task::Classification
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Classification => write!(f, "classification"),
            Task::Regression => write!(f, "regression"),
        }
    }
}

/// Loss function selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossKind {
    /// Squared error with a constant unit hessian
    SquaredError,
    /// Squared-error gradients with a `(1-p)p` hessian
    Calibrated,
}

impl Default for LossKind {
    fn default() -> Self {
        LossKind::SquaredError
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossKind::SquaredError => write!(f, "squared_error"),
            LossKind::Calibrated => write!(f, "calibrated"),
        }
    }
}

impl FromStr for LossKind {
    type Err = GbtuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "squared_error" | "mse" | "sq" => Ok(LossKind::SquaredError),
            "calibrated" | "plain" => Ok(LossKind::Calibrated),
            other => Err(GbtuneError::invalid_parameter(
                "loss",
                other,
                "expected one of: squared_error, calibrated",
            )),
        }
    }
}
