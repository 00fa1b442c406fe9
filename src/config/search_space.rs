//! Hyperparameter search space.
//!
//! Each tunable parameter gets a [`ParamRange`] of `(min, max, step)`.
//! Grid searches enumerate the ranges; the coordinate search uses them as
//! a box it may never leave and scales its steps by each range's `step`.

use crate::config::core::Options;
use crate::core::error::{GbtuneError, Result};
use crate::core::types::BoostingKind;
use num_traits::{NumCast, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Tolerance used when enumerating float ranges so that `max` itself is
/// not lost to rounding.
const RANGE_EPSILON: f64 = 1e-9;

/// Inclusive `(min, max, step)` range for one hyperparameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange<T> {
    /// Lower bound (inclusive)
    pub min: T,
    /// Upper bound (inclusive)
    pub max: T,
    /// Grid spacing; also the scale of a coordinate-search step
    pub step: T,
}

impl<T> ParamRange<T>
where
    T: Copy + PartialOrd + NumCast + ToPrimitive,
{
    /// Create a new range.
    pub fn new(min: T, max: T, step: T) -> Self {
        ParamRange { min, max, step }
    }

    /// A range holding exactly one value.
    pub fn single(value: T) -> Self {
        ParamRange {
            min: value,
            max: value,
            step: value,
        }
    }

    fn bounds_f64(&self) -> (f64, f64, f64) {
        (
            self.min.to_f64().unwrap_or(0.0),
            self.max.to_f64().unwrap_or(0.0),
            self.step.to_f64().unwrap_or(0.0),
        )
    }

    /// Number of grid points in the range.
    pub fn len(&self) -> usize {
        let (min, max, step) = self.bounds_f64();
        if !(step > 0.0) || max <= min {
            return 1;
        }
        ((max - min) / step + RANGE_EPSILON).floor() as usize + 1
    }

    /// Ranges always hold at least one point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Grid points `min, min+step, ...` up to and including `max`.
    ///
    /// Points are computed from their index rather than by repeated
    /// addition. A step larger than the range yields `[min]`.
    pub fn values(&self) -> Vec<T> {
        let (min, _, step) = self.bounds_f64();
        if self.len() == 1 {
            return vec![self.min];
        }
        (0..self.len())
            .filter_map(|i| <T as NumCast>::from(min + i as f64 * step))
            .collect()
    }

    /// Whether `value` lies inside the range.
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp `value` into the range.
    pub fn clamp(&self, value: T) -> T {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Middle of the range (truncated for integer parameters).
    pub fn midpoint(&self) -> T {
        let (min, max, _) = self.bounds_f64();
        <T as NumCast>::from(min + (max - min) / 2.0).unwrap_or(self.min)
    }

    /// The range's step as `f64`.
    pub fn step_f64(&self) -> f64 {
        self.bounds_f64().2
    }

    fn check(&self, name: &str) -> Result<()> {
        let (min, max, step) = self.bounds_f64();
        if !(min <= max) {
            return Err(GbtuneError::invalid_parameter(
                name,
                format!("[{}, {}]", min, max),
                "range minimum must not exceed its maximum",
            ));
        }
        if !(step >= 0.0) {
            return Err(GbtuneError::invalid_parameter(
                name,
                step.to_string(),
                "range step must be non-negative",
            ));
        }
        Ok(())
    }
}

impl<T: fmt::Display> fmt::Display for ParamRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{} by {}]", self.min, self.max, self.step)
    }
}

/// Ranges for every tunable hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    /// Boosting rounds
    pub rounds: ParamRange<usize>,
    /// Maximum tree depth
    pub max_depth: ParamRange<usize>,
    /// Learning rate
    pub learning_rate: ParamRange<f64>,
    /// L2 leaf regularization
    pub lambda: ParamRange<f64>,
    /// Split penalty
    pub gamma: ParamRange<f64>,
    /// Minimum child weight
    pub min_child_weight: ParamRange<f64>,
    /// Row subsample fraction
    pub subsample: ParamRange<f64>,
    /// Column subsample fraction
    pub col_subsample: ParamRange<f64>,
}

impl SearchSpace {
    /// Default box for the regularized variant.
    pub fn regularized() -> Self {
        SearchSpace {
            rounds: ParamRange::new(20, 1000, 100),
            max_depth: ParamRange::new(3, 6, 1),
            learning_rate: ParamRange::new(0.01, 0.5, 0.15),
            lambda: ParamRange::new(0.5, 2.0, 0.2),
            gamma: ParamRange::new(0.0, 0.5, 0.1),
            min_child_weight: ParamRange::new(3.0, 5.0, 1.0),
            subsample: ParamRange::new(0.6, 0.9, 0.1),
            col_subsample: ParamRange::new(0.6, 0.9, 0.1),
        }
    }

    /// Default box for plain boosting. Parameters plain boosting ignores
    /// (lambda, gamma, subsampling) hold a single value.
    pub fn plain() -> Self {
        SearchSpace {
            rounds: ParamRange::new(2, 100, 1),
            max_depth: ParamRange::new(2, 10, 1),
            learning_rate: ParamRange::new(0.01, 0.8, 0.1),
            lambda: ParamRange::new(0.0, 1.0, 2.0),
            gamma: ParamRange::new(0.0, 1.0, 2.0),
            min_child_weight: ParamRange::new(2.0, 6.0, 1.0),
            subsample: ParamRange::new(1.0, 1.0, 2.0),
            col_subsample: ParamRange::new(1.0, 1.0, 2.0),
        }
    }

    /// Default box for the given boosting flavour.
    pub fn for_kind(kind: BoostingKind) -> Self {
        match kind {
            BoostingKind::Plain => SearchSpace::plain(),
            BoostingKind::Regularized => SearchSpace::regularized(),
        }
    }

    /// A space containing only the point `options`.
    pub fn single_point(options: &Options) -> Self {
        SearchSpace {
            rounds: ParamRange::single(options.rounds),
            max_depth: ParamRange::single(options.max_depth),
            learning_rate: ParamRange::single(options.learning_rate),
            lambda: ParamRange::single(options.lambda),
            gamma: ParamRange::single(options.gamma),
            min_child_weight: ParamRange::single(options.min_child_weight),
            subsample: ParamRange::single(options.subsample),
            col_subsample: ParamRange::single(options.col_subsample),
        }
    }

    /// Total number of grid points.
    pub fn grid_size(&self) -> usize {
        self.rounds.len()
            * self.max_depth.len()
            * self.learning_rate.len()
            * self.lambda.len()
            * self.gamma.len()
            * self.min_child_weight.len()
            * self.subsample.len()
            * self.col_subsample.len()
    }

    /// Whether every tunable field of `options` lies inside the box.
    pub fn contains(&self, options: &Options) -> bool {
        self.rounds.contains(options.rounds)
            && self.max_depth.contains(options.max_depth)
            && self.learning_rate.contains(options.learning_rate)
            && self.lambda.contains(options.lambda)
            && self.gamma.contains(options.gamma)
            && self.min_child_weight.contains(options.min_child_weight)
            && self.subsample.contains(options.subsample)
            && self.col_subsample.contains(options.col_subsample)
    }

    /// Copy of `base` with every tunable field set to its range midpoint.
    pub fn midpoint(&self, base: &Options) -> Options {
        let mut options = base.clone();
        options.rounds = self.rounds.midpoint();
        options.max_depth = self.max_depth.midpoint();
        options.learning_rate = self.learning_rate.midpoint();
        options.lambda = self.lambda.midpoint();
        options.gamma = self.gamma.midpoint();
        options.min_child_weight = self.min_child_weight.midpoint();
        options.subsample = self.subsample.midpoint();
        options.col_subsample = self.col_subsample.midpoint();
        options
    }

    /// Check that every range is well formed.
    pub fn validate(&self) -> Result<()> {
        self.rounds.check("rounds")?;
        self.max_depth.check("max_depth")?;
        self.learning_rate.check("learning_rate")?;
        self.lambda.check("lambda")?;
        self.gamma.check("gamma")?;
        self.min_child_weight.check("min_child_weight")?;
        self.subsample.check("subsample")?;
        self.col_subsample.check("col_subsample")?;
        Ok(())
    }

    /// Load a search space from a `.json` or `.toml` file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let space: SearchSpace = super::load_config_file(path.as_ref())?;
        space.validate()?;
        Ok(space)
    }

    /// Save the search space to a `.json` or `.toml` file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        super::save_config_file(self, path.as_ref())
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        SearchSpace::regularized()
    }
}
