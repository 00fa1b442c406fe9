//! Training hyperparameters for gbtune.
//!
//! [`Options`] is the hyperparameter vector handed to the ensemble trainer.
//! Searches clone it by value before each mutation, so concurrent
//! evaluations never share one instance.

use crate::core::constants::*;
use crate::core::error::{GbtuneError, Result};
use crate::core::types::{BoostingKind, LossKind, Task};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Hyperparameters for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Boosting flavour (plain or regularized)
    pub kind: BoostingKind,
    /// Classification or regression
    pub task: Task,
    /// Number of boosting rounds
    pub rounds: usize,
    /// Depth budget of each tree
    pub max_depth: usize,
    /// Shrinkage applied to every tree output
    pub learning_rate: f64,
    /// L2 regularization on leaf values (regularized only)
    pub lambda: f64,
    /// Minimum split gain penalty (regularized only)
    pub gamma: f64,
    /// Minimum number of samples on each side of a split
    pub min_child_weight: f64,
    /// Row subsample fraction per round (regularized only)
    pub subsample: f64,
    /// Column subsample fraction per round (regularized only)
    pub col_subsample: f64,
    /// Initial raw score of every row and class
    pub base_score: f64,
    /// Rounds are skipped when the row subsample is smaller than this
    pub min_samples_per_tree: usize,
    /// Early stop patience in rounds; 0 disables early stopping
    pub early_stop: usize,
    /// Loss used for gradients and hessians
    pub loss: LossKind,
    /// Seed for row/column subsampling; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Options::regularized()
    }
}

impl Options {
    /// Defaults for XGBoost-style regularized boosting.
    pub fn regularized() -> Self {
        Options {
            kind: BoostingKind::Regularized,
            task: Task::Classification,
            rounds: DEFAULT_REG_ROUNDS,
            max_depth: DEFAULT_REG_MAX_DEPTH,
            learning_rate: DEFAULT_REG_LEARNING_RATE,
            lambda: DEFAULT_REG_LAMBDA,
            gamma: DEFAULT_REG_GAMMA,
            min_child_weight: DEFAULT_REG_MIN_CHILD_WEIGHT,
            subsample: DEFAULT_REG_SUBSAMPLE,
            col_subsample: DEFAULT_REG_COL_SUBSAMPLE,
            base_score: DEFAULT_REG_BASE_SCORE,
            min_samples_per_tree: DEFAULT_REG_MIN_SAMPLES,
            early_stop: DEFAULT_REG_EARLY_STOP,
            loss: LossKind::SquaredError,
            seed: None,
        }
    }

    /// Defaults for plain gradient boosting.
    pub fn plain() -> Self {
        Options {
            kind: BoostingKind::Plain,
            task: Task::Classification,
            rounds: DEFAULT_PLAIN_ROUNDS,
            max_depth: DEFAULT_PLAIN_MAX_DEPTH,
            learning_rate: DEFAULT_PLAIN_LEARNING_RATE,
            lambda: 0.0,
            gamma: 0.0,
            min_child_weight: DEFAULT_PLAIN_MIN_CHILD_WEIGHT,
            subsample: 1.0,
            col_subsample: 1.0,
            base_score: 0.0,
            min_samples_per_tree: 1,
            early_stop: 0,
            loss: LossKind::SquaredError,
            seed: None,
        }
    }

    /// Defaults for the given boosting flavour.
    pub fn for_kind(kind: BoostingKind) -> Self {
        match kind {
            BoostingKind::Plain => Options::plain(),
            BoostingKind::Regularized => Options::regularized(),
        }
    }

    /// Validate the hyperparameters. Training never starts on an invalid
    /// vector.
    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(GbtuneError::invalid_parameter(
                "rounds",
                self.rounds.to_string(),
                "must be positive",
            ));
        }

        if !(self.learning_rate > 0.0) || !self.learning_rate.is_finite() {
            return Err(GbtuneError::invalid_parameter(
                "learning_rate",
                self.learning_rate.to_string(),
                "must be positive",
            ));
        }

        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(GbtuneError::invalid_parameter(
                "subsample",
                self.subsample.to_string(),
                "must be in range (0.0, 1.0]",
            ));
        }

        if !(self.col_subsample > 0.0 && self.col_subsample <= 1.0) {
            return Err(GbtuneError::invalid_parameter(
                "col_subsample",
                self.col_subsample.to_string(),
                "must be in range (0.0, 1.0]",
            ));
        }

        if !(self.lambda >= 0.0) {
            return Err(GbtuneError::invalid_parameter(
                "lambda",
                self.lambda.to_string(),
                "must be non-negative",
            ));
        }

        if !(self.gamma >= 0.0) {
            return Err(GbtuneError::invalid_parameter(
                "gamma",
                self.gamma.to_string(),
                "must be non-negative",
            ));
        }

        if !(self.min_child_weight >= 1.0) {
            return Err(GbtuneError::invalid_parameter(
                "min_child_weight",
                self.min_child_weight.to_string(),
                "must be at least 1",
            ));
        }

        if self.max_depth < 2 {
            return Err(GbtuneError::invalid_parameter(
                "max_depth",
                self.max_depth.to_string(),
                "must be at least 2",
            ));
        }

        if self.min_samples_per_tree < 1 {
            return Err(GbtuneError::invalid_parameter(
                "min_samples_per_tree",
                self.min_samples_per_tree.to_string(),
                "must be at least 1",
            ));
        }

        if !self.base_score.is_finite() {
            return Err(GbtuneError::invalid_parameter(
                "base_score",
                self.base_score.to_string(),
                "must be finite",
            ));
        }

        Ok(())
    }

    /// Load options from a `.json` or `.toml` file and validate them.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let options: Options = super::load_config_file(path.as_ref())?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to a `.json` or `.toml` file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        super::save_config_file(self, path.as_ref())
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: rounds={} max_depth={} lr={:.3} lambda={:.3} gamma={:.3} \
             mcw={:.1} subsample={:.3} col_subsample={:.3} base_score={:.3} early_stop={}",
            self.kind,
            self.task,
            self.rounds,
            self.max_depth,
            self.learning_rate,
            self.lambda,
            self.gamma,
            self.min_child_weight,
            self.subsample,
            self.col_subsample,
            self.base_score,
            self.early_stop
        )
    }
}

/// Builder for [`Options`], collecting every invalid setting before failing.
#[derive(Debug, Clone)]
pub struct OptionsBuilder {
    options: Options,
    validation_errors: Vec<String>,
}

impl OptionsBuilder {
    /// Start from the regularized defaults.
    pub fn new() -> Self {
        OptionsBuilder::for_kind(BoostingKind::Regularized)
    }

    /// Start from the defaults of the given boosting flavour.
    pub fn for_kind(kind: BoostingKind) -> Self {
        OptionsBuilder {
            options: Options::for_kind(kind),
            validation_errors: Vec::new(),
        }
    }

    /// Set the learning task
    pub fn task(mut self, task: Task) -> Self {
        self.options.task = task;
        self
    }

    /// Set the number of boosting rounds
    pub fn rounds(mut self, rounds: usize) -> Self {
        if rounds == 0 {
            self.validation_errors
                .push("rounds must be positive".to_string());
        }
        self.options.rounds = rounds;
        self
    }

    /// Set the depth budget of each tree
    pub fn max_depth(mut self, depth: usize) -> Self {
        if depth < 2 {
            self.validation_errors
                .push("max_depth must be at least 2".to_string());
        }
        self.options.max_depth = depth;
        self
    }

    /// Set the learning rate
    pub fn learning_rate(mut self, rate: f64) -> Self {
        if !(rate > 0.0) {
            self.validation_errors
                .push("learning_rate must be positive".to_string());
        }
        self.options.learning_rate = rate;
        self
    }

    /// Set the L2 leaf regularization
    pub fn lambda(mut self, lambda: f64) -> Self {
        if !(lambda >= 0.0) {
            self.validation_errors
                .push("lambda must be non-negative".to_string());
        }
        self.options.lambda = lambda;
        self
    }

    /// Set the split penalty
    pub fn gamma(mut self, gamma: f64) -> Self {
        if !(gamma >= 0.0) {
            self.validation_errors
                .push("gamma must be non-negative".to_string());
        }
        self.options.gamma = gamma;
        self
    }

    /// Set the minimum child weight
    pub fn min_child_weight(mut self, weight: f64) -> Self {
        if !(weight >= 1.0) {
            self.validation_errors
                .push("min_child_weight must be at least 1".to_string());
        }
        self.options.min_child_weight = weight;
        self
    }

    /// Set the row subsample fraction
    pub fn subsample(mut self, fraction: f64) -> Self {
        if !(fraction > 0.0 && fraction <= 1.0) {
            self.validation_errors
                .push("subsample must be in range (0.0, 1.0]".to_string());
        }
        self.options.subsample = fraction;
        self
    }

    /// Set the column subsample fraction
    pub fn col_subsample(mut self, fraction: f64) -> Self {
        if !(fraction > 0.0 && fraction <= 1.0) {
            self.validation_errors
                .push("col_subsample must be in range (0.0, 1.0]".to_string());
        }
        self.options.col_subsample = fraction;
        self
    }

    /// Set the base score
    pub fn base_score(mut self, score: f64) -> Self {
        self.options.base_score = score;
        self
    }

    /// Set the minimum row subsample size for a round to be trained
    pub fn min_samples_per_tree(mut self, samples: usize) -> Self {
        if samples < 1 {
            self.validation_errors
                .push("min_samples_per_tree must be at least 1".to_string());
        }
        self.options.min_samples_per_tree = samples;
        self
    }

    /// Set the early stop patience (0 disables)
    pub fn early_stop(mut self, patience: usize) -> Self {
        self.options.early_stop = patience;
        self
    }

    /// Set the loss function
    pub fn loss(mut self, loss: LossKind) -> Self {
        self.options.loss = loss;
        self
    }

    /// Set the subsampling seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.options.seed = Some(seed);
        self
    }

    /// Build the options
    pub fn build(self) -> Result<Options> {
        if !self.validation_errors.is_empty() {
            return Err(GbtuneError::config(format!(
                "Options validation failed: {}",
                self.validation_errors.join(", ")
            )));
        }

        self.options.validate()?;
        Ok(self.options)
    }
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
