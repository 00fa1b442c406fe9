//! Settings for the cross-validated hyperparameter searches.

use crate::core::constants::*;
use crate::core::error::{GbtuneError, Result};
use crate::core::types::BoostingKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How rows are drawn into cross-validation folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoldAssignment {
    /// Every row lands in at most one fold.
    Exclusive,
    /// Each fold is drawn independently without replacement, so a row may
    /// appear in several test folds.
    Overlapping,
}

impl Default for FoldAssignment {
    fn default() -> Self {
        FoldAssignment::Exclusive
    }
}

/// Knobs shared by grid, coordinate and hybrid search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Requested number of cross-validation folds
    pub folds: usize,
    /// Fold drawing mode
    pub fold_assignment: FoldAssignment,
    /// Maximum concurrent grid evaluations
    pub ncpus: usize,
    /// Multiplier applied to `range.step * derivative` in the ascent
    pub step_size: f64,
    /// Relative perturbation for finite differences
    pub delta_fraction: f64,
    /// Ascent steps per outer grid cell
    pub n_steps: usize,
    /// Central (two-sided) instead of forward differences
    pub central: bool,
    /// Relative amplitude of the escape perturbation
    pub fuzz: f64,
    /// Consecutive stalls before moving to the next outer cell
    pub max_stalls: usize,
    /// Seed for fold assignment and fuzzing; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig::regularized()
    }
}

impl SearchConfig {
    /// Search defaults for regularized boosting.
    pub fn regularized() -> Self {
        SearchConfig {
            folds: DEFAULT_FOLDS,
            fold_assignment: FoldAssignment::Exclusive,
            ncpus: num_cpus::get(),
            step_size: DEFAULT_STEP_SIZE,
            delta_fraction: DEFAULT_DELTA_FRACTION,
            n_steps: DEFAULT_GRADIENT_STEPS,
            central: true,
            fuzz: DEFAULT_FUZZ,
            max_stalls: DEFAULT_MAX_STALLS,
            seed: None,
        }
    }

    /// Search defaults for plain boosting.
    pub fn plain() -> Self {
        SearchConfig {
            central: false,
            ..SearchConfig::regularized()
        }
    }

    /// Search defaults for the given boosting flavour.
    pub fn for_kind(kind: BoostingKind) -> Self {
        match kind {
            BoostingKind::Plain => SearchConfig::plain(),
            BoostingKind::Regularized => SearchConfig::regularized(),
        }
    }

    /// Set the fold count
    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    /// Set the maximum number of concurrent evaluations
    pub fn with_ncpus(mut self, ncpus: usize) -> Self {
        self.ncpus = ncpus;
        self
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the fold drawing mode
    pub fn with_fold_assignment(mut self, assignment: FoldAssignment) -> Self {
        self.fold_assignment = assignment;
        self
    }

    /// Set the number of ascent steps per outer cell
    pub fn with_steps(mut self, n_steps: usize) -> Self {
        self.n_steps = n_steps;
        self
    }

    /// Validate the search settings.
    pub fn validate(&self) -> Result<()> {
        if self.folds < MIN_FOLDS {
            return Err(GbtuneError::invalid_parameter(
                "folds",
                self.folds.to_string(),
                format!("must be at least {}", MIN_FOLDS),
            ));
        }
        if self.ncpus == 0 {
            return Err(GbtuneError::invalid_parameter(
                "ncpus",
                "0",
                "must be at least 1",
            ));
        }
        if !(self.step_size > 0.0) {
            return Err(GbtuneError::invalid_parameter(
                "step_size",
                self.step_size.to_string(),
                "must be positive",
            ));
        }
        if !(self.delta_fraction > 0.0) {
            return Err(GbtuneError::invalid_parameter(
                "delta_fraction",
                self.delta_fraction.to_string(),
                "must be positive",
            ));
        }
        if !(self.fuzz >= 0.0 && self.fuzz < 1.0) {
            return Err(GbtuneError::invalid_parameter(
                "fuzz",
                self.fuzz.to_string(),
                "must be in range [0.0, 1.0)",
            ));
        }
        Ok(())
    }

    /// Load search settings from a `.json` or `.toml` file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: SearchConfig = super::load_config_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Save search settings to a `.json` or `.toml` file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        super::save_config_file(self, path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_config_defaults() {
        let config = SearchConfig::regularized();
        assert_eq!(config.folds, 5);
        assert!(config.central);
        assert_eq!(config.n_steps, 6);
        assert!(config.ncpus >= 1);
        assert!(config.validate().is_ok());

        assert!(!SearchConfig::plain().central);
    }

    #[test]
    fn test_search_config_validation() {
        assert!(SearchConfig::default().with_folds(1).validate().is_err());
        assert!(SearchConfig::default().with_ncpus(0).validate().is_err());

        let mut config = SearchConfig::default();
        config.fuzz = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_config_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.toml");
        let config = SearchConfig::default().with_folds(3).with_seed(11);
        config.save_to_file(&path).unwrap();
        assert_eq!(SearchConfig::load_from_file(&path).unwrap(), config);
    }
}
