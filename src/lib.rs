//! # gbtune
//!
//! Gradient-boosted decision trees for multi-class classification and
//! regression, with cross-validated hyperparameter search.
//!
//! ## Features
//!
//! - **Two boosting flavours**: plain gradient boosting (variance-reduction
//!   splits, Newton-refined leaves) and regularized XGBoost-style boosting
//!   (second-order gain with `lambda` and `gamma`, row/column subsampling).
//! - **One-vs-rest multi-class** training with a softmax output, or
//!   single-column regression with an identity output.
//! - **Per-class early stopping** on the training loss.
//! - **Hyperparameter search**: exhaustive grid, finite-difference
//!   coordinate ascent and a hybrid of both, all scored by k-fold
//!   cross-validation and evaluated in parallel with Rayon.
//! - **Text model files** with one JSON record per tree node.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gbtune::{train, Dataset, OptionsBuilder};
//! use ndarray::Array2;
//!
//! # fn main() -> gbtune::Result<()> {
//! let features = Array2::from_shape_vec(
//!     (6, 2),
//!     vec![0.0, 1.0, 0.2, 0.9, 0.1, 1.1, 5.0, 0.0, 5.2, 0.1, 4.9, 0.2],
//! )
//! .map_err(|e| gbtune::GbtuneError::dataset(e.to_string()))?;
//! let dataset = Dataset::new(features, vec![0, 0, 0, 1, 1, 1])?;
//!
//! let options = OptionsBuilder::new()
//!     .rounds(20)
//!     .learning_rate(0.3)
//!     .min_child_weight(1.0)
//!     .build()?;
//!
//! let model = train(&dataset, &options)?;
//! println!("training accuracy: {:.1}%", model.accuracy(&dataset)?);
//! println!("{}", model.feature_importance());
//! # Ok(())
//! # }
//! ```
//!
//! ### Searching hyperparameters
//!
//! ```rust,no_run
//! use gbtune::{grid_search, Dataset, Options, SearchConfig, SearchSpace};
//!
//! # fn example(dataset: &Dataset) -> gbtune::Result<()> {
//! let base = Options::regularized();
//! let space = SearchSpace::regularized();
//! let config = SearchConfig::regularized().with_folds(5).with_seed(42);
//!
//! let result = grid_search(dataset, &base, &space, &config, None)?;
//! println!("best {:.2}: {}", result.best_score, result.best);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: error type, shared types, constants and logging setup
//! - [`config`]: the hyperparameter vector, search space and search settings
//! - [`dataset`]: sample matrix, labels and k-fold partitioning
//! - [`loss`] and [`activation`]: loss capability set and output transforms
//! - [`tree`]: split finding and recursive tree construction
//! - [`boosting`]: the stagewise trainer and the trained ensemble
//! - [`importance`]: accumulated split-gain report
//! - [`io`]: model file reading and writing
//! - [`hyperopt`]: cross-validation and the search strategies

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module - always available
pub mod core;

// Configuration management module
pub mod config;

// Dataset management module
pub mod dataset;

// Loss functions and output transforms
pub mod activation;
pub mod loss;

// Tree construction
pub mod tree;

// Boosting module
pub mod boosting;

// Feature importance report
pub mod importance;

// Model persistence
pub mod io;

// Hyperparameter search module
pub mod hyperopt;

// Re-export core functionality for convenience
pub use core::{
    constants::*,
    error::{GbtuneError, Result},
    types::*,
};

// Re-export configuration functionality
pub use config::{
    FoldAssignment, Options, OptionsBuilder, ParamRange, SearchConfig, SearchSpace,
};

// Re-export dataset functionality
pub use dataset::{CrossValidationSplits, Dataset, FoldPlan};

// Re-export model functionality
pub use activation::Activation;
pub use boosting::{classes_from_probs, train, ClassTree, Ensemble, Trainer};
pub use importance::FeatureImportance;
pub use io::{load_model, read_model, save_model, write_model};
pub use loss::{create_loss, LossFunction};
pub use tree::{Tree, TreeKind, TreeNode};

// Re-export search functionality
pub use hyperopt::{
    cross_validate, gradient_search, gradient_step, grid_search, hybrid_search, BestPointSink,
    ModelFileSink, SearchResult, StepOutcome, Tunable,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library.
///
/// Installs the `env_logger` backend so that training and search
/// diagnostics are visible (`RUST_LOG` controls the level, `info` by
/// default). Calling it more than once is harmless.
///
/// # Examples
///
/// ```rust
/// fn main() -> gbtune::Result<()> {
///     gbtune::init()?;
///     assert!(gbtune::is_initialized());
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    core::initialize_core()
}

/// Check if the library has been initialized.
pub fn is_initialized() -> bool {
    core::is_core_initialized()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert!(init().is_ok());
        assert!(is_initialized());
        assert!(!VERSION.is_empty());
    }
}
