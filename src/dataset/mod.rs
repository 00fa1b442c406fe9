//! Dataset management for gbtune.
//!
//! - [`dataset`]: the dense sample matrix with integer and float labels
//! - [`partition`]: k-fold plans and the cross-validation split iterator

pub mod dataset;
pub mod partition;

pub use dataset::Dataset;
pub use partition::{effective_fold_count, CrossValidationSplits, FoldPlan};
