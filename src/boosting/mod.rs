//! Gradient boosting: the round loop, its ensemble and helpers.
//!
//! - [`trainer`]: stagewise one-vs-rest boosting with shrinkage
//! - [`ensemble`]: the trained model, prediction and scoring
//! - [`early_stopping`]: per-class ACTIVE/STOPPED tracking
//! - [`sampling`]: per-round row and column subsampling

pub mod early_stopping;
pub mod ensemble;
pub mod sampling;
pub mod trainer;

pub use early_stopping::EarlyStopping;
pub use ensemble::{classes_from_probs, ClassTree, Ensemble};
pub use sampling::Subsampler;
pub use trainer::{train, Trainer};
