//! Model persistence.
//!
//! Trained ensembles are stored in a line-oriented text format: a JSON
//! metadata line followed by per-round, per-class trees whose nodes are
//! one JSON record per line. See [`model_file`] for the layout.

pub mod model_file;

pub use model_file::{load_model, read_model, save_model, write_model, ModelMetadata};
