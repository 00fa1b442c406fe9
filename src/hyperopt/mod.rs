//! Cross-validated hyperparameter search.
//!
//! Three strategies share one scoring function ([`cross_validate`]) and one
//! result type:
//!
//! - [`grid_search`]: exhaustive enumeration of a [`SearchSpace`], evaluated
//!   in batches of `ncpus` concurrent cross-validations
//! - [`gradient_search`]: finite-difference coordinate ascent started from
//!   the box midpoint of every (min child weight, max depth) cell
//! - [`hybrid_search`]: a coarse grid whose every cell runs the ascent in a
//!   narrowed box
//!
//! Every strategy maximizes the score and replaces its best point only on
//! strict improvement. An evaluation error aborts the whole search.

pub mod cross_validation;
pub mod gradient;
pub mod grid;
pub mod hybrid;

pub use cross_validation::cross_validate;
pub use gradient::{gradient_search, gradient_step, StepOutcome, Tunable};
pub use grid::{grid_search, GridPoints};
pub use hybrid::hybrid_search;

use crate::boosting::train;
use crate::config::{Options, SearchSpace};
use crate::core::error::{GbtuneError, Result};
use crate::dataset::Dataset;
use crate::io::save_model;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

/// Outcome of a hyperparameter search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Best hyperparameter vector found
    pub best: Options,
    /// Its cross-validated score
    pub best_score: f64,
    /// Score of every successive improvement, in discovery order
    pub history: Vec<f64>,
}

/// Receives every new best point of a search as soon as it is found.
pub trait BestPointSink {
    /// Called with the full dataset, the new best options and its score.
    fn record(&self, dataset: &Dataset, options: &Options, score: f64) -> Result<()>;
}

/// Retrains each new best point on the full dataset and saves the model as
/// `model<score>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct ModelFileSink {
    dir: PathBuf,
}

impl ModelFileSink {
    /// Sink writing into `dir`, which must exist.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        ModelFileSink { dir: dir.into() }
    }

    /// Path a point with `score` is written to.
    pub fn path_for(&self, score: f64) -> PathBuf {
        self.dir.join(format!("model{:.2}.json", score))
    }
}

impl BestPointSink for ModelFileSink {
    fn record(&self, dataset: &Dataset, options: &Options, score: f64) -> Result<()> {
        let ensemble = train(dataset, options)?;
        let path = self.path_for(score);
        save_model(&ensemble, &path)?;
        log::info!("saved best model to {}", path.display());
        Ok(())
    }
}

/// Running best point plus improvement history.
#[derive(Debug, Default)]
pub(crate) struct Tracker {
    best: Option<(Options, f64)>,
    history: Vec<f64>,
}

impl Tracker {
    /// Offer a scored point; returns whether it became the new best.
    pub(crate) fn offer(&mut self, options: &Options, score: f64) -> bool {
        let improves = match &self.best {
            Some((_, best)) => score > *best,
            None => true,
        };
        if improves {
            log::info!("new best score {:.4}: {}", score, options);
            self.best = Some((options.clone(), score));
            self.history.push(score);
        }
        improves
    }

    /// Score of the most recent improvement.
    pub(crate) fn last(&self) -> Option<f64> {
        self.history.last().copied()
    }

    pub(crate) fn finish(self) -> Result<SearchResult> {
        let (best, best_score) = self
            .best
            .ok_or_else(|| GbtuneError::evaluation("search evaluated no points"))?;
        Ok(SearchResult {
            best,
            best_score,
            history: self.history,
        })
    }
}

pub(crate) fn thread_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| GbtuneError::internal(format!("failed to create thread pool: {}", e)))
}

pub(crate) fn search_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// `value` moved up or down by a random fraction of at most `fraction`.
fn fuzz_value<R: Rng + ?Sized>(value: f64, fraction: f64, rng: &mut R) -> f64 {
    let amount = rng.gen::<f64>() * fraction;
    let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    value + sign * amount * value
}

/// Randomly perturb the continuous hyperparameters of `options` (and its
/// rounds and base score) by up to `fraction` of their values. Tunable
/// fields are clamped back into `space`.
pub(crate) fn fuzz_options<R: Rng + ?Sized>(
    options: &Options,
    space: &SearchSpace,
    fraction: f64,
    rng: &mut R,
) -> Options {
    let mut fuzzed = options.clone();
    let rounds = fuzz_value(options.rounds as f64, fraction, rng).max(1.0) as usize;
    fuzzed.rounds = space.rounds.clamp(rounds);
    fuzzed.subsample = space
        .subsample
        .clamp(fuzz_value(options.subsample, fraction, rng));
    fuzzed.col_subsample = space
        .col_subsample
        .clamp(fuzz_value(options.col_subsample, fraction, rng));
    fuzzed.lambda = space.lambda.clamp(fuzz_value(options.lambda, fraction, rng));
    fuzzed.gamma = space.gamma.clamp(fuzz_value(options.gamma, fraction, rng));
    fuzzed.learning_rate = space
        .learning_rate
        .clamp(fuzz_value(options.learning_rate, fraction, rng));
    fuzzed.base_score = fuzz_value(options.base_score, fraction, rng);
    fuzzed
}
