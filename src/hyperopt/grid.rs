//! Exhaustive grid search.

use crate::config::{Options, SearchConfig, SearchSpace};
use crate::core::error::Result;
use crate::dataset::Dataset;
use crate::hyperopt::cross_validation::cross_validate;
use crate::hyperopt::{thread_pool, BestPointSink, SearchResult, Tracker};
use rayon::prelude::*;

const DIMS: usize = 8;

/// Lazy enumeration of every grid point of a [`SearchSpace`].
///
/// Rounds vary slowest, then min child weight, max depth, column
/// subsample, learning rate, lambda, gamma; row subsample varies fastest.
#[derive(Debug, Clone)]
pub struct GridPoints {
    base: Options,
    rounds: Vec<usize>,
    min_child_weight: Vec<f64>,
    max_depth: Vec<usize>,
    col_subsample: Vec<f64>,
    learning_rate: Vec<f64>,
    lambda: Vec<f64>,
    gamma: Vec<f64>,
    subsample: Vec<f64>,
    index: [usize; DIMS],
    done: bool,
}

impl GridPoints {
    /// Grid over `space`; fields the space does not cover come from `base`.
    pub fn new(space: &SearchSpace, base: &Options) -> Self {
        let points = GridPoints {
            base: base.clone(),
            rounds: space.rounds.values(),
            min_child_weight: space.min_child_weight.values(),
            max_depth: space.max_depth.values(),
            col_subsample: space.col_subsample.values(),
            learning_rate: space.learning_rate.values(),
            lambda: space.lambda.values(),
            gamma: space.gamma.values(),
            subsample: space.subsample.values(),
            index: [0; DIMS],
            done: false,
        };
        let done = points.lens().iter().any(|&len| len == 0);
        GridPoints { done, ..points }
    }

    fn lens(&self) -> [usize; DIMS] {
        [
            self.rounds.len(),
            self.min_child_weight.len(),
            self.max_depth.len(),
            self.col_subsample.len(),
            self.learning_rate.len(),
            self.lambda.len(),
            self.gamma.len(),
            self.subsample.len(),
        ]
    }

    fn current(&self) -> Options {
        let i = &self.index;
        let mut options = self.base.clone();
        options.rounds = self.rounds[i[0]];
        options.min_child_weight = self.min_child_weight[i[1]];
        options.max_depth = self.max_depth[i[2]];
        options.col_subsample = self.col_subsample[i[3]];
        options.learning_rate = self.learning_rate[i[4]];
        options.lambda = self.lambda[i[5]];
        options.gamma = self.gamma[i[6]];
        options.subsample = self.subsample[i[7]];
        options
    }

    fn advance(&mut self) {
        let lens = self.lens();
        for dim in (0..DIMS).rev() {
            self.index[dim] += 1;
            if self.index[dim] < lens[dim] {
                return;
            }
            self.index[dim] = 0;
        }
        self.done = true;
    }
}

impl Iterator for GridPoints {
    type Item = Options;

    fn next(&mut self) -> Option<Options> {
        if self.done {
            return None;
        }
        let options = self.current();
        self.advance();
        Some(options)
    }
}

/// Cross-validate every grid point of `space` and keep the best.
///
/// Points are evaluated in batches of `config.ncpus` on a dedicated rayon
/// pool; each batch completes before its results are folded in submission
/// order. `sink`, when given, receives every new best point; its failures
/// are logged and do not stop the search.
pub fn grid_search(
    dataset: &Dataset,
    base: &Options,
    space: &SearchSpace,
    config: &SearchConfig,
    sink: Option<&dyn BestPointSink>,
) -> Result<SearchResult> {
    space.validate()?;
    config.validate()?;
    let pool = thread_pool(config.ncpus)?;
    let total = space.grid_size();
    log::info!(
        "grid search over {} points ({} folds, {} at a time)",
        total,
        config.folds,
        config.ncpus
    );

    let mut points = GridPoints::new(space, base);
    let mut tracker = Tracker::default();
    let mut evaluated = 0usize;
    loop {
        let batch: Vec<Options> = points.by_ref().take(config.ncpus).collect();
        if batch.is_empty() {
            break;
        }
        let scores: Vec<Result<f64>> = pool.install(|| {
            batch
                .par_iter()
                .map(|options| cross_validate(dataset, options, config))
                .collect()
        });

        for (options, score) in batch.iter().zip(scores) {
            let score = score.map_err(|e| {
                log::error!("evaluation of {} failed: {}", options, e);
                e
            })?;
            if tracker.offer(options, score) {
                if let Some(sink) = sink {
                    if let Err(e) = sink.record(dataset, options, score) {
                        log::warn!("could not persist best point: {}", e);
                    }
                }
            }
        }
        evaluated += batch.len();
        log::debug!("grid search: {}/{} points evaluated", evaluated, total);
    }

    tracker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParamRange;
    use crate::core::types::BoostingKind;

    #[test]
    fn test_grid_points_order_and_count() {
        let mut space = SearchSpace::single_point(&Options::regularized());
        space.rounds = ParamRange::new(10, 20, 10);
        space.subsample = ParamRange::new(0.5, 0.7, 0.1);
        let points: Vec<Options> = GridPoints::new(&space, &Options::regularized()).collect();
        assert_eq!(points.len(), space.grid_size());
        assert_eq!(points.len(), 6);
        assert_eq!(points[0].rounds, 10);
        assert_eq!(points[2].rounds, 10);
        assert_eq!(points[3].rounds, 20);
        assert!((points[1].subsample - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_single_point_space() {
        let base = Options::for_kind(BoostingKind::Plain);
        let points: Vec<Options> =
            GridPoints::new(&SearchSpace::single_point(&base), &base).collect();
        assert_eq!(points, vec![base]);
    }
}
