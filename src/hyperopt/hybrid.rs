//! Coarse grid with a local coordinate ascent inside every cell.

use crate::config::{Options, ParamRange, SearchConfig, SearchSpace};
use crate::core::error::Result;
use crate::dataset::Dataset;
use crate::hyperopt::gradient::{ascend, ascent_pool};
use crate::hyperopt::{search_rng, SearchResult, Tracker};

/// Box around one outer cell: rounds and lambda shrink to one outer step
/// on either side of the cell with a tenth of the step as spacing.
fn cell_space(space: &SearchSpace, rounds: usize, lambda: f64) -> SearchSpace {
    let rounds_step = space.rounds.step;
    let lambda_step = space.lambda.step;
    let lambda_spacing = if lambda > 0.0 {
        lambda * 0.1
    } else {
        lambda_step * 0.1
    };
    SearchSpace {
        rounds: ParamRange::new(
            rounds.saturating_sub(rounds_step).max(1),
            rounds + rounds_step,
            (rounds_step / 10).max(1),
        ),
        lambda: ParamRange::new(
            (lambda - lambda_step).max(0.0),
            lambda + lambda_step,
            lambda_spacing,
        ),
        ..space.clone()
    }
}

/// Grid over (min child weight, rounds, max depth, lambda); each cell runs
/// the coordinate ascent from the midpoint of its narrowed box.
pub fn hybrid_search(
    dataset: &Dataset,
    base: &Options,
    space: &SearchSpace,
    config: &SearchConfig,
) -> Result<SearchResult> {
    space.validate()?;
    config.validate()?;
    let pool = ascent_pool(base, config)?;
    let mut rng = search_rng(config.seed);
    let mut tracker = Tracker::default();

    for min_child_weight in space.min_child_weight.values() {
        for rounds in space.rounds.values() {
            log::info!(
                "hybrid search: rounds {}, min child weight {}",
                rounds,
                min_child_weight
            );
            for max_depth in space.max_depth.values() {
                for lambda in space.lambda.values() {
                    let cell = cell_space(space, rounds, lambda);
                    let mut start = cell.midpoint(base);
                    start.min_child_weight = min_child_weight;
                    start.max_depth = max_depth;
                    ascend(&pool, dataset, start, &cell, config, &mut tracker, &mut rng)?;
                }
            }
        }
    }

    tracker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    #[test]
    fn test_cell_space_narrows() {
        let space = SearchSpace::regularized();
        let cell = cell_space(&space, 120, 1.5);
        assert_eq!(cell.rounds, ParamRange::new(20, 220, 10));
        assert_abs_diff_eq!(cell.lambda.min, 1.3, epsilon = 1e-12);
        assert_abs_diff_eq!(cell.lambda.max, 1.7, epsilon = 1e-12);
        assert_abs_diff_eq!(cell.lambda.step, 0.15, epsilon = 1e-12);
        assert_eq!(cell.max_depth, space.max_depth);
    }

    #[test]
    fn test_cell_space_floors() {
        let space = SearchSpace::plain();
        let cell = cell_space(&space, 2, 0.0);
        assert_eq!(cell.rounds.min, 1);
        assert_eq!(cell.lambda.min, 0.0);
        assert!(cell.validate().is_ok());
    }

    #[test]
    fn test_hybrid_search_runs() {
        let features = Array2::from_shape_fn((20, 1), |(i, _)| ((i % 2) * 4) as f64 + i as f64 * 0.01);
        let ds = Dataset::new(features, (0..20).map(|i| (i % 2) as i32).collect()).unwrap();
        let mut base = Options::plain();
        base.seed = Some(1);
        let space = SearchSpace {
            rounds: ParamRange::new(4, 4, 2),
            max_depth: ParamRange::new(2, 2, 1),
            learning_rate: ParamRange::new(0.2, 0.6, 0.2),
            min_child_weight: ParamRange::new(1.0, 1.0, 1.0),
            ..SearchSpace::plain()
        };
        let config = SearchConfig::plain().with_folds(2).with_seed(8).with_steps(1);
        let result = hybrid_search(&ds, &base, &space, &config).unwrap();
        assert!(result.best_score > 50.0);
        assert_eq!(result.best.max_depth, 2);
    }
}
