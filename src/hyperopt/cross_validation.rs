//! K-fold cross-validated scoring of one hyperparameter vector.

use crate::boosting::train;
use crate::config::{Options, SearchConfig};
use crate::core::error::Result;
use crate::dataset::Dataset;

/// Mean held-out score of `options` over the folds of `dataset`.
///
/// The score is accuracy (%) for classification and `1 / RMSD` for
/// regression. Folds whose training split produced no boosting round are
/// logged and left out of the mean; if every fold is left out the score
/// is 0.
pub fn cross_validate(dataset: &Dataset, options: &Options, config: &SearchConfig) -> Result<f64> {
    let splits = dataset.k_fold(config.folds, config.fold_assignment, config.seed)?;
    let num_folds = splits.plan().num_folds();

    let mut total = 0.0;
    let mut counted = 0usize;
    for (fold, split) in splits.enumerate() {
        let (train_set, test_set) = split?;
        let ensemble = train(&train_set, options)?;
        if ensemble.num_rounds() == 0 {
            log::warn!(
                "fold {} of {} produced no boosting rounds, leaving it out",
                fold + 1,
                num_folds
            );
            continue;
        }
        let score = ensemble.score(&test_set)?;
        log::trace!("fold {} of {}: score {:.4}", fold + 1, num_folds, score);
        total += score;
        counted += 1;
    }

    if counted == 0 {
        log::warn!("no fold produced a usable ensemble for {}", options);
        return Ok(0.0);
    }
    Ok(total / counted as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptionsBuilder;
    use crate::core::error::GbtuneError;
    use ndarray::Array2;

    fn separable(n: usize) -> Dataset {
        let features = Array2::from_shape_fn((n, 2), |(i, j)| {
            let class = i % 2;
            (class * 10) as f64 + ((i * 3 + j) % 4) as f64 * 0.25
        });
        Dataset::new(features, (0..n).map(|i| (i % 2) as i32).collect()).unwrap()
    }

    fn quick_options() -> Options {
        OptionsBuilder::new()
            .rounds(5)
            .subsample(1.0)
            .col_subsample(1.0)
            .min_child_weight(1.0)
            .min_samples_per_tree(1)
            .seed(3)
            .build()
            .unwrap()
    }

    #[test]
    fn test_separable_scores_high() {
        let config = SearchConfig::default().with_folds(4).with_seed(11);
        let score = cross_validate(&separable(40), &quick_options(), &config).unwrap();
        assert!(score > 90.0, "score {}", score);
    }

    #[test]
    fn test_same_seed_same_score() {
        let ds = separable(30);
        let config = SearchConfig::default().with_folds(3).with_seed(5);
        let a = cross_validate(&ds, &quick_options(), &config).unwrap();
        let b = cross_validate(&ds, &quick_options(), &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_few_rows() {
        let config = SearchConfig::default().with_seed(1);
        let err = cross_validate(&separable(3), &quick_options(), &config).unwrap_err();
        assert!(matches!(err, GbtuneError::InsufficientData { .. }));
    }

    #[test]
    fn test_all_folds_skipped_scores_zero() {
        let mut options = quick_options();
        options.min_samples_per_tree = 1000;
        let config = SearchConfig::default().with_folds(2).with_seed(2);
        assert_eq!(cross_validate(&separable(10), &options, &config).unwrap(), 0.0);
    }
}
