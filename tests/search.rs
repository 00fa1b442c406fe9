//! Cross-validation and hyperparameter search.

mod common;

use common::*;
use gbtune::*;

#[test]
fn test_fold_count_degrades_on_tiny_data() {
    let ds = create_blobs(4, 2, 2);
    let splits = ds.k_fold(5, FoldAssignment::Exclusive, Some(1)).unwrap();
    assert_eq!(splits.plan().num_folds(), 2);
    let pairs: Vec<_> = splits.collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(pairs.len(), 2);
    for (train_set, test_set) in &pairs {
        assert_eq!(train_set.num_rows() + test_set.num_rows(), 4);
    }
}

#[test]
fn test_cross_validation_scores_separable_data() {
    let ds = create_blobs(60, 2, 3);
    let config = quick_search(BoostingKind::Regularized);
    let score = cross_validate(&ds, &quick_regularized(5), &config).unwrap();
    assert!(score > 90.0, "score {}", score);
}

#[test]
fn test_grid_single_point() {
    let ds = create_blobs(30, 2, 2);
    let base = quick_regularized(4);
    let config = quick_search(BoostingKind::Regularized);
    let space = SearchSpace::single_point(&base);

    let result = grid_search(&ds, &base, &space, &config, None).unwrap();
    assert_eq!(result.best, base);
    assert_eq!(result.history.len(), 1);
    let direct = cross_validate(&ds, &base, &config).unwrap();
    assert_eq!(result.best_score, direct);
}

#[test]
fn test_grid_search_picks_best_and_persists_it() {
    let ds = create_blobs(36, 2, 2);
    let base = quick_plain(3);
    let mut space = SearchSpace::single_point(&base);
    space.rounds = ParamRange::new(1, 5, 2);
    space.learning_rate = ParamRange::new(0.1, 0.5, 0.2);
    let config = quick_search(BoostingKind::Plain);

    let dir = tempfile::tempdir().unwrap();
    let sink = ModelFileSink::new(dir.path());
    let result = grid_search(&ds, &base, &space, &config, Some(&sink)).unwrap();

    assert!(space.contains(&result.best));
    assert!(result.history.windows(2).all(|w| w[1] > w[0]));
    assert_eq!(result.history.last(), Some(&result.best_score));
    assert!(sink.path_for(result.best_score).exists());
    let saved = load_model(sink.path_for(result.best_score)).unwrap();
    assert_eq!(saved.kind(), BoostingKind::Plain);
}

#[test]
fn test_search_errors_abort() {
    let ds = create_blobs(3, 2, 2);
    let base = quick_regularized(3);
    let config = quick_search(BoostingKind::Regularized);
    let space = SearchSpace::single_point(&base);

    assert!(grid_search(&ds, &base, &space, &config, None).is_err());
    assert!(gradient_search(&ds, &base, &space, &config).is_err());
    assert!(hybrid_search(&ds, &base, &space, &config).is_err());
}

#[test]
fn test_gradient_search_plain() {
    let ds = create_blobs(30, 2, 2);
    let base = quick_plain(4);
    let space = SearchSpace {
        rounds: ParamRange::new(2, 8, 2),
        max_depth: ParamRange::new(2, 3, 1),
        learning_rate: ParamRange::new(0.1, 0.7, 0.2),
        min_child_weight: ParamRange::new(1.0, 1.0, 1.0),
        ..SearchSpace::plain()
    };
    let config = quick_search(BoostingKind::Plain);
    let result = gradient_search(&ds, &base, &space, &config).unwrap();
    assert!(result.best_score > 90.0);
    assert!(space.contains(&result.best));
}
