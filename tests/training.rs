//! End-to-end training behaviour.

mod common;

use approx::assert_abs_diff_eq;
use common::*;
use gbtune::*;
use ndarray::{array, Array2};

#[test]
fn test_regularized_multiclass_accuracy() {
    let ds = create_blobs(90, 3, 3);
    let model = train(&ds, &quick_regularized(15)).unwrap();
    assert_eq!(model.class_labels(), &[10, 20, 30]);
    assert_eq!(model.kind(), BoostingKind::Regularized);
    assert!(model.accuracy(&ds).unwrap() > 95.0);
}

#[test]
fn test_plain_multiclass_accuracy() {
    let ds = create_blobs(90, 3, 3);
    let model = train(&ds, &quick_plain(15)).unwrap();
    assert_eq!(model.kind(), BoostingKind::Plain);
    assert!(model.accuracy(&ds).unwrap() > 95.0);
}

#[test]
fn test_training_is_deterministic_with_seed() {
    let ds = create_blobs(60, 2, 3);
    let mut options = quick_regularized(8);
    options.subsample = 0.7;
    options.col_subsample = 0.5;
    let a = train(&ds, &options).unwrap();
    let b = train(&ds, &options).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        a.predict_proba(ds.features()).unwrap(),
        b.predict_proba(ds.features()).unwrap()
    );
}

#[test]
fn test_probabilities_sum_to_one() {
    let ds = create_blobs(45, 2, 3);
    let model = train(&ds, &quick_regularized(5)).unwrap();
    let probs = model.predict_proba(ds.features()).unwrap();
    for row in probs.rows() {
        assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
        assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}

#[test]
fn test_larger_gamma_never_grows_the_tree() {
    let ds = create_regression(60, 2);
    let mut previous = usize::MAX;
    for gamma in [0.0, 0.5, 2.0, 10.0, 1.0e9] {
        let mut options = quick_regularized(1);
        options.task = Task::Regression;
        options.gamma = gamma;
        let branches = train(&ds, &options).unwrap().total_branches();
        assert!(branches <= previous, "gamma {} grew to {}", gamma, branches);
        previous = branches;
    }
    assert_eq!(previous, 1);
}

#[test]
fn test_regression_fit() {
    let ds = create_regression(120, 2);
    let options = OptionsBuilder::new()
        .task(Task::Regression)
        .rounds(60)
        .max_depth(4)
        .min_child_weight(1.0)
        .subsample(1.0)
        .col_subsample(1.0)
        .lambda(0.0)
        .gamma(0.0)
        .base_score(0.0)
        .early_stop(0)
        .build()
        .unwrap();
    let model = train(&ds, &options).unwrap();
    assert_eq!(model.task(), Task::Regression);
    assert_eq!(model.num_classes(), 1);
    let rmsd = model.rmsd(&ds).unwrap();
    assert!(rmsd < 0.5, "rmsd {}", rmsd);
    assert_abs_diff_eq!(model.score(&ds).unwrap(), 1.0 / rmsd, epsilon = 1e-9);
}

#[test]
fn test_constant_feature_never_split() {
    let n = 40;
    let features = Array2::from_shape_fn((n, 2), |(i, j)| {
        if j == 0 {
            (i % 2) as f64 * 3.0 + i as f64 * 0.01
        } else {
            7.0
        }
    });
    let ds = Dataset::new(features, (0..n).map(|i| (i % 2) as i32).collect()).unwrap();
    let model = train(&ds, &quick_regularized(5)).unwrap();
    let importance = model.feature_importance();
    assert_eq!(importance.top(1), vec![0]);
    assert!(importance.entries().iter().all(|&(f, _)| f != 1));
}

#[test]
fn test_no_rounds_predicts_base_score() {
    let ds = create_blobs(12, 2, 2);
    let mut options = quick_regularized(3);
    options.min_samples_per_tree = 100;
    let model = train(&ds, &options).unwrap();
    assert_eq!(model.num_rounds(), 0);
    let probs = model.predict_row(array![0.0, 0.0].view()).unwrap();
    assert_abs_diff_eq!(probs[0], 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(probs[1], 0.5, epsilon = 1e-12);
}

#[test]
fn test_tree_rendering_uses_feature_names() {
    let ds = create_blobs(30, 2, 2)
        .with_feature_names(vec!["mass".into(), "charge".into()])
        .unwrap();
    let model = train(&ds, &quick_regularized(1)).unwrap();
    let tree = model.trees().next().unwrap();
    let text = tree.render(Some(ds.feature_names()));
    assert!(text.contains("mass") || text.contains("charge"));
}

#[test]
fn test_trains_on_adjacent_and_huge_feature_values() {
    let adjacent = f64::from_bits(1.0f64.to_bits() + 1);
    for (a, b) in [(1.0, adjacent), (f64::MAX * 0.75, f64::MAX)] {
        let features = array![[a], [a], [b], [b]];
        let ds = Dataset::new(features, vec![0, 0, 1, 1]).unwrap();
        for kind in [BoostingKind::Regularized, BoostingKind::Plain] {
            let options = OptionsBuilder::for_kind(kind)
                .rounds(1)
                .max_depth(2)
                .min_child_weight(1.0)
                .min_samples_per_tree(1)
                .subsample(1.0)
                .col_subsample(1.0)
                .seed(3)
                .build()
                .unwrap();
            let model = train(&ds, &options).unwrap();
            let tree = model.trees().next().unwrap();
            assert_eq!(tree.branches(), 3);
            assert_eq!(model.predict_classes(ds.features()).unwrap(), vec![0, 0, 1, 1]);
        }
    }
}
