//! Common test utilities for gbtune integration tests.
#![allow(dead_code)]

use gbtune::*;
use ndarray::Array2;
use rand::prelude::*;

/// Gaussian-ish blobs: `classes` well separated clusters in `num_features`
/// dimensions, labels `10, 20, 30, ...`.
pub fn create_blobs(num_samples: usize, num_features: usize, classes: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(42);
    let mut features = Array2::zeros((num_samples, num_features));
    let mut labels = Vec::with_capacity(num_samples);

    for i in 0..num_samples {
        let class = i % classes;
        for j in 0..num_features {
            let center = (class * 6) as f64 + j as f64;
            features[[i, j]] = center + rng.gen_range(-1.0..1.0);
        }
        labels.push((class as i32 + 1) * 10);
    }

    Dataset::new(features, labels).expect("valid blobs")
}

/// Noisy linear regression targets over uniform features.
pub fn create_regression(num_samples: usize, num_features: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(7);
    let mut features = Array2::zeros((num_samples, num_features));
    let mut targets = Vec::with_capacity(num_samples);

    for i in 0..num_samples {
        let mut target = 0.0;
        for j in 0..num_features {
            let x: f64 = rng.gen_range(-2.0..2.0);
            features[[i, j]] = x;
            target += x * (j + 1) as f64;
        }
        targets.push(target + rng.gen_range(-0.05..0.05));
    }

    Dataset::regression(features, targets).expect("valid regression data")
}

/// Deterministic regularized options suited to small test datasets.
pub fn quick_regularized(rounds: usize) -> Options {
    OptionsBuilder::new()
        .rounds(rounds)
        .max_depth(3)
        .min_child_weight(1.0)
        .min_samples_per_tree(1)
        .subsample(1.0)
        .col_subsample(1.0)
        .early_stop(0)
        .seed(1)
        .build()
        .expect("valid options")
}

/// Deterministic plain options suited to small test datasets.
pub fn quick_plain(rounds: usize) -> Options {
    OptionsBuilder::for_kind(BoostingKind::Plain)
        .rounds(rounds)
        .max_depth(3)
        .learning_rate(0.3)
        .min_child_weight(1.0)
        .seed(1)
        .build()
        .expect("valid options")
}

/// Search settings with a fixed seed and few folds.
pub fn quick_search(kind: BoostingKind) -> SearchConfig {
    SearchConfig::for_kind(kind)
        .with_folds(3)
        .with_ncpus(2)
        .with_seed(5)
        .with_steps(2)
}
