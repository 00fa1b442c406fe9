//! Stagewise multi-class boosting.
//!
//! Every round grows one tree per still-active class (one-vs-rest) on the
//! current gradients, adds its shrunk output to the raw-score matrix and
//! re-applies the activation before the next class is fitted.

use crate::activation::Activation;
use crate::boosting::early_stopping::EarlyStopping;
use crate::boosting::ensemble::{ClassTree, Ensemble};
use crate::boosting::sampling::Subsampler;
use crate::config::Options;
use crate::core::error::Result;
use crate::core::types::{BoostingKind, Task};
use crate::dataset::Dataset;
use crate::loss::{create_loss, LossFunction};
use crate::tree::{SampleStats, Tree, TreeBuilder, TreeKind};
use ndarray::{Array1, Array2, ArrayView2};

/// Trains ensembles for one validated [`Options`] vector.
#[derive(Debug)]
pub struct Trainer {
    options: Options,
    loss: Box<dyn LossFunction>,
}

impl Trainer {
    /// Validate `options` and prepare a trainer.
    pub fn new(options: Options) -> Result<Self> {
        options.validate()?;
        let loss = create_loss(options.loss);
        Ok(Trainer { options, loss })
    }

    /// The options in use.
    pub fn options(&self) -> &Options {
        &self.options
    }

    fn tree_kind(&self) -> TreeKind {
        match self.options.kind {
            BoostingKind::Plain => TreeKind::Plain,
            BoostingKind::Regularized => TreeKind::Regularized {
                lambda: self.options.lambda,
                gamma: self.options.gamma,
            },
        }
    }

    /// Train an ensemble on `dataset`.
    pub fn fit(&self, dataset: &Dataset) -> Result<Ensemble> {
        let opts = &self.options;
        let features = dataset.features();
        let (targets, class_labels) = dataset.targets(opts.task);
        let activation = match opts.task {
            Task::Classification => Activation::Softmax,
            Task::Regression => Activation::Identity,
        };
        let num_rows = dataset.num_rows();
        let num_classes = class_labels.len();

        let mut raw = Array2::from_elem((num_rows, num_classes), opts.base_score);
        let mut preds = activation.apply(raw.view());

        let mut sampler = match opts.kind {
            BoostingKind::Regularized => {
                Subsampler::new(opts.subsample, opts.col_subsample, opts.seed)
            }
            BoostingKind::Plain => Subsampler::new(1.0, 1.0, opts.seed),
        };
        let mut stopping = EarlyStopping::new(opts.early_stop, num_classes);
        let kind = self.tree_kind();

        let mut rounds = Vec::with_capacity(opts.rounds);
        let mut first_buf: Option<Array1<f64>> = None;
        let mut second_buf: Option<Array1<f64>> = None;

        for round in 0..opts.rounds {
            if stopping.all_stopped() {
                log::debug!("all classes stopped before round {}", round);
                break;
            }

            let rows = sampler.sample_rows(num_rows);
            if rows.len() < opts.min_samples_per_tree {
                log::debug!(
                    "round {}: {} sampled rows < minimum {}, skipping",
                    round,
                    rows.len(),
                    opts.min_samples_per_tree
                );
                continue;
            }
            let columns = sampler.sample_features(dataset.num_features());
            let builder = TreeBuilder::new(features, kind, opts.max_depth, opts.min_child_weight)
                .with_features(columns)?;

            let mut round_trees = Vec::with_capacity(num_classes);
            for class in stopping.active_classes() {
                let target = targets.column(class);
                let pred = preds.column(class);

                let tree = match opts.kind {
                    BoostingKind::Regularized => {
                        let grads = self.loss.gradients(target, pred, first_buf.take())?;
                        let hess = self.loss.hessian(target, pred, second_buf.take())?;
                        let stats = SampleStats::GradHess {
                            gradients: grads.view(),
                            hessians: hess.view(),
                        };
                        let tree = builder.build(rows.clone(), &stats)?;
                        first_buf = Some(grads);
                        second_buf = Some(hess);
                        tree
                    }
                    BoostingKind::Plain => {
                        let neg = self.loss.neg_gradients(target, pred, first_buf.take())?;
                        let hess = self.loss.hessian(target, pred, second_buf.take())?;
                        let mut tree = builder.build(rows.clone(), &SampleStats::Targets(neg.view()))?;
                        tree.refine_leaves(neg.view(), hess.view())?;
                        first_buf = Some(neg);
                        second_buf = Some(hess);
                        tree
                    }
                };

                add_tree_output(&mut raw, class, &tree, features, opts.learning_rate);
                preds = activation.apply(raw.view());

                let class_loss = self.loss.loss(targets.column(class), preds.column(class))?;
                log::debug!(
                    "round {} class {}: {} loss {:.6}, {} nodes",
                    round,
                    class,
                    self.loss.name(),
                    class_loss,
                    tree.branches()
                );
                stopping.update(class, class_loss, round);

                round_trees.push(ClassTree { class, tree });
            }

            if !round_trees.is_empty() {
                rounds.push(round_trees);
            }
        }

        log::debug!(
            "trained {} rounds over {} classes ({})",
            rounds.len(),
            num_classes,
            opts.kind
        );
        Ensemble::new(
            rounds,
            opts.learning_rate,
            opts.base_score,
            class_labels,
            activation,
            opts.kind,
        )
    }
}

fn add_tree_output(
    raw: &mut Array2<f64>,
    class: usize,
    tree: &Tree,
    features: ArrayView2<'_, f64>,
    learning_rate: f64,
) {
    for (row, mut out) in features.rows().into_iter().zip(raw.rows_mut()) {
        out[class] += tree.predict(row) * learning_rate;
    }
}

/// Train an ensemble with `options` on `dataset`.
pub fn train(dataset: &Dataset, options: &Options) -> Result<Ensemble> {
    Trainer::new(options.clone())?.fit(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptionsBuilder;
    use ndarray::Array2;

    fn blobs(n: usize) -> Dataset {
        let features = Array2::from_shape_fn((n, 2), |(i, j)| {
            let class = i % 3;
            (class * 4) as f64 + ((i * 7 + j * 3) % 5) as f64 * 0.3
        });
        let labels = (0..n).map(|i| (i % 3) as i32).collect();
        Dataset::new(features, labels).unwrap()
    }

    #[test]
    fn test_regularized_fits_separable_data() {
        let ds = blobs(60);
        let options = OptionsBuilder::new()
            .rounds(10)
            .subsample(1.0)
            .col_subsample(1.0)
            .min_child_weight(1.0)
            .early_stop(0)
            .build()
            .unwrap();
        let ens = train(&ds, &options).unwrap();
        assert_eq!(ens.num_classes(), 3);
        assert!(ens.num_rounds() > 0);
        assert!(ens.accuracy(&ds).unwrap() > 95.0);
    }

    #[test]
    fn test_plain_fits_separable_data() {
        let ds = blobs(60);
        let options = OptionsBuilder::for_kind(BoostingKind::Plain)
            .rounds(10)
            .learning_rate(0.5)
            .min_child_weight(1.0)
            .build()
            .unwrap();
        let ens = train(&ds, &options).unwrap();
        assert_eq!(ens.kind(), BoostingKind::Plain);
        assert!(ens.accuracy(&ds).unwrap() > 95.0);
    }

    #[test]
    fn test_skips_rounds_below_min_samples() {
        let ds = blobs(12);
        let options = OptionsBuilder::new()
            .rounds(4)
            .min_samples_per_tree(100)
            .build()
            .unwrap();
        let ens = train(&ds, &options).unwrap();
        assert_eq!(ens.num_rounds(), 0);
    }

    #[test]
    fn test_invalid_options_never_train() {
        let mut options = Options::regularized();
        options.learning_rate = -1.0;
        assert!(Trainer::new(options).is_err());
    }

    #[test]
    fn test_regression_task() {
        let n = 40;
        let features = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let targets: Vec<f64> = (0..n).map(|i| if i < 20 { 1.0 } else { 5.0 }).collect();
        let ds = Dataset::regression(features, targets).unwrap();
        let options = OptionsBuilder::new()
            .task(Task::Regression)
            .rounds(30)
            .subsample(1.0)
            .col_subsample(1.0)
            .lambda(0.0)
            .gamma(0.0)
            .base_score(0.0)
            .early_stop(0)
            .build()
            .unwrap();
        let ens = train(&ds, &options).unwrap();
        assert_eq!(ens.task(), Task::Regression);
        assert!(ens.rmsd(&ds).unwrap() < 0.1);
    }
}
