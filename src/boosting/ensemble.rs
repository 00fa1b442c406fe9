//! Trained additive ensemble: `rounds[round][i]` holds the tree of one
//! still-active class for that round.

use crate::activation::Activation;
use crate::core::error::{GbtuneError, Result};
use crate::core::types::{BoostingKind, ClassLabel, Task};
use crate::dataset::Dataset;
use crate::importance::FeatureImportance;
use crate::tree::{Tree, TreeNode};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

/// A tree together with the class column it contributes to.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassTree {
    /// Class column index
    pub class: usize,
    /// The tree
    pub tree: Tree,
}

/// Additive ensemble of per-class trees.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    rounds: Vec<Vec<ClassTree>>,
    learning_rate: f64,
    base_score: f64,
    class_labels: Vec<ClassLabel>,
    activation: Activation,
    kind: BoostingKind,
}

impl Ensemble {
    /// Assemble an ensemble from its parts.
    pub fn new(
        rounds: Vec<Vec<ClassTree>>,
        learning_rate: f64,
        base_score: f64,
        class_labels: Vec<ClassLabel>,
        activation: Activation,
        kind: BoostingKind,
    ) -> Result<Self> {
        if class_labels.is_empty() {
            return Err(GbtuneError::training("ensemble needs at least one class"));
        }
        for round in &rounds {
            if let Some(bad) = round.iter().find(|ct| ct.class >= class_labels.len()) {
                return Err(GbtuneError::training(format!(
                    "tree for class {} but only {} classes",
                    bad.class,
                    class_labels.len()
                )));
            }
        }
        Ok(Ensemble {
            rounds,
            learning_rate,
            base_score,
            class_labels,
            activation,
            kind,
        })
    }

    /// Trees grouped by round.
    pub fn rounds(&self) -> &[Vec<ClassTree>] {
        &self.rounds
    }

    /// Number of rounds that produced at least one tree.
    pub fn num_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Number of rounds in which `class` received a tree.
    pub fn rounds_for_class(&self, class: usize) -> usize {
        self.rounds
            .iter()
            .filter(|round| round.iter().any(|ct| ct.class == class))
            .count()
    }

    /// Number of output columns.
    pub fn num_classes(&self) -> usize {
        self.class_labels.len()
    }

    /// Label of every output column.
    pub fn class_labels(&self) -> &[ClassLabel] {
        &self.class_labels
    }

    /// Shrinkage applied to tree outputs.
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Initial raw score.
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Output transform.
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Boosting flavour the trees were grown with.
    pub fn kind(&self) -> BoostingKind {
        self.kind
    }

    /// Task implied by the output transform.
    pub fn task(&self) -> Task {
        match self.activation {
            Activation::Softmax => Task::Classification,
            Activation::Identity => Task::Regression,
        }
    }

    /// Total number of nodes over all trees.
    pub fn total_branches(&self) -> usize {
        self.trees().map(Tree::branches).sum()
    }

    /// Every tree, round by round.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.rounds.iter().flatten().map(|ct| &ct.tree)
    }

    /// Minimum column count a sample needs for prediction.
    pub fn required_features(&self) -> usize {
        let mut required = 0;
        for tree in self.trees() {
            tree.root().visit(&mut |node: &TreeNode| {
                if let Some(split) = node.split() {
                    required = required.max(split.feature + 1);
                }
            });
        }
        required
    }

    fn check_width(&self, width: usize) -> Result<()> {
        let required = self.required_features();
        if width < required {
            return Err(GbtuneError::dimension_mismatch(
                format!("at least {} features", required),
                format!("{} features", width),
            ));
        }
        Ok(())
    }

    fn accumulate(&self, row: ArrayView1<'_, f64>, mut raw: ndarray::ArrayViewMut1<'_, f64>) {
        raw.fill(self.base_score);
        for round in &self.rounds {
            for ct in round {
                raw[ct.class] += ct.tree.predict(row) * self.learning_rate;
            }
        }
    }

    /// Raw (pre-activation) scores of one sample.
    pub fn predict_raw_row(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        self.check_width(row.len())?;
        let mut raw = Array1::zeros(self.num_classes());
        self.accumulate(row, raw.view_mut());
        Ok(raw)
    }

    /// Raw scores of every row of `features`, computed in parallel.
    pub fn predict_raw(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_width(features.ncols())?;
        let mut raw = Array2::zeros((features.nrows(), self.num_classes()));
        Zip::from(raw.rows_mut())
            .and(features.rows())
            .par_for_each(|out, row| self.accumulate(row, out));
        Ok(raw)
    }

    /// Activated predictions (class probabilities or regression values)
    /// of one sample.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        let raw = self.predict_raw_row(row)?;
        let width = raw.len();
        let matrix = raw
            .into_shape_with_order((1, width))
            .map_err(|e| GbtuneError::internal(e.to_string()))?;
        Ok(self.activation.apply(matrix.view()).row(0).to_owned())
    }

    /// Activated predictions of every row.
    pub fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let mut raw = self.predict_raw(features)?;
        self.activation.apply_inplace(&mut raw);
        Ok(raw)
    }

    /// Index of the most likely class of one sample.
    pub fn predict_class(&self, row: ArrayView1<'_, f64>) -> Result<usize> {
        Ok(argmax(self.predict_row(row)?.view()))
    }

    /// Label of the most likely class of one sample.
    pub fn predict_label(&self, row: ArrayView1<'_, f64>) -> Result<ClassLabel> {
        Ok(self.class_labels[self.predict_class(row)?])
    }

    /// Most likely class index of every row.
    pub fn predict_classes(&self, features: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        let probs = self.predict_proba(features)?;
        Ok(classes_from_probs(probs.view()))
    }

    /// Percentage of rows whose predicted label equals the true label.
    pub fn accuracy(&self, dataset: &Dataset) -> Result<f64> {
        let predicted = self.predict_classes(dataset.features())?;
        let right = predicted
            .iter()
            .zip(dataset.labels())
            .filter(|&(&p, &label)| self.class_labels[p] == label)
            .count();
        Ok(100.0 * right as f64 / dataset.num_rows() as f64)
    }

    /// Root mean squared deviation of the first output column from the
    /// float labels.
    pub fn rmsd(&self, dataset: &Dataset) -> Result<f64> {
        let preds = self.predict_proba(dataset.features())?;
        let sum: f64 = preds
            .column(0)
            .iter()
            .zip(dataset.float_labels())
            .map(|(p, t)| (p - t) * (p - t))
            .sum();
        Ok((sum / dataset.num_rows() as f64).sqrt())
    }

    /// Higher-is-better score: accuracy percentage for classification,
    /// `1 / RMSD` for regression.
    pub fn score(&self, dataset: &Dataset) -> Result<f64> {
        match self.task() {
            Task::Classification => self.accuracy(dataset),
            Task::Regression => Ok(1.0 / self.rmsd(dataset)?.max(f64::EPSILON)),
        }
    }

    /// Accumulated split gain per feature over every tree.
    pub fn feature_importance(&self) -> FeatureImportance {
        FeatureImportance::from_trees(self.kind, self.trees())
    }
}

fn argmax(values: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Column index of the largest value in every row (first wins ties).
pub fn classes_from_probs(probs: ArrayView2<'_, f64>) -> Vec<usize> {
    probs.axis_iter(Axis(0)).map(argmax).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeKind;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn stump(left: f64, right: f64) -> Tree {
        Tree::new(
            TreeNode::internal(
                vec![0, 1],
                0.0,
                -1.0,
                0,
                0.5,
                TreeNode::leaf(vec![0], left, f64::INFINITY),
                TreeNode::leaf(vec![1], right, f64::INFINITY),
            ),
            TreeKind::Plain,
        )
    }

    fn two_class() -> Ensemble {
        Ensemble::new(
            vec![vec![
                ClassTree {
                    class: 0,
                    tree: stump(2.0, -2.0),
                },
                ClassTree {
                    class: 1,
                    tree: stump(-2.0, 2.0),
                },
            ]],
            0.5,
            0.0,
            vec![10, 20],
            Activation::Softmax,
            BoostingKind::Plain,
        )
        .unwrap()
    }

    #[test]
    fn test_raw_and_class_prediction() {
        let ens = two_class();
        let raw = ens.predict_raw_row(array![0.0].view()).unwrap();
        assert_abs_diff_eq!(raw[0], 1.0);
        assert_abs_diff_eq!(raw[1], -1.0);
        assert_eq!(ens.predict_label(array![0.0].view()).unwrap(), 10);
        assert_eq!(ens.predict_label(array![1.0].view()).unwrap(), 20);
    }

    #[test]
    fn test_batch_matches_single() {
        let ens = two_class();
        let x = array![[0.0], [1.0], [0.2]];
        let probs = ens.predict_proba(x.view()).unwrap();
        for (i, row) in x.rows().into_iter().enumerate() {
            let single = ens.predict_row(row).unwrap();
            assert_abs_diff_eq!(single[0], probs[[i, 0]], epsilon = 1e-12);
        }
        assert_eq!(ens.predict_classes(x.view()).unwrap(), vec![0, 1, 0]);
    }

    #[test]
    fn test_accuracy() {
        let ens = two_class();
        let ds = Dataset::new(array![[0.0], [1.0], [0.0], [1.0]], vec![10, 20, 20, 20]).unwrap();
        assert_abs_diff_eq!(ens.accuracy(&ds).unwrap(), 75.0);
        assert_abs_diff_eq!(ens.score(&ds).unwrap(), 75.0);
    }

    #[test]
    fn test_missing_features_rejected() {
        let ens = two_class();
        let empty = Array2::<f64>::zeros((2, 0));
        assert!(ens.predict_proba(empty.view()).is_err());
        assert_eq!(ens.required_features(), 1);
    }

    #[test]
    fn test_rejects_unknown_class_column() {
        let result = Ensemble::new(
            vec![vec![ClassTree {
                class: 3,
                tree: stump(0.0, 0.0),
            }]],
            0.1,
            0.0,
            vec![1],
            Activation::Identity,
            BoostingKind::Plain,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_round_counts() {
        let ens = two_class();
        assert_eq!(ens.num_rounds(), 1);
        assert_eq!(ens.rounds_for_class(1), 1);
        assert_eq!(ens.total_branches(), 6);
    }
}
