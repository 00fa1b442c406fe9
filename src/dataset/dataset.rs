//! In-memory dataset: a dense sample matrix plus its labels.

use crate::core::error::{GbtuneError, Result};
use crate::core::types::{ClassLabel, FeatureIndex, RowIndex, Task};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Dense dataset shared read-only by every tree node during training.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Array2<f64>,
    labels: Vec<ClassLabel>,
    float_labels: Vec<f64>,
    feature_names: Vec<String>,
}

impl Dataset {
    /// Create a classification dataset from a sample matrix and integer
    /// labels (one per row).
    pub fn new(features: Array2<f64>, labels: Vec<ClassLabel>) -> Result<Self> {
        let float_labels = labels.iter().map(|&l| l as f64).collect();
        Dataset::from_parts(features, labels, float_labels)
    }

    /// Create a regression dataset from a sample matrix and float targets.
    ///
    /// Integer labels are the targets rounded to the nearest integer.
    pub fn regression(features: Array2<f64>, targets: Vec<f64>) -> Result<Self> {
        let labels = targets.iter().map(|&t| t.round() as ClassLabel).collect();
        Dataset::from_parts(features, labels, targets)
    }

    /// Create a dataset carrying both label representations.
    pub fn from_parts(
        features: Array2<f64>,
        labels: Vec<ClassLabel>,
        float_labels: Vec<f64>,
    ) -> Result<Self> {
        if features.nrows() == 0 {
            return Err(GbtuneError::dataset("dataset has no rows"));
        }
        if features.ncols() == 0 {
            return Err(GbtuneError::dataset("dataset has no features"));
        }
        if labels.len() != features.nrows() {
            return Err(GbtuneError::dimension_mismatch(
                format!("{} labels", features.nrows()),
                format!("{} labels", labels.len()),
            ));
        }
        if float_labels.len() != features.nrows() {
            return Err(GbtuneError::dimension_mismatch(
                format!("{} float labels", features.nrows()),
                format!("{} float labels", float_labels.len()),
            ));
        }
        Ok(Dataset {
            features,
            labels,
            float_labels,
            feature_names: Vec::new(),
        })
    }

    /// Attach feature names (one per column).
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.num_features() {
            return Err(GbtuneError::dimension_mismatch(
                format!("{} feature names", self.num_features()),
                format!("{} feature names", names.len()),
            ));
        }
        self.feature_names = names;
        Ok(self)
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.features.nrows()
    }

    /// Number of feature columns.
    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }

    /// The sample matrix.
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// One sample row.
    pub fn row(&self, index: RowIndex) -> ArrayView1<'_, f64> {
        self.features.row(index)
    }

    /// Integer labels.
    pub fn labels(&self) -> &[ClassLabel] {
        &self.labels
    }

    /// Float labels (regression targets).
    pub fn float_labels(&self) -> &[f64] {
        &self.float_labels
    }

    /// Feature names, empty when none were attached.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Name of a feature, if names were attached.
    pub fn feature_name(&self, index: FeatureIndex) -> Option<&str> {
        self.feature_names.get(index).map(String::as_str)
    }

    /// Distinct labels in order of first appearance.
    pub fn class_labels(&self) -> Vec<ClassLabel> {
        let mut seen = Vec::new();
        for &label in &self.labels {
            if !seen.contains(&label) {
                seen.push(label);
            }
        }
        seen
    }

    /// One-hot target matrix with one column per distinct label, columns
    /// ordered by first appearance. Returns the matrix and the column labels.
    pub fn one_hot(&self) -> (Array2<f64>, Vec<ClassLabel>) {
        let classes = self.class_labels();
        let mut targets = Array2::zeros((self.num_rows(), classes.len()));
        for (row, label) in self.labels.iter().enumerate() {
            if let Some(col) = classes.iter().position(|c| c == label) {
                targets[[row, col]] = 1.0;
            }
        }
        (targets, classes)
    }

    /// Float labels as a single-column target matrix.
    pub fn regression_targets(&self) -> Array2<f64> {
        let n = self.num_rows();
        let mut targets = Array2::zeros((n, 1));
        for (row, &t) in self.float_labels.iter().enumerate() {
            targets[[row, 0]] = t;
        }
        targets
    }

    /// Target matrix and column labels for the given task.
    pub fn targets(&self, task: Task) -> (Array2<f64>, Vec<ClassLabel>) {
        match task {
            Task::Classification => self.one_hot(),
            Task::Regression => (self.regression_targets(), vec![0]),
        }
    }

    /// Copy of the rows at `indices`, in that order.
    pub fn subset(&self, indices: &[RowIndex]) -> Result<Dataset> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.num_rows()) {
            return Err(GbtuneError::dataset(format!(
                "row index {} out of bounds for {} rows",
                bad,
                self.num_rows()
            )));
        }
        if indices.is_empty() {
            return Err(GbtuneError::dataset("cannot build an empty subset"));
        }
        Ok(Dataset {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            float_labels: indices.iter().map(|&i| self.float_labels[i]).collect(),
            feature_names: self.feature_names.clone(),
        })
    }
}
