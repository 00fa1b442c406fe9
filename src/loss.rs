//! Loss functions for computing gradients.
//!
//! A loss turns a target column and the matching prediction column into
//! per-row gradients, negative gradients and hessians. Results are written
//! into a caller-supplied buffer when one of the right length is given,
//! otherwise a new one is allocated.

use crate::core::error::{GbtuneError, Result};
use crate::core::types::LossKind;
use ndarray::{Array1, ArrayView1, Zip};
use std::fmt;

/// Lower bound on hessians derived from probabilities.
const MIN_HESSIAN: f64 = 1e-16;

/// A loss function used by the ensemble trainer.
pub trait LossFunction: Send + Sync + fmt::Debug {
    /// Hessian of a single row given its target and prediction.
    fn hessian_at(&self, target: f64, prediction: f64) -> f64;

    /// Name of the loss function (for logging).
    fn name(&self) -> &'static str;

    /// `prediction - target` for every row.
    fn gradients(
        &self,
        targets: ArrayView1<'_, f64>,
        predictions: ArrayView1<'_, f64>,
        buffer: Option<Array1<f64>>,
    ) -> Result<Array1<f64>> {
        let mut out = prepare_buffer(&targets, &predictions, buffer)?;
        Zip::from(&mut out)
            .and(&targets)
            .and(&predictions)
            .for_each(|o, &t, &p| *o = p - t);
        Ok(out)
    }

    /// `target - prediction` for every row.
    fn neg_gradients(
        &self,
        targets: ArrayView1<'_, f64>,
        predictions: ArrayView1<'_, f64>,
        buffer: Option<Array1<f64>>,
    ) -> Result<Array1<f64>> {
        let mut out = prepare_buffer(&targets, &predictions, buffer)?;
        Zip::from(&mut out)
            .and(&targets)
            .and(&predictions)
            .for_each(|o, &t, &p| *o = t - p);
        Ok(out)
    }

    /// Hessian for every row.
    fn hessian(
        &self,
        targets: ArrayView1<'_, f64>,
        predictions: ArrayView1<'_, f64>,
        buffer: Option<Array1<f64>>,
    ) -> Result<Array1<f64>> {
        let mut out = prepare_buffer(&targets, &predictions, buffer)?;
        Zip::from(&mut out)
            .and(&targets)
            .and(&predictions)
            .for_each(|o, &t, &p| *o = self.hessian_at(t, p));
        Ok(out)
    }

    /// Mean squared difference between targets and predictions.
    fn loss(&self, targets: ArrayView1<'_, f64>, predictions: ArrayView1<'_, f64>) -> Result<f64> {
        check_lengths(&targets, &predictions)?;
        if targets.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = targets
            .iter()
            .zip(predictions.iter())
            .map(|(t, p)| (t - p) * (t - p))
            .sum();
        Ok(sum / targets.len() as f64)
    }
}

fn check_lengths(targets: &ArrayView1<'_, f64>, predictions: &ArrayView1<'_, f64>) -> Result<()> {
    if targets.len() != predictions.len() {
        return Err(GbtuneError::dimension_mismatch(
            format!("{} predictions", targets.len()),
            format!("{} predictions", predictions.len()),
        ));
    }
    Ok(())
}

fn prepare_buffer(
    targets: &ArrayView1<'_, f64>,
    predictions: &ArrayView1<'_, f64>,
    buffer: Option<Array1<f64>>,
) -> Result<Array1<f64>> {
    check_lengths(targets, predictions)?;
    Ok(match buffer {
        Some(b) if b.len() == targets.len() => b,
        _ => Array1::zeros(targets.len()),
    })
}

/// Squared error loss: `L = 0.5 * (pred - target)^2`, hessian 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredError;

impl LossFunction for SquaredError {
    #[inline]
    fn hessian_at(&self, _target: f64, _prediction: f64) -> f64 {
        1.0
    }

    fn name(&self) -> &'static str {
        "squared_error"
    }
}

/// Squared-error gradients with a probability-shaped hessian `(1 - p) * p`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calibrated;

impl Calibrated {
    /// Rows whose raw hessian `(1 - p) * p` falls under the clamp.
    fn clamped_rows(predictions: &ArrayView1<'_, f64>) -> usize {
        predictions
            .iter()
            .filter(|&&p| !((1.0 - p) * p >= MIN_HESSIAN))
            .count()
    }
}

impl LossFunction for Calibrated {
    #[inline]
    fn hessian_at(&self, _target: f64, prediction: f64) -> f64 {
        ((1.0 - prediction) * prediction).max(MIN_HESSIAN)
    }

    fn hessian(
        &self,
        targets: ArrayView1<'_, f64>,
        predictions: ArrayView1<'_, f64>,
        buffer: Option<Array1<f64>>,
    ) -> Result<Array1<f64>> {
        let mut out = prepare_buffer(&targets, &predictions, buffer)?;
        let clamped = Calibrated::clamped_rows(&predictions);
        if clamped > 0 {
            log::warn!(
                "{} of {} hessians clamped to {:e}; saturated probabilities inflate leaf values",
                clamped,
                predictions.len(),
                MIN_HESSIAN
            );
        }
        Zip::from(&mut out)
            .and(&targets)
            .and(&predictions)
            .for_each(|o, &t, &p| *o = self.hessian_at(t, p));
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "calibrated"
    }
}

/// Construct the loss selected by `kind`.
pub fn create_loss(kind: LossKind) -> Box<dyn LossFunction> {
    match kind {
        LossKind::SquaredError => Box::new(SquaredError),
        LossKind::Calibrated => Box::new(Calibrated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_squared_error_gradients() {
        let targets = array![1.0, 0.0, 0.5];
        let preds = array![0.5, 0.25, 0.5];
        let loss = SquaredError;

        let g = loss.gradients(targets.view(), preds.view(), None).unwrap();
        assert_eq!(g, array![-0.5, 0.25, 0.0]);

        let ng = loss.neg_gradients(targets.view(), preds.view(), None).unwrap();
        assert_eq!(ng, array![0.5, -0.25, 0.0]);

        let h = loss.hessian(targets.view(), preds.view(), None).unwrap();
        assert_eq!(h, array![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_calibrated_hessian() {
        let targets = array![1.0, 0.0];
        let preds = array![0.5, 0.2];
        let h = Calibrated
            .hessian(targets.view(), preds.view(), None)
            .unwrap();
        assert_abs_diff_eq!(h[0], 0.25);
        assert_abs_diff_eq!(h[1], 0.16, epsilon = 1e-12);
    }

    #[test]
    fn test_calibrated_hessian_clamps_saturated_rows() {
        let targets = array![1.0, 0.0, 1.0];
        let preds = array![1.0, 0.0, 0.5];
        assert_eq!(Calibrated::clamped_rows(&preds.view()), 2);
        let h = Calibrated.hessian(targets.view(), preds.view(), None).unwrap();
        assert_abs_diff_eq!(h[0], MIN_HESSIAN);
        assert_abs_diff_eq!(h[1], MIN_HESSIAN);
        assert_abs_diff_eq!(h[2], 0.25);
    }

    #[test]
    fn test_buffer_reuse() {
        let targets = array![1.0, 2.0];
        let preds = array![0.0, 0.0];
        let buffer = Array1::from_elem(2, 99.0);
        let out = SquaredError
            .neg_gradients(targets.view(), preds.view(), Some(buffer))
            .unwrap();
        assert_eq!(out, array![1.0, 2.0]);

        let wrong_size = Array1::zeros(5);
        let out = SquaredError
            .gradients(targets.view(), preds.view(), Some(wrong_size))
            .unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_scalar_loss() {
        let targets = array![1.0, 0.0];
        let preds = array![0.0, 0.0];
        assert_abs_diff_eq!(SquaredError.loss(targets.view(), preds.view()).unwrap(), 0.5);
    }

    #[test]
    fn test_length_mismatch() {
        let targets = array![1.0, 0.0];
        let preds = array![0.0];
        assert!(SquaredError
            .gradients(targets.view(), preds.view(), None)
            .is_err());
        assert!(SquaredError.loss(targets.view(), preds.view()).is_err());
    }

    #[test]
    fn test_create_loss() {
        assert_eq!(create_loss(LossKind::SquaredError).name(), "squared_error");
        assert_eq!(create_loss(LossKind::Calibrated).name(), "calibrated");
    }
}
