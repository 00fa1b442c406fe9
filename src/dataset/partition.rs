//! K-fold partitioning for cross-validation.
//!
//! A [`FoldPlan`] assigns rows to `k` test folds; [`CrossValidationSplits`]
//! walks the plan and yields one `(train, test)` pair per fold, then `None`.

use crate::config::FoldAssignment;
use crate::core::constants::{MIN_FOLDS, MIN_SAMPLES_PER_FOLD};
use crate::core::error::{GbtuneError, Result};
use crate::core::types::RowIndex;
use crate::dataset::Dataset;
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};

/// Largest fold count `<= requested` that leaves every fold at least
/// [`MIN_SAMPLES_PER_FOLD`] rows.
///
/// Logs a warning when the count had to be lowered and fails when even
/// [`MIN_FOLDS`] folds are infeasible.
pub fn effective_fold_count(num_rows: usize, requested: usize) -> Result<usize> {
    if requested < MIN_FOLDS {
        return Err(GbtuneError::invalid_parameter(
            "folds",
            requested.to_string(),
            format!("must be at least {}", MIN_FOLDS),
        ));
    }
    let mut folds = requested;
    while folds >= MIN_FOLDS && num_rows / folds < MIN_SAMPLES_PER_FOLD {
        folds -= 1;
    }
    if folds < MIN_FOLDS {
        return Err(GbtuneError::insufficient_data(
            MIN_FOLDS * MIN_SAMPLES_PER_FOLD,
            num_rows,
        ));
    }
    if folds != requested {
        log::warn!(
            "{} rows cannot fill {} folds of at least {} samples; using {} folds",
            num_rows,
            requested,
            MIN_SAMPLES_PER_FOLD,
            folds
        );
    }
    Ok(folds)
}

/// Row membership of every test fold.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldPlan {
    num_rows: usize,
    folds: Vec<Vec<RowIndex>>,
}

impl FoldPlan {
    /// Draw a plan of (at most) `requested` folds over `num_rows` rows.
    ///
    /// Each fold gets `num_rows / k` rows drawn without replacement; the
    /// division remainder goes to the last fold.
    pub fn new<R: Rng + ?Sized>(
        num_rows: usize,
        requested: usize,
        assignment: FoldAssignment,
        rng: &mut R,
    ) -> Result<Self> {
        let k = effective_fold_count(num_rows, requested)?;
        let size = num_rows / k;
        let extra = num_rows % k;

        let folds = match assignment {
            FoldAssignment::Exclusive => {
                let mut rows: Vec<RowIndex> = (0..num_rows).collect();
                rows.shuffle(rng);
                (0..k)
                    .map(|i| {
                        let start = i * size;
                        let end = if i == k - 1 { num_rows } else { start + size };
                        rows[start..end].to_vec()
                    })
                    .collect()
            }
            FoldAssignment::Overlapping => (0..k)
                .map(|i| {
                    let amount = if i == k - 1 { size + extra } else { size };
                    index::sample(rng, num_rows, amount).into_vec()
                })
                .collect(),
        };

        Ok(FoldPlan { num_rows, folds })
    }

    /// Number of folds.
    pub fn num_folds(&self) -> usize {
        self.folds.len()
    }

    /// Rows of every test fold.
    pub fn folds(&self) -> &[Vec<RowIndex>] {
        &self.folds
    }

    /// `(train, test)` row indices for fold `k`. Training rows are every
    /// row outside the test fold, in ascending order.
    pub fn train_test(&self, k: usize) -> Option<(Vec<RowIndex>, Vec<RowIndex>)> {
        let test = self.folds.get(k)?.clone();
        let mut in_test = vec![false; self.num_rows];
        for &row in &test {
            in_test[row] = true;
        }
        let train = (0..self.num_rows).filter(|&r| !in_test[r]).collect();
        Some((train, test))
    }
}

/// Iterator over the `(train, test)` datasets of a fold plan.
#[derive(Debug)]
pub struct CrossValidationSplits<'a> {
    dataset: &'a Dataset,
    plan: FoldPlan,
    next: usize,
}

impl<'a> CrossValidationSplits<'a> {
    /// Walk `plan` over `dataset`.
    pub fn new(dataset: &'a Dataset, plan: FoldPlan) -> Self {
        CrossValidationSplits {
            dataset,
            plan,
            next: 0,
        }
    }

    /// The underlying plan.
    pub fn plan(&self) -> &FoldPlan {
        &self.plan
    }
}

impl Iterator for CrossValidationSplits<'_> {
    type Item = Result<(Dataset, Dataset)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (train, test) = self.plan.train_test(self.next)?;
        self.next += 1;
        Some(
            self.dataset
                .subset(&train)
                .and_then(|tr| Ok((tr, self.dataset.subset(&test)?))),
        )
    }
}

impl Dataset {
    /// K-fold `(train, test)` splits of this dataset.
    ///
    /// The fold count is lowered (with a warning) until every fold holds at
    /// least two rows; fewer than two folds is an error.
    pub fn k_fold(
        &self,
        folds: usize,
        assignment: FoldAssignment,
        seed: Option<u64>,
    ) -> Result<CrossValidationSplits<'_>> {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let plan = FoldPlan::new(self.num_rows(), folds, assignment, &mut rng)?;
        Ok(CrossValidationSplits::new(self, plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use proptest::prelude::*;

    fn rows(n: usize) -> Dataset {
        let features = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        Dataset::new(features, (0..n).map(|i| (i % 2) as i32).collect()).unwrap()
    }

    #[test]
    fn test_fold_count_degrades() {
        assert_eq!(effective_fold_count(4, 5).unwrap(), 2);
        assert_eq!(effective_fold_count(100, 5).unwrap(), 5);
        assert_eq!(effective_fold_count(9, 5).unwrap(), 4);
    }

    #[test]
    fn test_fold_count_infeasible() {
        let err = effective_fold_count(3, 5).unwrap_err();
        assert!(matches!(err, GbtuneError::InsufficientData { .. }));
        assert!(effective_fold_count(10, 1).is_err());
    }

    #[test]
    fn test_exclusive_leftovers_go_to_last_fold() {
        let mut rng = StdRng::seed_from_u64(1);
        let plan = FoldPlan::new(11, 3, FoldAssignment::Exclusive, &mut rng).unwrap();
        let sizes: Vec<usize> = plan.folds().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 5]);
    }

    #[test]
    fn test_overlapping_folds_have_unique_rows() {
        let mut rng = StdRng::seed_from_u64(2);
        let plan = FoldPlan::new(20, 4, FoldAssignment::Overlapping, &mut rng).unwrap();
        for fold in plan.folds() {
            let mut sorted = fold.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), fold.len());
        }
        assert_eq!(plan.folds()[3].len(), 5);
    }

    #[test]
    fn test_splits_yield_k_pairs_then_none() {
        let ds = rows(10);
        let mut splits = ds.k_fold(5, FoldAssignment::Exclusive, Some(3)).unwrap();
        let mut count = 0;
        for split in splits.by_ref() {
            let (train, test) = split.unwrap();
            assert_eq!(train.num_rows() + test.num_rows(), 10);
            count += 1;
        }
        assert_eq!(count, 5);
        assert!(splits.next().is_none());
    }

    #[test]
    fn test_small_dataset_uses_two_folds() {
        let ds = rows(4);
        let splits = ds.k_fold(5, FoldAssignment::Exclusive, Some(0)).unwrap();
        assert_eq!(splits.plan().num_folds(), 2);
        assert_eq!(splits.count(), 2);
    }

    proptest! {
        #[test]
        fn prop_exclusive_folds_partition_rows(n in 4usize..200, k in 2usize..8, seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = FoldPlan::new(n, k, FoldAssignment::Exclusive, &mut rng).unwrap();
            let mut all: Vec<RowIndex> = plan.folds().iter().flatten().copied().collect();
            all.sort_unstable();
            prop_assert_eq!(all, (0..n).collect::<Vec<_>>());
            for fold in plan.folds() {
                prop_assert!(fold.len() >= MIN_SAMPLES_PER_FOLD);
            }
        }
    }
}
