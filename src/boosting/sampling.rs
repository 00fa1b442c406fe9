//! Row and column subsampling for one boosting round.

use crate::core::types::{FeatureIndex, RowIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Draws the rows and columns a round's trees are grown on.
#[derive(Debug, Clone)]
pub struct Subsampler {
    rng: StdRng,
    row_fraction: f64,
    col_fraction: f64,
}

impl Subsampler {
    /// Create a sampler; `seed = None` seeds from entropy.
    pub fn new(row_fraction: f64, col_fraction: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Subsampler {
            rng,
            row_fraction,
            col_fraction,
        }
    }

    /// Rows for this round, sorted. A fraction of 1 returns every row
    /// without consuming randomness.
    pub fn sample_rows(&mut self, num_rows: usize) -> Vec<RowIndex> {
        self.sample(num_rows, self.row_fraction, 0)
    }

    /// Columns for this round, sorted. At least one column is kept.
    pub fn sample_features(&mut self, num_features: usize) -> Vec<FeatureIndex> {
        self.sample(num_features, self.col_fraction, 1)
    }

    fn sample(&mut self, total: usize, fraction: f64, min_keep: usize) -> Vec<usize> {
        if fraction >= 1.0 {
            return (0..total).collect();
        }
        let amount = ((total as f64 * fraction).round() as usize)
            .max(min_keep)
            .min(total);
        let mut drawn: Vec<usize> = (0..total).collect();
        drawn.shuffle(&mut self.rng);
        drawn.truncate(amount);
        drawn.sort_unstable();
        drawn
    }
}
