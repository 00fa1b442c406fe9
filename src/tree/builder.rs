//! Recursive exact-greedy tree construction.

use crate::core::error::{GbtuneError, Result};
use crate::core::types::{FeatureIndex, RowIndex};
use crate::tree::node::{Tree, TreeNode};
use crate::tree::split::{SampleStats, SplitCandidate, SplitFinder, TreeKind};
use ndarray::ArrayView2;

/// Grows one tree over a read-only sample matrix.
#[derive(Debug, Clone)]
pub struct TreeBuilder<'a> {
    features: ArrayView2<'a, f64>,
    finder: SplitFinder,
    max_depth: usize,
    allowed_features: Vec<FeatureIndex>,
}

impl<'a> TreeBuilder<'a> {
    /// Builder considering every feature of `features`.
    pub fn new(
        features: ArrayView2<'a, f64>,
        kind: TreeKind,
        max_depth: usize,
        min_child_weight: f64,
    ) -> Self {
        TreeBuilder {
            allowed_features: (0..features.ncols()).collect(),
            features,
            finder: SplitFinder::new(kind, min_child_weight),
            max_depth,
        }
    }

    /// Restrict splits to a column subsample.
    pub fn with_features(mut self, allowed: Vec<FeatureIndex>) -> Result<Self> {
        if let Some(&bad) = allowed.iter().find(|&&f| f >= self.features.ncols()) {
            return Err(GbtuneError::training(format!(
                "feature {} out of range for {} columns",
                bad,
                self.features.ncols()
            )));
        }
        self.allowed_features = allowed;
        Ok(self)
    }

    /// Grow a tree over the rows in `indices`.
    pub fn build(&self, indices: Vec<RowIndex>, stats: &SampleStats<'_>) -> Result<Tree> {
        if stats.len() != self.features.nrows() {
            return Err(GbtuneError::dimension_mismatch(
                format!("{} per-row statistics", self.features.nrows()),
                format!("{} per-row statistics", stats.len()),
            ));
        }
        let root = self.build_node(indices, self.max_depth, stats)?;
        Ok(Tree::new(root, self.finder.kind()))
    }

    fn build_node(
        &self,
        indices: Vec<RowIndex>,
        depth_budget: usize,
        stats: &SampleStats<'_>,
    ) -> Result<TreeNode> {
        let value = self.finder.leaf_value(&indices, stats)?;
        let initial = self.finder.kind().initial_score();
        if depth_budget == 0 {
            return Ok(TreeNode::leaf(indices, value, initial));
        }

        let best = match self.best_split(&indices, stats)? {
            Some(best) => best,
            None => return Ok(TreeNode::leaf(indices, value, initial)),
        };

        let column = self.features.column(best.feature);
        let (left, right): (Vec<RowIndex>, Vec<RowIndex>) = indices
            .iter()
            .partition(|&&row| column[row] < best.threshold);

        let left = self.build_node(left, depth_budget - 1, stats)?;
        let right = self.build_node(right, depth_budget - 1, stats)?;
        Ok(TreeNode::internal(
            indices,
            value,
            best.gain,
            best.feature,
            best.threshold,
            left,
            right,
        ))
    }

    /// Best split across the allowed features; earlier features win ties.
    fn best_split(
        &self,
        indices: &[RowIndex],
        stats: &SampleStats<'_>,
    ) -> Result<Option<SplitCandidate>> {
        let kind = self.finder.kind();
        let mut best: Option<SplitCandidate> = None;
        for &feature in &self.allowed_features {
            if let Some(candidate) = self
                .finder
                .best_split(self.features, feature, indices, stats)?
            {
                let better = match &best {
                    Some(current) => kind.improves(candidate.gain, current.gain),
                    None => true,
                };
                if better {
                    best = Some(candidate);
                }
            }
        }
        Ok(best)
    }
}
