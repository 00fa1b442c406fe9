//! Binary regression tree with parent-owned children.

use crate::core::error::{GbtuneError, Result};
use crate::core::types::{FeatureIndex, RowIndex};
use crate::tree::split::TreeKind;
use ndarray::ArrayView1;
use std::fmt;

/// Split stored in an internal node. Children are exclusively owned.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitNode {
    /// Feature compared at this node
    pub feature: FeatureIndex,
    /// Rows with `x[feature] < threshold` go left
    pub threshold: f64,
    /// Left subtree
    pub left: Box<TreeNode>,
    /// Right subtree
    pub right: Box<TreeNode>,
}

/// One tree node. A node is a leaf iff it carries no split.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    samples: Vec<RowIndex>,
    num_samples: usize,
    value: f64,
    score: f64,
    branches: usize,
    split: Option<SplitNode>,
}

impl TreeNode {
    /// Leaf over `samples` predicting `value`. `score` is the node's
    /// unimproved initial gain.
    pub fn leaf(samples: Vec<RowIndex>, value: f64, score: f64) -> Self {
        TreeNode {
            num_samples: samples.len(),
            samples,
            value,
            score,
            branches: 1,
            split: None,
        }
    }

    /// Internal node splitting `samples` on `feature < threshold`.
    pub fn internal(
        samples: Vec<RowIndex>,
        value: f64,
        gain: f64,
        feature: FeatureIndex,
        threshold: f64,
        left: TreeNode,
        right: TreeNode,
    ) -> Self {
        TreeNode {
            num_samples: samples.len(),
            samples,
            value,
            score: gain,
            branches: 1 + left.branches + right.branches,
            split: Some(SplitNode {
                feature,
                threshold,
                left: Box::new(left),
                right: Box::new(right),
            }),
        }
    }

    /// Node restored from a model file; training samples are not kept.
    pub(crate) fn restored(
        num_samples: usize,
        value: f64,
        score: f64,
        split: Option<SplitNode>,
    ) -> Self {
        let branches = match &split {
            Some(s) => 1 + s.left.branches + s.right.branches,
            None => 1,
        };
        TreeNode {
            samples: Vec::new(),
            num_samples,
            value,
            score,
            branches,
            split,
        }
    }

    /// Whether the node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    /// Training rows that reached this node (empty for loaded trees).
    pub fn samples(&self) -> &[RowIndex] {
        &self.samples
    }

    /// Number of training rows that reached this node.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Node prediction value (before learning-rate shrinkage).
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Best gain found at this node ("best score so far").
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Number of nodes in this subtree.
    pub fn branches(&self) -> usize {
        self.branches
    }

    /// The split, if this is an internal node.
    pub fn split(&self) -> Option<&SplitNode> {
        self.split.as_ref()
    }

    /// Value of the leaf reached by `row`.
    pub fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = self;
        while let Some(split) = &node.split {
            node = if row[split.feature] < split.threshold {
                &split.left
            } else {
                &split.right
            };
        }
        node.value
    }

    /// Depth of the subtree (a leaf has depth 0).
    pub fn depth(&self) -> usize {
        match &self.split {
            Some(s) => 1 + s.left.depth().max(s.right.depth()),
            None => 0,
        }
    }

    /// Number of leaves in the subtree.
    pub fn num_leaves(&self) -> usize {
        match &self.split {
            Some(s) => s.left.num_leaves() + s.right.num_leaves(),
            None => 1,
        }
    }

    /// Replace every leaf value with `Σnumerator / Σdenominator` over the
    /// leaf's training rows.
    pub(crate) fn refine_leaves(
        &mut self,
        numerator: ArrayView1<'_, f64>,
        denominator: ArrayView1<'_, f64>,
    ) -> Result<()> {
        match &mut self.split {
            Some(split) => {
                split.left.refine_leaves(numerator, denominator)?;
                split.right.refine_leaves(numerator, denominator)
            }
            None => {
                if self.samples.is_empty() {
                    return Err(GbtuneError::numerical(
                        "leaf has no samples to recompute its value from",
                    ));
                }
                let (num, den) = self
                    .samples
                    .iter()
                    .fold((0.0, 0.0), |(n, d), &r| (n + numerator[r], d + denominator[r]));
                if den == 0.0 || !den.is_finite() {
                    return Err(GbtuneError::numerical(format!(
                        "leaf hessian sum is {} over {} samples",
                        den,
                        self.samples.len()
                    )));
                }
                self.value = num / den;
                Ok(())
            }
        }
    }

    /// Visit every node in pre-order.
    pub fn visit<F: FnMut(&TreeNode)>(&self, f: &mut F) {
        f(self);
        if let Some(split) = &self.split {
            split.left.visit(f);
            split.right.visit(f);
        }
    }

    fn render_into<W: fmt::Write>(
        &self,
        out: &mut W,
        depth: usize,
        names: Option<&[String]>,
    ) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match &self.split {
            Some(split) => {
                let name = names
                    .and_then(|n| n.get(split.feature))
                    .cloned()
                    .unwrap_or_else(|| format!("f{}", split.feature));
                writeln!(
                    out,
                    "{}[{} < {:.4}] gain={:.4} n={}",
                    indent, name, split.threshold, self.score, self.num_samples
                )?;
                split.left.render_into(out, depth + 1, names)?;
                split.right.render_into(out, depth + 1, names)
            }
            None => writeln!(
                out,
                "{}leaf value={:.4} n={}",
                indent, self.value, self.num_samples
            ),
        }
    }
}

/// A grown tree plus the convention it was grown under.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    root: TreeNode,
    kind: TreeKind,
}

impl Tree {
    /// Wrap a root node.
    pub fn new(root: TreeNode, kind: TreeKind) -> Self {
        Tree { root, kind }
    }

    /// Root node.
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Gain convention.
    pub fn kind(&self) -> TreeKind {
        self.kind
    }

    /// Prediction for one row.
    pub fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.root.predict(row)
    }

    /// Total number of nodes.
    pub fn branches(&self) -> usize {
        self.root.branches()
    }

    /// Recompute leaf values as `Σnumerator / Σdenominator` over each
    /// leaf's training rows. Fails on leaves without samples (as in trees
    /// read back from a model file) or with a zero denominator.
    pub fn refine_leaves(
        &mut self,
        numerator: ArrayView1<'_, f64>,
        denominator: ArrayView1<'_, f64>,
    ) -> Result<()> {
        self.root.refine_leaves(numerator, denominator)
    }

    /// Human-readable indented dump, optionally naming features.
    pub fn render(&self, feature_names: Option<&[String]>) -> String {
        RenderedTree {
            tree: self,
            names: feature_names,
        }
        .to_string()
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.render_into(f, 0, None)
    }
}

struct RenderedTree<'a> {
    tree: &'a Tree,
    names: Option<&'a [String]>,
}

impl fmt::Display for RenderedTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.root.render_into(f, 0, self.names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn stump() -> Tree {
        let left = TreeNode::leaf(vec![0, 1], 0.0, f64::INFINITY);
        let right = TreeNode::leaf(vec![2, 3], 1.0, f64::INFINITY);
        Tree::new(
            TreeNode::internal(vec![0, 1, 2, 3], 0.5, -1.0, 0, 1.5, left, right),
            TreeKind::Plain,
        )
    }

    #[test]
    fn test_branches_and_shape() {
        let tree = stump();
        assert_eq!(tree.branches(), 3);
        assert_eq!(tree.root().num_leaves(), 2);
        assert_eq!(tree.root().depth(), 1);
        assert!(!tree.root().is_leaf());
    }

    #[test]
    fn test_predict() {
        let tree = stump();
        assert_eq!(tree.predict(array![0.7].view()), 0.0);
        assert_eq!(tree.predict(array![1.5].view()), 1.0);
        assert_eq!(tree.predict(array![9.0].view()), 1.0);
    }

    #[test]
    fn test_refine_leaves() {
        let mut tree = stump();
        let num = array![1.0, 3.0, 2.0, 2.0];
        let den = array![1.0, 1.0, 2.0, 2.0];
        tree.refine_leaves(num.view(), den.view()).unwrap();
        assert_eq!(tree.predict(array![0.0].view()), 2.0);
        assert_eq!(tree.predict(array![3.0].view()), 1.0);
    }

    #[test]
    fn test_refine_without_samples_fails() {
        let mut tree = Tree::new(TreeNode::restored(4, 1.0, 0.0, None), TreeKind::Plain);
        let v = array![1.0];
        let err = tree.refine_leaves(v.view(), v.view()).unwrap_err();
        assert!(matches!(err, GbtuneError::Numerical { .. }));
    }

    #[test]
    fn test_refine_zero_hessian_fails() {
        let mut tree = stump();
        let num = array![1.0, 1.0, 1.0, 1.0];
        let den = array![0.0, 0.0, 1.0, 1.0];
        assert!(tree.refine_leaves(num.view(), den.view()).is_err());
    }

    #[test]
    fn test_render_uses_names() {
        let names = vec!["age".to_string()];
        let text = stump().render(Some(&names));
        assert!(text.starts_with("[age < 1.5000]"));
        assert_eq!(text.lines().count(), 3);
        assert!(stump().render(None).contains("f0"));
        assert_eq!(stump().to_string(), stump().render(None));
        assert_eq!(stump().to_string().lines().count(), 3);
    }
}
