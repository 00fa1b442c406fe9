//! Feature importance from accumulated split gains.

use crate::core::types::{BoostingKind, FeatureIndex};
use crate::tree::{Tree, TreeNode};
use std::fmt;

/// Per-feature accumulated gain over every internal node of an ensemble.
///
/// Regularized gains are sorted descending (bigger gains first); plain
/// variance-reduction scores ascending (more negative first), mirroring
/// the split conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    kind: BoostingKind,
    entries: Vec<(FeatureIndex, f64)>,
    names: Vec<String>,
}

impl FeatureImportance {
    /// Empty report for the given boosting flavour.
    pub fn new(kind: BoostingKind) -> Self {
        FeatureImportance {
            kind,
            entries: Vec::new(),
            names: Vec::new(),
        }
    }

    /// Collect gains from a set of trees.
    pub fn from_trees<'a, I>(kind: BoostingKind, trees: I) -> Self
    where
        I: IntoIterator<Item = &'a Tree>,
    {
        let mut report = FeatureImportance::new(kind);
        for tree in trees {
            tree.root().visit(&mut |node: &TreeNode| {
                if let Some(split) = node.split() {
                    report.add(split.feature, node.score());
                }
            });
        }
        report.sort();
        report
    }

    /// Add `gain` to `feature`.
    pub fn add(&mut self, feature: FeatureIndex, gain: f64) {
        match self.entries.iter_mut().find(|(f, _)| *f == feature) {
            Some((_, total)) => *total += gain,
            None => self.entries.push((feature, gain)),
        }
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: &FeatureImportance) {
        for &(feature, gain) in &other.entries {
            self.add(feature, gain);
        }
        self.sort();
    }

    /// Re-sort by this flavour's ordering.
    pub fn sort(&mut self) {
        match self.kind {
            BoostingKind::Regularized => self.entries.sort_by(|a, b| b.1.total_cmp(&a.1)),
            BoostingKind::Plain => self.entries.sort_by(|a, b| a.1.total_cmp(&b.1)),
        }
    }

    /// Attach feature names used by the text listing.
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    /// `(feature, gain)` pairs, most important first.
    pub fn entries(&self) -> &[(FeatureIndex, f64)] {
        &self.entries
    }

    /// The `n` most important features.
    pub fn top(&self, n: usize) -> Vec<FeatureIndex> {
        self.entries.iter().take(n).map(|&(f, _)| f).collect()
    }

    /// Number of features that were split on.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no feature was ever split on.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for FeatureImportance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = match self.kind {
            BoostingKind::Regularized => "descending",
            BoostingKind::Plain => "ascending",
        };
        write!(f, "Feature importance in {} order, for {}:", order, self.kind)?;
        for (rank, &(feature, gain)) in self.entries.iter().enumerate() {
            match self.names.get(feature) {
                Some(name) => write!(f, "\n{} {} with score: {:.3}", rank + 1, name, gain)?,
                None => write!(
                    f,
                    "\n{} Feature {} with score: {:.3}",
                    rank + 1,
                    feature,
                    gain
                )?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_and_sort_regularized() {
        let mut fi = FeatureImportance::new(BoostingKind::Regularized);
        fi.add(2, 1.0);
        fi.add(0, 3.0);
        fi.add(2, 4.0);
        fi.sort();
        assert_eq!(fi.entries(), &[(2, 5.0), (0, 3.0)]);
        assert_eq!(fi.top(1), vec![2]);
    }

    #[test]
    fn test_plain_sorts_ascending() {
        let mut fi = FeatureImportance::new(BoostingKind::Plain);
        fi.add(1, -0.5);
        fi.add(3, -2.0);
        fi.sort();
        assert_eq!(fi.top(2), vec![3, 1]);
    }

    #[test]
    fn test_merge() {
        let mut a = FeatureImportance::new(BoostingKind::Regularized);
        a.add(0, 1.0);
        let mut b = FeatureImportance::new(BoostingKind::Regularized);
        b.add(0, 1.0);
        b.add(1, 5.0);
        a.merge(&b);
        assert_eq!(a.entries(), &[(1, 5.0), (0, 2.0)]);
    }

    #[test]
    fn test_display_listing() {
        let mut fi = FeatureImportance::new(BoostingKind::Regularized);
        fi.add(0, 2.0);
        fi.add(1, 1.0);
        let text = fi.with_names(vec!["mass".into()]).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("descending"));
        assert_eq!(lines[1], "1 mass with score: 2.000");
        assert_eq!(lines[2], "2 Feature 1 with score: 1.000");
    }
}
