//! Decision tree construction for gbtune.
//!
//! - [`split`]: the two gain conventions and the exact-greedy split sweep
//! - [`node`]: parent-owned binary tree nodes, prediction and rendering
//! - [`builder`]: recursive construction under depth and weight limits

pub mod builder;
pub mod node;
pub mod split;

pub use builder::TreeBuilder;
pub use node::{SplitNode, Tree, TreeNode};
pub use split::{SampleStats, SplitCandidate, SplitFinder, TreeKind};
