//! Line-oriented text format for trained ensembles.
//!
//! ```text
//! {"LearningRate":0.3,"ClassLabels":[0,1],"ProbTransformName":"softmax","BaseScore":0.5,...}
//! ROUND 0
//! CLASS 0, label: 0
//! {"Id":1,"Nsamples":40,"SplitFeatureIndex":2,...,"Leftid":2,"Rightid":3,...}
//! {"Id":2,...}
//! {"Id":3,...}
//! CLASS 1, label: 1
//! ...
//! ```
//!
//! Nodes are written in pre-order, one JSON record per line. A child id of
//! 0 means "no child"; otherwise the child's subtree follows immediately.

use crate::activation::Activation;
use crate::boosting::{ClassTree, Ensemble};
use crate::core::error::{GbtuneError, Result};
use crate::core::types::{BoostingKind, ClassLabel};
use crate::tree::{SplitNode, Tree, TreeKind, TreeNode};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// First line of a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelMetadata {
    /// Shrinkage applied to tree outputs
    pub learning_rate: f64,
    /// Label of every output column
    pub class_labels: Vec<ClassLabel>,
    /// Activation name (`softmax` or `identity`)
    pub prob_transform_name: String,
    /// Initial raw score
    pub base_score: f64,
    /// Whether trees use the regularized convention
    #[serde(default)]
    pub regularized: bool,
    /// L2 leaf regularization the trees were grown with
    #[serde(default)]
    pub lambda: f64,
    /// Split penalty the trees were grown with
    #[serde(default)]
    pub gamma: f64,
}

/// One serialized tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeRecord {
    id: usize,
    nsamples: usize,
    split_feature_index: usize,
    /// `None` for leaves, whose score is the convention's initial value.
    best_score_so_far: Option<f64>,
    leaf: bool,
    threshold: f64,
    leftid: usize,
    rightid: usize,
    branches: usize,
    value: f64,
    #[serde(rename = "XGB")]
    xgb: bool,
}

impl ModelMetadata {
    fn from_ensemble(ensemble: &Ensemble) -> Self {
        let (lambda, gamma) = ensemble
            .trees()
            .find_map(|t| match t.kind() {
                TreeKind::Regularized { lambda, gamma } => Some((lambda, gamma)),
                TreeKind::Plain => None,
            })
            .unwrap_or((0.0, 0.0));
        ModelMetadata {
            learning_rate: ensemble.learning_rate(),
            class_labels: ensemble.class_labels().to_vec(),
            prob_transform_name: ensemble.activation().name().to_string(),
            base_score: ensemble.base_score(),
            regularized: ensemble.kind() == BoostingKind::Regularized,
            lambda,
            gamma,
        }
    }

    fn tree_kind(&self) -> TreeKind {
        if self.regularized {
            TreeKind::Regularized {
                lambda: self.lambda,
                gamma: self.gamma,
            }
        } else {
            TreeKind::Plain
        }
    }
}

fn write_node<W: Write>(writer: &mut W, node: &TreeNode, id: usize, xgb: bool) -> Result<()> {
    let (feature, threshold, leftid, rightid) = match node.split() {
        Some(split) => (
            split.feature,
            split.threshold,
            id + 1,
            id + 1 + split.left.branches(),
        ),
        None => (0, 0.0, 0, 0),
    };
    let record = NodeRecord {
        id,
        nsamples: node.num_samples(),
        split_feature_index: feature,
        best_score_so_far: if node.is_leaf() {
            None
        } else {
            Some(node.score())
        },
        leaf: node.is_leaf(),
        threshold,
        leftid,
        rightid,
        branches: node.branches(),
        value: node.value(),
        xgb,
    };
    serde_json::to_writer(&mut *writer, &record)?;
    writeln!(writer)?;
    if let Some(split) = node.split() {
        write_node(writer, &split.left, leftid, xgb)?;
        write_node(writer, &split.right, rightid, xgb)?;
    }
    Ok(())
}

/// Write `ensemble` in the text model format.
pub fn write_model<W: Write>(ensemble: &Ensemble, writer: &mut W) -> Result<()> {
    let metadata = ModelMetadata::from_ensemble(ensemble);
    serde_json::to_writer(&mut *writer, &metadata)?;
    writeln!(writer)?;

    for (round_index, round) in ensemble.rounds().iter().enumerate() {
        writeln!(writer, "ROUND {}", round_index)?;
        for ct in round {
            writeln!(
                writer,
                "CLASS {}, label: {}",
                ct.class,
                ensemble.class_labels()[ct.class]
            )?;
            write_node(writer, ct.tree.root(), 1, ct.tree.kind().is_regularized())?;
        }
    }
    Ok(())
}

struct Lines<R: BufRead> {
    reader: R,
    line_number: usize,
    peeked: Option<String>,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Lines {
            reader,
            line_number: 0,
            peeked: None,
        }
    }

    /// Next non-empty line, trimmed, or `None` at end of input.
    fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.peeked.take() {
            return Ok(Some(line));
        }
        loop {
            let mut buf = String::new();
            if self.reader.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let trimmed = buf.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> GbtuneError {
        GbtuneError::serialization(format!("line {}: {}", self.line_number, message))
    }
}

fn read_node<R: BufRead>(lines: &mut Lines<R>, expected_id: usize) -> Result<TreeNode> {
    let line = lines
        .next_line()?
        .ok_or_else(|| lines.error("unexpected end of file inside a tree"))?;
    let record: NodeRecord = serde_json::from_str(&line)
        .map_err(|e| lines.error(format!("bad node record: {}", e)))?;
    if record.id != expected_id {
        return Err(lines.error(format!(
            "expected node {}, found node {}",
            expected_id, record.id
        )));
    }

    let split = if record.leftid > 0 && record.rightid > 0 {
        let left = read_node(lines, record.leftid)?;
        let right = read_node(lines, record.rightid)?;
        Some(SplitNode {
            feature: record.split_feature_index,
            threshold: record.threshold,
            left: Box::new(left),
            right: Box::new(right),
        })
    } else if record.leftid > 0 || record.rightid > 0 {
        return Err(lines.error(format!("node {} has a single child", record.id)));
    } else {
        None
    };

    let score = record.best_score_so_far.unwrap_or(match record.xgb {
        true => 0.0,
        false => f64::INFINITY,
    });
    Ok(TreeNode::restored(record.nsamples, record.value, score, split))
}

fn parse_class_header(line: &str) -> Option<(usize, ClassLabel)> {
    let rest = line.strip_prefix("CLASS")?.trim();
    let (class, label) = rest.split_once(',')?;
    let label = label.trim().strip_prefix("label:")?.trim();
    Some((class.trim().parse().ok()?, label.parse().ok()?))
}

/// Read an ensemble written by [`write_model`].
pub fn read_model<R: BufRead>(reader: R) -> Result<Ensemble> {
    let mut lines = Lines::new(reader);
    let header = lines
        .next_line()?
        .ok_or_else(|| GbtuneError::serialization("empty model file"))?;
    let metadata: ModelMetadata = serde_json::from_str(&header)
        .map_err(|e| lines.error(format!("bad metadata: {}", e)))?;
    let activation = Activation::from_name(&metadata.prob_transform_name)?;
    let kind = metadata.tree_kind();

    let mut rounds: Vec<Vec<ClassTree>> = Vec::new();
    let mut current: Option<Vec<ClassTree>> = None;

    while let Some(line) = lines.next_line()? {
        if line.starts_with("ROUND") {
            if let Some(round) = current.take() {
                rounds.push(round);
            }
            current = Some(Vec::new());
        } else if line.starts_with("CLASS") {
            let (class, label) =
                parse_class_header(&line).ok_or_else(|| lines.error("bad CLASS line"))?;
            match metadata.class_labels.get(class) {
                Some(&expected) if expected == label => {}
                _ => {
                    return Err(lines.error(format!(
                        "class {} with label {} does not match the metadata",
                        class, label
                    )))
                }
            }
            let root = read_node(&mut lines, 1)?;
            let round = current
                .as_mut()
                .ok_or_else(|| lines.error("CLASS before any ROUND"))?;
            round.push(ClassTree {
                class,
                tree: Tree::new(root, kind),
            });
        } else {
            return Err(lines.error(format!("unexpected line '{}'", line)));
        }
    }
    if let Some(round) = current.take() {
        rounds.push(round);
    }

    let boosting = if metadata.regularized {
        BoostingKind::Regularized
    } else {
        BoostingKind::Plain
    };
    Ensemble::new(
        rounds,
        metadata.learning_rate,
        metadata.base_score,
        metadata.class_labels,
        activation,
        boosting,
    )
}

/// Write `ensemble` to `path`.
pub fn save_model<P: AsRef<Path>>(ensemble: &Ensemble, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_model(ensemble, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Read an ensemble from `path`.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Ensemble> {
    read_model(BufReader::new(File::open(path.as_ref())?))
}
