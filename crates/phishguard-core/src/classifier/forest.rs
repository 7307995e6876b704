//! Random-forest classifier loaded from a JSON export.
//!
//! Each tree mirrors scikit-learn's `tree_` arrays (`children_left`,
//! `children_right`, `feature`, `threshold`, `value`), so an exporter only
//! has to dump them. Node `i` is a leaf when `children_left[i] == -1`; a
//! split sends the sample left when `x[feature] <= threshold`.
//!
//! The forest probability is the mean of the per-tree leaf distributions.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use super::{validate_contract, Prediction, UrlClassifier};
use crate::error::{Error, Result};
use crate::features::{FeatureRecord, FEATURE_COUNT};

/// Artifact format understood by this loader.
pub const FORMAT_VERSION: u32 = 1;

const N_CLASSES: usize = 2;
const LEAF: i64 = -1;

/// On-disk artifact.
#[derive(Debug, Deserialize)]
struct ForestArtifact {
    format_version: u32,
    feature_names: Vec<String>,
    n_classes: usize,
    trees: Vec<TreeArtifact>,
}

#[derive(Debug, Deserialize)]
struct TreeArtifact {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        proba: [f64; N_CLASSES],
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Compiles and validates one exported tree.
    fn compile(raw: TreeArtifact) -> std::result::Result<Self, String> {
        let n = raw.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if raw.children_right.len() != n
            || raw.feature.len() != n
            || raw.threshold.len() != n
            || raw.value.len() != n
        {
            return Err(format!("node arrays disagree in length (expected {})", n));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (raw.children_left[i], raw.children_right[i]);

            if left == LEAF {
                if right != LEAF {
                    return Err(format!("node {} has only a right child", i));
                }
                nodes.push(Node::Leaf {
                    proba: normalize(&raw.value[i]).ok_or_else(|| {
                        format!("node {} leaf value must be {} non-negative counts", i, N_CLASSES)
                    })?,
                });
                continue;
            }

            // Children must come after their parent, which also rules out cycles.
            let child = |c: i64| -> std::result::Result<usize, String> {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c > i && c < n)
                    .ok_or_else(|| format!("node {} has invalid child index {}", i, c))
            };
            let feature = usize::try_from(raw.feature[i])
                .ok()
                .filter(|&f| f < FEATURE_COUNT)
                .ok_or_else(|| format!("node {} splits on unknown feature {}", i, raw.feature[i]))?;
            let threshold = raw.threshold[i];
            if !threshold.is_finite() {
                return Err(format!("node {} has a non-finite threshold", i));
            }

            nodes.push(Node::Split {
                feature,
                threshold,
                left: child(left)?,
                right: child(right)?,
            });
        }

        Ok(Self { nodes })
    }

    fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> [f64; N_CLASSES] {
        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => i = if x[*feature] <= *threshold { *left } else { *right },
                Node::Leaf { proba } => return *proba,
            }
        }
    }
}

/// Normalizes class counts (or fractions) to probabilities.
fn normalize(value: &[f64]) -> Option<[f64; N_CLASSES]> {
    if value.len() != N_CLASSES || value.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return None;
    }
    let total: f64 = value.iter().sum();
    if total <= 0.0 {
        return None;
    }
    Some([value[0] / total, value[1] / total])
}

/// Metadata about a loaded model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Where the artifact came from.
    pub source: String,
    /// Artifact format version.
    pub format_version: u32,
    /// Number of trees in the ensemble.
    pub tree_count: usize,
    /// Total node count across trees.
    pub node_count: usize,
    /// SHA-256 of the artifact bytes, hex encoded.
    pub fingerprint: String,
    /// When the artifact was loaded.
    pub loaded_at: DateTime<Utc>,
}

/// Tree ensemble evaluated in-process.
///
/// Immutable once loaded; wrap in an `Arc` and share across requests.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<Tree>,
    feature_names: Vec<String>,
    info: ModelInfo,
}

impl RandomForest {
    /// Loads and validates an artifact from disk.
    ///
    /// Fails with [`Error::ModelLoadFailure`] if the file is missing or
    /// malformed, and with [`Error::ModelContractMismatch`] if it was trained
    /// on a different feature schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::load_failure(path, e.to_string()))?;
        Self::from_slice(&bytes, &path.display().to_string())
    }

    /// Parses and validates an artifact from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Self::from_slice(raw.as_bytes(), "<inline>")
    }

    fn from_slice(bytes: &[u8], source: &str) -> Result<Self> {
        let artifact: ForestArtifact =
            serde_json::from_slice(bytes).map_err(|e| Error::load_failure(source, e.to_string()))?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(Error::load_failure(
                source,
                format!(
                    "unsupported format version {} (expected {})",
                    artifact.format_version, FORMAT_VERSION
                ),
            ));
        }
        if artifact.n_classes != N_CLASSES {
            return Err(Error::load_failure(
                source,
                format!("expected a binary model, found {} classes", artifact.n_classes),
            ));
        }
        if artifact.trees.is_empty() {
            return Err(Error::load_failure(source, "model has no trees"));
        }

        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(t, raw)| {
                Tree::compile(raw)
                    .map_err(|reason| Error::load_failure(source, format!("tree {}: {}", t, reason)))
            })
            .collect::<Result<Vec<_>>>()?;

        let info = ModelInfo {
            source: source.to_string(),
            format_version: artifact.format_version,
            tree_count: trees.len(),
            node_count: trees.iter().map(|t| t.nodes.len()).sum(),
            fingerprint: format!("{:x}", Sha256::digest(bytes)),
            loaded_at: Utc::now(),
        };

        let forest = Self {
            trees,
            feature_names: artifact.feature_names,
            info,
        };
        validate_contract(&forest)?;

        info!(
            source = %forest.info.source,
            trees = forest.info.tree_count,
            nodes = forest.info.node_count,
            fingerprint = %forest.info.fingerprint,
            "Loaded random forest model"
        );

        Ok(forest)
    }

    /// Returns metadata about the loaded artifact.
    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Returns `[p(safe), p(malicious)]` for a feature record.
    pub fn predict_proba(&self, features: &FeatureRecord) -> [f64; N_CLASSES] {
        let x = features.to_vector();
        let mut sum = [0.0; N_CLASSES];
        for tree in &self.trees {
            let p = tree.predict_proba(&x);
            sum[0] += p[0];
            sum[1] += p[1];
        }
        let n = self.trees.len() as f64;
        [sum[0] / n, sum[1] / n]
    }
}

impl UrlClassifier for RandomForest {
    fn predict(&self, features: &FeatureRecord) -> Prediction {
        Prediction::from_probabilities(self.predict_proba(features))
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn name(&self) -> &'static str {
        "random_forest"
    }
}
