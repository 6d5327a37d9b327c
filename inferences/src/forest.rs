//! Random forest inference over an exported JSON artifact.
//!
//! The artifact carries each tree as parallel node arrays, the same layout a
//! fitted scikit-learn estimator exposes through `tree_`:
//!
//! ```text
//! {
//!   "feature_names": ["Color_black", ...],
//!   "n_classes": 2,
//!   "trees": [{
//!     "feature":        [1, -2, -2],
//!     "threshold":      [0.5, -2.0, -2.0],
//!     "children_left":  [1, -1, -1],
//!     "children_right": [2, -1, -1],
//!     "value":          [[40.0, 40.0], [30.0, 10.0], [10.0, 30.0]]
//!   }]
//! }
//! ```
//!
//! A node whose `children_left` is negative is a leaf; `value` holds the
//! per-class sample counts (or fractions) that reached it. Only inference is
//! done here, training happens elsewhere.

use serde::Deserialize;

use crate::artifact::{ArtifactFormat, Classifier};
use crate::error::{PredictorError, PredictorResult};

#[derive(Debug, Deserialize)]
struct ForestArtifact {
    feature_names: Vec<String>,
    n_classes: usize,
    trees: Vec<TreeArtifact>,
}

#[derive(Debug, Deserialize)]
struct TreeArtifact {
    feature: Vec<i64>,
    threshold: Vec<f64>,
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Normalized class distribution.
    Leaf(Vec<f64>),
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn from_artifact(tree: TreeArtifact, n_features: usize, n_classes: usize) -> Result<Self, String> {
        let n = tree.feature.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if tree.threshold.len() != n
            || tree.children_left.len() != n
            || tree.children_right.len() != n
            || tree.value.len() != n
        {
            return Err("inconsistent node array lengths".into());
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let left = tree.children_left[i];
            let right = tree.children_right[i];
            if left < 0 {
                let counts = &tree.value[i];
                if counts.len() != n_classes {
                    return Err(format!(
                        "leaf {i} has {} class values, expected {n_classes}",
                        counts.len()
                    ));
                }
                if counts.iter().any(|c| !c.is_finite() || *c < 0.0) {
                    return Err(format!("leaf {i} has a negative or non-finite class value"));
                }
                let total: f64 = counts.iter().sum();
                if total <= 0.0 {
                    return Err(format!("leaf {i} has no samples"));
                }
                nodes.push(Node::Leaf(counts.iter().map(|c| c / total).collect()));
                continue;
            }

            let feature = usize::try_from(tree.feature[i])
                .ok()
                .filter(|f| *f < n_features)
                .ok_or_else(|| format!("node {i} splits on unknown feature {}", tree.feature[i]))?;
            // Children always come after their parent, which rules out cycles.
            let child = |c: i64| {
                usize::try_from(c)
                    .ok()
                    .filter(|c| *c > i && *c < n)
                    .ok_or_else(|| format!("node {i} has invalid child index {c}"))
            };
            nodes.push(Node::Split {
                feature,
                threshold: tree.threshold[i],
                left: child(left)?,
                right: child(right)?,
            });
        }
        Ok(Self { nodes })
    }

    /// Class distribution of the leaf `features` falls into.
    fn leaf_distribution(&self, features: &[f32]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf(dist) => return dist,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if f64::from(features[*feature]) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// Ensemble of [`DecisionTree`]s whose leaf distributions are averaged.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    feature_names: Vec<String>,
    n_classes: usize,
}

impl RandomForest {
    /// Parses and validates a JSON artifact.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the JSON is malformed, the forest is empty, the model
    /// is not binary, or any tree is structurally invalid.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let artifact: ForestArtifact =
            serde_json::from_str(raw).map_err(|e| format!("invalid forest JSON: {e}"))?;
        if artifact.trees.is_empty() {
            return Err("empty forest".into());
        }
        if artifact.n_classes != 2 {
            return Err(format!(
                "expected a binary classifier, artifact has {} classes",
                artifact.n_classes
            ));
        }
        if artifact.feature_names.is_empty() {
            return Err("artifact lists no feature names".into());
        }

        let n_features = artifact.feature_names.len();
        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                DecisionTree::from_artifact(t, n_features, artifact.n_classes)
                    .map_err(|e| format!("tree {i}: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            trees,
            feature_names: artifact.feature_names,
            n_classes: artifact.n_classes,
        })
    }

    /// Mean of the per-tree leaf distributions.
    pub fn class_probabilities(&self, features: &[f32]) -> PredictorResult<Vec<f64>> {
        if features.len() != self.feature_names.len() {
            return Err(PredictorError::Inference(format!(
                "expected {} features, got {}",
                self.feature_names.len(),
                features.len()
            )));
        }
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.leaf_distribution(features)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn total_nodes(&self) -> usize {
        self.trees.iter().map(DecisionTree::n_nodes).sum()
    }
}

impl Classifier for RandomForest {
    fn predict(&self, features: &[f32]) -> PredictorResult<bool> {
        let proba = self.class_probabilities(features)?;
        // argmax, first class wins ties
        Ok(proba[1] > proba[0])
    }

    fn predict_proba(&self, features: &[f32]) -> PredictorResult<f64> {
        Ok(self.class_probabilities(features)?[1])
    }

    fn predict_with_proba(&self, features: &[f32]) -> PredictorResult<(bool, f64)> {
        let proba = self.class_probabilities(features)?;
        Ok((proba[1] > proba[0], proba[1]))
    }

    fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_names)
    }

    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Json
    }
}
