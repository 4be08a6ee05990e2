//! Inference for gradient-boosted tree models saved with XGBoost's
//! `save_model("model.json")`.

use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    #[serde(default)]
    model: Option<GbTreeModel>,
}

#[derive(Debug, Deserialize)]
struct GbTreeModel {
    trees: Vec<TreeFile>,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    num_feature: String,
}

#[derive(Debug, Deserialize)]
struct TreeFile {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<u32>,
    split_conditions: Vec<f64>,
    default_left: Vec<Flag>,
}

/// Older releases store `default_left` as 0/1, newer ones as booleans
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    /// XGBoost keeps split thresholds in single precision
    threshold: f32,
    leaf: f64,
    default_left: bool,
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_file(tree: TreeFile, num_feature: usize) -> Result<Self> {
        let n = tree.left_children.len();
        if tree.right_children.len() != n
            || tree.split_indices.len() != n
            || tree.split_conditions.len() != n
            || tree.default_left.len() != n
        {
            return Err(PipelineError::InvalidArtifact(
                "tree arrays have different lengths".to_string(),
            ));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let node = Node {
                left: tree.left_children[i],
                right: tree.right_children[i],
                feature: tree.split_indices[i] as usize,
                threshold: tree.split_conditions[i] as f32,
                leaf: tree.split_conditions[i],
                default_left: tree.default_left[i].is_set(),
            };
            let is_leaf = node.left == -1;
            if !is_leaf {
                // children are always numbered after their parent
                let in_range = |child: i32| child > i as i32 && (child as usize) < n;
                if !in_range(node.left) || !in_range(node.right) || node.feature >= num_feature {
                    return Err(PipelineError::InvalidArtifact(format!(
                        "node {} has an invalid child or feature index",
                        i
                    )));
                }
            }
            nodes.push(node);
        }

        if nodes.is_empty() {
            return Err(PipelineError::InvalidArtifact("empty tree".to_string()));
        }
        Ok(Self { nodes })
    }

    fn leaf_value(&self, features: &[f64]) -> f64 {
        let mut node = &self.nodes[0];
        while node.left != -1 {
            let x = features[node.feature];
            let go_left = if x.is_nan() {
                node.default_left
            } else {
                (x as f32) < node.threshold
            };
            let next = if go_left { node.left } else { node.right };
            node = &self.nodes[next as usize];
        }
        node.leaf
    }
}

/// A regression ensemble: `base_score` plus the sum of every tree's leaf
#[derive(Debug, Clone)]
pub struct Booster {
    base_score: f64,
    num_feature: usize,
    feature_names: Vec<String>,
    trees: Vec<Tree>,
}

/// `"5E-1"` or, from XGBoost 3 on, `"[5E-1]"`
fn parse_base_score(text: &str) -> Result<f64> {
    text.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .parse()
        .map_err(|_| PipelineError::InvalidArtifact(format!("bad base_score {:?}", text)))
}

impl Booster {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(json)?;
        let learner = file.learner;

        if learner.gradient_booster.name != "gbtree" {
            return Err(PipelineError::InvalidArtifact(format!(
                "unsupported booster {}",
                learner.gradient_booster.name
            )));
        }
        let model = learner
            .gradient_booster
            .model
            .ok_or_else(|| PipelineError::InvalidArtifact("missing tree model".to_string()))?;

        let base_score = parse_base_score(&learner.learner_model_param.base_score)?;
        let num_feature: usize = learner
            .learner_model_param
            .num_feature
            .trim()
            .parse()
            .map_err(|_| PipelineError::InvalidArtifact("bad num_feature".to_string()))?;

        let trees = model
            .trees
            .into_iter()
            .map(|tree| Tree::from_file(tree, num_feature))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            base_score,
            num_feature,
            feature_names: learner.feature_names,
            trees,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn num_feature(&self) -> usize {
        self.num_feature
    }

    /// Column names the model was fit on, when it was fit on a dataframe
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.num_feature {
            return Err(PipelineError::SchemaMismatch {
                expected: vec![format!("{} features", self.num_feature)],
                found: vec![format!("{} features", features.len())],
            });
        }
        Ok(self.base_score + self.trees.iter().map(|t| t.leaf_value(features)).sum::<f64>())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Two stumps over `[home_ppg, away_ppg]`
    pub const MODEL_JSON: &str = r#"{
        "learner": {
            "attributes": {},
            "feature_names": ["home_ppg", "away_ppg"],
            "feature_types": ["float", "float"],
            "gradient_booster": {
                "model": {
                    "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "2"},
                    "tree_info": [0, 0],
                    "trees": [
                        {
                            "base_weights": [0.0, -4.0, 4.0],
                            "default_left": [1, 0, 0],
                            "id": 0,
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_conditions": [0.0, -4.0, 4.0],
                            "split_indices": [0, 0, 0],
                            "tree_param": {"num_feature": "2", "num_nodes": "3"}
                        },
                        {
                            "base_weights": [0.0, 1.5, -1.5],
                            "default_left": [false, false, false],
                            "id": 1,
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_conditions": [0.0, 1.5, -1.5],
                            "split_indices": [1, 0, 0],
                            "tree_param": {"num_feature": "2", "num_nodes": "3"}
                        }
                    ]
                },
                "name": "gbtree"
            },
            "learner_model_param": {"base_score": "5E-1", "num_class": "0", "num_feature": "2"},
            "objective": {"name": "reg:squarederror"}
        },
        "version": [2, 0, 3]
    }"#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::MODEL_JSON;
    use super::*;

    #[test]
    fn test_parse_base_score() {
        assert_eq!(parse_base_score("5E-1").unwrap(), 0.5);
        assert_eq!(parse_base_score("[6.5E0]").unwrap(), 6.5);
        assert!(parse_base_score("abc").is_err());
    }

    #[test]
    fn test_load_model() {
        let booster = Booster::from_json(MODEL_JSON).unwrap();
        assert_eq!(booster.num_feature(), 2);
        assert_eq!(booster.num_trees(), 2);
        assert_eq!(booster.feature_names(), ["home_ppg", "away_ppg"]);
    }

    #[test]
    fn test_tree_traversal() {
        let booster = Booster::from_json(MODEL_JSON).unwrap();
        // home above the split, away below: 0.5 + 4.0 + 1.5
        assert_eq!(booster.predict(&[1.0, -1.0]).unwrap(), 6.0);
        // home below, away above: 0.5 - 4.0 - 1.5
        assert_eq!(booster.predict(&[-1.0, 1.0]).unwrap(), -5.0);
        // equal to the threshold goes right
        assert_eq!(booster.predict(&[0.0, 0.0]).unwrap(), 0.5 + 4.0 - 1.5);
    }

    #[test]
    fn test_missing_values_follow_default_branch() {
        let booster = Booster::from_json(MODEL_JSON).unwrap();
        // tree 0 defaults left, tree 1 defaults right
        assert_eq!(booster.predict(&[f64::NAN, f64::NAN]).unwrap(), 0.5 - 4.0 - 1.5);
    }

    #[test]
    fn test_split_compares_in_single_precision() {
        let model = MODEL_JSON.replace(
            "\"split_conditions\": [0.0, -4.0, 4.0]",
            "\"split_conditions\": [1.00000001E-1, -4.0, 4.0]",
        );
        let booster = Booster::from_json(&model).unwrap();
        // 0.1 equals the threshold once both are f32, so it goes right
        assert_eq!(booster.predict(&[0.1, 1.0]).unwrap(), 0.5 + 4.0 - 1.5);
    }

    #[test]
    fn test_rejects_cyclic_tree() {
        let cyclic = MODEL_JSON.replacen(
            "\"left_children\": [1, -1, -1]",
            "\"left_children\": [1, 1, -1]",
            1,
        );
        assert!(matches!(
            Booster::from_json(&cyclic),
            Err(PipelineError::InvalidArtifact(_))
        ));

        let self_loop = MODEL_JSON.replacen(
            "\"right_children\": [2, -1, -1]",
            "\"right_children\": [0, -1, -1]",
            1,
        );
        assert!(matches!(
            Booster::from_json(&self_loop),
            Err(PipelineError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_wrong_feature_count() {
        let booster = Booster::from_json(MODEL_JSON).unwrap();
        assert!(matches!(
            booster.predict(&[1.0]),
            Err(PipelineError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_dart_and_broken_trees() {
        let dart = MODEL_JSON.replace("\"name\": \"gbtree\"", "\"name\": \"dart\"");
        assert!(matches!(
            Booster::from_json(&dart),
            Err(PipelineError::InvalidArtifact(_))
        ));

        let broken = MODEL_JSON.replace("\"split_indices\": [1, 0, 0]", "\"split_indices\": [7, 0, 0]");
        assert!(matches!(
            Booster::from_json(&broken),
            Err(PipelineError::InvalidArtifact(_))
        ));
    }
}
