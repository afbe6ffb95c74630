//! Random forest of decision trees
//!
//! Each tree is grown on its own bootstrap sample of the training rows, drawn
//! from a per-tree seed derived from the forest seed. The forest's probability
//! is the mean of the trees' leaf probabilities.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RiskError;
use crate::types::FeatureVector;

use super::tree::{DecisionTree, TreeParams};
use super::{check_width, Classifier};

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// Unlimited when `None`
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    /// Sample rows with replacement for each tree
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_leaf: 1,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf.max(1),
        }
    }

    fn check(&self) -> Result<(), RiskError> {
        if self.n_trees == 0 {
            return Err(RiskError::Config("n_trees must be at least 1".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(RiskError::Config("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Fitted random forest
#[derive(Serialize, Deserialize)]
#[serde(try_from = "ForestParts")]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl fmt::Debug for RandomForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomForest")
            .field("n_features", &self.n_features)
            .field("n_trees", &self.trees.len())
            .finish()
    }
}

#[derive(Deserialize)]
struct ForestParts {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl TryFrom<ForestParts> for RandomForest {
    type Error = RiskError;

    fn try_from(parts: ForestParts) -> Result<Self, Self::Error> {
        if parts.trees.is_empty() {
            return Err(RiskError::SchemaMismatch("forest has no trees".to_string()));
        }
        if let Some(tree) = parts
            .trees
            .iter()
            .find(|t| t.n_features() != parts.n_features)
        {
            return Err(RiskError::DimensionMismatch {
                expected: parts.n_features,
                actual: tree.n_features(),
            });
        }
        Ok(Self {
            n_features: parts.n_features,
            trees: parts.trees,
        })
    }
}

impl RandomForest {
    /// Train a forest on scaled rows and 0/1 labels.
    ///
    /// The same rows, labels and config always produce the same forest.
    pub fn fit(
        rows: &[FeatureVector],
        labels: &[u8],
        config: &ForestConfig,
    ) -> Result<Self, RiskError> {
        config.check()?;
        let n_features = rows
            .first()
            .map(|r| r.len())
            .ok_or_else(|| RiskError::Training("cannot fit a forest on zero rows".to_string()))?;
        let params = config.tree_params();
        let n = rows.len();

        let mut master = ChaCha8Rng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_trees);

        for i in 0..config.n_trees {
            let mut rng = ChaCha8Rng::seed_from_u64(master.gen());
            let samples: Vec<usize> = if config.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            let tree = DecisionTree::fit(rows, labels, &samples, &params)?;
            debug!(tree = i, samples = samples.len(), "grew tree");
            trees.push(tree);
        }

        Ok(Self { n_features, trees })
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, RiskError> {
        check_width(self.n_features, features)?;
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.predict_proba(features)?;
        }
        Ok(total / self.trees.len() as f64)
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well separated clusters on the first feature; the others carry no signal
    fn separable() -> (Vec<FeatureVector>, Vec<u8>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let jitter = f64::from(i % 5) * 0.1;
            rows.push(FeatureVector::new(vec![-2.0 + jitter, 0.5, 0.3]));
            labels.push(0);
            rows.push(FeatureVector::new(vec![2.0 - jitter, 0.5, 0.3]));
            labels.push(1);
        }
        (rows, labels)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_trees: 15,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = ForestConfig::default();
        assert_eq!(config.n_trees, 100);
        assert_eq!(config.seed, 42);
        assert!(config.bootstrap);
        assert_eq!(config.max_depth, None);
        assert_eq!(config.tree_params().min_samples_leaf, 1);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (rows, labels) = separable();
        let a = RandomForest::fit(&rows, &labels, &small_config()).unwrap();
        let b = RandomForest::fit(&rows, &labels, &small_config()).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        for x in [-3.0, -0.05, 0.0, 0.05, 3.0] {
            let x = FeatureVector::new(vec![x, 0.5, 0.3]);
            assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
        }
    }

    #[test]
    fn test_separates_clusters() {
        let (rows, labels) = separable();
        let forest = RandomForest::fit(&rows, &labels, &small_config()).unwrap();

        let high = forest
            .predict(&FeatureVector::new(vec![2.5, 0.5, 0.3]))
            .unwrap();
        assert_eq!(high.label, 1);
        assert!(high.probability > 0.8);

        let low = forest
            .predict(&FeatureVector::new(vec![-2.5, 0.5, 0.3]))
            .unwrap();
        assert_eq!(low.label, 0);
        assert!(low.probability < 0.2);
    }

    #[test]
    fn test_label_follows_probability() {
        let (rows, labels) = separable();
        let forest = RandomForest::fit(&rows, &labels, &small_config()).unwrap();
        for x in [-3.0, -0.5, 0.0, 0.1, 0.5, 3.0] {
            let result = forest
                .predict(&FeatureVector::new(vec![x, 0.5, 0.3]))
                .unwrap();
            assert!((0.0..=1.0).contains(&result.probability));
            assert_eq!(result.label == 1, result.probability >= 0.5);
        }
    }

    #[test]
    fn test_rejects_wrong_width_and_bad_config() {
        let (rows, labels) = separable();
        let forest = RandomForest::fit(&rows, &labels, &small_config()).unwrap();
        assert!(matches!(
            forest.predict_proba(&FeatureVector::new(vec![1.0])),
            Err(RiskError::DimensionMismatch {
                expected: 3,
                actual: 1
            })
        ));

        let zero_trees = ForestConfig {
            n_trees: 0,
            ..ForestConfig::default()
        };
        assert!(matches!(
            RandomForest::fit(&rows, &labels, &zero_trees),
            Err(RiskError::Config(_))
        ));
    }

    #[test]
    fn test_serde_preserves_predictions() {
        let (rows, labels) = separable();
        let forest = RandomForest::fit(&rows, &labels, &small_config()).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let loaded: RandomForest = serde_json::from_str(&json).unwrap();

        let x = FeatureVector::new(vec![0.4, 0.1, 0.3]);
        assert_eq!(
            forest.predict_proba(&x).unwrap(),
            loaded.predict_proba(&x).unwrap()
        );
    }

    #[test]
    fn test_empty_forest_fails_to_deserialize() {
        assert!(serde_json::from_str::<RandomForest>(r#"{"n_features":3,"trees":[]}"#).is_err());
    }
}
