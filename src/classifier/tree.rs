//! Single decision tree
//!
//! A thin wrapper over `gbdt`'s regression tree. Trained with squared error on
//! 0/1 targets, each leaf stores the mean target of its samples, which is the
//! leaf's positive-class fraction. Minimising squared error on 0/1 targets
//! picks the same splits as minimising Gini impurity.

use std::fmt;

use gbdt::config::Loss;
use gbdt::decision_tree::{Data, DataVec, DecisionTree as GbdtTree, TrainingCache, ValueType};
use serde::{Deserialize, Serialize};

use crate::error::RiskError;
use crate::types::FeatureVector;

use super::{check_width, Classifier};

/// Depth used when no limit is configured; deeper than any tree the dataset can grow
const UNBOUNDED_DEPTH: u32 = 64;

/// Full feature cache while fitting
const CACHE_LEVEL: u8 = 2;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
}

/// Fitted decision tree
#[derive(Serialize, Deserialize)]
pub struct DecisionTree {
    n_features: usize,
    model: GbdtTree,
}

impl fmt::Debug for DecisionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionTree")
            .field("n_features", &self.n_features)
            .finish_non_exhaustive()
    }
}

impl DecisionTree {
    /// Grow a tree on the rows selected by `samples` (duplicates allowed, as in a bootstrap).
    ///
    /// # Errors
    /// Returns `Training` on empty or out-of-range samples and labels other
    /// than 0/1, and `DimensionMismatch` on ragged rows.
    pub fn fit(
        rows: &[FeatureVector],
        labels: &[u8],
        samples: &[usize],
        params: &TreeParams,
    ) -> Result<Self, RiskError> {
        let n_features = rows
            .first()
            .map(|r| r.len())
            .ok_or_else(|| RiskError::Training("cannot fit a tree on zero rows".to_string()))?;
        if rows.len() != labels.len() {
            return Err(RiskError::Training(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if let Some(row) = rows.iter().find(|r| r.len() != n_features) {
            return Err(RiskError::DimensionMismatch {
                expected: n_features,
                actual: row.len(),
            });
        }
        if labels.iter().any(|l| *l > 1) {
            return Err(RiskError::Training("labels must be 0 or 1".to_string()));
        }
        if samples.is_empty() {
            return Err(RiskError::Training("no samples selected".to_string()));
        }
        if let Some(bad) = samples.iter().find(|i| **i >= rows.len()) {
            return Err(RiskError::Training(format!(
                "sample index {bad} out of range for {} rows",
                rows.len()
            )));
        }

        let data: DataVec = samples
            .iter()
            .map(|i| {
                Data::new_training_data(
                    to_values(&rows[*i]),
                    1.0,
                    ValueType::from(labels[*i]),
                    None,
                )
            })
            .collect();

        let mut model = GbdtTree::new();
        model.set_feature_size(n_features);
        model.set_max_depth(
            params
                .max_depth
                .map_or(UNBOUNDED_DEPTH, |d| u32::try_from(d).unwrap_or(UNBOUNDED_DEPTH)),
        );
        model.set_min_leaf_size(params.min_samples_leaf.max(1));
        model.set_loss(Loss::SquaredError);

        let mut cache = TrainingCache::get_cache(n_features, &data, CACHE_LEVEL);
        model.fit(&data, &mut cache);

        Ok(Self { n_features, model })
    }
}

impl Classifier for DecisionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, RiskError> {
        check_width(self.n_features, features)?;
        let input: DataVec = vec![Data::new_training_data(to_values(features), 1.0, 0.0, None)];
        let leaf = self
            .model
            .predict(&input)
            .first()
            .copied()
            .ok_or_else(|| RiskError::Training("tree returned no prediction".to_string()))?;
        Ok(f64::from(leaf).clamp(0.0, 1.0))
    }

    fn name(&self) -> &str {
        "decision_tree"
    }
}

fn to_values(features: &FeatureVector) -> Vec<ValueType> {
    features.as_slice().iter().map(|v| *v as ValueType).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_leaf: 1,
        }
    }

    fn staircase() -> (Vec<FeatureVector>, Vec<u8>) {
        let rows = vec![
            FeatureVector::new(vec![0.0, 0.0]),
            FeatureVector::new(vec![0.0, 1.0]),
            FeatureVector::new(vec![1.0, 0.0]),
            FeatureVector::new(vec![1.0, 1.0]),
            FeatureVector::new(vec![2.0, 0.0]),
            FeatureVector::new(vec![2.0, 1.0]),
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        (rows, labels)
    }

    #[test]
    fn test_fits_training_data_exactly() {
        let (rows, labels) = staircase();
        let samples: Vec<usize> = (0..rows.len()).collect();
        let tree = DecisionTree::fit(&rows, &labels, &samples, &params()).unwrap();

        for (row, label) in rows.iter().zip(&labels) {
            let p = tree.predict_proba(row).unwrap();
            assert_eq!(p, f64::from(*label));
        }
    }

    #[test]
    fn test_pure_samples_predict_their_class() {
        let rows = vec![FeatureVector::new(vec![1.0]), FeatureVector::new(vec![2.0])];
        let tree = DecisionTree::fit(&rows, &[1, 1], &[0, 1], &params()).unwrap();
        assert_eq!(tree.predict_proba(&FeatureVector::new(vec![1.5])).unwrap(), 1.0);
    }

    #[test]
    fn test_rejects_bad_labels() {
        let rows = vec![FeatureVector::new(vec![1.0])];
        assert!(DecisionTree::fit(&rows, &[2], &[0], &params()).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_sample() {
        let rows = vec![FeatureVector::new(vec![1.0]), FeatureVector::new(vec![2.0])];
        match DecisionTree::fit(&rows, &[0, 1], &[0, 5], &params()) {
            Err(RiskError::Training(msg)) => assert!(msg.contains("5")),
            other => panic!("expected Training error, got {other:?}"),
        }
    }

    #[test]
    fn test_serde_preserves_predictions() {
        let (rows, labels) = staircase();
        let tree = DecisionTree::fit(&rows, &labels, &[0, 1, 2, 3, 4, 5], &params()).unwrap();
        let json = serde_json::to_string(&tree).unwrap();
        let loaded: DecisionTree = serde_json::from_str(&json).unwrap();
        for row in &rows {
            assert_eq!(
                tree.predict_proba(row).unwrap(),
                loaded.predict_proba(row).unwrap()
            );
        }
    }

    #[test]
    fn test_dimension_mismatch_on_predict() {
        let (rows, labels) = staircase();
        let tree = DecisionTree::fit(&rows, &labels, &[0, 3], &params()).unwrap();
        assert!(matches!(
            tree.predict_proba(&FeatureVector::new(vec![1.0])),
            Err(RiskError::DimensionMismatch { .. })
        ));
    }
}
