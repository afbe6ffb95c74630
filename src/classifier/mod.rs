//! Binary classifiers
//!
//! A bagged forest of `gbdt` decision trees, trained after standard scaling,
//! is the only model the pipeline serves. The `Classifier` trait is the contract the
//! predictor depends on: a positive-class probability and a thresholded label.

mod forest;
mod tree;

pub use forest::{ForestConfig, RandomForest};
pub use tree::{DecisionTree, TreeParams};

use crate::error::RiskError;
use crate::types::{FeatureVector, PredictionResult};

/// Trained binary classifier
pub trait Classifier: Send + Sync {
    /// Number of features the model was trained on
    fn n_features(&self) -> usize;

    /// Probability (0..1) of the positive class
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, RiskError>;

    /// Label and probability; the label is 1 when the probability is at least 0.5
    fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, RiskError> {
        Ok(PredictionResult::from_probability(
            self.predict_proba(features)?,
        ))
    }

    /// Human readable model name
    fn name(&self) -> &str {
        "classifier"
    }
}

fn check_width(expected: usize, features: &FeatureVector) -> Result<(), RiskError> {
    if features.len() != expected {
        return Err(RiskError::DimensionMismatch {
            expected,
            actual: features.len(),
        });
    }
    Ok(())
}
