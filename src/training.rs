//! Offline training
//!
//! Fits encoder layout, scaler and random forest from a labeled dataset and
//! returns artifacts ready to be saved. Training runs once, by hand; serving
//! never refits anything.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::artifact::{ModelArtifacts, ModelMetadata};
use crate::classifier::{Classifier, ForestConfig, RandomForest};
use crate::dataset::LabeledDataset;
use crate::encoding::{DirectEncoder, FeatureEncoder, IndicatorEncoder};
use crate::error::RiskError;
use crate::scaler::StandardScaler;
use crate::schema::EncodingPolicy;
use crate::types::FeatureVector;

/// Training parameters
///
/// Defaults reproduce the reference training run: 20% holdout split with
/// seed 42 and a 100-tree forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub policy: EncodingPolicy,
    /// Share of rows held out for evaluation
    pub test_fraction: f64,
    /// Seed of the train/test shuffle
    pub split_seed: u64,
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            policy: EncodingPolicy::Direct,
            test_fraction: 0.2,
            split_seed: 42,
            forest: ForestConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Read a config from a JSON file; absent keys keep their defaults
    pub fn load(path: &Path) -> Result<Self, RiskError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, RiskError> {
        serde_json::from_str(json).map_err(|e| RiskError::Config(e.to_string()))
    }
}

/// Result of a training run
#[derive(Debug)]
pub struct TrainingOutcome {
    pub artifacts: ModelArtifacts,
    pub train_size: usize,
    pub test_size: usize,
    /// Holdout rows that could not be encoded (unseen categories)
    pub test_skipped: usize,
    /// Share of evaluated holdout rows predicted correctly
    pub test_accuracy: Option<f64>,
}

/// Split, encode, scale and fit.
///
/// The scaler is fitted on the training partition only; the holdout
/// partition is transformed with the training statistics.
pub fn train(dataset: &LabeledDataset, config: &TrainingConfig) -> Result<TrainingOutcome, RiskError> {
    let (train_set, test_set) = dataset.split(config.test_fraction, config.split_seed)?;

    let encoder: Box<dyn FeatureEncoder> = match config.policy {
        EncodingPolicy::Direct => Box::new(DirectEncoder::new()),
        EncodingPolicy::Indicator => Box::new(IndicatorEncoder::from_categories(&train_set.categories())?),
    };

    let train_rows = train_set
        .records()
        .iter()
        .map(|record| encoder.encode(record))
        .collect::<Result<Vec<_>, _>>()?;

    let scaler = StandardScaler::fit(&train_rows)?;
    let scaled = scaler.transform_all(&train_rows)?;
    let forest = RandomForest::fit(&scaled, train_set.labels(), &config.forest)?;

    let evaluation = evaluate(encoder.as_ref(), &scaler, &forest, &test_set)?;
    if evaluation.skipped > 0 {
        warn!(
            skipped = evaluation.skipped,
            "holdout rows with categories unseen in training were not evaluated"
        );
    }

    info!(
        policy = %config.policy,
        features = encoder.width(),
        trees = forest.n_trees(),
        train = train_set.len(),
        test = test_set.len(),
        accuracy = ?evaluation.accuracy,
        "training complete"
    );

    Ok(TrainingOutcome {
        artifacts: ModelArtifacts {
            metadata: ModelMetadata::new(config.policy),
            columns: encoder.columns().to_vec(),
            scaler,
            classifier: forest,
        },
        train_size: train_set.len(),
        test_size: test_set.len(),
        test_skipped: evaluation.skipped,
        test_accuracy: evaluation.accuracy,
    })
}

struct Evaluation {
    skipped: usize,
    accuracy: Option<f64>,
}

fn evaluate(
    encoder: &dyn FeatureEncoder,
    scaler: &StandardScaler,
    forest: &RandomForest,
    test_set: &LabeledDataset,
) -> Result<Evaluation, RiskError> {
    let mut correct = 0usize;
    let mut evaluated = 0usize;
    let mut skipped = 0usize;

    for (record, label) in test_set.records().iter().zip(test_set.labels()) {
        let encoded: FeatureVector = match encoder.encode(record) {
            Ok(v) => v,
            Err(RiskError::SchemaMismatch(_)) => {
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        let prediction = forest.predict(&scaler.transform(&encoded)?)?;
        evaluated += 1;
        if prediction.label == *label {
            correct += 1;
        }
    }

    let accuracy = (evaluated > 0).then(|| correct as f64 / evaluated as f64);
    Ok(Evaluation { skipped, accuracy })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SAMPLE_CSV;
    use crate::schema::FIELD_COUNT;

    fn dataset() -> LabeledDataset {
        LabeledDataset::from_reader(SAMPLE_CSV.as_bytes()).unwrap()
    }

    fn quick_config(policy: EncodingPolicy) -> TrainingConfig {
        TrainingConfig {
            policy,
            forest: ForestConfig {
                n_trees: 20,
                ..ForestConfig::default()
            },
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_train_direct() {
        let outcome = train(&dataset(), &quick_config(EncodingPolicy::Direct)).unwrap();
        assert_eq!(outcome.train_size, 32);
        assert_eq!(outcome.test_size, 8);
        assert_eq!(outcome.test_skipped, 0);
        assert_eq!(outcome.artifacts.columns.len(), FIELD_COUNT);
        assert_eq!(outcome.artifacts.scaler.n_features(), FIELD_COUNT);
        assert_eq!(outcome.artifacts.classifier.n_trees(), 20);

        let accuracy = outcome.test_accuracy.unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
    }

    #[test]
    fn test_train_indicator_uses_observed_categories() {
        let outcome = train(&dataset(), &quick_config(EncodingPolicy::Indicator)).unwrap();
        let columns = &outcome.artifacts.columns;
        assert!(columns.iter().any(|c| c == "chest_pain_type_4"));
        assert!(!columns.iter().any(|c| c == "chest_pain_type"));
        assert_eq!(outcome.artifacts.scaler.n_features(), columns.len());
        assert_eq!(outcome.artifacts.classifier.n_features(), columns.len());
    }

    #[test]
    fn test_training_is_reproducible() {
        let config = quick_config(EncodingPolicy::Direct);
        let a = train(&dataset(), &config).unwrap();
        let b = train(&dataset(), &config).unwrap();
        assert_eq!(
            serde_json::to_string(&a.artifacts.classifier).unwrap(),
            serde_json::to_string(&b.artifacts.classifier).unwrap()
        );
        assert_eq!(a.artifacts.scaler, b.artifacts.scaler);
        // identities differ per run
        assert_ne!(a.artifacts.metadata.model_id, b.artifacts.metadata.model_id);
    }

    #[test]
    fn test_config_json_defaults() {
        let config = TrainingConfig::from_json(r#"{"policy":"indicator","forest":{"n_trees":7}}"#).unwrap();
        assert_eq!(config.policy, EncodingPolicy::Indicator);
        assert_eq!(config.forest.n_trees, 7);
        assert_eq!(config.forest.seed, 42);
        assert_eq!(config.test_fraction, 0.2);

        assert!(matches!(
            TrainingConfig::from_json(r#"{"policy":"onehot"}"#),
            Err(RiskError::Config(_))
        ));
    }
}
