//! Model artifacts on disk
//!
//! A trained model is persisted as a directory of three JSON files, each wrapped
//! in the same envelope:
//!
//! ```text
//! classifier.json  {"format": "heartrisk.classifier.v1", "model_id", "trained_at", "policy", "body": <forest>}
//! scaler.json      {"format": "heartrisk.scaler.v1",     "model_id", "trained_at", "body": <scaler>}
//! columns.json     {"format": "heartrisk.columns.v1",    "model_id", "trained_at", "body": [names]}
//! ```
//!
//! Loading checks every file against the others so an inconsistent directory is
//! rejected at start-up rather than producing wrong predictions later.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use crate::classifier::{Classifier, RandomForest};
use crate::encoding::{build_encoder, FeatureEncoder};
use crate::error::RiskError;
use crate::scaler::StandardScaler;
use crate::schema::{EncodingPolicy, FIELD_COUNT};

pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const COLUMNS_FILE: &str = "columns.json";

pub const CLASSIFIER_FORMAT: &str = "heartrisk.classifier.v1";
pub const SCALER_FORMAT: &str = "heartrisk.scaler.v1";
pub const COLUMNS_FORMAT: &str = "heartrisk.columns.v1";

/// Identity shared by every file of one trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub trained_at: DateTime<Utc>,
    pub policy: EncodingPolicy,
}

impl ModelMetadata {
    /// Fresh identity for a model trained now
    pub fn new(policy: EncodingPolicy) -> Self {
        Self {
            model_id: Uuid::new_v4().to_string(),
            trained_at: Utc::now(),
            policy,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    format: String,
    model_id: String,
    trained_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    policy: Option<EncodingPolicy>,
    body: T,
}

/// Everything needed to rebuild a predictor
#[derive(Debug)]
pub struct ModelArtifacts {
    pub metadata: ModelMetadata,
    pub columns: Vec<String>,
    pub scaler: StandardScaler,
    pub classifier: RandomForest,
}

impl ModelArtifacts {
    /// Write the three artifact files into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> Result<(), RiskError> {
        std::fs::create_dir_all(dir)?;

        write_envelope(
            &dir.join(CLASSIFIER_FILE),
            &self.envelope(CLASSIFIER_FORMAT, Some(self.metadata.policy), &self.classifier),
        )?;
        write_envelope(
            &dir.join(SCALER_FILE),
            &self.envelope(SCALER_FORMAT, None, &self.scaler),
        )?;
        write_envelope(
            &dir.join(COLUMNS_FILE),
            &self.envelope(COLUMNS_FORMAT, None, &self.columns),
        )?;

        info!(
            dir = %dir.display(),
            model_id = %self.metadata.model_id,
            policy = %self.metadata.policy,
            features = self.columns.len(),
            "saved model artifacts"
        );
        Ok(())
    }

    fn envelope<'a, T>(
        &self,
        format: &str,
        policy: Option<EncodingPolicy>,
        body: &'a T,
    ) -> Envelope<&'a T> {
        Envelope {
            format: format.to_string(),
            model_id: self.metadata.model_id.clone(),
            trained_at: self.metadata.trained_at,
            policy,
            body,
        }
    }

    /// Read and cross-check the artifact files in `dir`.
    ///
    /// # Errors
    /// Every failure is reported as `ArtifactLoad` naming the offending file:
    /// missing or unreadable files, a wrong `format`, files from different
    /// models, or widths that disagree between encoder, scaler and classifier.
    pub fn load(dir: &Path) -> Result<Self, RiskError> {
        let classifier_path = dir.join(CLASSIFIER_FILE);
        let classifier: Envelope<RandomForest> = read_envelope(&classifier_path, CLASSIFIER_FORMAT)?;
        let policy = classifier.policy.ok_or_else(|| {
            RiskError::artifact(&classifier_path, "missing encoding policy")
        })?;

        let scaler_path = dir.join(SCALER_FILE);
        let scaler: Envelope<StandardScaler> = read_envelope(&scaler_path, SCALER_FORMAT)?;
        same_model(&classifier, &scaler, &scaler_path)?;

        let columns_path = dir.join(COLUMNS_FILE);
        let columns = if columns_path.exists() {
            let columns: Envelope<Vec<String>> = read_envelope(&columns_path, COLUMNS_FORMAT)?;
            same_model(&classifier, &columns, &columns_path)?;
            Some(columns.body)
        } else if policy == EncodingPolicy::Indicator {
            return Err(RiskError::artifact(
                &columns_path,
                "indicator policy requires a reference column list",
            ));
        } else {
            warn!(dir = %dir.display(), "no column list found, using direct field order");
            None
        };

        let encoder = build_encoder(policy, columns)
            .map_err(|e| RiskError::artifact(&columns_path, e.to_string()))?;

        let artifacts = Self {
            metadata: ModelMetadata {
                model_id: classifier.model_id,
                trained_at: classifier.trained_at,
                policy,
            },
            columns: encoder.columns().to_vec(),
            scaler: scaler.body,
            classifier: classifier.body,
        };
        artifacts.check_widths(encoder.as_ref(), dir)?;

        info!(
            dir = %dir.display(),
            model_id = %artifacts.metadata.model_id,
            policy = %policy,
            features = artifacts.columns.len(),
            trees = artifacts.classifier.n_trees(),
            "loaded model artifacts"
        );
        Ok(artifacts)
    }

    /// Confirm encoder, scaler and classifier agree on the feature count
    pub fn check_widths(&self, encoder: &dyn FeatureEncoder, dir: &Path) -> Result<(), RiskError> {
        let width = encoder.width();
        if encoder.policy() == EncodingPolicy::Direct && width != FIELD_COUNT {
            return Err(RiskError::artifact(
                dir.join(COLUMNS_FILE),
                format!("direct policy expects {FIELD_COUNT} features, got {width}"),
            ));
        }
        if self.scaler.n_features() != width {
            return Err(RiskError::artifact(
                dir.join(SCALER_FILE),
                format!(
                    "scaler has {} features but the encoder produces {width}",
                    self.scaler.n_features()
                ),
            ));
        }
        if self.classifier.n_features() != width {
            return Err(RiskError::artifact(
                dir.join(CLASSIFIER_FILE),
                format!(
                    "classifier expects {} features but the encoder produces {width}",
                    self.classifier.n_features()
                ),
            ));
        }
        Ok(())
    }
}

fn write_envelope<T: Serialize>(path: &Path, envelope: &Envelope<&T>) -> Result<(), RiskError> {
    let json = serde_json::to_string_pretty(envelope)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn read_envelope<T: DeserializeOwned>(path: &Path, format: &str) -> Result<Envelope<T>, RiskError> {
    let text = std::fs::read_to_string(path).map_err(|e| RiskError::artifact(path, e.to_string()))?;
    let raw: Envelope<serde_json::Value> =
        serde_json::from_str(&text).map_err(|e| RiskError::artifact(path, e.to_string()))?;

    if raw.format != format {
        return Err(RiskError::artifact(
            path,
            format!("expected format {format}, found {}", raw.format),
        ));
    }

    let body = serde_json::from_value(raw.body).map_err(|e| RiskError::artifact(path, e.to_string()))?;
    Ok(Envelope {
        format: raw.format,
        model_id: raw.model_id,
        trained_at: raw.trained_at,
        policy: raw.policy,
        body,
    })
}

fn same_model<A, B>(first: &Envelope<A>, other: &Envelope<B>, path: &Path) -> Result<(), RiskError> {
    if first.model_id != other.model_id {
        return Err(RiskError::artifact(
            path,
            format!(
                "belongs to model {} but the classifier is {}",
                other.model_id, first.model_id
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ForestConfig;
    use crate::dataset::{LabeledDataset, SAMPLE_CSV};
    use crate::encoding::DirectEncoder;
    use crate::training::{train, TrainingConfig};
    use crate::types::FeatureVector;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn direct_artifacts() -> ModelArtifacts {
        let rows: Vec<FeatureVector> = (0..12)
            .map(|i| {
                let x = f64::from(i);
                FeatureVector::new((0..FIELD_COUNT).map(|j| x + j as f64).collect())
            })
            .collect();
        let labels: Vec<u8> = (0..12).map(|i| u8::from(i >= 6)).collect();
        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled = scaler.transform_all(&rows).unwrap();
        let config = ForestConfig {
            n_trees: 5,
            ..ForestConfig::default()
        };

        ModelArtifacts {
            metadata: ModelMetadata::new(EncodingPolicy::Direct),
            columns: DirectEncoder::new().columns().to_vec(),
            scaler,
            classifier: RandomForest::fit(&scaled, &labels, &config).unwrap(),
        }
    }

    fn assert_artifact_error(result: Result<ModelArtifacts, RiskError>, file: &str) {
        match result {
            Err(RiskError::ArtifactLoad { path, .. }) => assert!(path.ends_with(file), "{path}"),
            other => panic!("expected ArtifactLoad for {file}, got {other:?}"),
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let artifacts = direct_artifacts();
        artifacts.save(dir.path()).unwrap();

        let loaded = ModelArtifacts::load(dir.path()).unwrap();
        assert_eq!(loaded.metadata, artifacts.metadata);
        assert_eq!(loaded.columns, artifacts.columns);
        assert_eq!(loaded.scaler, artifacts.scaler);
        assert_eq!(
            serde_json::to_string(&loaded.classifier).unwrap(),
            serde_json::to_string(&artifacts.classifier).unwrap()
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        direct_artifacts().save(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();
        assert_artifact_error(ModelArtifacts::load(dir.path()), SCALER_FILE);
    }

    #[test]
    fn test_direct_policy_without_columns_file() {
        let dir = TempDir::new().unwrap();
        direct_artifacts().save(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join(COLUMNS_FILE)).unwrap();
        let loaded = ModelArtifacts::load(dir.path()).unwrap();
        assert_eq!(loaded.columns.len(), FIELD_COUNT);
    }

    #[test]
    fn test_indicator_policy_requires_columns_file() {
        let dataset = LabeledDataset::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
        let config = TrainingConfig {
            policy: EncodingPolicy::Indicator,
            forest: ForestConfig {
                n_trees: 5,
                ..ForestConfig::default()
            },
            ..TrainingConfig::default()
        };
        let artifacts = train(&dataset, &config).unwrap().artifacts;

        let dir = TempDir::new().unwrap();
        artifacts.save(dir.path()).unwrap();
        assert!(ModelArtifacts::load(dir.path()).is_ok());

        std::fs::remove_file(dir.path().join(COLUMNS_FILE)).unwrap();
        assert_artifact_error(ModelArtifacts::load(dir.path()), COLUMNS_FILE);
    }

    #[test]
    fn test_wrong_format() {
        let dir = TempDir::new().unwrap();
        direct_artifacts().save(dir.path()).unwrap();
        // a scaler file where the classifier should be
        std::fs::copy(dir.path().join(SCALER_FILE), dir.path().join(CLASSIFIER_FILE)).unwrap();
        assert_artifact_error(ModelArtifacts::load(dir.path()), CLASSIFIER_FILE);
    }

    #[test]
    fn test_scaler_width_mismatch() {
        let dir = TempDir::new().unwrap();
        let mut artifacts = direct_artifacts();
        artifacts.scaler = StandardScaler::from_parts(vec![0.0; 5], vec![1.0; 5]).unwrap();
        artifacts.save(dir.path()).unwrap();
        assert_artifact_error(ModelArtifacts::load(dir.path()), SCALER_FILE);
    }

    #[test]
    fn test_files_from_different_models() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        direct_artifacts().save(first.path()).unwrap();
        direct_artifacts().save(second.path()).unwrap();

        std::fs::copy(second.path().join(SCALER_FILE), first.path().join(SCALER_FILE)).unwrap();
        assert_artifact_error(ModelArtifacts::load(first.path()), SCALER_FILE);
    }

    #[test]
    fn test_direct_columns_must_match_field_order() {
        let dir = TempDir::new().unwrap();
        let mut artifacts = direct_artifacts();
        artifacts.columns.reverse();
        artifacts.save(dir.path()).unwrap();
        assert_artifact_error(ModelArtifacts::load(dir.path()), COLUMNS_FILE);
    }
}
