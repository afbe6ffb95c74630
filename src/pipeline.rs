//! Pipeline orchestration
//!
//! This module provides the public prediction API. A `RiskPredictor` is
//! loaded once from an artifact directory and then runs every request through
//! the same immutable stages:
//!
//! 1. FormSpec - reject values outside the declared input bounds (optional)
//! 2. FeatureEncoder - typed record to ordered feature vector
//! 3. StandardScaler - standardize with training statistics
//! 4. RandomForest - positive-class probability and label
//! 5. ReportEncoder - result card and gauge data

use std::path::Path;
use tracing::debug;

use crate::artifact::ModelArtifacts;
use crate::classifier::{Classifier, RandomForest};
use crate::encoding::{build_encoder, FeatureEncoder};
use crate::error::RiskError;
use crate::form::FormSpec;
use crate::report::ReportEncoder;
use crate::scaler::StandardScaler;
use crate::schema::EncodingPolicy;
use crate::types::{FeatureVector, PatientRecord, PredictionResult, RiskReport};

/// Loaded model: encoder, scaler and classifier that were trained together.
///
/// Immutable after construction; share it by reference.
pub struct RiskPredictor {
    model_id: String,
    encoder: Box<dyn FeatureEncoder>,
    scaler: StandardScaler,
    classifier: RandomForest,
}

impl std::fmt::Debug for RiskPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskPredictor")
            .field("model_id", &self.model_id)
            .field("policy", &self.encoder.policy())
            .field("features", &self.encoder.width())
            .field("trees", &self.classifier.n_trees())
            .finish()
    }
}

impl RiskPredictor {
    /// Load and cross-check the artifacts in `dir`
    pub fn load(dir: &Path) -> Result<Self, RiskError> {
        Self::from_artifacts(ModelArtifacts::load(dir)?)
    }

    /// Build a predictor from in-memory artifacts (e.g. straight after training)
    pub fn from_artifacts(artifacts: ModelArtifacts) -> Result<Self, RiskError> {
        let encoder = build_encoder(artifacts.metadata.policy, Some(artifacts.columns))?;
        let width = encoder.width();
        if artifacts.scaler.n_features() != width {
            return Err(RiskError::DimensionMismatch {
                expected: width,
                actual: artifacts.scaler.n_features(),
            });
        }
        if artifacts.classifier.n_features() != width {
            return Err(RiskError::DimensionMismatch {
                expected: width,
                actual: artifacts.classifier.n_features(),
            });
        }

        Ok(Self {
            model_id: artifacts.metadata.model_id,
            encoder,
            scaler: artifacts.scaler,
            classifier: artifacts.classifier,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn policy(&self) -> EncodingPolicy {
        self.encoder.policy()
    }

    /// Reference column names in feature order
    pub fn columns(&self) -> &[String] {
        self.encoder.columns()
    }

    pub fn n_trees(&self) -> usize {
        self.classifier.n_trees()
    }

    /// Encoded and scaled feature vector for a record
    pub fn features(&self, record: &PatientRecord) -> Result<FeatureVector, RiskError> {
        let encoded = self.encoder.encode(record)?;
        debug!(features = encoded.len(), "encoded record");
        let scaled = self.scaler.transform(&encoded)?;
        debug!("scaled features");
        Ok(scaled)
    }

    /// Run encode, scale and classify for one record
    pub fn predict(&self, record: &PatientRecord) -> Result<PredictionResult, RiskError> {
        let scaled = self.features(record)?;
        let prediction = self.classifier.predict(&scaled)?;
        debug!(
            label = prediction.label,
            probability = prediction.probability,
            "classified record"
        );
        Ok(prediction)
    }

    /// Validate against the form bounds first, then predict
    pub fn predict_checked(
        &self,
        form: &FormSpec,
        record: &PatientRecord,
    ) -> Result<PredictionResult, RiskError> {
        form.validate(record)?;
        self.predict(record)
    }

    /// Predict and render the result report
    pub fn report(
        &self,
        encoder: &ReportEncoder,
        record: &PatientRecord,
    ) -> Result<RiskReport, RiskError> {
        let prediction = self.predict(record)?;
        Ok(encoder.encode(&prediction, &self.model_id))
    }
}

/// Parse newline-delimited JSON records; blank lines are skipped.
///
/// Errors name the 1-based line that failed.
pub fn parse_ndjson(input: &str) -> Result<Vec<PatientRecord>, RiskError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                RiskError::SchemaMismatch(format!("line {}: {e}", i + 1))
            })
        })
        .collect()
}

/// Parse either a single JSON record or an array of records
pub fn parse_json(input: &str) -> Result<Vec<PatientRecord>, RiskError> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    let records = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item)
                    .map_err(|e| RiskError::SchemaMismatch(format!("record {}: {e}", i + 1)))
            })
            .collect::<Result<Vec<PatientRecord>, _>>()?,
        other => vec![serde_json::from_value(other)
            .map_err(|e| RiskError::SchemaMismatch(e.to_string()))?],
    };
    Ok(records)
}

/// Load a model, predict one JSON record and return the report as JSON.
///
/// The record is checked against the canonical form bounds first. Convenience
/// for one-shot callers; long-lived callers should keep a `RiskPredictor`
/// instead of reloading artifacts per request.
pub fn predict_json(model_dir: &Path, record_json: &str) -> Result<String, RiskError> {
    let predictor = RiskPredictor::load(model_dir)?;
    let record: PatientRecord = serde_json::from_str(record_json)
        .map_err(|e| RiskError::SchemaMismatch(e.to_string()))?;
    let prediction = predictor.predict_checked(&FormSpec::canonical(), &record)?;
    let report = ReportEncoder::new().encode(&prediction, predictor.model_id());
    Ok(serde_json::to_string_pretty(&report)?)
}
