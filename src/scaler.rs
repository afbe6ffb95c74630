//! Feature standardization
//!
//! This module applies a fitted per-feature standardization to encoded vectors:
//! - Each value becomes `(x - mean) / scale`
//! - Statistics are fixed at training time and never updated afterwards
//! - Constant features get a scale of 1 so they map to 0 instead of dividing by zero

use serde::{Deserialize, Serialize};

use crate::error::RiskError;
use crate::types::FeatureVector;

/// Fitted standard scaler (per-feature mean and standard deviation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScalerParams")]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// Stored scaler statistics, checked before use
#[derive(Deserialize)]
struct ScalerParams {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl TryFrom<ScalerParams> for StandardScaler {
    type Error = RiskError;

    fn try_from(params: ScalerParams) -> Result<Self, Self::Error> {
        Self::from_parts(params.mean, params.scale)
    }
}

impl StandardScaler {
    /// Build a scaler from stored statistics.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if the two lists differ in length and
    /// `SchemaMismatch` if a scale is not a positive finite number.
    pub fn from_parts(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, RiskError> {
        if mean.len() != scale.len() {
            return Err(RiskError::DimensionMismatch {
                expected: mean.len(),
                actual: scale.len(),
            });
        }
        if let Some(bad) = scale.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(RiskError::SchemaMismatch(format!(
                "scaler contains invalid scale {bad}"
            )));
        }
        Ok(Self { mean, scale })
    }

    /// Fit mean and population standard deviation over the given rows.
    ///
    /// # Errors
    /// Returns `Training` on empty input and `DimensionMismatch` on ragged rows.
    pub fn fit(rows: &[FeatureVector]) -> Result<Self, RiskError> {
        let first = rows
            .first()
            .ok_or_else(|| RiskError::Training("cannot fit scaler on zero rows".to_string()))?;
        let n_features = first.len();
        let n = rows.len() as f64;

        let mut mean = vec![0.0; n_features];
        for row in rows {
            if row.len() != n_features {
                return Err(RiskError::DimensionMismatch {
                    expected: n_features,
                    actual: row.len(),
                });
            }
            for (m, x) in mean.iter_mut().zip(row.as_slice()) {
                *m += x;
            }
        }
        for m in mean.iter_mut() {
            *m /= n;
        }

        let mut variance = vec![0.0; n_features];
        for row in rows {
            for ((v, x), m) in variance.iter_mut().zip(row.as_slice()).zip(&mean) {
                let d = x - m;
                *v += d * d;
            }
        }

        let scale = variance
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    /// Number of features this scaler was fitted on
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Standardize one vector.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if the vector length differs from the fitted width.
    pub fn transform(&self, features: &FeatureVector) -> Result<FeatureVector, RiskError> {
        if features.len() != self.n_features() {
            return Err(RiskError::DimensionMismatch {
                expected: self.n_features(),
                actual: features.len(),
            });
        }

        let values = features
            .as_slice()
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((x, mean), scale)| (x - mean) / scale)
            .collect();

        Ok(FeatureVector::new(values))
    }

    /// Standardize a batch of vectors
    pub fn transform_all(&self, rows: &[FeatureVector]) -> Result<Vec<FeatureVector>, RiskError> {
        rows.iter().map(|row| self.transform(row)).collect()
    }
}
