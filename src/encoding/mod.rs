//! Feature encoders
//!
//! This module turns a typed patient record into the ordered numeric feature
//! vector a trained model expects. Two policies exist, matching how categories
//! were laid out at training time.

mod direct;
mod indicator;

pub use direct::DirectEncoder;
pub use indicator::IndicatorEncoder;

use crate::error::RiskError;
use crate::schema::EncodingPolicy;
use crate::types::{FeatureVector, PatientRecord};

/// Trait for feature encoders
pub trait FeatureEncoder: Send + Sync {
    /// Encode one record into a feature vector in `columns()` order
    fn encode(&self, record: &PatientRecord) -> Result<FeatureVector, RiskError>;

    /// Ordered column names of the produced vector
    fn columns(&self) -> &[String];

    /// Encoding policy implemented by this encoder
    fn policy(&self) -> EncodingPolicy;

    /// Number of features produced
    fn width(&self) -> usize {
        self.columns().len()
    }
}

/// Build the encoder for a policy.
///
/// The indicator policy requires the reference column list saved at training
/// time; the direct policy accepts an optional list and checks it against the
/// fixed field order.
pub fn build_encoder(
    policy: EncodingPolicy,
    columns: Option<Vec<String>>,
) -> Result<Box<dyn FeatureEncoder>, RiskError> {
    match policy {
        EncodingPolicy::Direct => {
            let encoder = DirectEncoder::new();
            if let Some(columns) = columns {
                if columns.as_slice() != encoder.columns() {
                    return Err(RiskError::SchemaMismatch(format!(
                        "direct policy expects columns {:?}, got {:?}",
                        encoder.columns(),
                        columns
                    )));
                }
            }
            Ok(Box::new(encoder))
        }
        EncodingPolicy::Indicator => {
            let columns = columns.ok_or_else(|| {
                RiskError::SchemaMismatch(
                    "indicator policy requires a reference column list".to_string(),
                )
            })?;
            Ok(Box::new(IndicatorEncoder::new(columns)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sample_record;

    #[test]
    fn test_build_direct_without_columns() {
        let encoder = build_encoder(EncodingPolicy::Direct, None).unwrap();
        assert_eq!(encoder.width(), 11);
        assert_eq!(encoder.policy(), EncodingPolicy::Direct);
    }

    #[test]
    fn test_build_direct_rejects_reordered_columns() {
        let mut columns = DirectEncoder::new().columns().to_vec();
        columns.swap(0, 1);
        assert!(matches!(
            build_encoder(EncodingPolicy::Direct, Some(columns)),
            Err(RiskError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_build_indicator_requires_columns() {
        assert!(matches!(
            build_encoder(EncodingPolicy::Indicator, None),
            Err(RiskError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let encoder = build_encoder(EncodingPolicy::Direct, None).unwrap();
        let record = sample_record();
        assert_eq!(
            encoder.encode(&record).unwrap(),
            encoder.encode(&record).unwrap()
        );
    }
}
