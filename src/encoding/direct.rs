//! Direct encoding policy
//!
//! Every field becomes exactly one column, in the fixed field order. Ordinal
//! categories pass through as their small integer codes.

use crate::error::RiskError;
use crate::schema::{EncodingPolicy, Field};
use crate::types::{FeatureVector, PatientRecord};

use super::FeatureEncoder;

/// Direct (one column per field) encoder
#[derive(Debug, Clone)]
pub struct DirectEncoder {
    columns: Vec<String>,
}

impl Default for DirectEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectEncoder {
    pub fn new() -> Self {
        Self {
            columns: Field::ALL.iter().map(|f| f.as_str().to_string()).collect(),
        }
    }
}

impl FeatureEncoder for DirectEncoder {
    fn encode(&self, record: &PatientRecord) -> Result<FeatureVector, RiskError> {
        let values: Vec<f64> = Field::ALL.iter().map(|f| record.value(*f)).collect();
        Ok(FeatureVector::new(values))
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn policy(&self) -> EncodingPolicy {
        EncodingPolicy::Direct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{sample_record, Sex, YesNo};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_direct_encoding_matches_field_order() {
        let vector = DirectEncoder::new().encode(&sample_record()).unwrap();
        assert_eq!(
            vector.as_slice(),
            &[50.0, 1.0, 1.0, 120.0, 200.0, 0.0, 0.0, 150.0, 0.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_text_answers_map_to_codes() {
        let record = PatientRecord {
            sex: Sex::Female,
            fasting_blood_sugar: YesNo::Yes,
            exercise_angina: YesNo::Yes,
            ..sample_record()
        };
        let vector = DirectEncoder::new().encode(&record).unwrap();
        assert_eq!(vector.as_slice()[1], 0.0);
        assert_eq!(vector.as_slice()[5], 1.0);
        assert_eq!(vector.as_slice()[8], 1.0);
    }

    #[test]
    fn test_width_matches_columns() {
        let encoder = DirectEncoder::new();
        let vector = encoder.encode(&sample_record()).unwrap();
        assert_eq!(vector.len(), encoder.width());
        assert_eq!(encoder.columns()[10], "st_slope");
    }
}
