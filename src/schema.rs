//! Patient field schema
//!
//! The fixed, ordered list of clinical fields a model is trained on, together
//! with the names used for them in the dataset CSV and in encoded column lists.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fields in a patient record (and columns under the direct policy)
pub const FIELD_COUNT: usize = 11;

/// Name of the label column in the dataset
pub const TARGET_COLUMN: &str = "target";

/// Clinical fields in model order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Age,
    Sex,
    ChestPainType,
    RestingBp,
    Cholesterol,
    FastingBloodSugar,
    RestingEcg,
    MaxHeartRate,
    ExerciseAngina,
    Oldpeak,
    StSlope,
}

impl Field {
    /// All fields in the order the direct policy emits them
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Age,
        Field::Sex,
        Field::ChestPainType,
        Field::RestingBp,
        Field::Cholesterol,
        Field::FastingBloodSugar,
        Field::RestingEcg,
        Field::MaxHeartRate,
        Field::ExerciseAngina,
        Field::Oldpeak,
        Field::StSlope,
    ];

    /// Fields the indicator policy expands into one column per category
    pub const CATEGORICAL: [Field; 3] = [Field::ChestPainType, Field::RestingEcg, Field::StSlope];

    /// Fields answered with text on the form
    pub const TEXT_ANSWERS: [Field; 3] = [Field::Sex, Field::FastingBloodSugar, Field::ExerciseAngina];

    /// Canonical column name used in reference column lists and JSON input
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Age => "age",
            Field::Sex => "sex",
            Field::ChestPainType => "chest_pain_type",
            Field::RestingBp => "resting_bp",
            Field::Cholesterol => "cholesterol",
            Field::FastingBloodSugar => "fasting_blood_sugar",
            Field::RestingEcg => "resting_ecg",
            Field::MaxHeartRate => "max_heart_rate",
            Field::ExerciseAngina => "exercise_angina",
            Field::Oldpeak => "oldpeak",
            Field::StSlope => "st_slope",
        }
    }

    /// Header of this field in the heart dataset CSV
    pub fn dataset_column(&self) -> &'static str {
        match self {
            Field::Age => "age",
            Field::Sex => "sex",
            Field::ChestPainType => "chest pain type",
            Field::RestingBp => "resting bp s",
            Field::Cholesterol => "cholesterol",
            Field::FastingBloodSugar => "fasting blood sugar",
            Field::RestingEcg => "resting ecg",
            Field::MaxHeartRate => "max heart rate",
            Field::ExerciseAngina => "exercise angina",
            Field::Oldpeak => "oldpeak",
            Field::StSlope => "ST slope",
        }
    }

    /// Human-readable label shown next to the input control
    pub fn label(&self) -> &'static str {
        match self {
            Field::Age => "Age",
            Field::Sex => "Sex",
            Field::ChestPainType => "Chest Pain Type",
            Field::RestingBp => "Resting BP (mm Hg)",
            Field::Cholesterol => "Cholesterol (mg/dl)",
            Field::FastingBloodSugar => "Fasting Blood Sugar > 120 mg/dl",
            Field::RestingEcg => "Resting ECG",
            Field::MaxHeartRate => "Max Heart Rate",
            Field::ExerciseAngina => "Exercise Induced Angina",
            Field::Oldpeak => "Oldpeak (ST Depression)",
            Field::StSlope => "ST Slope",
        }
    }

    pub fn is_categorical(&self) -> bool {
        Self::CATEGORICAL.contains(self)
    }

    pub fn is_text_answer(&self) -> bool {
        Self::TEXT_ANSWERS.contains(self)
    }

    /// Column name for one category value of a categorical field, e.g. `chest_pain_type_3`
    pub fn indicator_column(&self, value: u8) -> String {
        format!("{}_{}", self.as_str(), value)
    }

    /// Split an indicator column name back into its field and category value
    pub fn parse_indicator_column(column: &str) -> Option<(Field, u8)> {
        Self::CATEGORICAL.iter().find_map(|field| {
            column
                .strip_prefix(field.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                .and_then(|value| value.parse::<u8>().ok())
                .map(|value| (*field, value))
        })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .find(|field| field.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown field: {s}"))
    }
}

/// How categorical fields are laid out in the feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingPolicy {
    /// One column per field, categories kept as small integers
    #[default]
    Direct,
    /// Categorical fields expanded into one 0/1 column per category value
    Indicator,
}

impl EncodingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncodingPolicy::Direct => "direct",
            EncodingPolicy::Indicator => "indicator",
        }
    }
}

impl fmt::Display for EncodingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncodingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(EncodingPolicy::Direct),
            "indicator" | "expansion" => Ok(EncodingPolicy::Indicator),
            _ => Err(format!("Unknown encoding policy: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_is_fixed() {
        let names: Vec<&str> = Field::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "age",
                "sex",
                "chest_pain_type",
                "resting_bp",
                "cholesterol",
                "fasting_blood_sugar",
                "resting_ecg",
                "max_heart_rate",
                "exercise_angina",
                "oldpeak",
                "st_slope",
            ]
        );
    }

    #[test]
    fn test_indicator_column_roundtrip() {
        let column = Field::StSlope.indicator_column(2);
        assert_eq!(column, "st_slope_2");
        assert_eq!(
            Field::parse_indicator_column(&column),
            Some((Field::StSlope, 2))
        );
    }

    #[test]
    fn test_parse_indicator_rejects_non_categorical() {
        assert_eq!(Field::parse_indicator_column("age_50"), None);
        assert_eq!(Field::parse_indicator_column("chest_pain_type"), None);
        assert_eq!(Field::parse_indicator_column("chest_pain_type_x"), None);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Direct".parse::<EncodingPolicy>(), Ok(EncodingPolicy::Direct));
        assert_eq!(
            "expansion".parse::<EncodingPolicy>(),
            Ok(EncodingPolicy::Indicator)
        );
        assert!("onehot".parse::<EncodingPolicy>().is_err());
    }
}
