//! Core types for the heartrisk pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: the patient record entered on the form, the encoded feature vector,
//! the classifier's prediction and the rendered risk report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::Field;

/// Probability at or above which a record is labelled high risk
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Patient sex as entered on the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Numeric code used by the model (Male = 1, Female = 0)
    pub fn code(&self) -> f64 {
        match self {
            Sex::Male => 1.0,
            Sex::Female => 0.0,
        }
    }

    /// Text answer as shown on the form
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Sex::Male),
            0 => Some(Sex::Female),
            _ => None,
        }
    }
}

/// Answer to a yes/no clinical question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    /// Numeric code used by the model (Yes = 1, No = 0)
    pub fn code(&self) -> f64 {
        match self {
            YesNo::Yes => 1.0,
            YesNo::No => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(YesNo::Yes),
            0 => Some(YesNo::No),
            _ => None,
        }
    }
}

/// One patient's clinical measurements, in the fixed model field order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientRecord {
    /// Age in years
    pub age: u32,
    pub sex: Sex,
    /// Chest pain type (ordinal category)
    #[serde(alias = "cp")]
    pub chest_pain_type: u8,
    /// Resting blood pressure (mm Hg)
    #[serde(alias = "trestbps")]
    pub resting_bp: u32,
    /// Serum cholesterol (mg/dl)
    #[serde(alias = "chol")]
    pub cholesterol: u32,
    /// Fasting blood sugar > 120 mg/dl
    #[serde(alias = "fbs")]
    pub fasting_blood_sugar: YesNo,
    /// Resting ECG result (ordinal category)
    #[serde(alias = "restecg")]
    pub resting_ecg: u8,
    /// Maximum heart rate achieved
    #[serde(alias = "thalach")]
    pub max_heart_rate: u32,
    /// Exercise-induced angina
    #[serde(alias = "exang")]
    pub exercise_angina: YesNo,
    /// ST depression induced by exercise relative to rest
    pub oldpeak: f64,
    /// Slope of the peak exercise ST segment (ordinal category)
    #[serde(alias = "slope")]
    pub st_slope: u8,
}

impl PatientRecord {
    /// Numeric value of a single field, with categorical answers mapped to their codes
    pub fn value(&self, field: Field) -> f64 {
        match field {
            Field::Age => f64::from(self.age),
            Field::Sex => self.sex.code(),
            Field::ChestPainType => f64::from(self.chest_pain_type),
            Field::RestingBp => f64::from(self.resting_bp),
            Field::Cholesterol => f64::from(self.cholesterol),
            Field::FastingBloodSugar => self.fasting_blood_sugar.code(),
            Field::RestingEcg => f64::from(self.resting_ecg),
            Field::MaxHeartRate => f64::from(self.max_heart_rate),
            Field::ExerciseAngina => self.exercise_angina.code(),
            Field::Oldpeak => self.oldpeak,
            Field::StSlope => f64::from(self.st_slope),
        }
    }

    /// Text answer of a yes/no or sex field
    pub fn answer(&self, field: Field) -> Option<&'static str> {
        match field {
            Field::Sex => Some(self.sex.as_str()),
            Field::FastingBloodSugar => Some(self.fasting_blood_sugar.as_str()),
            Field::ExerciseAngina => Some(self.exercise_angina.as_str()),
            _ => None,
        }
    }

    /// Category value of a categorical field
    pub fn category(&self, field: Field) -> Option<u8> {
        match field {
            Field::ChestPainType => Some(self.chest_pain_type),
            Field::RestingEcg => Some(self.resting_ecg),
            Field::StSlope => Some(self.st_slope),
            _ => None,
        }
    }
}

/// Ordered numeric features consumed by the scaler and classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Binary risk prediction for one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 0 = low risk, 1 = high risk
    pub label: u8,
    /// Probability of the positive (high-risk) class, 0-1
    pub probability: f64,
}

impl PredictionResult {
    /// Derive the label by thresholding the positive-class probability
    pub fn from_probability(probability: f64) -> Self {
        let probability = probability.clamp(0.0, 1.0);
        let label = if probability >= DECISION_THRESHOLD { 1 } else { 0 };
        Self { label, probability }
    }

    pub fn is_high_risk(&self) -> bool {
        self.label == 1
    }

    /// Probability expressed as a percentage (0-100)
    pub fn percentage(&self) -> f64 {
        self.probability * 100.0
    }

    pub fn band(&self) -> RiskBand {
        RiskBand::from_probability(self.probability)
    }
}

/// Severity band used by the result gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    /// Below 30%
    Low,
    /// 30% to 60%
    Moderate,
    /// 60% and above
    High,
}

impl RiskBand {
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.3 {
            RiskBand::Low
        } else if probability < 0.6 {
            RiskBand::Moderate
        } else {
            RiskBand::High
        }
    }

    /// Gauge colour of this band
    pub fn color(&self) -> &'static str {
        match self {
            RiskBand::Low => "#b7e4c7",
            RiskBand::Moderate => "#ffdd8f",
            RiskBand::High => "#f4978e",
        }
    }

    /// Percentage range covered by this band on the gauge
    pub fn range(&self) -> (f64, f64) {
        match self {
            RiskBand::Low => (0.0, 30.0),
            RiskBand::Moderate => (30.0, 60.0),
            RiskBand::High => (60.0, 100.0),
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskBand::Low => write!(f, "LOW"),
            RiskBand::Moderate => write!(f, "MODERATE"),
            RiskBand::High => write!(f, "HIGH"),
        }
    }
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// One coloured band of the gauge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeBand {
    pub band: RiskBand,
    pub from: f64,
    pub to: f64,
    pub color: String,
}

/// Gauge-style visualisation data for the result surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gauge {
    /// Needle value, percentage 0-100
    pub value: f64,
    /// Bar colour: red above 50%, green otherwise
    pub bar_color: String,
    pub bands: Vec<GaugeBand>,
}

/// Rendered result of one prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub report_version: String,
    pub producer: ReportProducer,
    /// Identifier of the trained model that produced the prediction
    pub model_id: String,
    pub computed_at_utc: DateTime<Utc>,
    pub prediction: PredictionResult,
    pub band: RiskBand,
    /// Display text for the result card
    pub headline: String,
    /// Probability of high risk as a percentage, two decimals
    pub risk_percentage: f64,
    pub gauge: Gauge,
}

/// Record used across unit tests: a 50 year old male with typical values
#[cfg(test)]
pub(crate) fn sample_record() -> PatientRecord {
    PatientRecord {
        age: 50,
        sex: Sex::Male,
        chest_pain_type: 1,
        resting_bp: 120,
        cholesterol: 200,
        fasting_blood_sugar: YesNo::No,
        resting_ecg: 0,
        max_heart_rate: 150,
        exercise_angina: YesNo::No,
        oldpeak: 1.0,
        st_slope: 1,
    }
}
