//! Input form surface
//!
//! Declares one input control per patient field with its valid range or option
//! set, and rejects submissions outside those bounds before they reach the
//! feature encoder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::RiskError;
use crate::schema::Field;
use crate::types::PatientRecord;

/// Kind of input control and its bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Control {
    /// Slider or number input with inclusive bounds
    Range {
        min: f64,
        max: f64,
        default: f64,
        step: f64,
    },
    /// Select box over small integer category codes
    Options { options: Vec<u8>, default: u8 },
    /// Radio buttons over text answers
    Choice {
        options: Vec<String>,
        default: String,
    },
}

/// A labelled control bound to one patient field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldControl {
    pub field: Field,
    pub label: String,
    pub control: Control,
}

/// A submitted value that falls outside its control's declared bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeViolation {
    pub field: Field,
    pub value: f64,
    pub allowed: String,
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} not in {}", self.field, self.value, self.allowed)
    }
}

/// The full set of form controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSpec {
    pub controls: Vec<FieldControl>,
}

impl Default for FormSpec {
    fn default() -> Self {
        Self::canonical()
    }
}

impl FormSpec {
    /// Controls matching the deployed model: chest pain 1-4, ST slope 1-3,
    /// oldpeak 0-10, age 18-100.
    pub fn canonical() -> Self {
        let yes_no = || Control::Choice {
            options: vec!["Yes".to_string(), "No".to_string()],
            default: "Yes".to_string(),
        };

        let controls = vec![
            (Field::Age, range(18.0, 100.0, 50.0, 1.0)),
            (
                Field::Sex,
                Control::Choice {
                    options: vec!["Male".to_string(), "Female".to_string()],
                    default: "Male".to_string(),
                },
            ),
            (
                Field::ChestPainType,
                Control::Options {
                    options: vec![1, 2, 3, 4],
                    default: 1,
                },
            ),
            (Field::RestingBp, range(80.0, 200.0, 120.0, 1.0)),
            (Field::Cholesterol, range(100.0, 600.0, 200.0, 1.0)),
            (Field::FastingBloodSugar, yes_no()),
            (
                Field::RestingEcg,
                Control::Options {
                    options: vec![0, 1, 2],
                    default: 0,
                },
            ),
            (Field::MaxHeartRate, range(60.0, 220.0, 150.0, 1.0)),
            (Field::ExerciseAngina, yes_no()),
            (Field::Oldpeak, range(0.0, 10.0, 1.0, 0.1)),
            (
                Field::StSlope,
                Control::Options {
                    options: vec![1, 2, 3],
                    default: 1,
                },
            ),
        ];

        Self {
            controls: controls
                .into_iter()
                .map(|(field, control)| FieldControl {
                    field,
                    label: field.label().to_string(),
                    control,
                })
                .collect(),
        }
    }

    /// Load a form definition from a JSON file
    pub fn load(path: &Path) -> Result<Self, RiskError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse a form definition, requiring exactly one control per field
    pub fn from_json(json: &str) -> Result<Self, RiskError> {
        let spec: FormSpec = serde_json::from_str(json)?;
        spec.check_complete()?;
        Ok(spec)
    }

    fn check_complete(&self) -> Result<(), RiskError> {
        for field in Field::ALL {
            let count = self.controls.iter().filter(|c| c.field == field).count();
            if count != 1 {
                return Err(RiskError::Config(format!(
                    "form must declare exactly one control for {field}, found {count}"
                )));
            }
        }
        for control in &self.controls {
            let field = control.field;
            match &control.control {
                Control::Range { min, max, default, .. } => {
                    if field.is_categorical() || field.is_text_answer() {
                        return Err(RiskError::Config(format!(
                            "{field} needs a choice control, not a range"
                        )));
                    }
                    if !(min <= max) || !(*min..=*max).contains(default) {
                        return Err(RiskError::Config(format!(
                            "invalid range for {field}: [{min}, {max}] default {default}"
                        )));
                    }
                }
                Control::Options { options, default } => {
                    if !field.is_categorical() {
                        return Err(RiskError::Config(format!(
                            "{field} is not categorical and cannot use an options control"
                        )));
                    }
                    if !options.contains(default) {
                        return Err(RiskError::Config(format!(
                            "default {default} for {field} is not one of {options:?}"
                        )));
                    }
                }
                Control::Choice { options, default } => {
                    if !field.is_text_answer() {
                        return Err(RiskError::Config(format!(
                            "{field} is not a text answer and cannot use a choice control"
                        )));
                    }
                    if !options.contains(default) {
                        return Err(RiskError::Config(format!(
                            "default {default} for {field} is not one of {options:?}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Control declared for a field
    pub fn control(&self, field: Field) -> Option<&FieldControl> {
        self.controls.iter().find(|c| c.field == field)
    }

    /// Check every field of a record against its control.
    ///
    /// # Errors
    /// Returns `InputOutOfRange` listing every violating field.
    pub fn validate(&self, record: &PatientRecord) -> Result<(), RiskError> {
        let violations = self.violations(record);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(RiskError::InputOutOfRange(violations))
        }
    }

    /// All range violations of a record, in field order
    pub fn violations(&self, record: &PatientRecord) -> Vec<RangeViolation> {
        let mut violations = Vec::new();

        for control in &self.controls {
            let value = record.value(control.field);
            match &control.control {
                Control::Range { min, max, .. } => {
                    if !value.is_finite() || value < *min || value > *max {
                        violations.push(RangeViolation {
                            field: control.field,
                            value,
                            allowed: format!("[{min}, {max}]"),
                        });
                    }
                }
                Control::Options { options, .. } => {
                    let allowed = record
                        .category(control.field)
                        .is_some_and(|category| options.contains(&category));
                    if !allowed {
                        violations.push(RangeViolation {
                            field: control.field,
                            value,
                            allowed: format!("{options:?}"),
                        });
                    }
                }
                Control::Choice { options, .. } => {
                    let allowed = record
                        .answer(control.field)
                        .is_some_and(|answer| options.iter().any(|o| o == answer));
                    if !allowed {
                        violations.push(RangeViolation {
                            field: control.field,
                            value,
                            allowed: format!("{options:?}"),
                        });
                    }
                }
            }
        }

        violations.sort_by_key(|v| v.field);
        violations
    }

    /// The record the form shows before the user changes anything
    pub fn default_record(&self) -> Result<PatientRecord, RiskError> {
        let mut object = serde_json::Map::new();

        for control in &self.controls {
            let value = match &control.control {
                Control::Range { default, .. } if control.field == Field::Oldpeak => {
                    serde_json::Value::from(*default)
                }
                Control::Range { default, .. } => serde_json::Value::from(default.round() as u64),
                Control::Options { default, .. } => serde_json::Value::from(*default),
                Control::Choice { default, .. } => serde_json::Value::from(default.clone()),
            };
            object.insert(control.field.as_str().to_string(), value);
        }

        Ok(serde_json::from_value(serde_json::Value::Object(object))?)
    }
}

fn range(min: f64, max: f64, default: f64, step: f64) -> Control {
    Control::Range {
        min,
        max,
        default,
        step,
    }
}
