//! Indicator (expansion) encoding policy
//!
//! Categorical fields are expanded into one 0/1 column per category value seen
//! at training time. The saved reference column list fixes the layout; a
//! category without a reference column is rejected rather than zero-filled.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::RiskError;
use crate::schema::{EncodingPolicy, Field};
use crate::types::{FeatureVector, PatientRecord};

use super::FeatureEncoder;

/// Resolved meaning of one reference column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    /// Field value copied as-is
    Value(Field),
    /// 1 when the field equals the category, else 0
    Indicator(Field, u8),
}

/// Encoder driven by a reference column list
#[derive(Debug, Clone)]
pub struct IndicatorEncoder {
    names: Vec<String>,
    layout: Vec<Column>,
    categories: BTreeMap<Field, BTreeSet<u8>>,
}

impl IndicatorEncoder {
    /// Build an encoder from a saved reference column list.
    ///
    /// # Errors
    /// Returns `SchemaMismatch` if a column is unknown or duplicated, if a
    /// non-categorical field is missing, or if a categorical field has no
    /// indicator column.
    pub fn new(columns: Vec<String>) -> Result<Self, RiskError> {
        let mut seen = HashSet::new();
        let mut layout = Vec::with_capacity(columns.len());
        let mut categories: BTreeMap<Field, BTreeSet<u8>> = BTreeMap::new();

        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(RiskError::SchemaMismatch(format!(
                    "duplicate reference column {name}"
                )));
            }

            let column = match name.parse::<Field>() {
                Ok(field) if !field.is_categorical() => Column::Value(field),
                Ok(field) => {
                    return Err(RiskError::SchemaMismatch(format!(
                        "categorical field {field} must be expanded into indicator columns"
                    )))
                }
                Err(_) => match Field::parse_indicator_column(name) {
                    Some((field, value)) => {
                        categories.entry(field).or_default().insert(value);
                        Column::Indicator(field, value)
                    }
                    None => {
                        return Err(RiskError::SchemaMismatch(format!(
                            "unknown reference column {name}"
                        )))
                    }
                },
            };
            layout.push(column);
        }

        for field in Field::ALL {
            let present = if field.is_categorical() {
                categories.contains_key(&field)
            } else {
                layout.contains(&Column::Value(field))
            };
            if !present {
                return Err(RiskError::SchemaMismatch(format!(
                    "reference columns do not cover field {field}"
                )));
            }
        }

        Ok(Self {
            names: columns,
            layout,
            categories,
        })
    }

    /// Build the reference layout from the category values observed in training data.
    ///
    /// Columns follow field order; indicator columns of one field are sorted by value.
    pub fn from_categories(observed: &BTreeMap<Field, BTreeSet<u8>>) -> Result<Self, RiskError> {
        let mut columns = Vec::new();
        for field in Field::ALL {
            if field.is_categorical() {
                let values = observed.get(&field).filter(|v| !v.is_empty()).ok_or_else(|| {
                    RiskError::SchemaMismatch(format!("no categories observed for {field}"))
                })?;
                columns.extend(values.iter().map(|v| field.indicator_column(*v)));
            } else {
                columns.push(field.as_str().to_string());
            }
        }
        Self::new(columns)
    }

    /// Observed category values of a categorical field
    pub fn categories(&self, field: Field) -> Option<&BTreeSet<u8>> {
        self.categories.get(&field)
    }

    fn check_categories(&self, record: &PatientRecord) -> Result<(), RiskError> {
        for (field, known) in &self.categories {
            let Some(value) = record.category(*field) else {
                continue;
            };
            if !known.contains(&value) {
                return Err(RiskError::SchemaMismatch(format!(
                    "{field} value {value} was not seen in training (known: {known:?})"
                )));
            }
        }
        Ok(())
    }
}

impl FeatureEncoder for IndicatorEncoder {
    fn encode(&self, record: &PatientRecord) -> Result<FeatureVector, RiskError> {
        self.check_categories(record)?;

        let values = self
            .layout
            .iter()
            .map(|column| match column {
                Column::Value(field) => record.value(*field),
                Column::Indicator(field, value) => {
                    if record.category(*field) == Some(*value) {
                        1.0
                    } else {
                        0.0
                    }
                }
            })
            .collect();

        Ok(FeatureVector::new(values))
    }

    fn columns(&self) -> &[String] {
        &self.names
    }

    fn policy(&self) -> EncodingPolicy {
        EncodingPolicy::Indicator
    }
}
