//! Dataset summary
//!
//! Row count, class balance and per-field statistics split by diagnosis, for
//! a quick look at a dataset before training on it.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::dataset::LabeledDataset;
use crate::schema::Field;

/// Summary statistics of one group of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            count: values.len(),
            mean,
            std: variance.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Statistics of one field overall and per class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub field: Field,
    pub overall: Option<Stats>,
    /// Rows labelled 0
    pub no_disease: Option<Stats>,
    /// Rows labelled 1
    pub disease: Option<Stats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub positives: usize,
    pub negatives: usize,
    /// Share of rows labelled 1
    pub positive_rate: f64,
    pub fields: Vec<FieldSummary>,
}

/// Summarize a labeled dataset
pub fn summarize(dataset: &LabeledDataset) -> DatasetSummary {
    let rows = dataset.len();
    let positives = dataset.positives();

    let fields = Field::ALL
        .iter()
        .map(|field| {
            let mut all = Vec::with_capacity(rows);
            let mut by_label: [Vec<f64>; 2] = [Vec::new(), Vec::new()];
            for (record, label) in dataset.records().iter().zip(dataset.labels()) {
                let value = record.value(*field);
                all.push(value);
                by_label[usize::from(*label)].push(value);
            }
            FieldSummary {
                field: *field,
                overall: Stats::from_values(&all),
                no_disease: Stats::from_values(&by_label[0]),
                disease: Stats::from_values(&by_label[1]),
            }
        })
        .collect();

    DatasetSummary {
        rows,
        positives,
        negatives: rows - positives,
        positive_rate: if rows == 0 {
            0.0
        } else {
            positives as f64 / rows as f64
        },
        fields,
    }
}

/// Render a summary as an aligned text table
pub fn render_summary(summary: &DatasetSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Rows: {}  (disease: {}, no disease: {}, positive rate {:.1}%)",
        summary.rows,
        summary.positives,
        summary.negatives,
        summary.positive_rate * 100.0
    );
    let _ = writeln!(
        out,
        "{:<22} {:>10} {:>10} {:>10} {:>10} {:>12} {:>12}",
        "field", "mean", "std", "min", "max", "mean (no)", "mean (yes)"
    );

    let mean_of = |stats: &Option<Stats>| {
        stats
            .as_ref()
            .map_or_else(|| "-".to_string(), |s| format!("{:.2}", s.mean))
    };
    for field in &summary.fields {
        let Some(overall) = &field.overall else {
            continue;
        };
        let _ = writeln!(
            out,
            "{:<22} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12} {:>12}",
            field.field.as_str(),
            overall.mean,
            overall.std,
            overall.min,
            overall.max,
            mean_of(&field.no_disease),
            mean_of(&field.disease)
        );
    }
    out
}
