//! Result rendering
//!
//! Turns a prediction into the `RiskReport` shown to the user: a headline for
//! the result card, the risk percentage and the data behind the gauge.

use chrono::Utc;
use std::fmt::Write as _;

use crate::error::RiskError;
use crate::types::{
    Gauge, GaugeBand, PredictionResult, ReportProducer, RiskBand, RiskReport,
};
use crate::{HEARTRISK_VERSION, PRODUCER_NAME};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

pub const HIGH_RISK_HEADLINE: &str = "High Risk of Heart Disease";
pub const LOW_RISK_HEADLINE: &str = "Low Risk of Heart Disease";

/// Gauge bar colour above 50%
pub const BAR_COLOR_HIGH: &str = "red";
/// Gauge bar colour at or below 50%
pub const BAR_COLOR_LOW: &str = "green";

/// Report encoder for producing result payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build the report for one prediction of the given model
    pub fn encode(&self, prediction: &PredictionResult, model_id: &str) -> RiskReport {
        let percentage = prediction.percentage();
        let headline = if prediction.is_high_risk() {
            HIGH_RISK_HEADLINE
        } else {
            LOW_RISK_HEADLINE
        };

        RiskReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: HEARTRISK_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            model_id: model_id.to_string(),
            computed_at_utc: Utc::now(),
            prediction: *prediction,
            band: prediction.band(),
            headline: headline.to_string(),
            risk_percentage: (percentage * 100.0).round() / 100.0,
            gauge: build_gauge(percentage),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        prediction: &PredictionResult,
        model_id: &str,
    ) -> Result<String, RiskError> {
        let report = self.encode(prediction, model_id);
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

fn build_gauge(percentage: f64) -> Gauge {
    let bar_color = if percentage > 50.0 {
        BAR_COLOR_HIGH
    } else {
        BAR_COLOR_LOW
    };

    let bands = [RiskBand::Low, RiskBand::Moderate, RiskBand::High]
        .into_iter()
        .map(|band| {
            let (from, to) = band.range();
            GaugeBand {
                band,
                from,
                to,
                color: band.color().to_string(),
            }
        })
        .collect();

    Gauge {
        value: percentage,
        bar_color: bar_color.to_string(),
        bands,
    }
}

/// Plain-text rendering of a report for terminals
pub fn render_text(report: &RiskReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.headline);
    let _ = writeln!(out, "Risk Score: {:.2}%", report.risk_percentage);
    let _ = writeln!(out, "Band: {}", report.band);

    const WIDTH: usize = 40;
    let filled = ((report.gauge.value / 100.0) * WIDTH as f64).round() as usize;
    let filled = filled.min(WIDTH);
    let _ = writeln!(
        out,
        "[{}{}] {}",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        report.gauge.bar_color
    );
    let _ = write!(out, "Model: {}", report.model_id);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_high_risk_report() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(&PredictionResult::from_probability(0.73456), "model-1");

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.model_id, "model-1");
        assert_eq!(report.headline, HIGH_RISK_HEADLINE);
        assert_eq!(report.risk_percentage, 73.46);
        assert_eq!(report.band, RiskBand::High);
        assert_eq!(report.gauge.bar_color, BAR_COLOR_HIGH);
    }

    #[test]
    fn test_low_risk_report() {
        let report = ReportEncoder::new().encode(&PredictionResult::from_probability(0.12), "m");
        assert_eq!(report.headline, LOW_RISK_HEADLINE);
        assert_eq!(report.band, RiskBand::Low);
        assert_eq!(report.gauge.bar_color, BAR_COLOR_LOW);
    }

    #[test]
    fn test_bar_colour_at_boundary() {
        // exactly 50% is high risk but the bar stays green
        let report = ReportEncoder::new().encode(&PredictionResult::from_probability(0.5), "m");
        assert_eq!(report.headline, HIGH_RISK_HEADLINE);
        assert_eq!(report.gauge.bar_color, BAR_COLOR_LOW);
    }

    #[test]
    fn test_gauge_bands() {
        let report = ReportEncoder::new().encode(&PredictionResult::from_probability(0.4), "m");
        let bands: Vec<(f64, f64, &str)> = report
            .gauge
            .bands
            .iter()
            .map(|b| (b.from, b.to, b.color.as_str()))
            .collect();
        assert_eq!(
            bands,
            vec![
                (0.0, 30.0, "#b7e4c7"),
                (30.0, 60.0, "#ffdd8f"),
                (60.0, 100.0, "#f4978e"),
            ]
        );
    }

    #[test]
    fn test_encode_to_json_fields() {
        let json = ReportEncoder::new()
            .encode_to_json(&PredictionResult::from_probability(0.25), "m")
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["prediction"]["label"], 0);
        assert_eq!(value["band"], "low");
        assert!(value["computed_at_utc"].is_string());
    }

    #[test]
    fn test_render_text() {
        let report = ReportEncoder::new().encode(&PredictionResult::from_probability(0.8), "abc");
        let text = render_text(&report);
        assert!(text.starts_with(HIGH_RISK_HEADLINE));
        assert!(text.contains("Risk Score: 80.00%"));
        assert!(text.contains("Band: HIGH"));
        assert!(text.ends_with("Model: abc"));
    }
}
