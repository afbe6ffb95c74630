//! heartrisk - Heart-disease risk estimation from clinical measurements
//!
//! A patient record flows through a deterministic pipeline: form validation →
//! feature encoding → standard scaling → random-forest classification →
//! risk report. Models are trained offline from a labeled CSV dataset and
//! persisted as JSON artifacts.
//!
//! ## Modules
//!
//! - **Inference**: `RiskPredictor` loads a trained model once and predicts records
//! - **Training**: `train` fits encoder layout, scaler and forest from a dataset

pub mod artifact;
pub mod classifier;
pub mod dataset;
pub mod describe;
pub mod encoding;
pub mod error;
pub mod form;
pub mod pipeline;
pub mod report;
pub mod scaler;
pub mod schema;
pub mod training;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use artifact::ModelArtifacts;
pub use classifier::{Classifier, ForestConfig, RandomForest};
pub use dataset::LabeledDataset;
pub use encoding::{build_encoder, DirectEncoder, FeatureEncoder, IndicatorEncoder};
pub use error::RiskError;
pub use form::FormSpec;
pub use pipeline::{predict_json, RiskPredictor};
pub use report::ReportEncoder;
pub use scaler::StandardScaler;
pub use schema::{EncodingPolicy, Field};
pub use training::{train, TrainingConfig, TrainingOutcome};
pub use types::{FeatureVector, PatientRecord, PredictionResult, RiskBand, RiskReport};

/// heartrisk version embedded in every report
pub const HEARTRISK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for risk reports
pub const PRODUCER_NAME: &str = "heartrisk";
