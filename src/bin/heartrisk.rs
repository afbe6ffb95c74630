//! heartrisk CLI - Command-line interface for heart-disease risk estimation
//!
//! Commands:
//! - train: Fit a model from the labeled dataset and save its artifacts
//! - predict: Score patient records with a saved model
//! - validate: Check patient records against the form bounds
//! - doctor: Diagnose model artifacts and environment
//! - describe: Summarize a dataset
//! - schema: Print input/output schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use heartrisk::artifact::{CLASSIFIER_FILE, COLUMNS_FILE, SCALER_FILE};
use heartrisk::describe::{render_summary, summarize};
use heartrisk::form::{Control, FormSpec, RangeViolation};
use heartrisk::pipeline::{parse_json, parse_ndjson};
use heartrisk::report::{render_text, ReportEncoder, REPORT_VERSION};
use heartrisk::types::{PatientRecord, RiskReport};
use heartrisk::{
    train, EncodingPolicy, Field, LabeledDataset, RiskError, RiskPredictor, TrainingConfig,
    HEARTRISK_VERSION, PRODUCER_NAME,
};

/// heartrisk - Heart-disease risk estimation
#[derive(Parser)]
#[command(name = "heartrisk")]
#[command(version = HEARTRISK_VERSION)]
#[command(about = "Train and serve a heart-disease risk classifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a model from the labeled dataset and save its artifacts
    Train {
        /// Dataset CSV path
        #[arg(short, long)]
        data: PathBuf,

        /// Output model directory
        #[arg(short, long)]
        out: PathBuf,

        /// Categorical encoding policy
        #[arg(long)]
        policy: Option<PolicyArg>,

        /// Number of trees in the forest
        #[arg(long)]
        trees: Option<usize>,

        /// Seed for the split and the forest
        #[arg(long)]
        seed: Option<u64>,

        /// Share of rows held out for evaluation
        #[arg(long)]
        test_fraction: Option<f64>,

        /// Maximum tree depth (unlimited when omitted)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Training config JSON; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score patient records with a saved model
    Predict {
        /// Model directory
        #[arg(short, long)]
        model: PathBuf,

        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Form definition JSON replacing the canonical input bounds
        #[arg(long)]
        form: Option<PathBuf>,
    },

    /// Check patient records against the form bounds
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Form definition JSON replacing the canonical input bounds
        #[arg(long)]
        form: Option<PathBuf>,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose model artifacts and environment
    Doctor {
        /// Model directory to check
        #[arg(long)]
        model: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize a dataset
    Describe {
        /// Dataset CSV path
        #[arg(short, long)]
        data: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// One column per field
    Direct,
    /// One 0/1 column per category of chest pain, resting ECG and ST slope
    Indicator,
}

impl From<PolicyArg> for EncodingPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Direct => EncodingPolicy::Direct,
            PolicyArg::Indicator => EncodingPolicy::Indicator,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// A JSON record or array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one report per line)
    Ndjson,
    /// JSON array of reports
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Human-readable result cards
    Text,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (patient record)
    Input,
    /// Output schema (risk report)
    Output,
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), HeartCliError> {
    match cli.command {
        Commands::Train {
            data,
            out,
            policy,
            trees,
            seed,
            test_fraction,
            max_depth,
            config,
        } => {
            let mut training = match config {
                Some(path) => TrainingConfig::load(&path)?,
                None => TrainingConfig::default(),
            };
            if let Some(policy) = policy {
                training.policy = policy.into();
            }
            if let Some(trees) = trees {
                training.forest.n_trees = trees;
            }
            if let Some(seed) = seed {
                training.split_seed = seed;
                training.forest.seed = seed;
            }
            if let Some(fraction) = test_fraction {
                training.test_fraction = fraction;
            }
            if max_depth.is_some() {
                training.forest.max_depth = max_depth;
            }
            cmd_train(&data, &out, &training)
        }

        Commands::Predict {
            model,
            input,
            input_format,
            output_format,
            form,
        } => cmd_predict(&model, &input, input_format, output_format, form.as_deref()),

        Commands::Validate {
            input,
            input_format,
            form,
            json,
        } => cmd_validate(&input, input_format, form.as_deref(), json),

        Commands::Doctor { model, json } => cmd_doctor(model.as_deref(), json),

        Commands::Describe { data, json } => cmd_describe(&data, json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_train(data: &Path, out: &Path, config: &TrainingConfig) -> Result<(), HeartCliError> {
    let dataset = LabeledDataset::load(data)?;
    let outcome = train(&dataset, config)?;
    outcome.artifacts.save(out)?;

    info!(out = %out.display(), "model written");

    println!("Training Summary");
    println!("================");
    println!("Model ID:      {}", outcome.artifacts.metadata.model_id);
    println!("Policy:        {}", outcome.artifacts.metadata.policy);
    println!("Features:      {}", outcome.artifacts.columns.len());
    println!("Trees:         {}", outcome.artifacts.classifier.n_trees());
    println!("Train rows:    {}", outcome.train_size);
    println!("Test rows:     {}", outcome.test_size);
    if outcome.test_skipped > 0 {
        println!("Test skipped:  {}", outcome.test_skipped);
    }
    match outcome.test_accuracy {
        Some(accuracy) => println!("Test accuracy: {:.2}%", accuracy * 100.0),
        None => println!("Test accuracy: n/a"),
    }
    println!("Saved to:      {}", out.display());

    Ok(())
}

fn cmd_predict(
    model: &Path,
    input: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    form: Option<&Path>,
) -> Result<(), HeartCliError> {
    let form = load_form(form)?;
    let predictor = RiskPredictor::load(model)?;

    let input_data = read_input(input)?;
    let records = match input_format {
        InputFormat::Ndjson => parse_ndjson(&input_data)?,
        InputFormat::Json => parse_json(&input_data)?,
    };

    if records.is_empty() {
        return Err(HeartCliError::NoRecords);
    }

    let encoder = ReportEncoder::new();
    let mut reports: Vec<RiskReport> = Vec::with_capacity(records.len());
    for record in &records {
        let prediction = predictor.predict_checked(&form, record)?;
        reports.push(encoder.encode(&prediction, predictor.model_id()));
    }

    print!("{}", format_output(&reports, &output_format)?);
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    form: Option<&Path>,
    json: bool,
) -> Result<(), HeartCliError> {
    let form = load_form(form)?;
    let input_data = read_input(input)?;

    // Parse each record on its own so one bad record does not hide the others
    let items: Vec<(usize, String)> = match input_format {
        InputFormat::Ndjson => input_data
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| (i + 1, line.to_string()))
            .collect(),
        InputFormat::Json => match serde_json::from_str::<serde_json::Value>(&input_data)? {
            serde_json::Value::Array(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| (i + 1, v.to_string()))
                .collect(),
            other => vec![(1, other.to_string())],
        },
    };

    let mut errors = Vec::new();
    for (index, text) in &items {
        match serde_json::from_str::<PatientRecord>(text) {
            Ok(record) => {
                let violations = form.violations(&record);
                if !violations.is_empty() {
                    errors.push(ValidationErrorDetail {
                        index: *index,
                        error: RiskError::InputOutOfRange(violations.clone()).to_string(),
                        violations,
                    });
                }
            }
            Err(e) => errors.push(ValidationErrorDetail {
                index: *index,
                error: e.to_string(),
                violations: Vec::new(),
            }),
        }
    }

    let report = ValidationReport {
        total_records: items.len(),
        valid_records: items.len() - errors.len(),
        invalid_records: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Record {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(HeartCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_doctor(model: Option<&Path>, json: bool) -> Result<(), HeartCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "heartrisk_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("heartrisk version {}", HEARTRISK_VERSION),
    });

    checks.push(DoctorCheck {
        name: "report_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Report schema: {}", REPORT_VERSION),
    });

    if let Some(dir) = model {
        if dir.is_dir() {
            for file in [CLASSIFIER_FILE, SCALER_FILE, COLUMNS_FILE] {
                let present = dir.join(file).is_file();
                checks.push(DoctorCheck {
                    name: file.to_string(),
                    status: match (present, file == COLUMNS_FILE) {
                        (true, _) => CheckStatus::Ok,
                        (false, true) => CheckStatus::Warning,
                        (false, false) => CheckStatus::Error,
                    },
                    message: if present {
                        "present".to_string()
                    } else {
                        "missing".to_string()
                    },
                });
            }

            match RiskPredictor::load(dir) {
                Ok(predictor) => {
                    checks.push(DoctorCheck {
                        name: "model".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Model {} loads ({} policy, {} features, {} trees)",
                            predictor.model_id(),
                            predictor.policy(),
                            predictor.columns().len(),
                            predictor.n_trees()
                        ),
                    });

                    let smoke = FormSpec::canonical()
                        .default_record()
                        .and_then(|record| predictor.predict(&record));
                    checks.push(match smoke {
                        Ok(prediction) => DoctorCheck {
                            name: "smoke_prediction".to_string(),
                            status: CheckStatus::Ok,
                            message: format!(
                                "Default form record scores {:.2}%",
                                prediction.percentage()
                            ),
                        },
                        Err(e) => DoctorCheck {
                            name: "smoke_prediction".to_string(),
                            status: CheckStatus::Warning,
                            message: format!("Default form record cannot be scored: {}", e),
                        },
                    });
                }
                Err(e) => checks.push(DoctorCheck {
                    name: "model".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                }),
            }
        } else {
            checks.push(DoctorCheck {
                name: "model".to_string(),
                status: CheckStatus::Error,
                message: "Model directory does not exist".to_string(),
            });
        }
    }

    // Check stdin is available (for piped predictions)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (batch prediction ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: HEARTRISK_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("heartrisk Doctor Report");
        println!("=======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(HeartCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_describe(data: &Path, json: bool) -> Result<(), HeartCliError> {
    let dataset = LabeledDataset::load(data)?;
    let summary = summarize(&dataset);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_summary(&summary));
    }
    Ok(())
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), HeartCliError> {
    let form = FormSpec::canonical();

    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema(&form));
            } else {
                println!("Input Schema: patient record");
                println!();
                println!("One JSON object per patient with exactly these fields:");
                println!();
                for control in &form.controls {
                    let allowed = match &control.control {
                        Control::Range { min, max, default, .. } => {
                            format!("{min} to {max} (default {default})")
                        }
                        Control::Options { options, default } => {
                            format!("one of {options:?} (default {default})")
                        }
                        Control::Choice { options, default } => {
                            format!("one of {} (default {default})", options.join(", "))
                        }
                    };
                    println!("- {:<20} {:<32} {}", control.field.as_str(), control.label, allowed);
                }
                println!();
                println!("Short aliases are accepted: cp, trestbps, chol, fbs, restecg, thalach, exang, slope");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: risk report {}", REPORT_VERSION);
                println!();
                println!("- report_version: Schema version ({})", REPORT_VERSION);
                println!("- producer: {{ name, version, instance_id }}");
                println!("- model_id: Identifier of the trained model");
                println!("- computed_at_utc: RFC 3339 timestamp");
                println!("- prediction: {{ label (0/1), probability (0-1) }}");
                println!("- band: low | moderate | high");
                println!("- headline: High Risk of Heart Disease | Low Risk of Heart Disease");
                println!("- risk_percentage: Probability as a percentage, two decimals");
                println!("- gauge: {{ value, bar_color, bands: [{{ band, from, to, color }}] }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, HeartCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_form(path: Option<&Path>) -> Result<FormSpec, HeartCliError> {
    match path {
        Some(path) => Ok(FormSpec::load(path)?),
        None => Ok(FormSpec::canonical()),
    }
}

fn format_output(reports: &[RiskReport], format: &OutputFormat) -> Result<String, HeartCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for report in reports {
                lines.push(serde_json::to_string(report)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(reports)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(reports)? + "\n"),
        OutputFormat::Text => {
            let cards: Vec<String> = reports.iter().map(render_text).collect();
            Ok(cards.join("\n\n") + "\n")
        }
    }
}

fn get_input_json_schema(form: &FormSpec) -> String {
    let mut properties = serde_json::Map::new();
    for control in &form.controls {
        let property = match &control.control {
            Control::Range { min, max, .. } => serde_json::json!({
                "type": if control.field == Field::Oldpeak { "number" } else { "integer" },
                "minimum": min,
                "maximum": max,
                "description": control.label,
            }),
            Control::Options { options, .. } => serde_json::json!({
                "type": "integer",
                "enum": options,
                "description": control.label,
            }),
            Control::Choice { options, .. } => serde_json::json!({
                "type": "string",
                "enum": options,
                "description": control.label,
            }),
        };
        properties.insert(control.field.as_str().to_string(), property);
    }
    let required: Vec<&str> = Field::ALL.iter().map(|f| f.as_str()).collect();

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "heartrisk.patient_record",
        "description": "Clinical measurements of one patient",
        "type": "object",
        "required": required,
        "additionalProperties": false,
        "properties": properties,
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "heartrisk.risk_report",
        "description": "Heart-disease risk report for one patient",
        "type": "object",
        "required": [
            "report_version", "producer", "model_id", "computed_at_utc",
            "prediction", "band", "headline", "risk_percentage", "gauge"
        ],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "model_id": { "type": "string" },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "prediction": {
                "type": "object",
                "properties": {
                    "label": { "type": "integer", "enum": [0, 1] },
                    "probability": { "type": "number", "minimum": 0, "maximum": 1 }
                }
            },
            "band": { "type": "string", "enum": ["low", "moderate", "high"] },
            "headline": { "type": "string" },
            "risk_percentage": { "type": "number", "minimum": 0, "maximum": 100 },
            "gauge": {
                "type": "object",
                "properties": {
                    "value": { "type": "number" },
                    "bar_color": { "type": "string" },
                    "bands": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "band": { "type": "string" },
                                "from": { "type": "number" },
                                "to": { "type": "number" },
                                "color": { "type": "string" }
                            }
                        }
                    }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum HeartCliError {
    Io(io::Error),
    Risk(RiskError),
    Json(serde_json::Error),
    NoRecords,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for HeartCliError {
    fn from(e: io::Error) -> Self {
        HeartCliError::Io(e)
    }
}

impl From<RiskError> for HeartCliError {
    fn from(e: RiskError) -> Self {
        HeartCliError::Risk(e)
    }
}

impl From<serde_json::Error> for HeartCliError {
    fn from(e: serde_json::Error) -> Self {
        HeartCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HeartCliError> for CliError {
    fn from(e: HeartCliError) -> Self {
        match e {
            HeartCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HeartCliError::Risk(e) => risk_error(e),
            HeartCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            HeartCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            HeartCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            HeartCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

fn risk_error(e: RiskError) -> CliError {
    let (code, hint) = match &e {
        RiskError::ArtifactLoad { .. } => (
            "ARTIFACT_LOAD_FAILED",
            "Run 'heartrisk doctor --model <dir>' or retrain with 'heartrisk train'",
        ),
        RiskError::SchemaMismatch(_) => (
            "SCHEMA_MISMATCH",
            "Run 'heartrisk schema input' to see the expected record fields",
        ),
        RiskError::DimensionMismatch { .. } => (
            "DIMENSION_MISMATCH",
            "The model artifacts are inconsistent; retrain the model",
        ),
        RiskError::InputOutOfRange(_) => (
            "INPUT_OUT_OF_RANGE",
            "Run 'heartrisk validate' for details",
        ),
        RiskError::Dataset(_) | RiskError::Csv(_) => (
            "DATASET_ERROR",
            "Check the dataset header and that every value is numeric",
        ),
        RiskError::Json(_) => ("JSON_ERROR", "Check JSON syntax"),
        RiskError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
        RiskError::Training(_) => (
            "TRAINING_FAILED",
            "Check that the dataset contains both classes",
        ),
        RiskError::Config(_) => ("CONFIG_ERROR", "Check the configuration values"),
    };

    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<RangeViolation>,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
