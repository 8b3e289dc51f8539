//! Incident CLI - Command-line interface for incident clustering
//!
//! Commands:
//! - cluster: Group alerts into incidents and emit a report
//! - label: Emit alerts with their cluster labels
//! - validate: Validate alert schema
//! - doctor: Diagnose configuration
//! - schema: Print input/output schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use incident_cluster::encoder::REPORT_VERSION;
use incident_cluster::schema::{RawAlert, RawAlertAdapter, SCHEMA_VERSION};
use incident_cluster::{
    ClusterConfig, ClusterProcessor, ClusterReport, EventRecord, CRATE_VERSION, PRODUCER_NAME,
};

/// Incident - group related geotagged alerts into incidents
#[derive(Parser)]
#[command(name = "incident")]
#[command(author = "Synheart AI Inc")]
#[command(version = CRATE_VERSION)]
#[command(about = "Cluster geotagged alerts into incidents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Clustering parameters shared by `cluster` and `label`
#[derive(clap::Args)]
struct ParamArgs {
    /// Parameters file (JSON); flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Spatial epsilon in meters
    #[arg(long)]
    eps_spatial: Option<f64>,

    /// Temporal epsilon in seconds
    #[arg(long)]
    eps_temporal: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Group alerts into incidents and emit a report
    Cluster {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Emit alerts annotated with their cluster label
    Label {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        params: ParamArgs,

        /// Minimum neighborhood size for a record to seed or extend a cluster
        #[arg(long)]
        min_neighbors: Option<usize>,
    },

    /// Validate alert schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration
    Doctor {
        /// Check parameters file
        #[arg(long)]
        config: Option<PathBuf>,

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

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one alert per line)
    Ndjson,
    /// JSON array of alerts
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one item per line)
    Ndjson,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (geo.alert.v1)
    Input,
    /// Output schema (incident.report.v1)
    Output,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), IncidentCliError> {
    match cli.command {
        Commands::Cluster {
            input,
            output,
            input_format,
            output_format,
            params,
        } => cmd_cluster(&input, &output, input_format, output_format, &params),

        Commands::Label {
            input,
            output,
            input_format,
            output_format,
            params,
            min_neighbors,
        } => cmd_label(
            &input,
            &output,
            input_format,
            output_format,
            &params,
            min_neighbors,
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_cluster(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    params: &ParamArgs,
) -> Result<(), IncidentCliError> {
    let alerts = read_alerts(input, &input_format)?;

    let config = resolve_config(params, None)?;
    let processor = ClusterProcessor::with_config(config)?;

    let mut records = RawAlertAdapter::to_records(&alerts)?;
    let report = processor.process(&mut records);

    let output_data = format_report(&report, &output_format)?;
    write_output(output, &output_data)
}

fn cmd_label(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    params: &ParamArgs,
    min_neighbors: Option<usize>,
) -> Result<(), IncidentCliError> {
    let alerts = read_alerts(input, &input_format)?;

    let config = resolve_config(params, min_neighbors)?;
    let processor = ClusterProcessor::with_config(config)?;

    let mut records = RawAlertAdapter::to_records(&alerts)?;
    processor.label(&mut records);

    let output_data = format_records(&records, &output_format)?;
    write_output(output, &output_data)
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), IncidentCliError> {
    let alerts = read_alerts(input, &input_format)?;

    let results = RawAlertAdapter::validate_alerts(&alerts);
    let inverted = RawAlertAdapter::inverted_intervals(&alerts);

    let report = ValidationReport {
        total_alerts: alerts.len(),
        valid_alerts: alerts.len() - results.len(),
        invalid_alerts: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                alert_id: r.alert_id.clone(),
                error: r.result.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            })
            .collect(),
        warnings: inverted
            .iter()
            .map(|&index| ValidationErrorDetail {
                index,
                alert_id: alerts[index].id.clone(),
                error: "end_time is before initial_time; total_time will be negative"
                    .to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total alerts:   {}", report.total_alerts);
        println!("Valid alerts:   {}", report.valid_alerts);
        println!("Invalid alerts: {}", report.invalid_alerts);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Alert {} (index {}): {}",
                    err.alert_id, err.index, err.error
                );
            }
        }

        if !report.warnings.is_empty() {
            println!("\nWarnings:");
            for warning in &report.warnings {
                println!(
                    "  - Alert {} (index {}): {}",
                    warning.alert_id, warning.index, warning.error
                );
            }
        }
    }

    if report.invalid_alerts > 0 {
        Err(IncidentCliError::ValidationFailed(report.invalid_alerts))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), IncidentCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} version {}", PRODUCER_NAME, CRATE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}, report: {}", SCHEMA_VERSION, REPORT_VERSION),
    });

    if let Some(config_path) = config {
        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match ClusterConfig::from_json(&content) {
                    Ok(parsed) => checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid (eps_spatial_m={}, eps_temporal_s={}, min_neighbors={})",
                            parsed.eps_spatial_m, parsed.eps_temporal_s, parsed.min_neighbors
                        ),
                    }),
                    Err(e) => checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid config: {}", e),
                    }),
                },
                Err(e) => checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                }),
            }
        } else {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist; defaults will be used".to_string(),
            });
        }
    }

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
            message: "stdin is a pipe (use -i - to read alerts from it)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: CRATE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Incident Doctor Report");
        println!("======================");
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
        Err(IncidentCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), IncidentCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One object per alert:");
                println!("  - id (or uuid): opaque identifier");
                println!("  - latitude, longitude: degrees");
                println!("  - initial_time, end_time: RFC 3339 timestamps");
                println!("  - source: optional originating system");
                println!("  - tags: optional list of strings");
                println!();
                println!("Alerts whose end_time precedes initial_time are accepted as-is.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: {}", REPORT_VERSION);
                println!();
                println!("- producer: {{ name, version, instance_id }}");
                println!("- parameters: {{ eps_spatial_m, eps_temporal_s, min_neighbors }}");
                println!("- record_count, cluster_count, noise_count");
                println!("- clusters: Array of incidents containing:");
                println!("  - cluster: -1 for noise, otherwise a cluster id");
                println!("  - ids: member alert ids");
                println!("  - initial_time, end_time, total_time (seconds)");
                println!("  - estimated_center: {{ latitude, longitude }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, IncidentCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_alerts(input: &Path, format: &InputFormat) -> Result<Vec<RawAlert>, IncidentCliError> {
    let input_data = read_input(input)?;
    let alerts = match format {
        InputFormat::Ndjson => RawAlertAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => RawAlertAdapter::parse_array(&input_data)?,
    };
    Ok(alerts)
}

fn write_output(output: &Path, data: &str) -> Result<(), IncidentCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn resolve_config(
    params: &ParamArgs,
    min_neighbors: Option<usize>,
) -> Result<ClusterConfig, IncidentCliError> {
    let mut config = match &params.config {
        Some(path) => ClusterConfig::from_json(&fs::read_to_string(path)?)?,
        None => ClusterConfig::default(),
    };

    if let Some(eps) = params.eps_spatial {
        config.eps_spatial_m = eps;
    }
    if let Some(eps) = params.eps_temporal {
        config.eps_temporal_s = eps;
    }
    if let Some(min) = min_neighbors {
        config.min_neighbors = min;
    }

    config.validate()?;
    Ok(config)
}

fn format_report(
    report: &ClusterReport,
    format: &OutputFormat,
) -> Result<String, IncidentCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for cluster in &report.clusters {
                out.push_str(&serde_json::to_string(cluster)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(report)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn format_records(
    records: &[EventRecord],
    format: &OutputFormat,
) -> Result<String, IncidentCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for record in records {
                out.push_str(&serde_json::to_string(record)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)?),
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/geo.alert.v1.json",
        "title": "geo.alert.v1",
        "description": "Geotagged, time-interval-stamped alert",
        "type": "object",
        "required": ["latitude", "longitude", "initial_time", "end_time"],
        "properties": {
            "schema_version": { "type": "string", "const": "geo.alert.v1" },
            "id": { "type": "string" },
            "uuid": { "type": "string" },
            "latitude": { "type": "number", "minimum": -90, "maximum": 90 },
            "longitude": { "type": "number", "minimum": -180, "maximum": 180 },
            "initial_time": { "type": "string", "format": "date-time" },
            "end_time": { "type": "string", "format": "date-time" },
            "source": { "type": "string" },
            "tags": { "type": "array", "items": { "type": "string" } }
        },
        "oneOf": [
            { "required": ["id"] },
            { "required": ["uuid"] }
        ]
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/incident.report.v1.json",
        "title": "incident.report.v1",
        "description": "Incident clustering report",
        "type": "object",
        "required": ["report_version", "producer", "parameters", "clusters"],
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
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "parameters": {
                "type": "object",
                "properties": {
                    "eps_spatial_m": { "type": "number" },
                    "eps_temporal_s": { "type": "number" },
                    "min_neighbors": { "type": "integer" }
                }
            },
            "record_count": { "type": "integer" },
            "cluster_count": { "type": "integer" },
            "noise_count": { "type": "integer" },
            "clusters": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "cluster": { "type": "integer" },
                        "ids": { "type": "array", "items": { "type": "string" } },
                        "initial_time": { "type": "string", "format": "date-time" },
                        "end_time": { "type": "string", "format": "date-time" },
                        "total_time": { "type": "number" },
                        "estimated_center": {
                            "type": "object",
                            "properties": {
                                "latitude": { "type": "number" },
                                "longitude": { "type": "number" }
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
enum IncidentCliError {
    Io(io::Error),
    Compute(incident_cluster::ComputeError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for IncidentCliError {
    fn from(e: io::Error) -> Self {
        IncidentCliError::Io(e)
    }
}

impl From<incident_cluster::ComputeError> for IncidentCliError {
    fn from(e: incident_cluster::ComputeError) -> Self {
        IncidentCliError::Compute(e)
    }
}

impl From<serde_json::Error> for IncidentCliError {
    fn from(e: serde_json::Error) -> Self {
        IncidentCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<IncidentCliError> for CliError {
    fn from(e: IncidentCliError) -> Self {
        match e {
            IncidentCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            IncidentCliError::Compute(e) => {
                let hint = match e {
                    incident_cluster::ComputeError::InvalidConfig(_) => {
                        "Epsilons must be non-negative numbers"
                    }
                    _ => "Ensure input matches geo.alert.v1 schema",
                };
                CliError {
                    code: "COMPUTE_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            IncidentCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            IncidentCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} alerts failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            IncidentCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_alerts: usize,
    valid_alerts: usize,
    invalid_alerts: usize,
    errors: Vec<ValidationErrorDetail>,
    warnings: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    alert_id: String,
    error: String,
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
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
