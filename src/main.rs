use adherence_engine::config::AlgorithmConfig;
use adherence_engine::error::EngineError;
use adherence_engine::scoring::{AllowanceContext, MetricSample, RolloverLedger, ScoringEngine};
use adherence_engine::telemetry::{self, TelemetrySettings};
use adherence_engine::validation;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "adherence-engine",
    about = "Validate scoring configurations and compute adherence scores from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate every config in a JSON catalog
    Validate(ValidateArgs),
    /// Score an inline sample or a CSV batch against one config
    Score(ScoreArgs),
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Catalog file mapping config names to {kind, parameters} documents
    #[arg(long)]
    config: PathBuf,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Catalog file mapping config names to {kind, parameters} documents
    #[arg(long)]
    config: PathBuf,
    /// Config to score with; may be omitted when the catalog has exactly one
    #[arg(long)]
    name: Option<String>,
    /// Inline sample values: one for daily algorithms, a full window otherwise
    #[arg(long, value_delimiter = ',')]
    values: Option<Vec<f64>>,
    /// CSV batch: subject, week_start (YYYY-MM-DD), then one column per day
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Recommendation key used for the rollover ledger in CSV batches
    #[arg(long, default_value = "default")]
    recommendation: String,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid sample file: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("{0}")]
    Catalog(String),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = TelemetrySettings::from_env();
    if let Err(err) = telemetry::init(&settings) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Command::Validate(args) => validate_catalog(&args.config),
        Command::Score(args) => score_command(&args),
    }
}

fn load_catalog(path: &Path) -> Result<BTreeMap<String, serde_json::Value>, CliError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

fn validate_catalog(path: &Path) -> Result<ExitCode, CliError> {
    let catalog = load_catalog(path)?;
    let reports = validation::validate_batch(
        catalog
            .iter()
            .map(|(name, document)| (name.as_str(), document)),
    );

    let mut failures = 0usize;
    for (name, report) in &reports {
        let verdict = if report.valid { "valid" } else { "INVALID" };
        println!("{name}: {verdict}");
        for error in &report.errors {
            println!("  error: {error}");
        }
        for warning in &report.warnings {
            println!("  warning: {warning}");
        }
        if !report.valid {
            failures += 1;
        }
    }
    info!(total = reports.len(), failures, "validation finished");

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn select_config(
    catalog: &BTreeMap<String, serde_json::Value>,
    name: Option<&str>,
) -> Result<(String, AlgorithmConfig), CliError> {
    let (name, document) = match name {
        Some(name) => (
            name.to_string(),
            catalog
                .get(name)
                .ok_or_else(|| CliError::Catalog(format!("no config named '{name}' in catalog")))?,
        ),
        None => match catalog.iter().next() {
            Some((name, document)) if catalog.len() == 1 => (name.clone(), document),
            _ => {
                return Err(CliError::Catalog(format!(
                    "catalog holds {} configs; pick one with --name",
                    catalog.len()
                )))
            }
        },
    };
    let config = serde_json::from_value(document.clone())?;
    Ok((name, config))
}

fn score_command(args: &ScoreArgs) -> Result<ExitCode, CliError> {
    let catalog = load_catalog(&args.config)?;
    let (name, config) = select_config(&catalog, args.name.as_deref())?;
    let engine = ScoringEngine::new(config)?;

    if let Some(values) = &args.values {
        let sample = if values.len() == 1 {
            MetricSample::Value(values[0])
        } else {
            MetricSample::Daily(values.clone())
        };
        let result = engine.score(&sample)?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(csv_path) = &args.csv {
        return score_batch(&name, &engine, csv_path, &args.recommendation);
    }

    Err(CliError::Catalog(
        "supply a sample with --values or --csv".to_string(),
    ))
}

/// Score a CSV batch row by row; per-row failures are logged and skipped so
/// one bad sample never sinks the rest of the population.
fn score_batch(
    config_name: &str,
    engine: &ScoringEngine,
    path: &Path,
    recommendation: &str,
) -> Result<ExitCode, CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut ledger = RolloverLedger::new();
    let mut scored = 0usize;
    let mut skipped = 0usize;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        match score_row(engine, &record, recommendation, &mut ledger) {
            Ok((subject, result)) => {
                println!(
                    "{}",
                    serde_json::json!({
                        "config": config_name,
                        "subject": subject,
                        "result": result,
                    })
                );
                scored += 1;
            }
            Err(err) => {
                warn!(row, %err, "skipping unscorable row");
                skipped += 1;
            }
        }
    }

    info!(scored, skipped, "batch finished");
    Ok(ExitCode::SUCCESS)
}

fn score_row(
    engine: &ScoringEngine,
    record: &csv::StringRecord,
    recommendation: &str,
    ledger: &mut RolloverLedger,
) -> Result<(String, adherence_engine::scoring::ScoreResult), CliError> {
    let mut columns = record.iter();
    let subject = columns
        .next()
        .filter(|subject| !subject.is_empty())
        .ok_or_else(|| CliError::Catalog("row has no subject column".to_string()))?
        .to_string();
    let week_start = parse_date(
        columns
            .next()
            .ok_or_else(|| CliError::Catalog("row has no week_start column".to_string()))?,
    )
    .map_err(CliError::Catalog)?;

    let values = columns
        .map(|column| {
            column
                .parse::<f64>()
                .map_err(|_| CliError::Catalog(format!("'{column}' is not a number")))
        })
        .collect::<Result<Vec<f64>, CliError>>()?;
    let sample = if values.len() == 1 {
        MetricSample::Value(values[0])
    } else {
        MetricSample::Daily(values)
    };

    let context = AllowanceContext {
        subject: &subject,
        recommendation,
        week_start,
    };
    let result = engine.score_with_rollover(&sample, &context, ledger)?;
    Ok((subject, result))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("'{value}' is not a date in YYYY-MM-DD form"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_parse_in_iso_form_only() {
        assert!(parse_date("2026-08-24").is_ok());
        assert!(parse_date("08/24/2026").is_err());
    }

    #[test]
    fn selecting_from_a_multi_config_catalog_requires_a_name() {
        let catalog: BTreeMap<String, serde_json::Value> = serde_json::from_value(
            serde_json::json!({
                "steps": { "kind": "proportional", "parameters": { "target": 10000.0 } },
                "water": { "kind": "binary_threshold", "parameters": { "threshold": 2.0 } }
            }),
        )
        .expect("catalog parses");
        assert!(select_config(&catalog, None).is_err());
        let (name, config) = select_config(&catalog, Some("steps")).expect("named lookup works");
        assert_eq!(name, "steps");
        assert_eq!(config.kind(), "proportional");
    }

    #[test]
    fn a_single_config_catalog_needs_no_name() {
        let catalog: BTreeMap<String, serde_json::Value> = serde_json::from_value(
            serde_json::json!({
                "steps": { "kind": "proportional", "parameters": { "target": 10000.0 } }
            }),
        )
        .expect("catalog parses");
        let (name, config) = select_config(&catalog, None).expect("sole entry is selected");
        assert_eq!(name, "steps");
        assert_eq!(config.kind(), "proportional");
    }
}
