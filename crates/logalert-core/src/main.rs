//! LogAlert CLI
//!
//! Command-line interface for the LogAlert rule evaluation engine.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing::info;

use logalert::alerting::{
    is_pattern_safe, safe_create_regex, AlertRunner, InMemoryAlertRepository, PassOutcome,
};
use logalert::config::LoggingConfig;
use logalert::ingest::{parse_logs, parse_timestamp, FileLogSource};
use logalert::models::{Alert, AlertRule};
use logalert::Config;

/// LogAlert - Log-driven alert rule evaluation
#[derive(Parser)]
#[command(name = "logalert")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "LOGALERT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one evaluation pass over a log file
    Evaluate {
        /// JSON file with the rule catalog
        #[arg(long)]
        rules: PathBuf,

        /// Raw log file, one entry per line
        #[arg(long)]
        logs: PathBuf,

        /// JSON file with existing alerts
        #[arg(long)]
        alerts: Option<PathBuf>,

        /// Evaluation time (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<String>,

        /// Write the resulting alert set to this JSON file
        #[arg(long)]
        write_alerts: Option<PathBuf>,
    },

    /// Parse a log file and print the normalized entries
    Parse {
        /// Raw log file, one entry per line
        #[arg(long)]
        logs: PathBuf,

        /// Time used for entries without a readable timestamp
        #[arg(long)]
        now: Option<String>,
    },

    /// Check whether a regex pattern would be accepted by the engine
    CheckPattern {
        /// Pattern to check
        pattern: String,

        /// Regex flags (i, m, s)
        #[arg(long, default_value = "")]
        flags: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    init_logging(&config.logging, cli.verbose);

    // Execute command
    let result = match cli.command {
        Commands::Evaluate {
            rules,
            logs,
            alerts,
            now,
            write_alerts,
        } => {
            run_evaluate(
                &config,
                &rules,
                &logs,
                alerts.as_deref(),
                now.as_deref(),
                write_alerts.as_deref(),
                cli.format,
            )
            .await
        }
        Commands::Parse { logs, now } => run_parse(&logs, now.as_deref(), cli.format).await,
        Commands::CheckPattern { pattern, flags } => run_check_pattern(&pattern, &flags, cli.format),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parse_now(raw: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    match raw {
        Some(raw) => parse_timestamp(raw).ok_or_else(|| anyhow!("invalid --now timestamp: {raw}")),
        None => Ok(Utc::now()),
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

async fn run_evaluate(
    config: &Config,
    rules_path: &Path,
    logs_path: &Path,
    alerts_path: Option<&Path>,
    now: Option<&str>,
    write_alerts: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let now = parse_now(now)?;
    let rules: Vec<AlertRule> = read_json(rules_path).await?;
    let alerts: Vec<Alert> = match alerts_path {
        Some(path) => read_json(path).await?,
        None => Vec::new(),
    };

    info!(rules = rules.len(), alerts = alerts.len(), %now, "Loaded evaluation inputs");

    let runner = AlertRunner::new(
        InMemoryAlertRepository::new(rules, alerts),
        FileLogSource::new(logs_path),
        config.engine.clone(),
    );
    let outcome = runner.run_once(now).await;

    if let Some(path) = write_alerts {
        let json = serde_json::to_string_pretty(&runner.repository().alerts())?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => print_outcome(&outcome),
    }

    if let Some(error) = &outcome.run.error {
        bail!("evaluation pass failed: {error}");
    }

    Ok(())
}

fn print_outcome(outcome: &PassOutcome) {
    let run = &outcome.run;

    println!("Evaluation run {} at {}", run.id, run.started_at.to_rfc3339());
    println!("  Rules evaluated: {}", run.rules_evaluated);
    println!("  Logs analyzed:   {}", run.logs_analyzed);
    println!("  Alerts created:  {}", run.alerts_created);
    println!("  Alerts resolved: {}", run.alerts_resolved);
    println!("  Duration:        {} ms", run.duration_ms);

    for alert in &outcome.batches.to_create {
        println!("  + [{}] {}", alert.severity, alert.title);
    }
    for id in &outcome.batches.to_resolve {
        println!("  - resolved {id}");
    }
    for error in &run.errors {
        println!("  ! {error}");
    }
}

async fn run_parse(logs_path: &Path, now: Option<&str>, format: OutputFormat) -> anyhow::Result<()> {
    let now = parse_now(now)?;
    let content = tokio::fs::read_to_string(logs_path)
        .await
        .with_context(|| format!("reading {}", logs_path.display()))?;
    let entries = parse_logs(content.lines(), now);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            for entry in &entries {
                println!(
                    "{} {:<5} {} {}",
                    entry.timestamp.to_rfc3339(),
                    entry.level.to_string(),
                    entry.function_name,
                    entry.message
                );
            }
            println!("{} entries parsed", entries.len());
        }
    }

    Ok(())
}

fn run_check_pattern(pattern: &str, flags: &str, format: OutputFormat) -> anyhow::Result<()> {
    let safe = is_pattern_safe(pattern);
    let compiles = safe_create_regex(pattern, flags).is_some();

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "pattern": pattern, "safe": safe, "accepted": compiles })
        ),
        OutputFormat::Text => {
            if compiles {
                println!("accepted: {pattern}");
            } else if safe {
                println!("rejected: {pattern} (invalid syntax or flags)");
            } else {
                println!("rejected: {pattern} (unsafe or too long)");
            }
        }
    }

    if !compiles {
        bail!("pattern rejected");
    }
    Ok(())
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "logalert", &mut io::stdout());
}
