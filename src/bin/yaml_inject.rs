//! yaml_inject CLI
//!
//! Expands `(( inject ... ))` markers in a YAML document and prints the
//! result.
//!
//! # Usage
//!
//! ```bash
//! # Expand a file to stdout
//! yaml_inject manifest.yml
//!
//! # Read stdin, write to a file, allow deeper nesting
//! cat manifest.yml | yaml_inject --budget 128 --output expanded.yml
//!
//! # Trace every resolution step
//! yaml_inject --trace manifest.yml
//! ```
//!
//! Reads config from env vars (a `.env` file is honoured):
//!   YAML_INJECT_BUDGET - nested expansion budget (default: 64, max: 128)
//!   RUST_LOG           - tracing filter (default: warn)

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Parser;
use yaml_inject::{Document, InjectConfig};

#[derive(Parser)]
#[command(name = "yaml_inject")]
#[command(version)]
#[command(about = "Expand (( inject ... )) markers in a YAML document")]
#[command(long_about = None)]
struct Cli {
    /// Input file (reads stdin if not provided)
    file: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// YAML config file with resolver settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Nested expansion budget per marker, at most 128 (overrides config and env)
    #[arg(long)]
    budget: Option<i32>,

    /// Log resolution at debug level
    #[arg(long)]
    debug: bool,

    /// Log resolution at trace level
    #[arg(long, conflicts_with = "debug")]
    trace: bool,
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let fallback = if cli.trace {
        "trace"
    } else if cli.debug {
        "debug"
    } else {
        "warn"
    };
    let filter = if cli.trace || cli.debug {
        tracing_subscriber::EnvFilter::new(fallback)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<InjectConfig> {
    let base = match &cli.config {
        Some(path) => InjectConfig::from_path(path)?,
        None => InjectConfig::default(),
    };
    let config = base.with_env_overrides(|name| std::env::var(name).ok());
    Ok(match cli.budget {
        Some(budget) if budget > 0 => config.with_budget(budget),
        Some(budget) => anyhow::bail!("--budget must be positive, got {}", budget),
        None => config,
    })
}

fn read_input(file: &Option<PathBuf>) -> Result<Document> {
    match file {
        Some(path) => Ok(Document::from_path(path)?),
        None => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .map_err(|e| anyhow!("Failed to read stdin: {}", e))?;
            Ok(Document::from_yaml_str(&content)?)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let mut doc = read_input(&cli.file)?;

    let report = doc.post_process(&config)?;
    tracing::info!(
        visited = report.visited,
        injected = report.injected,
        "inject pass finished"
    );

    let rendered = doc.to_yaml_string()?;
    match &cli.output {
        Some(path) => std::fs::write(path, rendered)
            .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?,
        None => print!("{}", rendered),
    }
    Ok(())
}
