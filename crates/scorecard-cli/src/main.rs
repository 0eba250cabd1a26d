//! scorecard: score statement bundles and print the analysis records as JSON.
//!
//! Each input file holds one bundle (`incomeStatements`, `cashFlowStatements`,
//! `balanceSheets`, `monthlyPrices`). Results are printed to stdout as a JSON
//! array in the order the files were given; logs go to stderr.
//!
//! Usage:
//!   scorecard data/AAPL.json data/MSFT.json
//!   scorecard --window 8 --anchor 2022-12 data/AAPL.json
//!   scorecard --valuation-window 24 --pretty data/*.json

use std::path::{Path, PathBuf};

use analysis_core::CompanyFinancials;
use analysis_orchestrator::{config::parse_anchor, AnalysisConfig, CompanyAnalysis, ScoringPipeline};
use anyhow::{Context, Result};
use rayon::prelude::*;

/// Flags that consume the following argument.
const VALUE_FLAGS: &[&str] = &["--window", "--valuation-window", "--anchor"];

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn input_paths(args: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
        } else if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
        } else if !arg.starts_with("--") {
            paths.push(PathBuf::from(arg));
        }
    }
    paths
}

/// Environment configuration with command-line overrides applied on top.
fn resolve_config(args: &[String]) -> Result<AnalysisConfig> {
    let mut config = AnalysisConfig::from_env()?;
    if let Some(raw) = flag_value(args, "--window") {
        config.window_size = raw.parse().context("--window must be a positive integer")?;
    }
    if let Some(raw) = flag_value(args, "--valuation-window") {
        config.valuation_window_months =
            Some(raw.parse().context("--valuation-window must be a positive integer")?);
    }
    if let Some(raw) = flag_value(args, "--anchor") {
        config.anchor_date = Some(parse_anchor(raw)?);
    }
    config.validate()?;
    Ok(config)
}

fn load_bundle(path: &Path) -> Result<CompanyFinancials> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut financials = CompanyFinancials::from_json_str(&raw)
        .with_context(|| format!("Failed to parse statement bundle {}", path.display()))?;
    if financials.symbol.is_none() {
        financials.symbol = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase());
    }
    Ok(financials)
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  scorecard [OPTIONS] FILE...        Score one statement bundle per file");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --window N              Trailing quarters per pillar (default: SCORE_WINDOW_SIZE or 12)");
    eprintln!("  --valuation-window N    Months in the valuation regression (default: window x 3)");
    eprintln!("  --anchor DATE           Point-in-time cutoff, YYYY-MM-DD or YYYY-MM");
    eprintln!("  --pretty                Pretty-print the JSON output");
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "scorecard=info,analysis_orchestrator=info".into())
    };

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let paths = input_paths(&args);
    if paths.is_empty() || args.iter().any(|a| a == "--help") {
        print_usage();
        std::process::exit(1);
    }
    let pretty = args.iter().any(|a| a == "--pretty");

    let config = resolve_config(&args)?;
    tracing::info!(
        files = paths.len(),
        window_size = config.window_size,
        valuation_window = config.valuation_window(),
        anchor = ?config.anchor_date,
        "scorecard starting"
    );
    let pipeline = ScoringPipeline::new(config)?;

    let started = chrono::Utc::now();
    let analyses: Vec<CompanyAnalysis> = paths
        .par_iter()
        .map(|path| load_bundle(path).map(|financials| pipeline.analyze(&financials)))
        .collect::<Result<_>>()?;

    let output = if pretty {
        serde_json::to_string_pretty(&analyses)?
    } else {
        serde_json::to_string(&analyses)?
    };
    println!("{output}");

    tracing::info!(
        scored = analyses.len(),
        elapsed_ms = (chrono::Utc::now() - started).num_milliseconds(),
        "scorecard finished"
    );
    Ok(())
}
