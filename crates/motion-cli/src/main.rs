//! # motion-eval
//!
//! Loads an exported motion document and evaluates it outside the renderer.
//!
//! ## Commands
//! - `sample`: Print clip transforms and mask geometry at chosen times as JSON
//! - `check`: Report integrity problems without evaluating anything

mod sample;


use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use motion_core::{validate_document, EvalConfig};
use motion_data::ExportDocument;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "motion-eval")]
#[command(about = "Evaluate keyframe animation exports")]
#[command(version)]
pub(crate) struct Cli {
    /// Evaluation settings (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Sample clips at one or more times
    Sample {
        /// Export document (.json)
        #[arg(short, long)]
        input: PathBuf,

        /// Clip ids to sample; all clips when omitted
        #[arg(short, long)]
        clip: Vec<String>,

        /// Explicit sample times in seconds
        #[arg(short, long)]
        time: Vec<f64>,

        /// Range start in seconds, used when no --time is given
        #[arg(long, default_value_t = 0.0)]
        start: f64,

        /// Range end in seconds (inclusive)
        #[arg(long)]
        end: Option<f64>,

        /// Samples per second over the range; defaults to the document frame rate
        #[arg(long)]
        fps: Option<f64>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Check a document for integrity problems
    Check {
        /// Export document (.json)
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

pub(crate) fn load_config(path: Option<&Path>) -> Result<EvalConfig> {
    let Some(path) = path else {
        return Ok(EvalConfig::default());
    };
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    EvalConfig::from_json(&data).with_context(|| format!("Invalid config {}", path.display()))
}

pub(crate) fn load_document(path: &Path) -> Result<ExportDocument> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = motion_core::load_document(&data)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    info!(path = %path.display(), clips = doc.clips.len(), "loaded document");
    Ok(doc)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Sample {
            input,
            clip,
            time,
            start,
            end,
            fps,
            pretty,
        } => {
            let doc = load_document(&input)?;
            let times = sample::sample_times(&time, start, end, fps.or(doc.frame_rate))?;
            let records = sample::sample_document(&doc, &clip, &times, &config)?;
            let out = if pretty {
                serde_json::to_string_pretty(&records)?
            } else {
                serde_json::to_string(&records)?
            };
            println!("{out}");
            Ok(())
        }
        Commands::Check { input } => cmd_check(&input),
    }
}

fn cmd_check(input: &Path) -> Result<()> {
    let doc = load_document(input)?;
    let issues = validate_document(&doc);
    for issue in &issues {
        warn!("{issue}");
    }
    println!("{}", serde_json::to_string_pretty(&issues)?);
    if !issues.is_empty() {
        bail!("{} integrity issue(s) in {}", issues.len(), input.display());
    }
    info!("no integrity issues");
    Ok(())
}
