//! Merkabah CLI - harmony scoring, chat ingestion and multi-backend orchestration
//!
//! # Usage
//!
//! ```bash
//! # Parse a chat export and print the messages
//! merkabah extract chat.txt
//!
//! # Batch statistics, or a full export document
//! merkabah analyze chat.txt
//! merkabah export chat.txt --output archive.json
//!
//! # Score and route one message
//! merkabah pipe "Thanks, that was great!"
//!
//! # Ask several backends at once
//! merkabah --config merkabah.yaml orchestrate "What is harmony?" --backend ollama
//! merkabah synthesize "What is harmony?"
//!
//! # Verbose logging
//! RUST_LOG=debug merkabah synthesize "hello"
//! ```
//!
//! Results go to stdout as JSON (the synthesis report is plain text); logs go
//! to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use merkabah_core::{
    analyze, default_export_name, route, BackendId, ExportDocument, ExportError, IngestError,
    Message, MessageIngester, Platform,
};
use merkabah_runtime::{Orchestrator, OrchestratorConfig};

/// Merkabah - harmony scoring and multi-backend orchestration
#[derive(Parser, Debug)]
#[command(name = "merkabah")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Orchestrator configuration file (YAML)
    #[arg(short = 'c', long, global = true, env = "MERKABAH_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, global = true, env = "MERKABAH_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract messages from a chat export
    Extract {
        /// Text export, one message per line
        file: PathBuf,
    },

    /// Batch statistics for a chat export
    Analyze { file: PathBuf },

    /// Write an export document for a chat export
    Export {
        file: PathBuf,

        /// Destination (default: merkabah_export_<timestamp>.json)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Score, classify and route one message
    Pipe {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Send a prompt to several backends concurrently
    Orchestrate {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// Restrict to these backends (repeatable; default: all configured)
        #[arg(short, long = "backend", value_name = "ID")]
        backends: Vec<BackendId>,
    },

    /// Orchestrate across every backend and print a report
    Synthesize {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// List supported platforms, or show one
    Platforms { name: Option<String> },
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "merkabah={level},merkabah_core={level},merkabah_runtime={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{json}");
    Ok(())
}

fn print_error(message: impl std::fmt::Display) -> Result<()> {
    print_json(&json!({ "status": "error", "message": message.to_string() }))
}

/// Only a missing input file is fatal; every other ingestion problem is
/// reported on stdout.
fn ingestion_failure(error: &IngestError) -> Result<ExitCode> {
    print_error(error)?;
    Ok(match error {
        IngestError::FileNotFound(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

fn load_config(path: Option<&Path>) -> Result<OrchestratorConfig> {
    match path {
        Some(path) => {
            let config = OrchestratorConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            info!(path = %path.display(), "Configuration loaded");
            Ok(config)
        }
        None => Ok(OrchestratorConfig::default()),
    }
}

fn orchestrator(config_path: Option<&Path>) -> Result<Orchestrator> {
    let config = load_config(config_path)?;
    let descriptors = config.resolve_from_env();
    debug!(backends = descriptors.len(), "Backends resolved");
    Ok(Orchestrator::new(descriptors))
}

fn ingest(file: &Path) -> Result<Vec<Message>, IngestError> {
    let messages = MessageIngester::ingest_file(file)?;
    info!(path = %file.display(), messages = messages.len(), "Chat export ingested");
    Ok(messages)
}

async fn run(args: Args) -> Result<ExitCode> {
    match args.command {
        Command::Extract { file } => match ingest(&file) {
            Ok(messages) => print_json(&json!({
                "status": "success",
                "messages_extracted": messages.len(),
                "messages": messages,
            }))?,
            Err(e) => return ingestion_failure(&e),
        },

        Command::Analyze { file } => {
            let analysis = ingest(&file).and_then(|messages| analyze(&messages));
            match analysis {
                Ok(analysis) => print_json(&analysis)?,
                Err(e) => return ingestion_failure(&e),
            }
        }

        Command::Export { file, output } => {
            let now = Utc::now();
            let document = match ingest(&file) {
                Ok(messages) => ExportDocument::from_messages(messages, now),
                Err(e) => return ingestion_failure(&e),
            };
            let output = output.unwrap_or_else(|| PathBuf::from(default_export_name(now)));

            match document.and_then(|doc| doc.write_to(&output)) {
                Ok(receipt) => print_json(&json!({
                    "status": "success",
                    "exported_to": receipt.exported_to,
                    "size": receipt.size,
                }))?,
                Err(ExportError::Ingest(e)) => return ingestion_failure(&e),
                Err(e) => print_error(e)?,
            }
        }

        Command::Pipe { message } => print_json(&route(&message.join(" ")))?,

        Command::Orchestrate { prompt, backends } => {
            let orchestrator = orchestrator(args.config.as_deref())?;
            let requested = (!backends.is_empty()).then_some(backends.as_slice());
            let result = orchestrator.orchestrate(&prompt.join(" "), requested).await;
            print_json(&result)?;
        }

        Command::Synthesize { prompt } => {
            let orchestrator = orchestrator(args.config.as_deref())?;
            print!("{}", orchestrator.synthesize(&prompt.join(" ")).await);
        }

        Command::Platforms { name: None } => {
            let catalog: Vec<_> = Platform::ALL.iter().map(|p| p.capabilities()).collect();
            print_json(&catalog)?;
        }

        Command::Platforms { name: Some(name) } => match name.parse::<Platform>() {
            Ok(platform) => print_json(&platform.capabilities())?,
            Err(e) => print_error(e)?,
        },
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(&args.log_level);
    run(args).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_orchestrate_backends() {
        let args = Args::try_parse_from([
            "merkabah",
            "orchestrate",
            "what",
            "is",
            "harmony",
            "--backend",
            "Ollama",
            "-b",
            "deepseek",
        ])
        .unwrap();

        match args.command {
            Command::Orchestrate { prompt, backends } => {
                assert_eq!(prompt.join(" "), "what is harmony");
                assert_eq!(backends, vec![BackendId::Ollama, BackendId::DeepSeek]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(Args::try_parse_from(["merkabah", "orchestrate", "hi", "--backend", "gemini"]).is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let args =
            Args::try_parse_from(["merkabah", "synthesize", "hello", "--config", "m.yaml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("m.yaml")));
    }

    #[test]
    fn test_missing_config_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/merkabah.yaml"))).is_err());
        assert!(load_config(None).is_ok());
    }

    #[test]
    fn test_only_missing_file_is_fatal() {
        let missing = IngestError::FileNotFound(PathBuf::from("nope.txt"));
        let code = |e: &IngestError| format!("{:?}", ingestion_failure(e).unwrap());
        assert_eq!(code(&missing), format!("{:?}", ExitCode::FAILURE));
        assert_eq!(code(&IngestError::NoMessages), format!("{:?}", ExitCode::SUCCESS));
    }
}
