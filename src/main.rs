//! CLI entry point for `hdrbridge`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use hdrbridge::builder::{attachment_header, body_header, build_header, related_header};
use hdrbridge::config::Config;
use hdrbridge::error::HeaderError;
use hdrbridge::model::attachment::Attachment;
use hdrbridge::model::header_map::HeaderMap;
use hdrbridge::model::message::Message;
use hdrbridge::parser::header::parse_header;

#[derive(Parser)]
#[command(name = "hdrbridge", version, about = "Build and parse MIME header blocks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a header block or .eml file and print the message as JSON
    Parse { path: PathBuf },
    /// Build the header block for a message given as JSON
    Build {
        path: PathBuf,
        /// Print the body part header instead
        #[arg(long, conflicts_with = "related")]
        body: bool,
        /// Print the multipart/related part header instead
        #[arg(long)]
        related: bool,
    },
    /// Build an attachment part header from attachment JSON
    Attachment { path: PathBuf },
    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = hdrbridge::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level);

    match cli.command {
        Commands::Parse { path } => cmd_parse(&path),
        Commands::Build {
            path,
            body,
            related,
        } => cmd_build(&path, body, related, &config),
        Commands::Attachment { path } => cmd_attachment(&path),
        Commands::Config => cmd_config(&config),
    }
}

/// Set up tracing on stderr; `RUST_LOG` overrides the configured level.
fn setup_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(std::fs::read(path).map_err(|e| HeaderError::io(path, e))?)
}

/// Parse a header block and print the resulting message as JSON.
fn cmd_parse(path: &Path) -> anyhow::Result<()> {
    let raw = read_input(path)?;
    let header = HeaderMap::parse(&raw);
    tracing::info!(path = %path.display(), fields = header.len(), "Parsed header block");

    let msg = parse_header(header);
    println!("{}", serde_json::to_string_pretty(&msg)?);
    Ok(())
}

/// Build a message (or part) header from message JSON.
fn cmd_build(path: &Path, body: bool, related: bool, config: &Config) -> anyhow::Result<()> {
    let raw = read_input(path)?;
    let msg: Message = serde_json::from_slice(&raw)
        .with_context(|| format!("Invalid message JSON in {}", path.display()))?;

    let header = if body {
        body_header(&msg)
    } else if related {
        related_header(&msg)
    } else {
        build_header(&msg, &config.id_domains())
    };
    print!("{header}");
    Ok(())
}

/// Build an attachment part header from attachment JSON.
fn cmd_attachment(path: &Path) -> anyhow::Result<()> {
    let raw = read_input(path)?;
    let att: Attachment = serde_json::from_slice(&raw)
        .with_context(|| format!("Invalid attachment JSON in {}", path.display()))?;
    print!("{}", attachment_header(&att));
    Ok(())
}

fn cmd_config(config: &Config) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
