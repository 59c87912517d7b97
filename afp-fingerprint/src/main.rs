//! afp - article fingerprinting command line
//!
//! **Usage:**
//! ```bash
//! afp fingerprint --html page.html --url https://example.com/a [--format markdown]
//! afp fingerprint --url URL --metadata meta.json --extraction goose=goose.txt --extraction newspaper=np.txt
//! afp normalize --source readability --url URL [FILE]
//! afp config [--write PATH]
//! ```
//!
//! Reports go to stdout, logs to stderr. Exit code 2 marks a degraded
//! fingerprint (no extraction survived normalization) or a discarded text.

use afp_common::config::{load_or_default, resolve_config_path, write_config};
use afp_common::AfpConfig;
use afp_fingerprint::extractors::{builtin_extractors, run_extractors_concurrently};
use afp_fingerprint::report::{render_html, render_markdown};
use afp_fingerprint::types::NormalizeOutcome;
use afp_fingerprint::{
    extract_metadata, ArticleMetadata, Fingerprinter, Normalizer, RawExtraction, RunStatus,
};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Consensus article fingerprinting
#[derive(Parser, Debug)]
#[command(name = "afp", version)]
#[command(about = "Fingerprint news articles by supermajority consensus of text extractors")]
struct Cli {
    /// Config file (overrides AFP_CONFIG and the platform default)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fingerprint one article
    Fingerprint {
        /// Page HTML (runs the built-in extractors unless --extraction is given)
        #[arg(long, value_name = "FILE")]
        html: Option<PathBuf>,

        /// URL the page was fetched from
        #[arg(long)]
        url: String,

        /// Article metadata JSON (canonical_url, publish_date, title)
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,

        /// Pre-computed extractor output, repeatable
        #[arg(long = "extraction", value_name = "NAME=FILE", value_parser = parse_extraction)]
        extractions: Vec<(String, PathBuf)>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Print the normalized form of one extractor output
    Normalize {
        /// Source id whose rules apply
        #[arg(long)]
        source: String,

        /// Article URL (drives site rules)
        #[arg(long)]
        url: String,

        /// Input text (stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Print the resolved configuration, or write the default one
    Config {
        /// Write the default configuration to PATH
        #[arg(long, value_name = "PATH")]
        write: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Markdown,
    Html,
}

fn parse_extraction(arg: &str) -> std::result::Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
            Ok((name.trim().to_string(), PathBuf::from(path.trim())))
        }
        _ => Err(format!("expected NAME=FILE, got '{}'", arg)),
    }
}

/// RUST_LOG wins; otherwise the configured level
fn init_logging(config: &AfpConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&config);
    debug!(
        config = ?resolve_config_path(cli.config.as_deref()),
        "Configuration resolved"
    );

    match cli.command {
        Command::Fingerprint {
            html,
            url,
            metadata,
            extractions,
            format,
        } => {
            run_fingerprint(
                &config,
                html.as_deref(),
                &url,
                metadata.as_deref(),
                &extractions,
                format,
            )
            .await
        }
        Command::Normalize { source, url, file } => run_normalize(&source, &url, file.as_deref()),
        Command::Config { write } => run_config(&config, write.as_deref()),
    }
}

async fn run_fingerprint(
    config: &AfpConfig,
    html_path: Option<&Path>,
    url: &str,
    metadata_path: Option<&Path>,
    extractions: &[(String, PathBuf)],
    format: OutputFormat,
) -> Result<ExitCode> {
    let html = html_path.map(read_file).transpose()?;

    // Step 1: raw extractions (files win over built-in extractors)
    let raw: Vec<RawExtraction> = if !extractions.is_empty() {
        extractions
            .iter()
            .map(|(name, path)| -> Result<RawExtraction> {
                Ok(RawExtraction::new(name.clone(), read_file(path)?))
            })
            .collect::<Result<_>>()?
    } else if let Some(html) = &html {
        let extractors = builtin_extractors(&config.extractors.enabled)?;
        run_extractors_concurrently(&extractors, html, url).await
    } else {
        bail!("either --html or at least one --extraction is required");
    };

    info!(url = %url, sources = raw.len(), "Fingerprinting article");
    let fingerprinter = Fingerprinter::new(config.pipeline.clone());

    // Step 2: metadata (explicit file is validated strictly), then the pipeline
    let report = match (metadata_path, &html) {
        (Some(path), _) => {
            let metadata: ArticleMetadata = serde_json::from_str(&read_file(path)?)
                .with_context(|| format!("Invalid metadata JSON in {}", path.display()))?;
            fingerprinter.build(&raw, &metadata, url)?
        }
        (None, Some(html)) => {
            fingerprinter.build_from_page(&raw, &extract_metadata(html, url), url)?
        }
        (None, None) => bail!("--metadata is required when --html is not given"),
    };

    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Markdown => render_markdown(&report, Utc::now()),
        OutputFormat::Html => render_html(&report, Utc::now()),
    };
    println!("{}", output);

    if report.status == RunStatus::Degraded {
        warn!(url = %url, "Degraded fingerprint: no extraction survived normalization");
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_normalize(source: &str, url: &str, file: Option<&Path>) -> Result<ExitCode> {
    let text = match file {
        Some(path) => read_file(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    match Normalizer::default().normalize(&RawExtraction::new(source, text), url) {
        NormalizeOutcome::Normalized(normalized) => {
            println!("{}", normalized.text);
            Ok(ExitCode::SUCCESS)
        }
        NormalizeOutcome::Discarded(reason) => {
            eprintln!("discarded: {}", reason);
            Ok(ExitCode::from(2))
        }
    }
}

fn run_config(config: &AfpConfig, write: Option<&Path>) -> Result<ExitCode> {
    match write {
        Some(path) => {
            write_config(&AfpConfig::default(), path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Default configuration written");
        }
        None => print!("{}", toml::to_string_pretty(config)?),
    }
    Ok(ExitCode::SUCCESS)
}
