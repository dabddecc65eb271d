//! GraphQL Armor check binary.
//!
//! Run with: `graphql-armor --config policy.yaml --query document.json`
//!
//! Evaluates a parsed query document (JSON) against a protection policy
//! (YAML) and prints the GraphQL error response when the query is rejected.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use zentinel_graphql_armor::{build_bundle, graphql_error_response, PolicyConfig, QueryDocument};

/// Check a GraphQL query document against a protection policy.
///
/// Guards:
/// - Character limit
/// - Cost analysis
/// - Alias limiting
/// - Directive limiting
/// - Depth limiting
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to policy file (YAML)
    #[arg(short, long, default_value = "armor.yaml")]
    config: PathBuf,

    /// Path to the parsed query document (JSON object, or array for a batch)
    #[arg(short, long)]
    query: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// A single document, or a batch of them as sent in a JSON array.
#[derive(Deserialize)]
#[serde(untagged)]
enum Request {
    Single(QueryDocument),
    Batch(Vec<QueryDocument>),
}

impl Request {
    fn into_documents(self) -> Vec<QueryDocument> {
        match self {
            Request::Single(document) => vec![document],
            Request::Batch(documents) => documents,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("GraphQL Armor v{}", env!("CARGO_PKG_VERSION"));
    info!("Config file: {}", args.config.display());

    // Load configuration
    let config = if args.config.exists() {
        let content = tokio::fs::read_to_string(&args.config)
            .await
            .context("Failed to read config file")?;
        PolicyConfig::from_yaml_str(&content).context("Failed to parse config file")?
    } else {
        info!("Config file not found, using defaults");
        PolicyConfig::default()
    };

    let bundle = build_bundle(config).context("Failed to build protection bundle")?;

    let content = tokio::fs::read_to_string(&args.query)
        .await
        .context("Failed to read query document")?;
    let request: Request =
        serde_json::from_str(&content).context("Failed to parse query document")?;
    let documents = request.into_documents();

    let mut violations = Vec::new();
    if let Some(batch) = bundle.check_batch(documents.len()).into_violation() {
        violations.push(batch);
    }
    for document in &documents {
        violations.extend(bundle.validate(document));
    }

    if violations.is_empty() {
        info!(query = %args.query.display(), "Query passed all guards");
        return Ok(ExitCode::SUCCESS);
    }

    warn!(
        query = %args.query.display(),
        violation_count = violations.len(),
        "Query rejected"
    );
    let response = graphql_error_response(&violations);
    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("Failed to encode response")?
    );

    Ok(ExitCode::FAILURE)
}
