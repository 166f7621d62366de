//! Archivum CLI - semantic and metadata retrieval over archived documents.
//!
//! # Usage
//!
//! ```bash
//! # Build the index from an exported document list
//! archivum reindex documents.json
//!
//! # Semantic search
//! archivum search "Acme invoice"
//! archivum search "Acme invoice" --json
//!
//! # Metadata filters, optionally ranked by free text
//! archivum retrieve documents.json --filter Tipo=fattura --query "acme"
//!
//! # Run as JSON-lines bridge for a host application
//! archivum serve
//! ```

mod commands;
mod config;
mod output;
mod serve;

use anyhow::Result;
use archivum_core::metadata::Filter;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Archivum retrieval CLI.
///
/// Indexes document text for semantic search and matches document metadata
/// against filters. The index is stored in the platform data directory.
#[derive(Parser)]
#[command(name = "archivum", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Custom data directory (default: $ARCHIVUM_DATA_DIR or platform standard location)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Keep the index in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear the index and embed every document in a JSON file
    Reindex {
        /// JSON array of {id, text, metadata} documents
        documents: PathBuf,
    },
    /// Embed and store a single document
    Ingest {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        text: String,
    },
    /// Rank indexed documents by similarity to a query
    Search { query: String },
    /// Filter documents by metadata, optionally ranked by free text
    Retrieve {
        /// JSON array of {id, text, metadata} documents
        documents: PathBuf,
        /// Metadata filter as key=value (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<Filter>,
        /// Free text for semantic ranking
        #[arg(short, long)]
        query: Option<String>,
    },
    /// List metadata keys available for filtering
    Keys {
        /// JSON array of {id, text, metadata} documents
        documents: PathBuf,
        /// Group keys by their parent object
        #[arg(long)]
        grouped: bool,
    },
    /// Serve the JSON-lines protocol on stdin/stdout
    Serve,
    /// Show index statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for results and the protocol.
    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let data_dir = cli.data_dir.as_deref();

    let report = match &cli.command {
        Commands::Serve => {
            let defaults = config::index_config(data_dir, cli.ephemeral)?;
            return serve::run_server(defaults).await;
        }
        Commands::Keys { documents, grouped } => commands::keys(documents, *grouped)?,
        Commands::Reindex { documents } => {
            let index_config = config::index_config(data_dir, cli.ephemeral)?;
            commands::reindex(index_config, documents, !cli.json).await?
        }
        Commands::Ingest { id, text } => {
            let index_config = config::index_config(data_dir, cli.ephemeral)?;
            commands::ingest(index_config, *id, text).await?
        }
        Commands::Search { query } => {
            let index_config = config::index_config(data_dir, cli.ephemeral)?;
            commands::search(index_config, query).await?
        }
        Commands::Retrieve {
            documents,
            filters,
            query,
        } => {
            let index_config = config::index_config(data_dir, cli.ephemeral)?;
            commands::retrieve(index_config, documents, filters, query.as_deref()).await?
        }
        Commands::Stats => {
            let index_config = config::index_config(data_dir, cli.ephemeral)?;
            commands::stats(index_config).await?
        }
    };

    let output = if cli.json {
        output::format_json(&report)
    } else {
        output::format_human(&report)
    };
    println!("{}", output);

    Ok(())
}
