//! # docvault CLI
//!
//! The `docvault` binary is the presentation layer over the document
//! registry. It renders the registry's five operations (add, list,
//! delete, delete-all, process, query) plus workspace initialization.
//!
//! ## Usage
//!
//! ```bash
//! docvault --config ./config/docvault.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docvault init` | Write a default config, empty catalog, and storage roots |
//! | `docvault add <paths>` | Register documents (per-path outcomes) |
//! | `docvault list` | Show the catalog as a table or JSON |
//! | `docvault delete --id <id>` | Remove one document and its folders |
//! | `docvault delete-all --yes` | Clear the catalog and sweep storage roots |
//! | `docvault process --id <id>` | Embed a document into its vector index |
//! | `docvault query --id <id> -q <text>` | Ask a question over an embedded document |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docvault::catalog::JsonCatalog;
use docvault::config::{self, Config};
use docvault::models::{AddOutcome, AddStatus};
use docvault::registry::DocumentRegistry;

/// docvault — a local-first document registry and lifecycle orchestrator
/// for retrieval-augmented querying.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; `docvault init` writes a commented default.
#[derive(Parser)]
#[command(
    name = "docvault",
    about = "docvault — a local-first document registry for retrieval-augmented querying",
    version,
    long_about = "docvault registers documents into a deduplicated catalog, copies them into \
    content-addressed storage folders, embeds them into per-document vector indices via a \
    configurable pipeline, and answers questions over embedded documents."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docvault.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the docvault workspace.
    ///
    /// Writes a default config file (if absent), creates an empty catalog
    /// and both storage roots. Idempotent — running it again is safe.
    Init,

    /// Register documents into the catalog.
    ///
    /// Each path is handled independently: a missing file, unsupported
    /// format, or duplicate produces a per-document rejection line while
    /// the rest of the batch continues.
    Add {
        /// Paths of the documents to register.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List all registered documents.
    List {
        /// Output format: `table` or `json`.
        #[arg(long, short, default_value = "table")]
        output: String,
    },

    /// Remove one document from the catalog and both storage roots.
    Delete {
        /// Document id to delete.
        #[arg(long, short)]
        id: String,
    },

    /// Remove every document from the catalog and both storage roots.
    DeleteAll {
        /// Confirm the bulk delete; refused without it.
        #[arg(long)]
        yes: bool,
    },

    /// Embed a document into its vector index.
    ///
    /// Runs the ingestion pipeline (extract, chunk, embed) and marks the
    /// document embedded on success. Requires an embedding provider in
    /// the config.
    Process {
        /// Document id to process.
        #[arg(long, short)]
        id: String,
    },

    /// Ask a question over one embedded document.
    ///
    /// Performs similarity search over the document's vector index and
    /// synthesizes an answer with the configured generation model.
    Query {
        /// Document id to query.
        #[arg(long, short)]
        id: String,

        /// The question text.
        #[arg(long, short = 'q')]
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docvault=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        run_init(&cli.config)?;
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    let registry = DocumentRegistry::from_config(&cfg);

    match cli.command {
        Commands::Init => unreachable!(),
        Commands::Add { paths } => {
            let outcomes = registry.add(&paths)?;
            print_add_outcomes(&outcomes);
        }
        Commands::List { output } => {
            run_list(&registry, &output)?;
        }
        Commands::Delete { id } => {
            registry.delete(&id)?;
            println!("Document deleted: {}", id);
        }
        Commands::DeleteAll { yes } => {
            let removed = registry.delete_all(yes)?;
            println!("All documents deleted ({} removed).", removed);
        }
        Commands::Process { id } => {
            registry.process(&id).await?;
            println!("Document processed: {}", id);
        }
        Commands::Query { id, question } => {
            let answer = registry.query(&id, &question).await?;
            println!("Question: {}", question);
            println!();
            println!("Answer: {}", answer.text);
            println!();
            println!("Sources: {}", answer.sources.join(", "));
        }
    }

    Ok(())
}

/// Write the default config if absent, then create catalog and roots.
fn run_init(config_path: &PathBuf) -> Result<()> {
    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, config::default_config_toml())?;
        println!("Wrote default config: {}", config_path.display());
    }

    let cfg: Config = config::load_config(config_path)?;
    let catalog = JsonCatalog::new(cfg.catalog.path.clone());
    catalog
        .initialize()
        .map_err(|e| anyhow::anyhow!("failed to initialize catalog: {}", e))?;

    let registry = DocumentRegistry::from_config(&cfg);
    registry.initialize_storage()?;

    println!("Workspace initialized successfully.");
    Ok(())
}

fn print_add_outcomes(outcomes: &[AddOutcome]) {
    for outcome in outcomes {
        match &outcome.status {
            AddStatus::Added { id } => {
                println!("added: {} (id {})", outcome.document.display(), id);
            }
            AddStatus::Rejected(rejection) => {
                println!(
                    "rejected: {} ({})",
                    outcome.document.display(),
                    rejection.message()
                );
            }
        }
    }
    let added = outcomes.iter().filter(|o| o.is_added()).count();
    println!("{} of {} documents added", added, outcomes.len());
}

fn run_list(registry: &DocumentRegistry, output: &str) -> Result<()> {
    let records = registry.list()?;
    if output.eq_ignore_ascii_case("json") {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No documents in the catalog.");
        return Ok(());
    }

    println!(
        "{:<6} {:<40} {:<12} {:<8} {:<8}",
        "ID", "NAME", "SIZE", "FORMAT", "EMBEDDED"
    );
    for record in &records {
        println!(
            "{:<6} {:<40} {:<12} {:<8} {:<8}",
            record.id,
            record.name,
            record.size,
            record.format,
            if record.embedded { "True" } else { "False" }
        );
    }
    println!("Total documents: {}", records.len());
    Ok(())
}
