//! Command-line interface for topic discovery and hybrid search.

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use topica::display::{
    PhaseProgressBar, create_spinner, extractions_table, search_results_table, topics_table,
};
use topica::logging::init_logging;
use topica::pipeline::{BatchExtraction, EmbeddingPass, PatternExtractor};
use topica::search::HybridSearchEngine;
use topica::topics::TopicBuilder;
use topica::{AppContext, Document, DocumentId, Settings, TopicaError, TopicaResult};

/// Topic discovery and hybrid search for short text documents
#[derive(Parser)]
#[command(
    name = "topica",
    version = env!("CARGO_PKG_VERSION"),
    about = "Topic discovery and hybrid search for short text documents",
    long_about = "Import documents, embed them, group them into topics, and search them by meaning and keywords.",
    next_line_help = true
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    #[command(about = "Set up .topica directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    #[command(about = "Display active settings")]
    Config,

    #[command(about = "Import documents from a JSON Lines file ({\"id\": 1, \"text\": \"...\"} per line)")]
    Import {
        /// Path to the .jsonl file
        path: PathBuf,
    },

    #[command(about = "Embed and index every document without a vector")]
    Embed,

    #[command(about = "Group embedded documents into topics")]
    Cluster {
        /// Number of topics (defaults to clustering.k, or the elbow heuristic)
        #[arg(short, long)]
        k: Option<usize>,
    },

    #[command(about = "List topics from the latest clustering run")]
    Topics,

    #[command(about = "Search documents by meaning and keywords")]
    Search {
        /// Query text
        query: String,

        /// Maximum number of results (defaults to search.limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    #[command(about = "Extract tasks and ideas from all documents")]
    Extract,
}

#[derive(Debug, Deserialize)]
struct ImportRecord {
    id: u64,
    text: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            for suggestion in e.recovery_suggestions() {
                eprintln!("  - {suggestion}");
            }
            std::process::exit(1);
        }
    };
    init_logging(&settings.logging, cli.debug || settings.debug);

    if let Err(e) = run(cli.command, settings).await {
        eprintln!("Error: {e:#}");
        if let Some(topica_error) = e.downcast_ref::<TopicaError>() {
            for suggestion in topica_error.recovery_suggestions() {
                eprintln!("  - {suggestion}");
            }
        }
        std::process::exit(1);
    }
}

fn load_settings(config: Option<&Path>) -> TopicaResult<Settings> {
    let loaded = match config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    loaded.map_err(|e| TopicaError::Config {
        reason: e.to_string(),
    })
}

async fn run(command: Commands, settings: Settings) -> anyhow::Result<()> {
    match command {
        Commands::Init { force } => {
            let root = std::env::current_dir()?;
            let path = Settings::init_config_file(&root, force).map_err(|e| anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::Import { path } => {
            let context = AppContext::open(settings)?;
            let imported = import_jsonl(&context, &path)?;
            println!("Imported {imported} documents from {}", path.display());
        }

        Commands::Embed => {
            let spinner = create_spinner("Loading embedding model");
            let context = AppContext::open(settings)?.with_fastembed(false);
            spinner.finish_and_clear();
            let context = context?;

            let progress = PhaseProgressBar::new();
            let stats = EmbeddingPass::from_context(&context)?
                .run(Some(&progress))
                .await;
            progress.finish();
            let stats = stats?;

            println!(
                "Embedded {} documents in {} batches ({} already embedded)",
                stats.embedded, stats.batches, stats.skipped
            );
        }

        Commands::Cluster { k } => {
            let context = AppContext::open(settings)?;
            let builder = TopicBuilder::from_context(&context);
            let builder = match k {
                Some(k) => builder.with_k(Some(k)),
                None => builder,
            };

            let progress = PhaseProgressBar::new();
            let report = builder.rebuild(Some(&progress));
            progress.finish();
            let report = report?;

            if report.is_empty() {
                println!("No embedded documents. Run 'topica embed' first.");
                return Ok(());
            }

            let source = if report.k_suggested { "suggested" } else { "configured" };
            println!(
                "Clustered {} documents into {} topics (k={} {source}, {} iterations, inertia {:.3})",
                report.documents,
                report.topics.len(),
                report.k,
                report.iterations,
                report.inertia
            );
            println!("{}", topics_table(&report.topics));
        }

        Commands::Topics => {
            let context = AppContext::open(settings)?;
            let topics = context.store().topics()?;
            if topics.is_empty() {
                println!("No topics yet. Run 'topica cluster' first.");
            } else {
                println!("{}", topics_table(&topics));
            }
        }

        Commands::Search { query, limit } => {
            let limit = limit.unwrap_or(settings.search.limit);
            let context = AppContext::open(settings)?.with_fastembed(false)?;
            let engine = HybridSearchEngine::from_context(&context)?;

            let output = engine.search(&query, limit).await?;
            if let topica::LexicalOutcome::Failed { reason } = &output.lexical {
                eprintln!("Warning: keyword search failed, showing semantic matches only ({reason})");
            }

            if output.results.is_empty() {
                println!("No results for '{query}'");
            } else {
                println!("{}", search_results_table(&output));
            }
        }

        Commands::Extract => {
            let context = AppContext::open(settings)?;
            let documents = context.store().documents()?;

            let progress = PhaseProgressBar::new();
            let report = BatchExtraction::from_context(&context, Arc::new(PatternExtractor))
                .run(documents, Some(&progress))
                .await;
            progress.finish();
            let report = report?;

            if !report.items.is_empty() {
                println!("{}", extractions_table(&report.items));
            }
            println!(
                "Found {} items in {} batches",
                report.items.len(),
                report.batches
            );
            for failure in &report.failures {
                eprintln!(
                    "Skipped batch {} ({} documents): {}",
                    failure.batch + 1,
                    failure.document_ids.len(),
                    failure.reason
                );
            }
        }
    }

    Ok(())
}

fn import_jsonl(context: &AppContext, path: &Path) -> anyhow::Result<usize> {
    let file =
        std::fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let store = context.store();
    let mut imported = 0;

    for (line_number, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: ImportRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid record", path.display(), line_number + 1))?;
        store.upsert_document(Document::new(DocumentId::new(record.id), record.text))?;
        imported += 1;
    }

    store.flush()?;
    Ok(imported)
}
