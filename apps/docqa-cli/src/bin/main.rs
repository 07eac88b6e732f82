use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docqa_core::config::{Config, Settings};
use docqa_core::loader::Capabilities;
use docqa_embed::build_embedder;
use docqa_vector::{indexed_count, rebuild, retrieve, IndexContext};

/// Document index for the question-answering assistant
#[derive(Parser)]
#[command(name = "docqa", version, about = "Build and query the document chunk index")]
struct Cli {
    /// Path to config.toml (defaults to ./config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Index directory (overrides data.persist_dir)
    #[arg(long, global = true)]
    persist: Option<PathBuf>,

    /// Collection name (overrides data.collection_name)
    #[arg(long, global = true)]
    collection: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Wipe the index and re-embed every document under the source directory
    Rebuild {
        /// Source directory (overrides data.source_dir)
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Print the top-k chunks for a query
    Query {
        text: String,
        /// Number of chunks to fetch before deduplication
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Show how many chunks the index holds
    Status,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let mut settings = config.settings()?;
    if let Some(dir) = &cli.persist { settings.data.persist_dir = dir.clone(); }
    if let Some(name) = &cli.collection { settings.data.collection_name = name.clone(); }
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let capabilities = Capabilities::detect();
    tracing::debug!("Capabilities: {:?}", capabilities);
    let persist_dir = &settings.data.persist_dir;
    let collection = settings.data.collection_name.as_str();

    match cli.command {
        Command::Rebuild { source } => {
            let source_dir = source.unwrap_or_else(|| settings.data.source_dir.clone());
            let ctx = IndexContext::from_settings(&settings, build_embedder(&settings.embedding)?, capabilities);
            let (index, count) = rebuild(&ctx, &source_dir, persist_dir, collection).await?;
            if count == 0 {
                println!("No documents under {}; existing index left as is", source_dir.display());
            } else {
                println!("✅ Indexed {} chunks from {} into '{}' at {}", count, source_dir.display(), index.collection(), index.persist_dir().display());
            }
        }
        Command::Query { text, k } => {
            let k = k.unwrap_or(settings.retrieval.top_k);
            let ctx = IndexContext::from_settings(&settings, build_embedder(&settings.embedding)?, capabilities);
            let hits = retrieve(&ctx, &text, persist_dir, k, collection).await?;
            println!("🔍 {} results for: \"{}\"", hits.len(), text);
            for (i, hit) in hits.iter().enumerate() {
                println!("\n  {}. score={:.4}  [{} | {}]", i + 1, hit.score, hit.chunk.doc_id, hit.chunk.location);
                println!("     {}", hit.chunk.content.replace('\n', " "));
            }
        }
        Command::Status => {
            let count = indexed_count(persist_dir, collection).await?;
            println!("📊 '{}' at {}: {} chunks", collection, persist_dir.display(), count);
        }
    }
    Ok(())
}
