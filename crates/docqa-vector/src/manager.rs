//! Index lifecycle: full rebuild from a source directory and deduplicated
//! retrieval.
//!
//! Callers must not run `rebuild` and `retrieve` concurrently against the same
//! `persist_dir`; rebuild deletes and recreates that directory.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use docqa_core::config::Settings;
use docqa_core::error::{Error, Result};
use docqa_core::loader::{load_documents, Capabilities, LoaderOptions};
use docqa_core::traits::Embedder;
use docqa_core::types::RetrievedChunk;
use docqa_core::{Chunker, ChunkingConfig};

use crate::table::{backend, open_db, VectorIndex};

/// Everything an index operation needs, built once by the caller.
#[derive(Clone)]
pub struct IndexContext {
    pub embedder: Arc<dyn Embedder>,
    pub loader: LoaderOptions,
    pub chunking: ChunkingConfig,
    pub embed_batch_size: usize,
    pub show_progress: bool,
}

impl IndexContext {
    /// Default chunking, loader options from the detected capabilities.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            loader: LoaderOptions::from(Capabilities::detect()),
            chunking: ChunkingConfig::default(),
            embed_batch_size: 32,
            show_progress: false,
        }
    }

    pub fn from_settings(settings: &Settings, embedder: Arc<dyn Embedder>, capabilities: Capabilities) -> Self {
        Self {
            embedder,
            loader: LoaderOptions::from(capabilities),
            chunking: settings.chunking.clone(),
            embed_batch_size: settings.embedding.batch_size,
            show_progress: settings.embedding.show_progress,
        }
    }
}

/// Connect to the collection under `persist_dir`. Does not create the table.
pub async fn get_or_open_index(ctx: &IndexContext, persist_dir: &Path, collection: &str) -> Result<VectorIndex> {
    VectorIndex::open(persist_dir, collection, ctx.embedder.clone()).await
}

/// Replace the collection with the chunks of every document under `source_dir`.
///
/// The persisted index is only wiped when at least one chunk will be written;
/// an empty source directory leaves an existing index untouched and reports 0.
pub async fn rebuild(ctx: &IndexContext, source_dir: &Path, persist_dir: &Path, collection: &str) -> Result<(VectorIndex, usize)> {
    fs::create_dir_all(source_dir).map_err(|e| Error::persistence(source_dir, e))?;

    let report = load_documents(source_dir, ctx.loader);
    let chunks = Chunker::new(&ctx.chunking)?.chunk_documents(&report.documents);

    if chunks.is_empty() {
        if !report.failures.is_empty() {
            warn!("{} files under {} failed to load; nothing to index", report.failures.len(), source_dir.display());
        }
        info!("No chunks to index; leaving {} untouched", persist_dir.display());
        fs::create_dir_all(persist_dir).map_err(|e| Error::persistence(persist_dir, e))?;
        let index = get_or_open_index(ctx, persist_dir, collection).await?;
        return Ok((index, 0));
    }

    info!("Rebuilding '{}' at {} from {} documents ({} chunks)", collection, persist_dir.display(), report.documents.len(), chunks.len());
    reset_dir(persist_dir)?;
    let index = get_or_open_index(ctx, persist_dir, collection).await?;
    match index.add_chunks(&chunks, ctx.embed_batch_size, ctx.show_progress).await {
        Ok(count) => Ok((index, count)),
        Err(err) => {
            drop(index);
            // leave an empty directory rather than a half-written collection
            if let Err(cleanup) = reset_dir(persist_dir) {
                warn!("Could not clear {} after failed rebuild: {cleanup}", persist_dir.display());
            }
            Err(err)
        }
    }
}

/// Top `k` chunks for `query`, one per `(doc_id, location)`.
///
/// A `persist_dir` or collection that was never built yields an empty list.
pub async fn retrieve(ctx: &IndexContext, query: &str, persist_dir: &Path, k: usize, collection: &str) -> Result<Vec<RetrievedChunk>> {
    if k == 0 {
        return Err(Error::InvalidArgument("k must be at least 1".into()));
    }
    if !persist_dir.is_dir() {
        warn!("No index at {}; run a rebuild first", persist_dir.display());
        return Ok(Vec::new());
    }
    let index = get_or_open_index(ctx, persist_dir, collection).await?;
    if !index.exists().await? {
        warn!("Collection '{}' not found in {}", collection, persist_dir.display());
        return Ok(Vec::new());
    }
    let hits = index.similarity_search(query, k).await?;
    Ok(dedupe_by_location(hits))
}

/// Rows in the collection under `persist_dir`, without loading an embedder.
/// A missing directory or collection counts as 0.
pub async fn indexed_count(persist_dir: &Path, collection: &str) -> Result<usize> {
    if !persist_dir.is_dir() {
        return Ok(0);
    }
    let db = open_db(persist_dir.to_string_lossy().as_ref()).await?;
    let names = db.table_names().execute().await.map_err(backend)?;
    if !names.iter().any(|n| n == collection) {
        return Ok(0);
    }
    let table = db.open_table(collection).execute().await.map_err(backend)?;
    table.count_rows(None).await.map_err(backend)
}

/// Keep the first hit for each `(doc_id, location)`, preserving order.
pub fn dedupe_by_location(hits: Vec<RetrievedChunk>) -> Vec<RetrievedChunk> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| seen.insert((hit.chunk.doc_id.clone(), hit.chunk.location.clone())))
        .collect()
}

fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| Error::persistence(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| Error::persistence(dir, e))
}
