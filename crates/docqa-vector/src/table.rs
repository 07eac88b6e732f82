//! LanceDB connection and the collection handle.
//!
//! A [`VectorIndex`] pairs an open database directory with a collection name
//! and the embedder used to fill and query it. Writing lives in `writer.rs`,
//! querying in `search.rs`.

use lancedb::{connect, Connection};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;

pub(crate) fn backend<E: Display>(e: E) -> Error {
    Error::Index(e.to_string())
}

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.map_err(backend)
}

pub struct VectorIndex {
    pub(crate) db: Connection,
    pub(crate) collection: String,
    pub(crate) persist_dir: PathBuf,
    pub(crate) embedder: Arc<dyn Embedder>,
}

impl VectorIndex {
    pub async fn open(persist_dir: &Path, collection: &str, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let db = open_db(persist_dir.to_string_lossy().as_ref()).await?;
        Ok(Self { db, collection: collection.to_string(), persist_dir: persist_dir.to_path_buf(), embedder })
    }

    pub fn collection(&self) -> &str { &self.collection }
    pub fn persist_dir(&self) -> &Path { &self.persist_dir }

    /// Whether the collection table has been created in this database.
    pub async fn exists(&self) -> Result<bool> {
        let names = self.db.table_names().execute().await.map_err(backend)?;
        Ok(names.iter().any(|n| n == &self.collection))
    }

    /// Number of persisted chunks; 0 when the collection does not exist.
    pub async fn count(&self) -> Result<usize> {
        if !self.exists().await? { return Ok(0); }
        let table = self.db.open_table(&self.collection).execute().await.map_err(backend)?;
        table.count_rows(None).await.map_err(backend)
    }
}
