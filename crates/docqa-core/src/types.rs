//! Domain types shared by the loader, the chunker and the vector index.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type Meta = HashMap<String, String>;

pub const SOURCE_KEY: &str = "source";
pub const PAGE_KEY: &str = "page";
pub const TOTAL_PAGES_KEY: &str = "total_pages";
pub const DOC_ID_KEY: &str = "doc_id";
pub const CHUNK_ID_KEY: &str = "chunk_id";
pub const LOCATION_KEY: &str = "location";

/// Placeholder `doc_id` for documents without a `source` entry.
pub const UNKNOWN_SOURCE: &str = "unknown_source";

/// A loaded source document: one per text file, one per page of a paginated file.
///
/// `metadata` always carries `source`; paginated formats add `page` (0-based)
/// and `total_pages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: Meta,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = Meta::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        Self { content: content.into(), metadata }
    }

    pub fn with_page(mut self, page: u32, total_pages: u32) -> Self {
        self.metadata.insert(PAGE_KEY.to_string(), page.to_string());
        self.metadata.insert(TOTAL_PAGES_KEY.to_string(), total_pages.to_string());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }

    pub fn page(&self) -> Option<u32> {
        self.metadata.get(PAGE_KEY).and_then(|p| p.parse().ok())
    }
}

/// A bounded text segment of a [`Document`] tagged with citation metadata.
///
/// - `doc_id`: basename of the source path
/// - `chunk_id`: sequence number across the whole chunking run
/// - `page`: source page, only for paginated formats
/// - `location`: human-readable citation label derived from `page`/`chunk_id`
/// - `metadata`: the parent document's metadata with the keys above written in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub doc_id: String,
    pub chunk_id: usize,
    pub page: Option<u32>,
    pub location: String,
    pub metadata: Meta,
}

impl Chunk {
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }

    /// Composite key used to collapse duplicate retrieval hits.
    pub fn citation_key(&self) -> (&str, &str) {
        (&self.doc_id, &self.location)
    }
}

/// Citation label for a chunk.
pub fn location_label(page: Option<u32>, chunk_id: usize) -> String {
    match page {
        Some(page) => format!("page {page}, chunk {chunk_id}"),
        None => format!("chunk {chunk_id}"),
    }
}

/// A chunk returned by similarity search. Higher `score` is more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}
