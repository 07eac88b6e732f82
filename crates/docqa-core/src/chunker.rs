use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::splitter::RecursiveCharacterSplitter;
use crate::types::{
    location_label, Chunk, Document, CHUNK_ID_KEY, DOC_ID_KEY, LOCATION_KEY, UNKNOWN_SOURCE,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 900, chunk_overlap: 150 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        RecursiveCharacterSplitter::new(self.chunk_size, self.chunk_overlap).map(|_| ())
    }
}

/// Splits documents and stamps every chunk with citation metadata.
#[derive(Debug, Clone)]
pub struct Chunker {
    splitter: RecursiveCharacterSplitter,
}

impl Chunker {
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        let splitter = RecursiveCharacterSplitter::new(config.chunk_size, config.chunk_overlap)?;
        Ok(Self { splitter })
    }

    /// Chunk `documents` in order. `chunk_id` counts across the whole output,
    /// it is not reset per document.
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for document in documents {
            let source = document.source().unwrap_or(UNKNOWN_SOURCE);
            let doc_id = basename(source);
            let page = document.page();
            let pieces = self.splitter.split_text(&document.content);
            debug!(source, pieces = pieces.len(), "split document");

            for content in pieces {
                let chunk_id = chunks.len();
                let location = location_label(page, chunk_id);
                let mut metadata = document.metadata.clone();
                metadata.insert(DOC_ID_KEY.to_string(), doc_id.clone());
                metadata.insert(CHUNK_ID_KEY.to_string(), chunk_id.to_string());
                metadata.insert(LOCATION_KEY.to_string(), location.clone());
                chunks.push(Chunk { content, doc_id: doc_id.clone(), chunk_id, page, location, metadata });
            }
        }
        chunks
    }
}

fn basename(source: &str) -> String {
    Path::new(source)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| source.to_string())
}
