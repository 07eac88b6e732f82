pub mod chunker;
pub mod config;
pub mod error;
pub mod loader;
pub mod splitter;
pub mod traits;
pub mod types;

pub use chunker::{Chunker, ChunkingConfig};
pub use error::{Error, Result};
pub use loader::{load_documents, Capabilities, LoadReport, LoaderOptions};
pub use types::{Chunk, Document, Meta, RetrievedChunk};
