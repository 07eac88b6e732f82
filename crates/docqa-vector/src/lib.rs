//! LanceDB-backed chunk index: rebuild from a source directory, retrieve
//! deduplicated top-k chunks.

pub mod manager;
pub mod schema;
mod search;
pub mod table;
mod writer;

pub use manager::{dedupe_by_location, get_or_open_index, indexed_count, rebuild, retrieve, IndexContext};
pub use table::VectorIndex;
