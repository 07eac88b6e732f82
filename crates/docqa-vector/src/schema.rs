use arrow_schema::{Schema, Field, DataType};
use std::sync::Arc;

pub const COL_CHUNK_ID: &str = "chunk_id";
pub const COL_DOC_ID: &str = "doc_id";
pub const COL_SOURCE: &str = "source";
pub const COL_PAGE: &str = "page";
pub const COL_LOCATION: &str = "location";
pub const COL_CONTENT: &str = "content";
pub const COL_METADATA: &str = "metadata";
pub const COL_VECTOR: &str = "vector";
/// Added by LanceDB to vector search results.
pub const COL_DISTANCE: &str = "_distance";

/// Row layout of a collection. `metadata` holds the full chunk metadata as JSON.
pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(COL_CHUNK_ID, DataType::Int64, false),
		Field::new(COL_DOC_ID, DataType::Utf8, false),
		Field::new(COL_SOURCE, DataType::Utf8, false),
		Field::new(COL_PAGE, DataType::Int32, true),
		Field::new(COL_LOCATION, DataType::Utf8, false),
		Field::new(COL_CONTENT, DataType::Utf8, false),
		Field::new(COL_METADATA, DataType::Utf8, false),
		Field::new(COL_VECTOR, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
