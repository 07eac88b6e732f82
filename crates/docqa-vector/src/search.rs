use arrow_array::{Array, Float32Array, Int32Array, Int64Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;
use tracing::debug;

use docqa_core::error::{Error, Result};
use docqa_core::types::{Chunk, Meta, RetrievedChunk};
use crate::schema::{COL_CHUNK_ID, COL_CONTENT, COL_DISTANCE, COL_DOC_ID, COL_LOCATION, COL_METADATA, COL_PAGE};
use crate::table::{backend, VectorIndex};

impl VectorIndex {
	/// Top `k` chunks by cosine similarity to `query`, most similar first.
	/// Returns an empty list when the collection has not been built.
	pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
		if !self.exists().await? { return Ok(Vec::new()); }
		let query_vec = self.embedder
			.embed_batch(&[query.to_string()])
			.map_err(|e| Error::Embedding(format!("{e:#}")))?
			.pop()
			.ok_or_else(|| Error::Embedding("provider returned no vector for the query".into()))?;
		let table = self.db.open_table(&self.collection).execute().await.map_err(backend)?;
		let mut stream = table
			.vector_search(query_vec)
			.map_err(backend)?
			.distance_type(DistanceType::Cosine)
			.limit(k)
			.execute()
			.await
			.map_err(backend)?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await.map_err(backend)? {
			hits.extend(decode_batch(&batch)?);
		}
		// stable: ties keep the backend's order
		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(k);
		debug!("'{}' -> {} hits from '{}'", query, hits.len(), self.collection);
		Ok(hits)
	}
}

fn decode_batch(batch: &RecordBatch) -> Result<Vec<RetrievedChunk>> {
	let chunk_ids = column::<Int64Array>(batch, COL_CHUNK_ID)?;
	let doc_ids = column::<StringArray>(batch, COL_DOC_ID)?;
	let pages = column::<Int32Array>(batch, COL_PAGE)?;
	let locations = column::<StringArray>(batch, COL_LOCATION)?;
	let contents = column::<StringArray>(batch, COL_CONTENT)?;
	let metadata = column::<StringArray>(batch, COL_METADATA)?;
	let distances = column::<Float32Array>(batch, COL_DISTANCE)?;

	let mut out = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		let meta: Meta = serde_json::from_str(metadata.value(i)).map_err(backend)?;
		let chunk = Chunk {
			content: contents.value(i).to_string(),
			doc_id: doc_ids.value(i).to_string(),
			chunk_id: chunk_ids.value(i) as usize,
			page: if pages.is_null(i) { None } else { Some(pages.value(i) as u32) },
			location: locations.value(i).to_string(),
			metadata: meta,
		};
		out.push(RetrievedChunk { chunk, score: 1.0 - distances.value(i) });
	}
	Ok(out)
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<T>())
		.ok_or_else(|| Error::Index(format!("column '{name}' missing or of unexpected type")))
}
