use indicatif::{ProgressBar, ProgressStyle};
use arrow_array::{RecordBatch, RecordBatchIterator, Int32Array, Int64Array, FixedSizeListArray, StringArray};
use std::sync::Arc;
use tracing::{debug, info};

use docqa_core::error::{Error, Result};
use docqa_core::types::Chunk;
use crate::schema::build_chunk_schema;
use crate::table::{backend, VectorIndex};

/// Rows per Arrow record batch handed to LanceDB.
const ROWS_PER_BATCH: usize = 1000;

impl VectorIndex {
	/// Embed and persist `chunks`. Every chunk is embedded before anything is
	/// written, so an embedding failure leaves the collection untouched.
	pub async fn add_chunks(&self, chunks: &[Chunk], embed_batch_size: usize, show_progress: bool) -> Result<usize> {
		if chunks.is_empty() { return Ok(0); }
		let embeddings = self.embed_chunks(chunks, embed_batch_size.max(1), show_progress)?;
		let dim = self.embedder.dim();
		let schema = build_chunk_schema(dim as i32);
		let mut batches = Vec::new();
		for (rows, vectors) in chunks.chunks(ROWS_PER_BATCH).zip(embeddings.chunks(ROWS_PER_BATCH)) {
			batches.push(chunks_to_record_batch(rows, vectors, dim)?);
		}
		let reader = Box::new(RecordBatchIterator::new(batches.into_iter().map(Ok), schema));
		if self.exists().await? {
			self.db.open_table(&self.collection).execute().await.map_err(backend)?.add(reader).execute().await.map_err(backend)?;
		} else {
			self.db.create_table(&self.collection, reader).execute().await.map_err(backend)?;
		}
		info!("Persisted {} chunks into collection '{}' at {}", chunks.len(), self.collection, self.persist_dir.display());
		Ok(chunks.len())
	}

	fn embed_chunks(&self, chunks: &[Chunk], batch_size: usize, show_progress: bool) -> Result<Vec<Vec<f32>>> {
		let pb = if show_progress { ProgressBar::new(chunks.len() as u64) } else { ProgressBar::hidden() };
		if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}") {
			pb.set_style(style.progress_chars("#>-"));
		}
		let dim = self.embedder.dim();
		let mut embeddings = Vec::with_capacity(chunks.len());
		for batch in chunks.chunks(batch_size) {
			let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
			let vectors = self.embedder.embed_batch(&texts).map_err(|e| Error::Embedding(format!("{e:#}")))?;
			if vectors.len() != texts.len() {
				return Err(Error::Embedding(format!("provider returned {} vectors for {} texts", vectors.len(), texts.len())));
			}
			if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
				return Err(Error::Embedding(format!("expected {dim}-d vectors, got {}", bad.len())));
			}
			embeddings.extend(vectors);
			pb.inc(batch.len() as u64);
			debug!("Embedded {}/{} chunks", embeddings.len(), chunks.len());
		}
		pb.finish_with_message("embedded");
		Ok(embeddings)
	}
}

fn chunks_to_record_batch(chunks: &[Chunk], embeddings: &[Vec<f32>], dim: usize) -> Result<RecordBatch> {
	let schema = build_chunk_schema(dim as i32);
	let mut chunk_ids = Vec::new(); let mut doc_ids = Vec::new(); let mut sources = Vec::new(); let mut pages = Vec::new(); let mut locations = Vec::new(); let mut contents = Vec::new(); let mut metadata = Vec::new(); let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
	for (chunk, vector) in chunks.iter().zip(embeddings) {
		chunk_ids.push(chunk.chunk_id as i64);
		doc_ids.push(chunk.doc_id.clone());
		sources.push(chunk.source().unwrap_or_default().to_string());
		pages.push(chunk.page.map(|p| p as i32));
		locations.push(chunk.location.clone());
		contents.push(chunk.content.clone());
		metadata.push(serde_json::to_string(&chunk.metadata).map_err(backend)?);
		vectors.push(Some(vector.iter().map(|&x| Some(x)).collect()));
	}
	let record_batch = RecordBatch::try_new(schema, vec![
		Arc::new(Int64Array::from(chunk_ids)),
		Arc::new(StringArray::from(doc_ids)),
		Arc::new(StringArray::from(sources)),
		Arc::new(Int32Array::from(pages)),
		Arc::new(StringArray::from(locations)),
		Arc::new(StringArray::from(contents)),
		Arc::new(StringArray::from(metadata)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim as i32)),
	]).map_err(backend)?;
	Ok(record_batch)
}
