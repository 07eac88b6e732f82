/// Text to vector capability consumed by the index.
///
/// Implementations must return vectors of length [`Embedder::dim`], and the
/// same embedder configuration must be used for indexing and querying.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}
