use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use docqa_core::traits::Embedder;
use docqa_core::Error;
use docqa_embed::HashEmbedder;
use docqa_vector::{indexed_count, rebuild, retrieve, IndexContext};

const COLLECTION: &str = "agentic_assistant";

fn context() -> IndexContext {
    IndexContext::new(Arc::new(HashEmbedder::new(256)))
}

fn seed_docs(dir: &Path) {
    fs::create_dir_all(dir.join("kitchen")).unwrap();
    fs::write(dir.join("fire.txt"), "fire safety basics keep a fire extinguisher near the stove and check smoke alarms monthly").unwrap();
    fs::write(dir.join("bread.txt"), "sourdough bread needs a mature starter flour water salt and a long cold proof").unwrap();
    fs::write(dir.join("kitchen/garden.txt"), "plant tomatoes after the last frost and water the garden beds deeply").unwrap();
}

fn basenames(dir: &Path) -> HashSet<String> {
    walk(dir).into_iter().filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string())).collect()
}

fn walk(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() { out.extend(walk(&path)); } else { out.push(path); }
    }
    out
}

#[tokio::test]
async fn rebuild_then_retrieve_cites_source_files() {
    let tmp = TempDir::new().unwrap();
    let (src, db) = (tmp.path().join("docs"), tmp.path().join("index"));
    seed_docs(&src);
    let ctx = context();

    let (index, count) = rebuild(&ctx, &src, &db, COLLECTION).await.expect("rebuild");
    assert_eq!(count, 3);
    assert_eq!(index.count().await.expect("count"), 3);

    let hits = retrieve(&ctx, "fire safety", &db, 6, COLLECTION).await.expect("retrieve");
    assert!(!hits.is_empty());
    assert_eq!(hits[0].chunk.doc_id, "fire.txt");

    let names = basenames(&src);
    let mut keys = HashSet::new();
    for hit in &hits {
        assert!(names.contains(&hit.chunk.doc_id), "unknown doc_id {}", hit.chunk.doc_id);
        assert!(keys.insert((hit.chunk.doc_id.clone(), hit.chunk.location.clone())), "duplicate citation");
        assert_eq!(hit.chunk.location, format!("chunk {}", hit.chunk.chunk_id));
        assert!(hit.chunk.metadata.contains_key("source"));
    }
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score, "results are ordered by similarity");
    }
}

#[tokio::test]
async fn rebuild_count_is_stable_across_runs() {
    let tmp = TempDir::new().unwrap();
    let (src, db) = (tmp.path().join("docs"), tmp.path().join("index"));
    seed_docs(&src);
    let long: String = (0..334).map(|i| format!("w{i:04}")).collect::<Vec<_>>().join(" ");
    fs::write(src.join("a.txt"), &long[..2000]).unwrap();
    let ctx = context();

    let (_, first) = rebuild(&ctx, &src, &db, COLLECTION).await.expect("first rebuild");
    let (index, second) = rebuild(&ctx, &src, &db, COLLECTION).await.expect("second rebuild");

    assert_eq!(first, 6, "three short files plus three chunks of a.txt");
    assert_eq!(first, second);
    assert_eq!(index.count().await.expect("count"), second, "old chunks do not survive a rebuild");
}

#[tokio::test]
async fn empty_source_leaves_existing_index_untouched() {
    let tmp = TempDir::new().unwrap();
    let (src, db) = (tmp.path().join("docs"), tmp.path().join("index"));
    seed_docs(&src);
    let ctx = context();
    rebuild(&ctx, &src, &db, COLLECTION).await.expect("rebuild");

    let empty_src = tmp.path().join("empty");
    let (index, count) = rebuild(&ctx, &empty_src, &db, COLLECTION).await.expect("empty rebuild");

    assert_eq!(count, 0);
    assert!(empty_src.is_dir(), "missing source dir is created");
    assert_eq!(index.count().await.expect("count"), 3);
    let hits = retrieve(&ctx, "sourdough bread", &db, 6, COLLECTION).await.expect("retrieve");
    assert!(!hits.is_empty());
}

#[tokio::test]
async fn unreadable_files_only_do_not_wipe_index() {
    let tmp = TempDir::new().unwrap();
    let (src, db) = (tmp.path().join("docs"), tmp.path().join("index"));
    seed_docs(&src);
    let ctx = context();
    rebuild(&ctx, &src, &db, COLLECTION).await.expect("rebuild");

    let broken = tmp.path().join("broken");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join("bad.txt"), [0xc3, 0x28]).unwrap();
    let (index, count) = rebuild(&ctx, &broken, &db, COLLECTION).await.expect("rebuild with only bad files");

    assert_eq!(count, 0);
    assert_eq!(index.count().await.expect("count"), 3);
}

#[tokio::test]
async fn removed_files_disappear_after_rebuild() {
    let tmp = TempDir::new().unwrap();
    let (src, db) = (tmp.path().join("docs"), tmp.path().join("index"));
    seed_docs(&src);
    let ctx = context();
    rebuild(&ctx, &src, &db, COLLECTION).await.expect("rebuild");

    fs::remove_file(src.join("bread.txt")).unwrap();
    let (_, count) = rebuild(&ctx, &src, &db, COLLECTION).await.expect("rebuild");
    assert_eq!(count, 2);

    let hits = retrieve(&ctx, "sourdough bread starter", &db, 10, COLLECTION).await.expect("retrieve");
    assert!(hits.iter().all(|h| h.chunk.doc_id != "bread.txt"));
}

#[tokio::test]
async fn retrieve_before_any_rebuild_is_empty() {
    let tmp = TempDir::new().unwrap();
    let ctx = context();

    let never = tmp.path().join("never-built");
    let hits = retrieve(&ctx, "anything", &never, 6, COLLECTION).await.expect("missing dir");
    assert!(hits.is_empty());
    assert!(!never.exists(), "retrieval does not create the index directory");

    let empty = tmp.path().join("empty-index");
    fs::create_dir_all(&empty).unwrap();
    let hits = retrieve(&ctx, "anything", &empty, 6, COLLECTION).await.expect("missing collection");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn retrieve_rejects_zero_k() {
    let tmp = TempDir::new().unwrap();
    let err = retrieve(&context(), "q", tmp.path(), 0, COLLECTION).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn retrieve_never_returns_more_than_k() {
    let tmp = TempDir::new().unwrap();
    let (src, db) = (tmp.path().join("docs"), tmp.path().join("index"));
    seed_docs(&src);
    let ctx = context();
    rebuild(&ctx, &src, &db, COLLECTION).await.expect("rebuild");

    let hits = retrieve(&ctx, "water", &db, 2, COLLECTION).await.expect("retrieve");
    assert!(hits.len() <= 2);
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize { 8 }
    fn max_len(&self) -> usize { 512 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("quota exceeded")
    }
}

#[tokio::test]
async fn embedding_failure_is_fatal_and_leaves_empty_index_dir() {
    let tmp = TempDir::new().unwrap();
    let (src, db) = (tmp.path().join("docs"), tmp.path().join("index"));
    seed_docs(&src);
    rebuild(&context(), &src, &db, COLLECTION).await.expect("good rebuild");

    let failing = IndexContext::new(Arc::new(FailingEmbedder));
    let err = rebuild(&failing, &src, &db, COLLECTION).await.err().expect("rebuild must fail");

    assert!(matches!(err, Error::Embedding(_)), "got {err:?}");
    assert!(db.is_dir());
    assert_eq!(fs::read_dir(&db).unwrap().count(), 0, "no partial index is left behind");
    let hits = retrieve(&context(), "fire", &db, 6, COLLECTION).await.expect("retrieve");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn persist_dir_that_is_a_file_fails_with_persistence_error() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("docs");
    seed_docs(&src);
    let db = tmp.path().join("index");
    fs::write(&db, "not a directory").unwrap();
    let ctx = context();

    let err = rebuild(&ctx, &src, &db, COLLECTION).await.err().expect("wipe must fail");
    assert!(matches!(err, Error::Persistence { .. }), "got {err:?}");

    let empty_src = tmp.path().join("empty");
    let err = rebuild(&ctx, &empty_src, &db, COLLECTION).await.err().expect("create must fail");
    assert!(matches!(err, Error::Persistence { .. }), "got {err:?}");
    assert!(db.is_file(), "the blocking file is not removed");
}

#[tokio::test]
async fn indexed_count_needs_no_embedder() {
    let tmp = TempDir::new().unwrap();
    let (src, db) = (tmp.path().join("docs"), tmp.path().join("index"));

    assert_eq!(indexed_count(&db, COLLECTION).await.expect("missing dir"), 0);
    assert!(!db.exists());

    seed_docs(&src);
    rebuild(&context(), &src, &db, COLLECTION).await.expect("rebuild");
    assert_eq!(indexed_count(&db, COLLECTION).await.expect("count"), 3);
    assert_eq!(indexed_count(&db, "other").await.expect("missing collection"), 0);
}
