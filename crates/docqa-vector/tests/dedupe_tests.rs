use docqa_core::types::{location_label, Chunk, Meta, RetrievedChunk};
use docqa_vector::dedupe_by_location;

fn hit(doc_id: &str, chunk_id: usize, score: f32) -> RetrievedChunk {
    RetrievedChunk {
        chunk: Chunk {
            content: format!("{doc_id} #{chunk_id}"),
            doc_id: doc_id.to_string(),
            chunk_id,
            page: None,
            location: location_label(None, chunk_id),
            metadata: Meta::new(),
        },
        score,
    }
}

#[test]
fn duplicate_citations_keep_first_occurrence() {
    let hits = vec![
        hit("a.txt", 0, 0.9),
        hit("b.txt", 4, 0.8),
        hit("a.txt", 0, 0.7),
        hit("a.txt", 1, 0.6),
        hit("b.txt", 4, 0.5),
        hit("c.txt", 2, 0.4),
    ];

    let unique = dedupe_by_location(hits);

    let keys: Vec<(&str, &str)> = unique.iter().map(|h| h.chunk.citation_key()).collect();
    assert_eq!(keys, vec![("a.txt", "chunk 0"), ("b.txt", "chunk 4"), ("a.txt", "chunk 1"), ("c.txt", "chunk 2")]);
    assert_eq!(unique[0].score, 0.9, "the higher ranked duplicate wins");
    for pair in unique.windows(2) { assert!(pair[0].score >= pair[1].score); }
}

#[test]
fn same_location_in_different_documents_is_not_a_duplicate() {
    let unique = dedupe_by_location(vec![hit("a.txt", 3, 0.9), hit("b.txt", 3, 0.8)]);
    assert_eq!(unique.len(), 2);
}

#[test]
fn empty_results_stay_empty() {
    assert!(dedupe_by_location(Vec::new()).is_empty());
}
