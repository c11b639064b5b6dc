use std::collections::HashMap;

use proptest::prelude::*;
use relay_core::models::{ChunkHit, DocAggregation, RetrievalParams};
use relay_retrieval::{assemble, document_score, select};
use test_fixtures::chunk;

fn hit() -> impl Strategy<Value = ChunkHit> {
    (0u8..6, 0u32..20, -1.0f64..1.0).prop_map(|(doc, idx, score)| chunk(&format!("d{doc}"), idx, score))
}

fn params() -> impl Strategy<Value = RetrievalParams> {
    (
        1usize..10,
        -1.0f64..1.0,
        0u32..3,
        1usize..4,
        1usize..10,
        prop_oneof![Just(DocAggregation::MeanTop2), Just(DocAggregation::Max)],
    )
        .prop_map(|(top_k, min_score, window, per_doc, max_contexts, doc_agg)| RetrievalParams {
            top_k,
            min_score,
            index_name: None,
            candidate_multiplier: 4,
            doc_agg,
            neighbor_window: window,
            per_doc_max_chunks: per_doc,
            max_contexts,
        })
}

/// Every chunk of every document is fetchable as a neighbor.
fn all_neighbors() -> HashMap<String, Vec<ChunkHit>> {
    let mut map: HashMap<String, Vec<ChunkHit>> = HashMap::new();
    for doc in 0u8..6 {
        let id = format!("d{doc}");
        map.insert(id.clone(), (0..20).map(|i| chunk(&id, i, 0.0)).collect());
    }
    map
}

proptest! {
    #[test]
    fn kept_chunks_respect_cap_and_floor(raw in prop::collection::vec(hit(), 0..40), p in params()) {
        let selection = select(raw, &p);
        for doc in &selection.documents {
            prop_assert!(doc.kept.len() <= p.per_doc_max_chunks);
            prop_assert!(!doc.kept.is_empty());
            for h in &doc.kept {
                prop_assert!(h.score >= p.min_score);
                prop_assert!(!doc.truncated.contains(&h.chunk_index));
            }
        }
    }

    #[test]
    fn documents_are_ranked_best_first(raw in prop::collection::vec(hit(), 0..40), p in params()) {
        let selection = select(raw, &p);
        for pair in selection.documents.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn assembled_contexts_never_exceed_max(raw in prop::collection::vec(hit(), 0..40), p in params()) {
        let neighbors = all_neighbors();
        let selection = select(raw, &p);
        let contexts = assemble(&selection.documents, &neighbors, &p);
        prop_assert!(contexts.len() <= p.max_contexts);
    }

    #[test]
    fn expansion_never_reintroduces_truncated_chunks(raw in prop::collection::vec(hit(), 0..40), p in params()) {
        let neighbors = all_neighbors();
        let selection = select(raw, &p);
        let contexts = assemble(&selection.documents, &neighbors, &p);
        for ctx in contexts.iter().filter(|c| c.is_neighbor()) {
            let doc = selection
                .documents
                .iter()
                .find(|d| d.document_id == ctx.chunk.document_id);
            prop_assert!(doc.is_some());
            if let Some(doc) = doc {
                prop_assert!(!doc.truncated.contains(&ctx.chunk.chunk_index));
            }
        }
    }

    #[test]
    fn contexts_are_unique(raw in prop::collection::vec(hit(), 0..40), p in params()) {
        let neighbors = all_neighbors();
        let selection = select(raw, &p);
        let contexts = assemble(&selection.documents, &neighbors, &p);
        let mut seen = std::collections::HashSet::new();
        for ctx in &contexts {
            prop_assert!(seen.insert((ctx.chunk.document_id.clone(), ctx.chunk.chunk_index)));
        }
    }
}

proptest! {
    #[test]
    fn max_never_scores_below_mean_top2(scores in prop::collection::vec(0.0f64..=1.0, 1..12)) {
        let max = document_score(&scores, DocAggregation::Max);
        let mean = document_score(&scores, DocAggregation::MeanTop2);
        prop_assert!(max >= mean, "max {max} < mean_top2 {mean} for {scores:?}");
        prop_assert!(scores.iter().all(|s| *s <= max));
    }

    #[test]
    fn single_chunk_documents_score_the_same_either_way(score in 0.0f64..=1.0) {
        let max = document_score(&[score], DocAggregation::Max);
        let mean = document_score(&[score], DocAggregation::MeanTop2);
        prop_assert_eq!(max, score);
        prop_assert_eq!(mean, score);
    }
}
