//! End-to-end retrieval against scripted store and embedder doubles.

use std::collections::BTreeSet;
use std::sync::Arc;

use relay_core::config::TimeoutConfig;
use relay_core::errors::ErrorKind;
use relay_core::models::{ChunkHit, DocAggregation, RetrievalParams};
use relay_retrieval::RetrievalEngine;
use test_fixtures::{chunk, ScriptedEmbedder, ScriptedVectorStore};

fn params(top_k: usize, per_doc: usize, max_contexts: usize, window: u32) -> RetrievalParams {
    RetrievalParams {
        top_k,
        min_score: 0.5,
        index_name: Some("kb".to_string()),
        candidate_multiplier: 4,
        doc_agg: DocAggregation::MeanTop2,
        neighbor_window: window,
        per_doc_max_chunks: per_doc,
        max_contexts,
    }
}

fn engine(store: Arc<ScriptedVectorStore>, embedder: Arc<ScriptedEmbedder>) -> RetrievalEngine {
    RetrievalEngine::new(store, embedder, TimeoutConfig::default())
}

fn spread_hits() -> Vec<ChunkHit> {
    let mut hits = Vec::new();
    for doc in 0..8u32 {
        for idx in 0..4u32 {
            let score = 0.99 - f64::from(doc) * 0.05 - f64::from(idx) * 0.07;
            hits.push(chunk(&format!("doc-{doc}"), idx * 3, score));
        }
    }
    hits
}

#[tokio::test]
async fn candidate_pool_caps_and_context_budget() {
    let store = Arc::new(ScriptedVectorStore::new(spread_hits()));
    let embedder = Arc::new(ScriptedEmbedder::new(8));
    let engine = engine(Arc::clone(&store), Arc::clone(&embedder));

    let outcome = engine
        .retrieve("compare the plans", None, &params(5, 2, 6, 1))
        .await
        .unwrap();

    let searches = store.searches();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].top_k, 20);
    assert_eq!(searches[0].index_name.as_deref(), Some("kb"));
    assert_eq!(outcome.raw_hits, 20);

    assert!(!outcome.contexts.is_empty());
    assert!(outcome.contexts.len() <= 6);
    let docs: BTreeSet<&str> = outcome
        .contexts
        .iter()
        .map(|c| c.chunk.document_id.as_str())
        .collect();
    assert!(docs.len() <= 6);
    for doc in &docs {
        let retrieved = outcome
            .contexts
            .iter()
            .filter(|c| c.chunk.document_id == *doc && !c.is_neighbor())
            .count();
        assert!(retrieved <= 2, "{doc} kept {retrieved} retrieved chunks");
    }
    assert!(outcome.contexts.iter().all(|c| c.chunk.score >= 0.5));
    assert!(!outcome.relaxed);
    assert_eq!(embedder.embed_calls(), 1);
}

#[tokio::test]
async fn truncated_chunks_are_not_reintroduced_by_expansion() {
    let hits = vec![chunk("a", 3, 0.9), chunk("a", 4, 0.8), chunk("a", 5, 0.7)];
    let table: Vec<ChunkHit> = (0..10).map(|i| chunk("a", i, 0.0)).collect();
    let store = Arc::new(ScriptedVectorStore::new(hits).with_chunks(table));
    let engine = engine(Arc::clone(&store), Arc::new(ScriptedEmbedder::new(8)));

    let outcome = engine
        .retrieve("q", None, &params(5, 2, 6, 1))
        .await
        .unwrap();

    assert_eq!(store.fetches(), vec![("a".to_string(), vec![2])]);
    let indices: Vec<u32> = outcome.contexts.iter().map(|c| c.chunk.chunk_index).collect();
    assert_eq!(indices, vec![2, 3, 4]);
    assert!(outcome.contexts[0].is_neighbor());
}

#[tokio::test]
async fn neighbor_fetch_failure_keeps_retrieved_chunks() {
    let hits = vec![chunk("a", 4, 0.9), chunk("b", 1, 0.8)];
    let store = Arc::new(ScriptedVectorStore::new(hits));
    store.set_fetch_failing(true);
    let engine = engine(Arc::clone(&store), Arc::new(ScriptedEmbedder::new(8)));

    let outcome = engine
        .retrieve("q", None, &params(5, 2, 6, 2))
        .await
        .unwrap();

    assert_eq!(outcome.contexts.len(), 2);
    assert!(outcome.contexts.iter().all(|c| !c.is_neighbor()));
    assert_eq!(store.fetches().len(), 2);
}

#[tokio::test]
async fn supplied_vector_skips_embedding() {
    let store = Arc::new(ScriptedVectorStore::new(vec![chunk("a", 0, 0.9)]));
    let embedder = Arc::new(ScriptedEmbedder::new(8));
    let engine = engine(store, Arc::clone(&embedder));

    let vector = vec![0.5f32; 8];
    let outcome = engine
        .retrieve("q", Some(vector.clone()), &params(5, 2, 6, 0))
        .await
        .unwrap();

    assert_eq!(embedder.embed_calls(), 0);
    assert_eq!(outcome.vector, vector);
}

#[tokio::test]
async fn empty_result_relaxes_once_when_enabled() {
    let hits = vec![chunk("a", 0, 0.2), chunk("b", 0, 0.1)];
    let store = Arc::new(ScriptedVectorStore::new(hits));
    let engine = engine(Arc::clone(&store), Arc::new(ScriptedEmbedder::new(8))).with_relax_on_empty(true);

    let outcome = engine
        .retrieve("q", None, &params(5, 2, 6, 0))
        .await
        .unwrap();

    let searches = store.searches();
    assert_eq!(searches.len(), 2);
    assert_eq!(searches[1].min_score, 0.0);
    assert_eq!(searches[1].top_k, 40);
    assert!(outcome.relaxed);
    assert_eq!(outcome.contexts.len(), 2);
}

#[tokio::test]
async fn empty_result_is_returned_as_is_by_default() {
    let store = Arc::new(ScriptedVectorStore::new(vec![chunk("a", 0, 0.2)]));
    let engine = engine(Arc::clone(&store), Arc::new(ScriptedEmbedder::new(8)));

    let outcome = engine
        .retrieve("q", None, &params(5, 2, 6, 0))
        .await
        .unwrap();

    assert!(outcome.contexts.is_empty());
    assert!(!outcome.relaxed);
    assert_eq!(store.searches().len(), 1);
}

#[tokio::test]
async fn search_failure_is_a_retrieval_error() {
    let store = Arc::new(ScriptedVectorStore::new(vec![]));
    store.set_search_failing(true);
    let engine = engine(store, Arc::new(ScriptedEmbedder::new(8)));

    let err = engine
        .retrieve("q", None, &params(5, 2, 6, 0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Retrieval);
}

#[tokio::test]
async fn embedding_failure_propagates() {
    let embedder = Arc::new(ScriptedEmbedder::new(8));
    embedder.set_failing(true);
    let engine = engine(Arc::new(ScriptedVectorStore::new(vec![])), embedder);

    let err = engine
        .retrieve("q", None, &params(5, 2, 6, 0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Embedding);
}

#[tokio::test]
async fn invalid_params_are_rejected_before_any_call() {
    let store = Arc::new(ScriptedVectorStore::new(vec![]));
    let embedder = Arc::new(ScriptedEmbedder::new(8));
    let engine = engine(Arc::clone(&store), Arc::clone(&embedder));

    let err = engine
        .retrieve("q", None, &params(5, 2, 0, 0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(embedder.embed_calls(), 0);
    assert!(store.searches().is_empty());
}
