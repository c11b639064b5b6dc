//! Document aggregation: filter, group, cap, score, rank, and assemble.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use relay_core::models::{ChunkHit, ContextOrigin, DocAggregation, RetrievalParams, RetrievedContext};

use crate::expansion;

/// One source document after per-document capping.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDocument {
    pub document_id: String,
    pub score: f64,
    /// Kept hits, best first. Ties go to the lower chunk index.
    pub kept: Vec<ChunkHit>,
    /// Chunks retrieved for this document but dropped by the cap.
    /// Neighbor expansion never brings these back.
    pub truncated: BTreeSet<u32>,
}

impl RankedDocument {
    pub fn kept_indices(&self) -> BTreeSet<u32> {
        self.kept.iter().map(|h| h.chunk_index).collect()
    }

    pub fn kept_hit(&self, chunk_index: u32) -> Option<&ChunkHit> {
        self.kept.iter().find(|h| h.chunk_index == chunk_index)
    }
}

/// Ranked documents plus counters for logging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Best document first.
    pub documents: Vec<RankedDocument>,
    pub raw_hits: usize,
    /// Hits at or above the score floor.
    pub accepted_hits: usize,
}

fn best_first(a: &ChunkHit, b: &ChunkHit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.chunk_index.cmp(&b.chunk_index))
}

/// Reduce kept chunk scores to one document score.
///
/// `MeanTop2` averages the two best scores, or returns the only score of a
/// single-chunk document. `Max` returns the best score. An empty slice
/// scores 0.0.
pub fn document_score(scores: &[f64], agg: DocAggregation) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mut best = f64::NEG_INFINITY;
    let mut second = f64::NEG_INFINITY;
    for &s in scores {
        if s > best {
            second = best;
            best = s;
        } else if s > second {
            second = s;
        }
    }
    match agg {
        DocAggregation::Max => best,
        DocAggregation::MeanTop2 if scores.len() < 2 => best,
        DocAggregation::MeanTop2 => (best + second) / 2.0,
    }
}

/// Filter raw hits by `min_score`, group them by document, keep at most
/// `per_doc_max_chunks` per document, and rank documents by score.
///
/// Documents with equal scores keep the order in which the search first
/// returned them. A chunk returned twice counts once, at its best score.
pub fn select(raw: Vec<ChunkHit>, params: &RetrievalParams) -> Selection {
    let raw_hits = raw.len();
    let mut accepted_hits = 0;
    let mut groups: Vec<(String, Vec<ChunkHit>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for hit in raw {
        if !hit.score.is_finite() || hit.score < params.min_score {
            continue;
        }
        accepted_hits += 1;
        let pos = match positions.get(&hit.document_id) {
            Some(pos) => *pos,
            None => {
                groups.push((hit.document_id.clone(), Vec::new()));
                positions.insert(hit.document_id.clone(), groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[pos].1.push(hit);
    }

    let mut documents: Vec<RankedDocument> = groups
        .into_iter()
        .map(|(document_id, mut hits)| {
            hits.sort_by(|a, b| {
                a.chunk_index
                    .cmp(&b.chunk_index)
                    .then(b.score.total_cmp(&a.score))
            });
            hits.dedup_by_key(|h| h.chunk_index);
            hits.sort_by(best_first);

            let truncated = hits
                .iter()
                .skip(params.per_doc_max_chunks)
                .map(|h| h.chunk_index)
                .collect();
            hits.truncate(params.per_doc_max_chunks);

            let scores: Vec<f64> = hits.iter().map(|h| h.score).collect();
            RankedDocument {
                score: document_score(&scores, params.doc_agg),
                document_id,
                kept: hits,
                truncated,
            }
        })
        .collect();

    // Stable: equal scores keep search order.
    documents.sort_by(|a, b| b.score.total_cmp(&a.score));

    Selection {
        documents,
        raw_hits,
        accepted_hits,
    }
}

/// Emit contexts from ranked documents, in rank order, until
/// `max_contexts` is reached.
///
/// Within a document each kept chunk forms a group with its expanded
/// neighbors. Groups follow the kept order; members of a group follow
/// chunk order. When a group does not fit, the anchor and its nearest
/// neighbors are kept. Neighbors inherit the anchor's score and rank.
pub fn assemble(
    documents: &[RankedDocument],
    neighbors: &HashMap<String, Vec<ChunkHit>>,
    params: &RetrievalParams,
) -> Vec<RetrievedContext> {
    let mut out: Vec<RetrievedContext> = Vec::with_capacity(params.max_contexts);

    for (rank, doc) in documents.iter().enumerate() {
        if out.len() >= params.max_contexts {
            break;
        }
        let fetched: HashMap<u32, &ChunkHit> = neighbors
            .get(&doc.document_id)
            .map(|chunks| {
                chunks
                    .iter()
                    .filter(|c| c.document_id == doc.document_id)
                    .map(|c| (c.chunk_index, c))
                    .collect()
            })
            .unwrap_or_default();
        let available: BTreeSet<u32> = fetched.keys().copied().collect();

        for group in expansion::anchor_groups(doc, params.neighbor_window, &available) {
            let remaining = params.max_contexts - out.len();
            if remaining == 0 {
                break;
            }
            let Some(anchor) = doc.kept_hit(group.anchor) else {
                continue;
            };
            for index in group.members(remaining) {
                if index == group.anchor {
                    out.push(RetrievedContext {
                        chunk: anchor.clone(),
                        document_score: doc.score,
                        rank,
                        origin: ContextOrigin::Retrieved,
                    });
                } else if let Some(chunk) = fetched.get(&index) {
                    let mut chunk = (*chunk).clone();
                    chunk.score = anchor.score;
                    out.push(RetrievedContext {
                        chunk,
                        document_score: doc.score,
                        rank,
                        origin: ContextOrigin::Neighbor {
                            anchor_chunk: group.anchor,
                        },
                    });
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(doc: &str, idx: u32, score: f64) -> ChunkHit {
        ChunkHit {
            document_id: doc.to_string(),
            chunk_index: idx,
            content: format!("{doc}-{idx}"),
            title: None,
            source: None,
            start_pos: None,
            end_pos: None,
            score,
        }
    }

    fn params(per_doc: usize, max_contexts: usize, window: u32) -> RetrievalParams {
        RetrievalParams {
            top_k: 5,
            min_score: 0.5,
            index_name: None,
            candidate_multiplier: 4,
            doc_agg: DocAggregation::MeanTop2,
            neighbor_window: window,
            per_doc_max_chunks: per_doc,
            max_contexts,
        }
    }

    #[test]
    fn single_chunk_mean_top2_equals_chunk_score() {
        assert_eq!(document_score(&[0.73], DocAggregation::MeanTop2), 0.73);
        assert_eq!(document_score(&[0.73], DocAggregation::Max), 0.73);
    }

    #[test]
    fn mean_top2_uses_two_best_scores() {
        let s = document_score(&[0.6, 0.9, 0.8], DocAggregation::MeanTop2);
        assert!((s - 0.85).abs() < 1e-12);
        assert_eq!(document_score(&[0.6, 0.9, 0.8], DocAggregation::Max), 0.9);
        assert_eq!(document_score(&[], DocAggregation::Max), 0.0);
    }

    #[test]
    fn select_filters_caps_and_ranks() {
        let raw = vec![
            hit("a", 0, 0.9),
            hit("a", 3, 0.8),
            hit("a", 7, 0.7),
            hit("b", 1, 0.95),
            hit("c", 2, 0.4),
        ];
        let sel = select(raw, &params(2, 6, 0));
        assert_eq!(sel.raw_hits, 5);
        assert_eq!(sel.accepted_hits, 4);
        let ids: Vec<&str> = sel.documents.iter().map(|d| d.document_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        let a = &sel.documents[1];
        assert_eq!(a.kept_indices(), BTreeSet::from([0, 3]));
        assert_eq!(a.truncated, BTreeSet::from([7]));
        assert!((a.score - 0.85).abs() < 1e-12);
    }

    #[test]
    fn duplicate_chunks_count_once() {
        let raw = vec![hit("a", 1, 0.6), hit("a", 1, 0.9), hit("a", 2, 0.7)];
        let sel = select(raw, &params(2, 6, 0));
        let a = &sel.documents[0];
        assert_eq!(a.kept.len(), 2);
        assert_eq!(a.kept[0].score, 0.9);
        assert!(a.truncated.is_empty());
    }

    #[test]
    fn assemble_respects_max_contexts_in_rank_order() {
        let raw = vec![
            hit("a", 0, 0.9),
            hit("a", 1, 0.85),
            hit("b", 0, 0.8),
            hit("b", 5, 0.75),
            hit("c", 0, 0.7),
        ];
        let p = params(2, 3, 0);
        let sel = select(raw, &p);
        let out = assemble(&sel.documents, &HashMap::new(), &p);
        let got: Vec<(&str, u32)> = out
            .iter()
            .map(|c| (c.chunk.document_id.as_str(), c.chunk.chunk_index))
            .collect();
        assert_eq!(got, vec![("a", 0), ("a", 1), ("b", 0)]);
        assert_eq!(out[2].rank, 1);
    }

    #[test]
    fn neighbors_inherit_anchor_score_and_follow_chunk_order() {
        let raw = vec![hit("a", 4, 0.9)];
        let p = params(2, 6, 1);
        let sel = select(raw, &p);
        let neighbors = HashMap::from([(
            "a".to_string(),
            vec![hit("a", 3, 0.0), hit("a", 5, 0.0)],
        )]);
        let out = assemble(&sel.documents, &neighbors, &p);
        let idx: Vec<u32> = out.iter().map(|c| c.chunk.chunk_index).collect();
        assert_eq!(idx, vec![3, 4, 5]);
        assert!(out.iter().all(|c| c.chunk.score == 0.9));
        assert_eq!(out[0].origin, ContextOrigin::Neighbor { anchor_chunk: 4 });
        assert_eq!(out[1].origin, ContextOrigin::Retrieved);
    }

    #[test]
    fn tight_budget_keeps_the_anchor_over_its_neighbors() {
        let raw = vec![hit("a", 4, 0.9)];
        let p = params(1, 1, 1);
        let sel = select(raw, &p);
        let neighbors = HashMap::from([(
            "a".to_string(),
            vec![hit("a", 3, 0.0), hit("a", 5, 0.0)],
        )]);
        let out = assemble(&sel.documents, &neighbors, &p);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].chunk.chunk_index, 4);
        assert_eq!(out[0].origin, ContextOrigin::Retrieved);
    }

    #[test]
    fn foreign_document_chunks_are_ignored() {
        let raw = vec![hit("a", 4, 0.9)];
        let p = params(2, 6, 1);
        let sel = select(raw, &p);
        let neighbors = HashMap::from([("a".to_string(), vec![hit("z", 5, 0.0)])]);
        let out = assemble(&sel.documents, &neighbors, &p);
        assert_eq!(out.len(), 1);
    }
}
