//! Neighbor-window expansion around kept chunks.
//!
//! Expansion stays inside the originating document and applies only to
//! chunks that survived per-document capping. Chunks dropped by the cap
//! are never reintroduced as neighbors.

use std::collections::BTreeSet;

use crate::aggregation::RankedDocument;

/// Indices within `window` of `anchor`, excluding the anchor. Indices
/// below zero are skipped.
pub fn window_around(anchor: u32, window: u32) -> impl Iterator<Item = u32> {
    let start = anchor.saturating_sub(window);
    let end = anchor.saturating_add(window);
    (start..=end).filter(move |i| *i != anchor)
}

/// Neighbor indices to fetch for `doc`: every index in the window of a
/// kept chunk that is neither kept nor truncated. Sorted ascending.
pub fn missing_neighbors(doc: &RankedDocument, window: u32) -> Vec<u32> {
    if window == 0 {
        return Vec::new();
    }
    let kept = doc.kept_indices();
    let wanted: BTreeSet<u32> = doc
        .kept
        .iter()
        .flat_map(|h| window_around(h.chunk_index, window))
        .filter(|i| !kept.contains(i) && !doc.truncated.contains(i))
        .collect();
    wanted.into_iter().collect()
}

/// A kept chunk and the neighbors assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorGroup {
    pub anchor: u32,
    /// Ascending chunk order.
    pub neighbors: Vec<u32>,
}

impl AnchorGroup {
    /// The anchor plus up to `limit - 1` of its nearest neighbors, in
    /// chunk order.
    pub fn members(&self, limit: usize) -> Vec<u32> {
        if limit == 0 {
            return Vec::new();
        }
        let mut nearest = self.neighbors.clone();
        nearest.sort_by_key(|i| (i.abs_diff(self.anchor), *i));
        nearest.truncate(limit - 1);
        nearest.push(self.anchor);
        nearest.sort_unstable();
        nearest
    }
}

/// Group `doc`'s kept chunks with the available neighbors in their window.
///
/// Groups follow the kept order (best first). A neighbor within reach of
/// several anchors belongs to the first. Kept and truncated indices are
/// never neighbors.
pub fn anchor_groups(
    doc: &RankedDocument,
    window: u32,
    available: &BTreeSet<u32>,
) -> Vec<AnchorGroup> {
    let kept = doc.kept_indices();
    let mut claimed: BTreeSet<u32> = BTreeSet::new();
    doc.kept
        .iter()
        .map(|hit| {
            let anchor = hit.chunk_index;
            let neighbors: Vec<u32> = if window == 0 {
                Vec::new()
            } else {
                window_around(anchor, window)
                    .filter(|i| available.contains(i))
                    .filter(|i| !kept.contains(i) && !doc.truncated.contains(i))
                    .filter(|i| claimed.insert(*i))
                    .collect()
            };
            AnchorGroup { anchor, neighbors }
        })
        .collect()
}
