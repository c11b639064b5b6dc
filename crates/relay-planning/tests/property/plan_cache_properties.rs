use std::sync::Arc;

use proptest::prelude::*;
use relay_core::config::PlanningConfig;
use relay_core::models::{TaskNode, TaskPlan};
use relay_core::similarity::cosine_similarity;
use relay_core::traits::SystemClock;
use relay_planning::TaskPlanCache;

/// Two vectors sharing the bucket prefix, with random tails.
fn same_bucket_pair() -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    (
        prop::collection::vec(-1.0f32..1.0, 5),
        prop::collection::vec(-1.0f32..1.0, 4),
        prop::collection::vec(-1.0f32..1.0, 4),
    )
        .prop_map(|(prefix, a, b)| {
            let prefix: Vec<f32> = prefix.iter().map(|x| (x * 100.0).round() / 100.0).collect();
            let mut va = prefix.clone();
            va.extend(a);
            let mut vb = prefix;
            vb.extend(b);
            (va, vb)
        })
}

proptest! {
    #[test]
    fn hit_iff_similarity_reaches_threshold(
        (a, b) in same_bucket_pair(),
        threshold in 0.5f64..0.99,
    ) {
        let cache = TaskPlanCache::new(
            PlanningConfig { similarity_threshold: threshold, ..PlanningConfig::default() },
            Arc::new(SystemClock),
        );
        cache.insert("q", a.clone(), TaskPlan::new("p", vec![TaskNode::new(1, "s", vec![])]));
        let similarity = cosine_similarity(&a, &b);
        let hit = cache.lookup(&b);
        if similarity >= threshold {
            prop_assert!(hit.is_some());
        } else {
            prop_assert!(hit.is_none(), "similarity {} below {} returned a plan", similarity, threshold);
        }
        if let Some(hit) = hit {
            prop_assert!(hit.similarity >= threshold);
        }
    }
}
