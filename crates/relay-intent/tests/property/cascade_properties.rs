use proptest::prelude::*;
use relay_core::models::{
    IntentRule, MatchMode, ProcessorKind, RuleType, TaskType, TopicDomain,
};
use relay_intent::detectors::RuleBasedDetector;
use relay_intent::{CascadeDecision, LexicalIndex, MatcherRegistry};

const QUERY: &str = "please check the status of my order today";
const WORDS: [&str; 5] = ["please", "status", "order", "today", "check"];

fn rule(id: i64, word: &str, priority: i32, confidence: f64) -> IntentRule {
    IntentRule {
        id,
        rule_type: RuleType::Keyword,
        match_mode: Some(MatchMode::Contains),
        content: word.to_string(),
        task_type: TaskType::Faq,
        domain: TopicDomain::General,
        target_processor: ProcessorKind::Basic,
        confidence: Some(confidence),
        priority,
        is_active: true,
        allow_cascade: true,
        lock_processor: false,
        route_key: None,
        semantic_threshold: None,
    }
}

fn matching_rules() -> impl Strategy<Value = Vec<IntentRule>> {
    prop::collection::vec((0usize..WORDS.len(), -50i32..50, 0.0f64..1.0), 1..12).prop_map(
        |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (w, p, c))| rule(i as i64 + 1, WORDS[w], p, c))
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn highest_priority_lock_rule_always_wins(
        rules in matching_rules(),
        lock_confidence in 0.0f64..1.0,
    ) {
        let top = rules.iter().map(|r| r.priority).max().unwrap_or(0);
        let mut lock = rule(1000, "order", top + 1, lock_confidence);
        lock.lock_processor = true;
        let mut all = rules;
        all.push(lock);

        let index = LexicalIndex::build(all, &MatcherRegistry::standard());
        let detection = RuleBasedDetector::new(0.8).evaluate(QUERY, &index);

        prop_assert_eq!(detection.decision, CascadeDecision::Locked);
        let intent = detection.candidate.unwrap();
        prop_assert_eq!(intent.attributes["rule_id"].as_str(), "1000");
    }

    #[test]
    fn candidate_is_the_most_confident_match(rules in matching_rules()) {
        let best = rules
            .iter()
            .map(|r| r.confidence.unwrap_or(0.0))
            .fold(f64::MIN, f64::max);
        let mut ordered = rules.clone();
        ordered.sort_by(IntentRule::precedence);
        let expected = ordered
            .iter()
            .find(|r| r.confidence == Some(best))
            .map(|r| r.id.to_string())
            .unwrap();

        let index = LexicalIndex::build(rules, &MatcherRegistry::standard());
        let detection = RuleBasedDetector::new(0.8).evaluate(QUERY, &index);

        prop_assert_eq!(detection.decision, CascadeDecision::ContinueCascade);
        let intent = detection.candidate.unwrap();
        prop_assert_eq!(intent.confidence, best);
        prop_assert_eq!(&intent.attributes["rule_id"], &expected);
    }
}
