use async_trait::async_trait;
use relay_core::errors::RelayResult;
use relay_core::models::IntentSource;

use super::{CascadeDecision, Detection, IIntentDetector};
use crate::index::CascadeIndex;
use crate::rules::{CompiledRule, LexicalIndex};

/// Lexical rules in precedence order.
///
/// The first matching lock rule is final. The first matching rule that
/// forbids cascading stops the cascade with its own intent. Otherwise the
/// most confident match is kept as a candidate; ties go to the earlier rule.
pub struct RuleBasedDetector {
    default_confidence: f64,
}

impl RuleBasedDetector {
    pub fn new(default_confidence: f64) -> Self {
        Self { default_confidence }
    }

    pub fn evaluate(&self, query: &str, lexical: &LexicalIndex) -> Detection {
        let mut best: Option<(&CompiledRule, f64)> = None;
        for compiled in lexical.rules() {
            if !compiled.matches(query) {
                continue;
            }
            let rule = &compiled.rule;
            let confidence = rule
                .confidence
                .unwrap_or(self.default_confidence)
                .clamp(0.0, 1.0);

            let decision = Detection::decision_for(rule.lock_processor, rule.allow_cascade);
            if decision != CascadeDecision::ContinueCascade {
                let reason = match decision {
                    CascadeDecision::Locked => format!(
                        "rule {} locked processor {}",
                        rule.id, rule.target_processor
                    ),
                    _ => format!("rule {} matched and stopped the cascade", rule.id),
                };
                let intent = rule.to_intent(IntentSource::RuleBased, confidence, &reason);
                return Detection::matched(decision, intent, reason);
            }
            if best.map_or(true, |(_, c)| confidence > c) {
                best = Some((compiled, confidence));
            }
        }

        match best {
            Some((compiled, confidence)) => {
                let reason = format!("rule {} matched", compiled.rule.id);
                let intent = compiled
                    .rule
                    .to_intent(IntentSource::RuleBased, confidence, &reason);
                Detection::matched(CascadeDecision::ContinueCascade, intent, reason)
            }
            None => Detection::unmatched(format!("no match among {} rules", lexical.len())),
        }
    }
}

#[async_trait]
impl IIntentDetector for RuleBasedDetector {
    fn name(&self) -> &'static str {
        "rule-based"
    }

    async fn detect(&self, query: &str, index: &CascadeIndex) -> RelayResult<Detection> {
        Ok(self.evaluate(query, &index.lexical))
    }
}
