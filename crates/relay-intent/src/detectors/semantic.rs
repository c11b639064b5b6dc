use std::sync::Arc;

use async_trait::async_trait;
use relay_core::blocking::call_blocking;
use relay_core::config::TimeoutConfig;
use relay_core::errors::RelayResult;
use relay_core::models::IntentSource;
use relay_core::traits::IEmbeddingProvider;

use super::{Detection, IIntentDetector};
use crate::index::CascadeIndex;

/// Embeds the query and picks the most similar route above its threshold.
/// Confidence is the similarity.
pub struct SemanticDetector {
    embedder: Arc<dyn IEmbeddingProvider>,
    timeouts: TimeoutConfig,
}

impl SemanticDetector {
    pub fn new(embedder: Arc<dyn IEmbeddingProvider>, timeouts: TimeoutConfig) -> Self {
        Self { embedder, timeouts }
    }
}

#[async_trait]
impl IIntentDetector for SemanticDetector {
    fn name(&self) -> &'static str {
        "semantic-router"
    }

    async fn detect(&self, query: &str, index: &CascadeIndex) -> RelayResult<Detection> {
        if index.semantic.is_empty() {
            return Ok(Detection::unmatched("no semantic routes"));
        }
        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        let vector = call_blocking("embedding", self.timeouts.embedding(), move || {
            embedder.embed(&text)
        })
        .await?;

        let Some(m) = index.semantic.best_match(&vector) else {
            return Ok(Detection::unmatched(format!(
                "no route above threshold among {}",
                index.semantic.len()
            )));
        };
        let template = &m.route.template;
        let reason = format!("route {} similarity {:.3}", m.route.key, m.similarity);
        let intent = template
            .to_intent(IntentSource::SemanticRouter, m.similarity, &reason)
            .with_attribute("similarity", format!("{:.4}", m.similarity));
        let decision = Detection::decision_for(template.lock_processor, template.allow_cascade);
        Ok(Detection::matched(decision, intent, reason))
    }
}
