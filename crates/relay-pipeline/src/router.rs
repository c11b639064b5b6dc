//! QueryRouter: route selector → processor registry, built once at startup.
//!
//! A selector with no registered processor falls back to the default
//! processor when one is configured. Only a router without a usable default
//! reports `RouteNotFound`.

use std::collections::BTreeMap;
use std::sync::Arc;

use relay_core::errors::{RelayError, RelayResult};
use relay_core::models::ProcessorKind;

use crate::processors::{BasicProcessor, IQueryProcessor, PlannedProcessor};

pub struct QueryRouter {
    processors: BTreeMap<ProcessorKind, Arc<dyn IQueryProcessor>>,
    default: Option<ProcessorKind>,
}

impl QueryRouter {
    /// An empty router with no default.
    pub fn new() -> Self {
        Self {
            processors: BTreeMap::new(),
            default: None,
        }
    }

    /// BASIC and RAG_FUSION, defaulting to BASIC.
    pub fn standard() -> Self {
        let mut router = Self::new().with_default(Some(ProcessorKind::Basic));
        router.register(Arc::new(BasicProcessor));
        router.register(Arc::new(PlannedProcessor));
        router
    }

    /// Selector served when the requested one is unregistered.
    pub fn with_default(mut self, default: Option<ProcessorKind>) -> Self {
        self.default = default;
        self
    }

    pub fn default_selector(&self) -> Option<ProcessorKind> {
        self.default
    }

    /// Register a processor under its own selector, replacing any previous one.
    pub fn register(&mut self, processor: Arc<dyn IQueryProcessor>) {
        self.processors.insert(processor.kind(), processor);
    }

    /// The processor registered for `selector`, else the default processor.
    /// Callers detect a fallback by comparing the returned `kind()`.
    pub fn route(&self, selector: ProcessorKind) -> RelayResult<Arc<dyn IQueryProcessor>> {
        self.processors
            .get(&selector)
            .or_else(|| self.default.and_then(|d| self.processors.get(&d)))
            .cloned()
            .ok_or_else(|| RelayError::RouteNotFound {
                selector: selector.as_str().to_string(),
            })
    }

    /// Registered selectors in a stable order.
    pub fn selectors(&self) -> Vec<ProcessorKind> {
        self.processors.keys().copied().collect()
    }
}

impl Default for QueryRouter {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use relay_core::errors::ErrorKind;

    use super::*;

    #[test]
    fn standard_router_serves_basic_and_rag_fusion() {
        let router = QueryRouter::standard();
        assert_eq!(
            router.selectors(),
            vec![ProcessorKind::Basic, ProcessorKind::RagFusion]
        );
        assert_eq!(router.route(ProcessorKind::Basic).unwrap().kind(), ProcessorKind::Basic);
        assert_eq!(
            router.route(ProcessorKind::RagFusion).unwrap().kind(),
            ProcessorKind::RagFusion
        );
    }

    #[test]
    fn unregistered_selector_is_route_not_found() {
        let err = QueryRouter::new().route(ProcessorKind::Hyde).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::RouteNotFound);
        assert!(err.to_string().contains("HYDE"));
    }

    #[test]
    fn unregistered_selector_falls_back_to_the_default() {
        let router = QueryRouter::standard();
        assert_eq!(router.default_selector(), Some(ProcessorKind::Basic));
        for selector in [ProcessorKind::StepBack, ProcessorKind::Hyde] {
            assert_eq!(router.route(selector).unwrap().kind(), ProcessorKind::Basic);
        }
    }

    #[test]
    fn default_without_a_registered_processor_is_route_not_found() {
        let router = QueryRouter::new().with_default(Some(ProcessorKind::Basic));
        let err = router.route(ProcessorKind::StepBack).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::RouteNotFound);
        assert!(err.to_string().contains("STEP_BACK"));

        let router = QueryRouter::standard().with_default(None);
        assert!(router.route(ProcessorKind::Hyde).is_err());
    }
}
