use crate::errors::RelayResult;
use crate::models::{IntentRule, Query, QueryStatus, Response, RuleType};

/// Query persistence.
pub trait IQueryRepository: Send + Sync {
    fn save_query(&self, query: &Query) -> RelayResult<()>;

    fn update_query_status(
        &self,
        query_id: &str,
        status: QueryStatus,
        completed_at_ms: Option<i64>,
        latency_ms: Option<u64>,
        error: Option<&str>,
    ) -> RelayResult<()>;
}

/// Response persistence. Saving an existing id overwrites it.
pub trait IResponseRepository: Send + Sync {
    fn save_response(&self, response: &Response) -> RelayResult<()>;
}

/// Source of intent rules for the cascade index.
pub trait IIntentRuleRepository: Send + Sync {
    /// Active rules of the given types, in any order.
    fn find_active_by_types(&self, types: &[RuleType]) -> RelayResult<Vec<IntentRule>>;
}
