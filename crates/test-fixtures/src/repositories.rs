use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use relay_core::errors::{RelayResult, StorageError};
use relay_core::models::{IntentRule, Query, QueryStatus, Response, RuleType};
use relay_core::traits::{IIntentRuleRepository, IQueryRepository, IResponseRepository};

use crate::lock;

/// One recorded status update.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub query_id: String,
    pub status: QueryStatus,
    pub completed_at_ms: Option<i64>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

#[derive(Default)]
pub struct InMemoryQueryRepository {
    queries: Mutex<HashMap<String, Query>>,
    updates: Mutex<Vec<StatusUpdate>>,
    fail_updates: AtomicBool,
}

impl InMemoryQueryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Query> {
        lock(&self.queries).get(id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.queries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every status transition in arrival order.
    pub fn updates(&self) -> Vec<StatusUpdate> {
        lock(&self.updates).clone()
    }

    pub fn statuses(&self, id: &str) -> Vec<QueryStatus> {
        lock(&self.updates)
            .iter()
            .filter(|u| u.query_id == id)
            .map(|u| u.status)
            .collect()
    }

    pub fn set_updates_failing(&self, failing: bool) {
        self.fail_updates.store(failing, Ordering::SeqCst);
    }
}

impl IQueryRepository for InMemoryQueryRepository {
    fn save_query(&self, query: &Query) -> RelayResult<()> {
        lock(&self.queries).insert(query.id.clone(), query.clone());
        Ok(())
    }

    fn update_query_status(
        &self,
        query_id: &str,
        status: QueryStatus,
        completed_at_ms: Option<i64>,
        latency_ms: Option<u64>,
        error: Option<&str>,
    ) -> RelayResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StorageError::UpdateFailed {
                entity: "query".to_string(),
                id: query_id.to_string(),
                reason: "scripted update failure".to_string(),
            }
            .into());
        }
        let mut queries = lock(&self.queries);
        let query = queries.get_mut(query_id).ok_or_else(|| StorageError::UpdateFailed {
            entity: "query".to_string(),
            id: query_id.to_string(),
            reason: "not found".to_string(),
        })?;
        query.status = status;
        query.completed_at_ms = completed_at_ms.or(query.completed_at_ms);
        query.latency_ms = latency_ms.or(query.latency_ms);
        if let Some(e) = error {
            query.error_message = Some(e.to_string());
        }
        lock(&self.updates).push(StatusUpdate {
            query_id: query_id.to_string(),
            status,
            completed_at_ms,
            latency_ms,
            error: error.map(str::to_string),
        });
        Ok(())
    }
}

/// Keeps the latest version of each response plus a save history.
#[derive(Default)]
pub struct InMemoryResponseRepository {
    responses: Mutex<HashMap<String, Response>>,
    saves: Mutex<Vec<(String, QueryStatus)>>,
}

impl InMemoryResponseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Response> {
        lock(&self.responses).get(id).cloned()
    }

    pub fn for_query(&self, query_id: &str) -> Vec<Response> {
        lock(&self.responses)
            .values()
            .filter(|r| r.query_id == query_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.responses).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(response_id, status)` per save call.
    pub fn saves(&self) -> Vec<(String, QueryStatus)> {
        lock(&self.saves).clone()
    }
}

impl IResponseRepository for InMemoryResponseRepository {
    fn save_response(&self, response: &Response) -> RelayResult<()> {
        lock(&self.saves).push((response.id.clone(), response.status));
        lock(&self.responses).insert(response.id.clone(), response.clone());
        Ok(())
    }
}

/// Serves a fixed rule list, filtered by type and `is_active`.
pub struct StaticRuleRepository {
    rules: Mutex<Vec<IntentRule>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl StaticRuleRepository {
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self {
            rules: Mutex::new(rules),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replace(&self, rules: Vec<IntentRule>) {
        *lock(&self.rules) = rules;
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IIntentRuleRepository for StaticRuleRepository {
    fn find_active_by_types(&self, types: &[RuleType]) -> RelayResult<Vec<IntentRule>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::LoadFailed {
                entity: "intent_rule".to_string(),
                reason: "scripted load failure".to_string(),
            }
            .into());
        }
        Ok(lock(&self.rules)
            .iter()
            .filter(|r| r.is_active && types.contains(&r.rule_type))
            .cloned()
            .collect())
    }
}
