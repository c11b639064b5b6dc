// Single source of truth for all default values.

use crate::models::ProcessorKind;

// --- Intent detection ---
pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.78;
pub const DEFAULT_PLANNER_ENABLED: bool = true;
pub const DEFAULT_SHORT_QUERY_CHARS: usize = 10;
pub const DEFAULT_LONG_QUERY_CHARS: usize = 120;
pub const DEFAULT_PLANNER_CONFIDENCE: f64 = 0.88;
pub const DEFAULT_SHORT_QUERY_CONFIDENCE: f64 = 0.72;
pub const DEFAULT_CACHED_PLAN_CONFIDENCE: f64 = 0.85;
pub const DEFAULT_RULE_CONFIDENCE: f64 = 0.8;
pub const DEFAULT_FALLBACK_CONFIDENCE: f64 = 0.3;
pub const DEFAULT_TRACKING_ENABLED: bool = true;
pub const DEFAULT_PROCESSOR: ProcessorKind = ProcessorKind::Basic;

// --- Embeddings ---
pub const DEFAULT_EMBEDDING_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_EMBEDDING_CACHE_TTL_SECS: u64 = 86_400; // 24 hours
pub const DEFAULT_EMBEDDING_CACHE_IDLE_SECS: u64 = 3_600; // 1 hour

// --- Plan cache ---
pub const DEFAULT_PLAN_SIMILARITY_THRESHOLD: f64 = 0.95;
pub const DEFAULT_PLAN_BUCKET_DIMS: usize = 5;
pub const DEFAULT_PLAN_BUCKET_CAPACITY: usize = 10;
pub const DEFAULT_PLAN_CACHE_MAX_ENTRIES: usize = 1_000;
pub const DEFAULT_PLAN_TTL_SECS: u64 = 86_400; // 24 hours

// --- Retrieval ---
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_MIN_SCORE: f64 = 0.5;
pub const DEFAULT_INDEX_NAME: &str = "default";
pub const DEFAULT_CANDIDATE_MULTIPLIER: usize = 4;
pub const DEFAULT_NEIGHBOR_WINDOW: u32 = 1;
pub const DEFAULT_PER_DOC_MAX_CHUNKS: usize = 2;
pub const DEFAULT_MAX_CONTEXTS: usize = 6;
pub const DEFAULT_RELAX_ON_EMPTY: bool = false;

// --- Generation ---
pub const DEFAULT_MODEL: &str = "default";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_DECISION_TEMPERATURE: f64 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 1_024;

// --- Evaluation ---
pub const DEFAULT_STRICT_MIN_FAITHFULNESS: f64 = 0.85;
pub const DEFAULT_LENIENT_MIN_FAITHFULNESS: f64 = 0.6;
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.6;
pub const DEFAULT_STRICT_MAX_RETRY: u32 = 1;

// --- Timeouts ---
pub const DEFAULT_EMBEDDING_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_VECTOR_SEARCH_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_GENERATION_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_EVALUATION_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_PLANNER_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_PERSISTENCE_TIMEOUT_MS: u64 = 5_000;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
pub const DEFAULT_QUERY_LOG_CAPACITY: usize = 50_000;
pub const DEFAULT_DECISION_CHANNEL_CAPACITY: usize = 1_024;
