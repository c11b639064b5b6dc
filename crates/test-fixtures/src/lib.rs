//! Test fixtures for the Relay workspace: deterministic in-memory doubles
//! of every external capability, a manual clock, and a loader for the JSON
//! rule sets under the workspace `test-fixtures/` directory.

pub mod clock;
pub mod embedders;
pub mod evaluators;
pub mod generators;
pub mod planners;
pub mod repositories;
pub mod stores;

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use relay_core::models::IntentRule;
use serde::de::DeserializeOwned;

pub use clock::ManualClock;
pub use embedders::{HashEmbedder, ScriptedEmbedder};
pub use evaluators::{FailingEvaluator, FixedEvaluator, FlakyEvaluator, SequenceEvaluator};
pub use generators::{EchoGenerator, FailingGenerator, SlowGenerator};
pub use planners::CountingPlanner;
pub use repositories::{InMemoryQueryRepository, InMemoryResponseRepository, StaticRuleRepository};
pub use stores::{chunk, ScriptedVectorStore};

/// Root directory of the test-fixtures data folder.
fn fixtures_root() -> PathBuf {
    // Works from any crate in the workspace: walk up to find the data folder.
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);

    while !path.join("test-fixtures").join("routing").is_dir() {
        if !path.pop() {
            panic!(
                "Could not find test-fixtures directory from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("test-fixtures")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Load a fixture file as raw JSON Value.
pub fn load_fixture_value(relative_path: &str) -> serde_json::Value {
    load_fixture(relative_path)
}

/// Check that a fixture file exists.
pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

/// Load a rule set from `test-fixtures/routing/<name>.json`.
pub fn load_rules(name: &str) -> Vec<IntentRule> {
    #[derive(serde::Deserialize)]
    struct RuleSet {
        rules: Vec<IntentRule>,
    }
    let set: RuleSet = load_fixture(&format!("routing/{name}.json"));
    set.rules
}

/// Lock a mutex, recovering the data if a panicking test poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
