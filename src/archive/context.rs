//! Run-scoped result aggregation
//!
//! Copy completions run on their own tasks, so the success/failure lists are
//! collected through a shared, thread-safe context handed to every worker
//! instead of global state.

use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of one run: display names in completion order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub successes: Vec<String>,
    pub failures: Vec<String>,
}

/// Cheaply cloneable handle shared between the coordinator and copy workers
#[derive(Clone, Default)]
pub struct RunContext {
    successes: Arc<Mutex<Vec<String>>>,
    failures: Arc<Mutex<Vec<String>>>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_success(&self, display_name: String) {
        self.successes.lock().await.push(display_name);
    }

    pub async fn record_failure(&self, display_name: String) {
        self.failures.lock().await.push(display_name);
    }

    /// Snapshot the collected results. Call only after all workers joined.
    pub async fn into_summary(&self) -> RunSummary {
        RunSummary {
            successes: self.successes.lock().await.clone(),
            failures: self.failures.lock().await.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_from_clones_land_in_one_summary() {
        let ctx = RunContext::new();
        let clone = ctx.clone();

        ctx.record_success("a".to_string()).await;
        clone.record_failure("b".to_string()).await;
        clone.record_success("c".to_string()).await;

        let summary = ctx.into_summary().await;
        assert_eq!(summary.successes, vec!["a", "c"]);
        assert_eq!(summary.failures, vec!["b"]);
    }
}
