//! Key-value storage scoped to one agent session.
//!
//! Tools read and write it through their [`ToolContext`](super::ToolContext).
//! It lives as long as the [`Session`](crate::agent::Session) that owns it.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

pub trait ExecutionState: Send + Sync {
    fn set_state(&self, key: &str, value: Value);

    fn get_state(&self, key: &str) -> Option<Value>;
}

/// Default implementation backed by a shared concurrent map. Clones share storage.
#[derive(Clone, Default)]
pub struct DefaultExecutionState {
    state: Arc<DashMap<String, Value>>,
}

impl DefaultExecutionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutionState for DefaultExecutionState {
    fn set_state(&self, key: &str, value: Value) {
        self.state.insert(key.to_owned(), value);
    }

    fn get_state(&self, key: &str) -> Option<Value> {
        self.state.get(key).map(|entry| entry.value().clone())
    }
}
