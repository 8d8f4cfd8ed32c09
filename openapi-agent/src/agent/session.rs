//! One conversation with an agent.

use crate::models::Thread;
use crate::tools::DefaultExecutionState;

/// The running thread plus the key/value state tools share across turns.
#[derive(Clone, Default)]
pub struct Session {
    id: String,
    thread: Thread,
    state: DefaultExecutionState,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            thread: Thread::default(),
            state: DefaultExecutionState::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    pub(crate) fn thread_mut(&mut self) -> &mut Thread {
        &mut self.thread
    }

    pub fn state(&self) -> &DefaultExecutionState {
        &self.state
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("turns", &self.thread.len())
            .finish()
    }
}
