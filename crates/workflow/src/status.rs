//! Transient workflow status with a cancelable auto-clear.
//!
//! Success and error statuses hide themselves after a fixed delay. Showing a
//! new status aborts any clear still scheduled for the previous one, so an
//! old timer can never hide a newer message. Pending statuses stay until
//! replaced.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowStatus {
    pub kind: StatusKind,
    pub message: String,
    pub visible: bool,
}

impl WorkflowStatus {
    pub fn hidden() -> Self {
        Self {
            kind: StatusKind::Pending,
            message: String::new(),
            visible: false,
        }
    }
}

#[derive(Debug)]
struct BoardState {
    status: WorkflowStatus,
    /// Bumped on every `show`; a clear task only fires for its own generation.
    generation: u64,
    clear_task: Option<JoinHandle<()>>,
}

/// Holds the current status and its scheduled clear.
#[derive(Debug)]
pub struct StatusBoard {
    state: Arc<Mutex<BoardState>>,
    success_ttl: Duration,
    error_ttl: Duration,
}

impl StatusBoard {
    pub fn new(success_ttl: Duration, error_ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState {
                status: WorkflowStatus::hidden(),
                generation: 0,
                clear_task: None,
            })),
            success_ttl,
            error_ttl,
        }
    }

    pub fn current(&self) -> WorkflowStatus {
        lock(&self.state).status.clone()
    }

    pub fn pending(&self, message: impl Into<String>) {
        self.show(StatusKind::Pending, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(StatusKind::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(StatusKind::Error, message.into());
    }

    /// Replace the current status, cancelling any scheduled clear.
    ///
    /// Outside a tokio runtime the status is shown but never auto-cleared.
    pub fn show(&self, kind: StatusKind, message: String) {
        let mut state = lock(&self.state);
        if let Some(task) = state.clear_task.take() {
            task.abort();
        }
        state.generation += 1;
        debug!(?kind, %message, "status");
        state.status = WorkflowStatus {
            kind,
            message,
            visible: true,
        };

        let ttl = match kind {
            StatusKind::Pending => return,
            StatusKind::Success => self.success_ttl,
            StatusKind::Error => self.error_ttl,
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let generation = state.generation;
        let shared = Arc::clone(&self.state);
        state.clear_task = Some(runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut state = lock(&shared);
            if state.generation == generation {
                state.status = WorkflowStatus::hidden();
                state.clear_task = None;
            }
        }));
    }

    /// Hide the current status immediately.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        if let Some(task) = state.clear_task.take() {
            task.abort();
        }
        state.generation += 1;
        state.status = WorkflowStatus::hidden();
    }
}

impl Drop for StatusBoard {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.state).clear_task.take() {
            task.abort();
        }
    }
}

fn lock(state: &Mutex<BoardState>) -> MutexGuard<'_, BoardState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}
