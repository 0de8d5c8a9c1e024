//! Progress reporting for cherry-pick requests

use crate::types::RequestState;
use async_trait::async_trait;

/// Receives state transitions and human-readable messages while a request runs
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called on every state machine transition
    async fn on_state(&self, state: RequestState);

    /// Called with a short status line
    async fn on_message(&self, message: &str);
}

/// Progress callback that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_state(&self, _state: RequestState) {}

    async fn on_message(&self, _message: &str) {}
}
