//! Shared test fixtures

#![allow(dead_code)]

pub mod mock_platform;

pub use mock_platform::{HostCall, MockPlatformService, identity};

use async_trait::async_trait;
use cherry_pick_bot::cherry_pick::ProgressCallback;
use cherry_pick_bot::types::{PlatformConfig, RequestState};
use std::sync::Mutex;

/// Repository coordinates used throughout the tests
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        owner: "octo".to_string(),
        repo: "widgets".to_string(),
        host: None,
    }
}

/// Host with `dev` at `basesha` (tree `basetree`) and commits `abc123`
/// and `def234` whose messages are `commit message for <sha>`
pub fn seeded_host() -> MockPlatformService {
    let host = MockPlatformService::with_config(github_config());
    host.add_commit_with_tree("basesha", "base", &["rootsha"], "basetree");
    host.set_branch("dev", "basesha");
    host.add_commit("abc123", "commit message for abc123", &["srcparent1"]);
    host.add_commit("def234", "commit message for def234", &["abc123"]);
    host
}

/// Owned SHA list
pub fn shas(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

/// Progress callback that records everything it is told
#[derive(Default)]
pub struct RecordingProgress {
    states: Mutex<Vec<RequestState>>,
    messages: Mutex<Vec<String>>,
}

impl RecordingProgress {
    /// States seen so far
    pub fn states(&self) -> Vec<RequestState> {
        self.states.lock().unwrap().clone()
    }

    /// Messages seen so far
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressCallback for RecordingProgress {
    async fn on_state(&self, state: RequestState) {
        self.states.lock().unwrap().push(state);
    }

    async fn on_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
