//! CLI commands

mod auth;
mod context;
mod init;
mod pick;
pub mod style;

pub use auth::run_auth;
pub use init::run_init;
pub use pick::{PickOptions, run_pick};

use async_trait::async_trait;
use cherry_pick_bot::cherry_pick::ProgressCallback;
use cherry_pick_bot::types::RequestState;
use indicatif::ProgressBar;
use std::time::Duration;
use style::{check, cross, spinner_style};
use tracing::debug;

/// Spinner-backed progress reporting for a running cherry-pick
pub struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    /// Start a spinner with an initial message
    pub fn spinner(message: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    /// Stop the spinner with a success line
    pub fn finish(&self, message: &str) {
        self.spinner
            .finish_with_message(format!("{} {message}", check()));
    }

    /// Stop the spinner with a failure line
    pub fn fail(&self, message: &str) {
        self.spinner
            .finish_with_message(format!("{} {message}", cross()));
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_state(&self, state: RequestState) {
        debug!(%state, "request state");
        if let RequestState::Replaying(index) = state {
            self.spinner
                .set_message(format!("Replaying commit {}...", index + 1));
        }
    }

    async fn on_message(&self, message: &str) {
        self.spinner.set_message(message.to_string());
    }
}
