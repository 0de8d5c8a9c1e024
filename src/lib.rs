//! cherry-pick-bot - cherry-pick commits through the GitHub API
//!
//! Replays an ordered list of commits onto a branch without a local clone.
//! The host's merge endpoint decides whether each commit applies and what
//! tree results; the engine only writes commit objects and moves refs.
//! Results are published either by moving the target branch or by opening a
//! pull request.
//!
//! ```no_run
//! use cherry_pick_bot::cherry_pick::{CherryPickOptions, NoopProgress, cherry_pick_as_pull_request};
//! use cherry_pick_bot::platform::{create_platform_service, parse_repo_slug};
//!
//! # async fn run() -> cherry_pick_bot::Result<()> {
//! let config = parse_repo_slug("octo/widgets")?;
//! let platform = create_platform_service(&config, None, None).await?;
//! let outcome = cherry_pick_as_pull_request(
//!     platform.as_ref(),
//!     &["abc123".to_string()],
//!     "release-1.x",
//!     None,
//!     CherryPickOptions::default(),
//!     &NoopProgress,
//! )
//! .await?;
//! println!("{}", outcome.pull_request.html_url);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cherry_pick;
pub mod comment;
pub mod config;
pub mod error;
pub mod platform;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
