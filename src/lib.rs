//! repofetch - clone or update every repository of a GitHub account
//!
//! Given a user or organization name, repofetch walks the paginated GitHub
//! repository listing, plans a clone-or-update task per repository, and runs
//! the tasks one git subprocess at a time.
//!
//! ## Modules
//!
//! - [`config`]: persisted API token and per-run options
//! - [`github`]: pagination walking and repository collection
//! - [`plan`]: local state probing and task planning
//! - [`runner`]: subprocess execution and cancellation

pub mod config;
pub mod error;
pub mod github;
pub mod plan;
pub mod runner;

pub use config::{Config, RunOptions};
pub use error::Error;
pub use github::{GitHubClient, RepoRecord};
pub use plan::{plan_tasks, LocalState, Task};
pub use runner::{spawn_interrupt_watcher, CancelHandle, RunSummary, TaskOutcome, TaskRunner};
