//! Error taxonomy for the discovery and clone pipeline.
//!
//! Discovery-phase failures ([`Error::Fetch`], [`Error::NoRepositories`]) are
//! fatal for the whole run and map to distinct process exit codes in `main`.
//! Per-repository failures are reported through
//! [`crate::runner::TaskOutcome`] instead and never surface here.

use thiserror::Error;

/// Fatal errors for a repofetch run.
#[derive(Debug, Error)]
pub enum Error {
    /// A listing page returned a non-200 status, or pagination misbehaved.
    ///
    /// A failed page invalidates the whole discovery: a later page might
    /// contain repositories not seen elsewhere.
    #[error("GitHub API request failed with status {status}: {body}")]
    Fetch { status: u16, body: String },

    /// The HTTP request itself failed (connection refused, DNS, TLS).
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Pagination exceeded the defensive page limit.
    #[error("pagination limit exceeded ({0} pages)")]
    PaginationLimit(usize),

    /// A repository full name resolved to a path outside the run root.
    #[error("repository name {name:?} escapes the working directory")]
    Path { name: String },

    /// Discovery and filtering produced zero repositories.
    #[error("no repositories found for account {account:?}")]
    NoRepositories { account: String },
}

impl Error {
    /// Process exit code for this error when it terminates the run.
    ///
    /// Collection problems exit with 2, upstream API errors with 3; usage
    /// errors (exit 1) are handled before any of these can occur.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Fetch { .. } | Error::Http(_) | Error::PaginationLimit(_) => 3,
            Error::Path { .. } | Error::NoRepositories { .. } => 2,
        }
    }
}
