//! Local state probing and clone/update task planning.
//!
//! The planner combines the discovered repository list with the state of the
//! local working tree and the run options into an ordered task queue. It
//! never mutates the filesystem; all writes happen in the runner.

use path_clean::PathClean;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::RunOptions;
use crate::error::Error;
use crate::github::RepoRecord;

/// Classification of a repository's local directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalState {
    /// Directory does not exist (or cannot be read; treated the same).
    Absent,
    /// Directory exists but contains no entries.
    PresentEmpty,
    /// Directory exists and has at least one entry.
    PresentNonEmpty,
}

/// One unit of work for the runner.
#[derive(Debug, Clone)]
pub enum Task {
    /// Initial checkout into a new directory under the run root.
    Clone { repo: RepoRecord },
    /// `git pull` inside an existing checkout.
    Update { repo: RepoRecord, local_path: PathBuf },
}

impl Task {
    /// The `owner/name` identifier this task operates on.
    pub fn full_name(&self) -> &str {
        match self {
            Task::Clone { repo } => &repo.full_name,
            Task::Update { repo, .. } => &repo.full_name,
        }
    }

    /// Short verb for progress output.
    pub fn verb(&self) -> &'static str {
        match self {
            Task::Clone { .. } => "Cloning",
            Task::Update { .. } => "Updating",
        }
    }
}

/// Resolve a repository full name to its directory under `root`.
///
/// Repository names come from an external API, so they are treated as
/// untrusted relative path segments: any name whose cleaned form escapes the
/// root is rejected.
pub fn repo_local_path(root: &Path, full_name: &str) -> Result<PathBuf, Error> {
    let candidate = root.join(full_name).clean();

    if candidate == root.clean() || !candidate.starts_with(root.clean()) {
        return Err(Error::Path {
            name: full_name.to_string(),
        });
    }

    Ok(candidate)
}

/// Classify the local directory for a repository.
///
/// Policy: any failure to read the directory (including it simply not being
/// there) counts as [`LocalState::Absent`]; a successful read is classified
/// by entry count.
pub fn probe_local_state(path: &Path) -> LocalState {
    match std::fs::read_dir(path) {
        Ok(mut entries) => {
            if entries.next().is_some() {
                LocalState::PresentNonEmpty
            } else {
                LocalState::PresentEmpty
            }
        }
        Err(_) => LocalState::Absent,
    }
}

/// Build the ordered task queue for a run.
///
/// Decision per repository: absent or empty directories are cloned; a
/// non-empty directory is updated when `--update` is set and skipped
/// otherwise. Duplicate full names are deduplicated, first occurrence wins.
/// Names that escape the run root are reported and skipped.
///
/// An empty repository list is an error: the account matched but yielded
/// nothing, which callers must be able to distinguish from a run where every
/// repository was already in place.
pub fn plan_tasks(
    root: &Path,
    account: &str,
    repos: Vec<RepoRecord>,
    options: &RunOptions,
) -> Result<Vec<Task>, Error> {
    if repos.is_empty() {
        return Err(Error::NoRepositories {
            account: account.to_string(),
        });
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut tasks = Vec::new();

    for repo in repos {
        if !seen.insert(repo.full_name.clone()) {
            debug!("Skipping duplicate listing entry: {}", repo.full_name);
            continue;
        }

        let local_path = match repo_local_path(root, &repo.full_name) {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping repository: {}", e);
                continue;
            }
        };

        match probe_local_state(&local_path) {
            LocalState::Absent | LocalState::PresentEmpty => {
                tasks.push(Task::Clone { repo });
            }
            LocalState::PresentNonEmpty => {
                if options.update {
                    tasks.push(Task::Update { repo, local_path });
                } else {
                    debug!("Already present, skipping: {}", repo.full_name);
                }
            }
        }
    }

    Ok(tasks)
}
