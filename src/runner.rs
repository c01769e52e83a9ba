//! Sequential task execution over the external `git` binary.
//!
//! The runner owns the lifecycle of the active child process. Cancellation
//! is a shared handle: the interrupt watcher flips the flag, the runner
//! observes it between tasks and races it against the running child with
//! `select!`. On interrupt the active child is killed, its task reported as
//! failed with detail "aborted by user", and the remaining queue is not
//! attempted (cancelled tasks produce no outcome at all).

use std::path::PathBuf;
use std::pin::pin;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::plan::Task;

/// Result of one executed task. Transient: produced for reporting only.
#[derive(Debug)]
pub struct TaskOutcome {
    pub task: Task,
    pub success: bool,
    pub error_detail: Option<String>,
}

/// Aggregate counts over a finished (or interrupted) run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total_tasks: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Tasks never attempted because of an interrupt.
    pub cancelled: usize,
}

impl RunSummary {
    /// Compile a summary from the outcome list and the planned task count.
    pub fn from_outcomes(outcomes: &[TaskOutcome], planned: usize) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.success).count();
        let failed = outcomes.len() - succeeded;
        Self {
            total_tasks: planned,
            succeeded,
            failed,
            cancelled: planned - outcomes.len(),
        }
    }
}

/// Shared cancellation state between the interrupt watcher and the runner.
#[derive(Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; a second call is a no-op.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut notified = pin!(self.inner.notify.notified());
        // Register before checking the flag so a cancel between the check
        // and the await is not lost.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Install the process-wide interrupt handler.
///
/// The first Ctrl-C flips the cancellation flag; the runner takes care of
/// killing the active child and draining the queue.
pub fn spawn_interrupt_watcher(cancel: CancelHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!(" - Aborting operation");
            cancel.cancel();
        }
    });
}

/// Executes the planned task queue, one git subprocess at a time.
pub struct TaskRunner {
    root: PathBuf,
    git_program: String,
    verbose: bool,
    cancel: CancelHandle,
}

impl TaskRunner {
    /// Create a runner rooted at `root` (the directory clones land in).
    pub fn new(root: PathBuf, verbose: bool, cancel: CancelHandle) -> Self {
        Self {
            root,
            git_program: "git".to_string(),
            verbose,
            cancel,
        }
    }

    /// Override the VCS executable. Used by tests and for non-PATH git
    /// installations.
    pub fn with_git_program(mut self, program: impl Into<String>) -> Self {
        self.git_program = program.into();
        self
    }

    /// Run every task in order, reporting one outcome per executed task.
    ///
    /// A failing task never aborts the batch. Once cancellation is observed
    /// no further task is dequeued; skipped tasks are absent from the result.
    pub async fn run(&self, tasks: Vec<Task>) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        let total = tasks.len();

        for (index, task) in tasks.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(
                    "Cancellation requested, skipping {} remaining task(s)",
                    total - index
                );
                break;
            }

            println!(" * {} {}", task.verb(), task.full_name());
            let outcome = self.run_task(task).await;

            match (outcome.success, outcome.error_detail.as_deref()) {
                (true, _) => println!("   - OK"),
                (false, Some(detail)) => println!("   - {detail}"),
                (false, None) => println!("   - failed"),
            }

            outcomes.push(outcome);
        }

        outcomes
    }

    /// Spawn and supervise the subprocess for a single task.
    async fn run_task(&self, task: Task) -> TaskOutcome {
        let mut command = Command::new(&self.git_program);

        match &task {
            Task::Clone { repo } => {
                command
                    .args(["clone", &repo.clone_url, &repo.full_name])
                    .current_dir(&self.root);
            }
            Task::Update { local_path, .. } => {
                command.arg("pull").current_dir(local_path);
            }
        }

        command.stdin(Stdio::null());
        if !self.verbose {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        debug!("Spawning {} for {}", self.git_program, task.full_name());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to start {}: {}", self.git_program, e);
                return TaskOutcome {
                    task,
                    success: false,
                    error_detail: Some(format!("failed to start {}: {}", self.git_program, e)),
                };
            }
        };

        tokio::select! {
            status = child.wait() => {
                match status {
                    Ok(status) if status.success() => TaskOutcome {
                        task,
                        success: true,
                        error_detail: None,
                    },
                    Ok(status) => {
                        let detail = match status.code() {
                            Some(code) => format!("{} exited with code {}", self.git_program, code),
                            None => format!("{} terminated by signal", self.git_program),
                        };
                        TaskOutcome {
                            task,
                            success: false,
                            error_detail: Some(detail),
                        }
                    }
                    Err(e) => TaskOutcome {
                        task,
                        success: false,
                        error_detail: Some(format!("failed to wait for {}: {}", self.git_program, e)),
                    },
                }
            }
            _ = self.cancel.cancelled() => {
                // Non-graceful kill, matching Ctrl-C expectations.
                let _ = child.start_kill();
                let _ = child.wait().await;
                TaskOutcome {
                    task,
                    success: false,
                    error_detail: Some("aborted by user".to_string()),
                }
            }
        }
    }
}
