use anyhow::Result;
use log::{error, info, warn};
use std::collections::HashMap;
use std::future::Future;
use tokio::task::{Id, JoinError, JoinSet};

/// Runs named tasks in separate failure domains.
///
/// A task that returns, fails or panics is logged on its own; the others keep running.
#[derive(Default)]
pub struct Supervisor {
    tasks: JoinSet<Result<()>>,
    names: HashMap<Id, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskExit {
    Finished,
    Failed(String),
    Panicked,
    Cancelled,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, name: &str, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let handle = self.tasks.spawn(task);
        self.names.insert(handle.id(), name.to_string());
        info!("Started task {}", name);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for the next task to end and reports how it ended.
    pub async fn join_next(&mut self) -> Option<(String, TaskExit)> {
        let joined = self.tasks.join_next_with_id().await?;
        let (id, exit) = match joined {
            Ok((id, Ok(()))) => (id, TaskExit::Finished),
            Ok((id, Err(e))) => (id, TaskExit::Failed(format!("{:#}", e))),
            Err(e) => (e.id(), exit_for_join_error(&e)),
        };
        let name = self.names.remove(&id).unwrap_or_else(|| format!("task-{}", id));

        match &exit {
            TaskExit::Finished => info!("Task {} finished", name),
            TaskExit::Failed(reason) => error!("Task {} failed: {}", name, reason),
            TaskExit::Panicked => error!("Task {} panicked", name),
            TaskExit::Cancelled => warn!("Task {} was cancelled", name),
        }
        Some((name, exit))
    }

    /// Supervises until every task has ended or `shutdown` resolves, then aborts
    /// whatever is still running.
    pub async fn run_until_shutdown<S>(mut self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping {} tasks", self.tasks.len());
                    break;
                }
                next = self.join_next() => {
                    if next.is_none() {
                        warn!("All supervised tasks have ended");
                        break;
                    }
                }
            }
        }
        self.tasks.shutdown().await;
    }
}

fn exit_for_join_error(e: &JoinError) -> TaskExit {
    if e.is_panic() {
        TaskExit::Panicked
    } else {
        TaskExit::Cancelled
    }
}
