//! Start/shutdown/destroy requests, run in the background so the dashboard
//! never waits on the hypervisor.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::task::{JoinError, JoinHandle};

use crate::hypervisor::{Connector, Credentials, DestroyMode, HypervisorError};

/// How long `drain` waits for in-flight requests on exit.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleAction {
    Start,
    Shutdown,
    Destroy,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleAction::Start => write!(f, "start"),
            LifecycleAction::Shutdown => write!(f, "shutdown"),
            LifecycleAction::Destroy => write!(f, "destroy"),
        }
    }
}

/// Which domain a request is for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub uri: String,
    pub name: String,
}

struct Task {
    target: Target,
    action: LifecycleAction,
    handle: JoinHandle<Result<(), HypervisorError>>,
}

/// Outcome of a finished request.
#[derive(Debug)]
pub struct Finished {
    pub target: Target,
    pub action: LifecycleAction,
    pub result: Result<(), String>,
}

/// Open a connection to the target's endpoint and perform `action`.
pub fn perform(
    connector: &dyn Connector,
    creds: &Credentials,
    target: &Target,
    action: LifecycleAction,
) -> Result<(), HypervisorError> {
    let conn = connector.connect(&target.uri, creds)?;
    let dom = conn.lookup_domain(&target.name)?;
    match action {
        LifecycleAction::Start => dom.start(),
        LifecycleAction::Shutdown => dom.shutdown(),
        LifecycleAction::Destroy => dom.destroy(DestroyMode::Forced).or_else(|e| {
            tracing::debug!(domain = %target.name, error = %e, "forced destroy failed, trying graceful");
            dom.destroy(DestroyMode::Graceful)
        }),
    }
}

/// Registry of in-flight lifecycle requests.
pub struct LifecycleDispatcher {
    connector: Arc<dyn Connector>,
    credentials: Credentials,
    rt: Arc<Runtime>,
    tasks: Vec<Task>,
}

impl LifecycleDispatcher {
    pub fn new(connector: Arc<dyn Connector>, credentials: Credentials, rt: Arc<Runtime>) -> Self {
        Self {
            connector,
            credentials,
            rt,
            tasks: Vec::new(),
        }
    }

    /// Schedule `action` and return at once. Each request opens its own
    /// connection, since hypervisor handles are not shared across threads.
    pub fn dispatch(&mut self, target: Target, action: LifecycleAction) {
        tracing::info!(uri = %target.uri, domain = %target.name, %action, "lifecycle request");
        let connector = Arc::clone(&self.connector);
        let creds = self.credentials.clone();
        let task_target = target.clone();
        let handle = self
            .rt
            .spawn_blocking(move || perform(connector.as_ref(), &creds, &task_target, action));
        self.tasks.push(Task { target, action, handle });
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Collect requests that have finished since the last call. Outcomes are
    /// logged; nothing is retried.
    pub fn reap(&mut self) -> Vec<Finished> {
        let (done, pending): (Vec<Task>, Vec<Task>) =
            self.tasks.drain(..).partition(|t| t.handle.is_finished());
        self.tasks = pending;
        done.into_iter().map(|t| self.finish(t)).collect()
    }

    fn finish(&self, task: Task) -> Finished {
        let joined = self.rt.block_on(task.handle);
        finished(task.target, task.action, joined)
    }

    /// Wait up to `grace` for in-flight requests, then abandon the rest.
    /// Returns how many were abandoned.
    pub fn drain(&mut self, grace: Duration) -> usize {
        if self.tasks.is_empty() {
            return 0;
        }
        let deadline = tokio::time::Instant::now() + grace;
        let tasks: Vec<Task> = self.tasks.drain(..).collect();
        let outcomes = self.rt.block_on(futures_util::future::join_all(tasks.into_iter().map(
            |mut task| async move {
                let joined = tokio::time::timeout_at(deadline, &mut task.handle).await;
                (task, joined)
            },
        )));

        let mut abandoned = 0;
        for (task, joined) in outcomes {
            match joined {
                Ok(joined) => {
                    finished(task.target, task.action, joined);
                }
                Err(_) => {
                    tracing::debug!(domain = %task.target.name, action = %task.action, "abandoned after grace period");
                    task.handle.abort();
                    abandoned += 1;
                }
            }
        }
        if abandoned > 0 {
            tracing::warn!(abandoned, "exiting with lifecycle requests still in flight");
        }
        abandoned
    }
}

fn finished(
    target: Target,
    action: LifecycleAction,
    joined: Result<Result<(), HypervisorError>, JoinError>,
) -> Finished {
    let result = match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("task failed: {}", e)),
    };
    match &result {
        Ok(()) => tracing::info!(domain = %target.name, %action, "lifecycle request completed"),
        Err(e) => tracing::warn!(domain = %target.name, %action, error = %e, "lifecycle request failed"),
    }
    Finished { target, action, result }
}
