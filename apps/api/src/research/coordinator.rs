//! Research Coordinator: fans out over the task set, bounds each task with its own
//! timeout, and fans in at a barrier that yields one `ResearchContext`.
//!
//! A task that fails, times out or panics becomes a `TaskResult::Failure` in its own
//! slot and never affects its siblings. The overall research budget is enforced one
//! level up, by the pipeline controller, which drops this future on expiry and with it
//! every task still in flight.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::models::input::InputBundle;
use crate::models::research::{
    ContextError, FailureKind, MinimumSuccessPolicy, ResearchContext, ResearchContextBuilder,
    TaskFailure, TaskKind, TaskResult,
};
use crate::research::task::TaskSet;

/// Log target for the raw per-task output. `main` can route it to its own file.
pub const AGENT_OUTPUT_TARGET: &str = "coverletter::agent_output";

#[derive(Debug, Clone)]
pub struct ResearchCoordinator {
    task_timeout: Duration,
    policy: MinimumSuccessPolicy,
}

impl ResearchCoordinator {
    pub fn new(task_timeout: Duration, policy: MinimumSuccessPolicy) -> Self {
        Self {
            task_timeout,
            policy,
        }
    }

    /// Runs every task concurrently and returns once each has a terminal result.
    ///
    /// Never fails because a task failed; the error cases are bookkeeping faults in the
    /// context builder.
    pub async fn run(
        &self,
        input: &InputBundle,
        tasks: &TaskSet,
    ) -> Result<ResearchContext, ContextError> {
        let research_input = input.research_input();
        let mut builder = ResearchContextBuilder::new(input.cv_text(), tasks.kinds());
        if tasks.is_empty() {
            warn!("Research started with no registered tasks");
        }

        info!(
            "Research started: {} tasks, {}s per-task timeout",
            tasks.len(),
            self.task_timeout.as_secs()
        );

        let mut in_flight = FuturesUnordered::new();
        for task in tasks.iter() {
            let kind = task.kind();
            let limit = self.task_timeout;
            in_flight.push(async move {
                let started = Instant::now();
                let guarded = AssertUnwindSafe(task.execute(research_input)).catch_unwind();
                let result = match tokio::time::timeout(limit, guarded).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(panic)) => TaskResult::Failure(TaskFailure::new(
                        FailureKind::Unknown,
                        format!("task panicked: {}", panic_message(panic.as_ref())),
                    )),
                    Err(_) => TaskResult::Failure(TaskFailure::timeout(limit)),
                };
                (kind, result, started.elapsed())
            });
        }

        while let Some((kind, result, elapsed)) = in_flight.next().await {
            log_outcome(kind, &result, elapsed);
            match builder.record(kind, result, elapsed) {
                Err(ContextError::MismatchedFindings { task, found }) => {
                    warn!("{task} returned {found} findings; recording as malformed");
                    builder.record(
                        task,
                        TaskResult::Failure(TaskFailure::new(
                            FailureKind::MalformedResponse,
                            format!("task produced findings of kind '{found}'"),
                        )),
                        elapsed,
                    )?;
                }
                other => other?,
            }
        }

        let context = builder.finish(self.policy)?;
        info!(
            "Research finished: {} results, {}/{} research tasks succeeded, sufficient: {}",
            context.len(),
            context.research_successes(),
            tasks.kinds().filter(|k| k.is_research()).count(),
            context.is_sufficient()
        );
        Ok(context)
    }
}

fn log_outcome(kind: TaskKind, result: &TaskResult, elapsed: Duration) {
    match result {
        TaskResult::Success(_) => info!(
            "{kind}: {} ({}ms)",
            result.status_label(),
            elapsed.as_millis()
        ),
        TaskResult::Failure(failure) => warn!(
            "{kind}: {} ({}ms) {failure}",
            result.status_label(),
            elapsed.as_millis()
        ),
    }
    match serde_json::to_string(result) {
        Ok(json) => info!(target: AGENT_OUTPUT_TARGET, task = %kind, "{json}"),
        Err(e) => debug!("could not serialize {kind} output: {e}"),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
