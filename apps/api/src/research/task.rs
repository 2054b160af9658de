//! Task Unit abstraction, one independent research step, and the task set the
//! coordinator fans out over.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm_client::{AgentReply, AgentStatus, LlmError};
use crate::models::input::ResearchInput;
use crate::models::research::{FailureKind, TaskFailure, TaskKind, TaskResult};

/// A single unit of research work.
///
/// Implementations must report every failure as `TaskResult::Failure` and must not
/// share state with other units; anything one unit learns reaches the others only
/// through the research context.
#[async_trait]
pub trait TaskUnit: Send + Sync {
    fn kind(&self) -> TaskKind;

    async fn execute(&self, input: ResearchInput<'_>) -> TaskResult;
}

#[derive(Debug, Error, PartialEq)]
#[error("task '{0}' is registered more than once")]
pub struct DuplicateTask(pub TaskKind);

/// The fixed set of task units for a pipeline. Kinds are unique.
#[derive(Clone)]
pub struct TaskSet {
    tasks: Vec<Arc<dyn TaskUnit>>,
}

impl TaskSet {
    pub fn new(tasks: Vec<Arc<dyn TaskUnit>>) -> Result<Self, DuplicateTask> {
        let mut seen = HashSet::new();
        for task in &tasks {
            if !seen.insert(task.kind()) {
                return Err(DuplicateTask(task.kind()));
            }
        }
        Ok(Self { tasks })
    }

    pub fn kinds(&self) -> impl Iterator<Item = TaskKind> + '_ {
        self.tasks.iter().map(|t| t.kind())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TaskUnit>> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Turns a model reply into the success message or a task failure.
pub(crate) fn interpret_reply(
    reply: Result<AgentReply, LlmError>,
    what: &str,
) -> Result<String, TaskFailure> {
    match reply {
        Ok(AgentReply {
            status: AgentStatus::Success,
            message,
        }) if !message.trim().is_empty() => Ok(message.trim().to_string()),
        Ok(AgentReply {
            status: AgentStatus::Success,
            ..
        }) => Err(TaskFailure::new(
            FailureKind::MalformedResponse,
            format!("{what}: model reported success with an empty message"),
        )),
        Ok(AgentReply { message, .. }) => Err(TaskFailure::new(
            FailureKind::Unknown,
            format!("{what}: {message}"),
        )),
        Err(e) => Err(TaskFailure::new(e.failure_kind(), format!("{what}: {e}"))),
    }
}

/// Cuts `text` to at most `max_chars` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
