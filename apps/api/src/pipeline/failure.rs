//! Pipeline error taxonomy and the structured failure callers receive.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::cv::ExtractError;
use crate::generation::generator::GenerationError;
use crate::models::params::ParamError;
use crate::models::research::{FailureKind, ResearchContext, TaskKind};

/// Rejected before research starts. No task runs when one of these is raised.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("no CV was provided")]
    MissingCv,

    #[error("the CV contains no extractable text")]
    EmptyCvText,

    #[error("could not read the CV: {0}")]
    CvExtraction(#[from] ExtractError),

    #[error("{0} is required")]
    MissingUrl(&'static str),

    #[error("{field} '{url}' is not a valid http(s) URL: {reason}")]
    InvalidUrl {
        field: &'static str,
        url: String,
        reason: String,
    },

    #[error("invalid generation parameters: {0}")]
    Params(#[from] ParamError),
}

/// A research task that did not succeed, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedTask {
    pub task: TaskKind,
    pub kind: FailureKind,
    pub reason: String,
}

pub(crate) fn failed_tasks(context: &ResearchContext) -> Vec<FailedTask> {
    context
        .failures()
        .into_iter()
        .map(|(task, failure)| FailedTask {
            task,
            kind: failure.kind,
            reason: failure.reason.clone(),
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("not enough research to write a letter: {reason}")]
    InsufficientResearch {
        reason: String,
        failed: Vec<FailedTask>,
    },

    #[error("research did not finish within {}s", .budget.as_secs())]
    ResearchTimeout { budget: Duration },

    #[error("letter generation failed: {source}")]
    Generation {
        #[source]
        source: GenerationError,
        failed: Vec<FailedTask>,
    },

    #[error("internal pipeline error: {0}")]
    Internal(String),
}

/// Stable reason codes. The wire form is SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    InputError,
    InsufficientResearch,
    ResearchTimeout,
    GenerationFailure,
    Internal,
}

impl FailureCode {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCode::InputError => "INPUT_ERROR",
            FailureCode::InsufficientResearch => "INSUFFICIENT_RESEARCH",
            FailureCode::ResearchTimeout => "RESEARCH_TIMEOUT",
            FailureCode::GenerationFailure => "GENERATION_FAILURE",
            FailureCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a failed run reports: a stable code, a readable message and the research tasks
/// that did not succeed (empty when research never finished).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredFailure {
    pub code: FailureCode,
    pub message: String,
    pub failed_tasks: Vec<FailedTask>,
}

impl fmt::Display for StructuredFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        for failed in &self.failed_tasks {
            write!(f, "\n  - {}: {}", failed.task, failed.reason)?;
        }
        Ok(())
    }
}

impl From<PipelineError> for StructuredFailure {
    fn from(error: PipelineError) -> Self {
        let message = error.to_string();
        let (code, failed_tasks) = match error {
            PipelineError::Input(_) => (FailureCode::InputError, Vec::new()),
            PipelineError::InsufficientResearch { failed, .. } => {
                (FailureCode::InsufficientResearch, failed)
            }
            PipelineError::ResearchTimeout { .. } => (FailureCode::ResearchTimeout, Vec::new()),
            PipelineError::Generation { failed, .. } => (FailureCode::GenerationFailure, failed),
            PipelineError::Internal(_) => (FailureCode::Internal, Vec::new()),
        };
        StructuredFailure {
            code,
            message,
            failed_tasks,
        }
    }
}
