//! Pipeline Controller: the sequential driver around research and generation.
//!
//! ```text
//! Idle → CollectingInputs → Researching → Generating → Done
//!              │                 │            │
//!              └──────────────► Aborted ◄─────┘
//! ```
//!
//! Aborted is terminal. A run never resumes; a retry starts again from Idle.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cv::{normalize_whitespace, CvSource, TextExtractor};
use crate::generation::generator::GenerationStage;
use crate::models::input::InputBundle;
use crate::models::letter::GeneratedLetter;
use crate::models::params::GenerationParams;
use crate::models::research::{ResearchContext, Sufficiency, TaskKind};
use crate::pipeline::failure::{failed_tasks, InputError, PipelineError, StructuredFailure};
use crate::research::coordinator::ResearchCoordinator;
use crate::research::task::TaskSet;

// ────────────────────────────────────────────────────────────────────────────
// State machine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    CollectingInputs,
    Researching,
    Generating,
    Aborted,
    Done,
}

impl PipelineState {
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, CollectingInputs)
                | (CollectingInputs, Researching)
                | (CollectingInputs, Aborted)
                | (Researching, Generating)
                | (Researching, Aborted)
                | (Generating, Done)
                | (Generating, Aborted)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Aborted | PipelineState::Done)
    }
}

/// Visited states of one run, in order.
#[derive(Debug)]
struct RunTrace {
    run_id: Uuid,
    states: Vec<PipelineState>,
}

impl RunTrace {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            states: vec![PipelineState::Idle],
        }
    }

    fn current(&self) -> PipelineState {
        self.states
            .last()
            .copied()
            .unwrap_or(PipelineState::Idle)
    }

    fn advance(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(PipelineError::Internal(format!(
                "illegal state transition {current:?} -> {next:?}"
            )));
        }
        info!("[run {}] {current:?} -> {next:?}", self.run_id);
        self.states.push(next);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Requests and reports
// ────────────────────────────────────────────────────────────────────────────

/// External inputs for one run, before validation.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub cv: Option<CvSource>,
    pub company_url: String,
    pub job_url: String,
    pub params: GenerationParams,
}

/// Per-task outcome summary, without the findings themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOutcome {
    pub task: TaskKind,
    pub status: &'static str,
    pub elapsed_ms: u64,
}

fn task_outcomes(context: &ResearchContext) -> Vec<TaskOutcome> {
    context
        .records()
        .map(|(task, record)| TaskOutcome {
            task,
            status: record.result.status_label(),
            elapsed_ms: record.elapsed_ms,
        })
        .collect()
}

#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub states: Vec<PipelineState>,
    pub tasks: Vec<TaskOutcome>,
    pub outcome: Result<GeneratedLetter, StructuredFailure>,
}

impl PipelineReport {
    pub fn final_state(&self) -> PipelineState {
        self.states
            .last()
            .copied()
            .unwrap_or(PipelineState::Idle)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Long-lived pipeline wiring. Each `run` builds fresh per-run state.
pub struct Pipeline {
    extractor: Arc<dyn TextExtractor>,
    tasks: TaskSet,
    coordinator: ResearchCoordinator,
    generation: GenerationStage,
    research_budget: Duration,
}

impl Pipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        tasks: TaskSet,
        coordinator: ResearchCoordinator,
        generation: GenerationStage,
        research_budget: Duration,
    ) -> Self {
        Self {
            extractor,
            tasks,
            coordinator,
            generation,
            research_budget,
        }
    }

    /// Runs once, start to finish. Never panics on task failure and never returns an
    /// empty letter: the outcome is a letter or a structured failure.
    pub async fn run(&self, request: PipelineRequest) -> PipelineReport {
        let mut trace = RunTrace::new(Uuid::new_v4());
        let mut tasks = Vec::new();

        let outcome = self.drive(request, &mut trace, &mut tasks).await;
        let outcome = match outcome {
            Ok(letter) => Ok(letter),
            Err(e) => {
                if !trace.current().is_terminal() && trace.advance(PipelineState::Aborted).is_err() {
                    error!("[run {}] could not record abort", trace.run_id);
                }
                let failure = StructuredFailure::from(e);
                warn!("[run {}] aborted: {failure}", trace.run_id);
                Err(failure)
            }
        };

        PipelineReport {
            run_id: trace.run_id,
            states: trace.states,
            tasks,
            outcome,
        }
    }

    async fn drive(
        &self,
        request: PipelineRequest,
        trace: &mut RunTrace,
        tasks: &mut Vec<TaskOutcome>,
    ) -> Result<GeneratedLetter, PipelineError> {
        trace.advance(PipelineState::CollectingInputs)?;
        let bundle = self.collect_inputs(request).await?;

        trace.advance(PipelineState::Researching)?;
        let context = match tokio::time::timeout(
            self.research_budget,
            self.coordinator.run(&bundle, &self.tasks),
        )
        .await
        {
            Ok(Ok(context)) => context,
            Ok(Err(e)) => return Err(PipelineError::Internal(e.to_string())),
            Err(_) => {
                return Err(PipelineError::ResearchTimeout {
                    budget: self.research_budget,
                })
            }
        };
        *tasks = task_outcomes(&context);

        if let Sufficiency::Insufficient { reason } = context.sufficiency() {
            return Err(PipelineError::InsufficientResearch {
                reason: reason.clone(),
                failed: failed_tasks(&context),
            });
        }

        trace.advance(PipelineState::Generating)?;
        let letter = self
            .generation
            .generate(&context, bundle.params())
            .await
            .map_err(|source| PipelineError::Generation {
                source,
                failed: failed_tasks(&context),
            })?;

        trace.advance(PipelineState::Done)?;
        info!(
            "[run {}] letter ready ({} chars, {})",
            trace.run_id,
            letter.text.chars().count(),
            letter.model_used
        );
        Ok(letter)
    }

    /// Validates URLs and parameters, then extracts the CV text. URL checks come first
    /// so a bad request never pays for PDF parsing.
    async fn collect_inputs(&self, request: PipelineRequest) -> Result<InputBundle, InputError> {
        let company_url = validate_url("company_url", &request.company_url)?;
        let job_url = validate_url("job_url", &request.job_url)?;
        request.params.validate()?;

        let cv_text = match request.cv {
            None => return Err(InputError::MissingCv),
            Some(CvSource::Pdf(bytes)) if bytes.is_empty() => return Err(InputError::MissingCv),
            Some(CvSource::Pdf(bytes)) => self.extractor.pdf_to_text(bytes).await?,
            Some(CvSource::Text(text)) => normalize_whitespace(&text),
        };
        if cv_text.trim().is_empty() {
            return Err(InputError::EmptyCvText);
        }

        Ok(InputBundle::new(company_url, job_url, cv_text, request.params))
    }
}

/// Convenience wrapper returning only the outcome.
pub async fn run_pipeline(
    pipeline: &Pipeline,
    request: PipelineRequest,
) -> Result<GeneratedLetter, StructuredFailure> {
    pipeline.run(request).await.outcome
}

fn validate_url(field: &'static str, raw: &str) -> Result<String, InputError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(InputError::MissingUrl(field));
    }
    let invalid = |reason: String| InputError::InvalidUrl {
        field,
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(raw.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
