//! In-memory stand-ins for the model, search, extraction and task seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::cv::{ExtractError, TextExtractor};
use crate::llm_client::{AgentReply, AgentStatus, CompletionRequest, LlmError, TextGenerator};
use crate::models::input::ResearchInput;
use crate::models::params::ThinkingLevel;
use crate::models::research::{
    CompanyInsights, CvProfile, FailureKind, Findings, JobInsights, TaskFailure, TaskKind,
    TaskResult,
};
use crate::research::task::TaskUnit;
use crate::search_client::{PageExtractor, SearchError, SearchHit, WebSearch};

// ────────────────────────────────────────────────────────────────────────────
// Model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub thinking_level: ThinkingLevel,
}

enum Reply {
    Text(String),
    Fail(fn() -> LlmError),
}

pub struct StubGenerator {
    reply: Reply,
    calls: AtomicUsize,
    last: Mutex<Option<RecordedRequest>>,
}

impl StubGenerator {
    fn with(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    fn envelope(status: AgentStatus, message: &str) -> String {
        serde_json::to_string(&AgentReply {
            status,
            message: message.to_string(),
        })
        .unwrap()
    }

    /// Replies with a `success` envelope around `message`.
    pub fn success(message: &str) -> Self {
        Self::with(Reply::Text(Self::envelope(AgentStatus::Success, message)))
    }

    /// Replies with an `error` envelope around `message`.
    pub fn error(message: &str) -> Self {
        Self::with(Reply::Text(Self::envelope(AgentStatus::Error, message)))
    }

    /// Replies with `text` verbatim.
    pub fn raw(text: &str) -> Self {
        Self::with(Reply::Text(text.to_string()))
    }

    pub fn failing(make: fn() -> LlmError) -> Self {
        Self::with(Reply::Fail(make))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(RecordedRequest {
            model: request.model.to_string(),
            system: request.system.to_string(),
            prompt: request.prompt.to_string(),
            thinking_level: request.thinking_level,
        });
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(make) => Err(make()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Search and extraction
// ────────────────────────────────────────────────────────────────────────────

pub struct StubSearch {
    hits: Result<Vec<SearchHit>, fn() -> SearchError>,
}

impl StubSearch {
    pub fn hits(hits: Vec<SearchHit>) -> Self {
        Self { hits: Ok(hits) }
    }

    pub fn failing(make: fn() -> SearchError) -> Self {
        Self { hits: Err(make) }
    }
}

#[async_trait]
impl WebSearch for StubSearch {
    async fn search(&self, _query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError> {
        match &self.hits {
            Ok(hits) => Ok(hits.iter().take(max_results as usize).cloned().collect()),
            Err(make) => Err(make()),
        }
    }
}

pub struct StubPages {
    content: Result<String, fn() -> SearchError>,
    last_depth: Mutex<Option<String>>,
}

impl StubPages {
    pub fn content(text: &str) -> Self {
        Self {
            content: Ok(text.to_string()),
            last_depth: Mutex::new(None),
        }
    }

    pub fn failing(make: fn() -> SearchError) -> Self {
        Self {
            content: Err(make),
            last_depth: Mutex::new(None),
        }
    }

    pub fn last_depth(&self) -> Option<String> {
        self.last_depth.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageExtractor for StubPages {
    async fn extract(&self, _url: &str, depth: &str) -> Result<String, SearchError> {
        *self.last_depth.lock().unwrap() = Some(depth.to_string());
        match &self.content {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make()),
        }
    }
}

pub struct StubExtractor {
    text: Option<String>,
    calls: AtomicUsize,
}

impl StubExtractor {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for StubExtractor {
    async fn pdf_to_text(&self, _pdf: Bytes) -> Result<String, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text
            .clone()
            .ok_or_else(|| ExtractError::Pdf("stub: not a PDF".to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Task units
// ────────────────────────────────────────────────────────────────────────────

enum Behavior {
    Finish(TaskResult),
    After(Duration, TaskResult),
    Hang,
    Panic,
}

pub struct StubTask {
    kind: TaskKind,
    behavior: Behavior,
    calls: AtomicUsize,
}

/// A plausible successful payload for `kind`.
pub fn findings_for(kind: TaskKind) -> Findings {
    match kind {
        TaskKind::CompanyResearch => Findings::Company(CompanyInsights {
            summary: "Acme's mission is affordable spaceflight. Values: craft, candour."
                .to_string(),
            sources: vec!["https://acme.example/about".to_string()],
        }),
        TaskKind::JobInformation => Findings::Job(JobInsights {
            description: "Senior Backend Engineer. Rust, Postgres, distributed systems."
                .to_string(),
            source_url: "https://acme.example/jobs/42".to_string(),
        }),
        TaskKind::CvProfile => Findings::CvProfile(CvProfile {
            summary: "Jane Doe, backend engineer, 5 years of Rust and Go.".to_string(),
        }),
    }
}

impl StubTask {
    fn with(kind: TaskKind, behavior: Behavior) -> Self {
        Self {
            kind,
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn ok(kind: TaskKind) -> Self {
        Self::with(kind, Behavior::Finish(TaskResult::Success(findings_for(kind))))
    }

    pub fn company_ok() -> Self {
        Self::ok(TaskKind::CompanyResearch)
    }

    pub fn job_ok() -> Self {
        Self::ok(TaskKind::JobInformation)
    }

    pub fn cv_ok() -> Self {
        Self::ok(TaskKind::CvProfile)
    }

    pub fn failing(kind: TaskKind, failure: FailureKind) -> Self {
        Self::with(
            kind,
            Behavior::Finish(TaskResult::Failure(TaskFailure::new(
                failure,
                format!("stub {kind} failed"),
            ))),
        )
    }

    /// Succeeds after `delay`.
    pub fn delayed(kind: TaskKind, delay: Duration) -> Self {
        Self::with(
            kind,
            Behavior::After(delay, TaskResult::Success(findings_for(kind))),
        )
    }

    pub fn hanging(kind: TaskKind) -> Self {
        Self::with(kind, Behavior::Hang)
    }

    pub fn panicking(kind: TaskKind) -> Self {
        Self::with(kind, Behavior::Panic)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskUnit for StubTask {
    fn kind(&self) -> TaskKind {
        self.kind
    }

    async fn execute(&self, _input: ResearchInput<'_>) -> TaskResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Finish(result) => result.clone(),
            Behavior::After(delay, result) => {
                tokio::time::sleep(*delay).await;
                result.clone()
            }
            Behavior::Hang => std::future::pending().await,
            Behavior::Panic => panic!("stub {} panicked", self.kind),
        }
    }
}
