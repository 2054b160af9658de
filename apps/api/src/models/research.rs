//! Research data model: task kinds, typed findings, per-task results and the
//! aggregated `ResearchContext` handed to generation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Task kinds and findings
// ────────────────────────────────────────────────────────────────────────────

/// Identifier of a registered task. Each kind owns exactly one key in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    CompanyResearch,
    JobInformation,
    CvProfile,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::CompanyResearch => "company_research",
            TaskKind::JobInformation => "job_information",
            TaskKind::CvProfile => "cv_profile",
        }
    }

    /// Whether a success of this kind counts toward the minimum-success policy.
    /// The CV profile only restates the candidate's own input.
    pub fn is_research(self) -> bool {
        !matches!(self, TaskKind::CvProfile)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInsights {
    /// Mission, vision, values and culture, condensed.
    pub summary: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInsights {
    /// Job title, description, skills and qualifications with page chrome removed.
    pub description: String,
    pub source_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvProfile {
    pub summary: String,
}

/// Structured payload of a successful task, one variant per task kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Findings {
    Company(CompanyInsights),
    Job(JobInsights),
    CvProfile(CvProfile),
}

impl Findings {
    /// The task kind allowed to produce this payload.
    pub fn kind(&self) -> TaskKind {
        match self {
            Findings::Company(_) => TaskKind::CompanyResearch,
            Findings::Job(_) => TaskKind::JobInformation,
            Findings::CvProfile(_) => TaskKind::CvProfile,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Task results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    NetworkError,
    QuotaExceeded,
    MalformedResponse,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl TaskFailure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("task did not finish within {}s", limit.as_secs_f32()),
        )
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskResult {
    Success(Findings),
    Failure(TaskFailure),
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskResult::Success(_))
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            TaskResult::Success(_) => "SUCCESS",
            TaskResult::Failure(_) => "ERROR",
        }
    }
}

/// A recorded result plus how long the task ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub result: TaskResult,
    pub elapsed_ms: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// Minimum-success policy
// ────────────────────────────────────────────────────────────────────────────

/// Rule deciding whether partial research failure still permits generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimumSuccessPolicy {
    /// At least this many research-producing tasks must succeed (clamped to ≥ 1).
    AtLeast(usize),
    /// Every research-producing task must succeed.
    All,
}

impl Default for MinimumSuccessPolicy {
    fn default() -> Self {
        MinimumSuccessPolicy::AtLeast(1)
    }
}

impl MinimumSuccessPolicy {
    fn required(self, research_tasks: usize) -> usize {
        match self {
            MinimumSuccessPolicy::AtLeast(n) => n.max(1),
            MinimumSuccessPolicy::All => research_tasks.max(1),
        }
    }
}

impl FromStr for MinimumSuccessPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(MinimumSuccessPolicy::All);
        }
        match s.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(MinimumSuccessPolicy::AtLeast(n)),
            _ => Err(format!(
                "invalid minimum-success policy '{s}' (expected a positive number or 'all')"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Sufficiency {
    Sufficient,
    Insufficient { reason: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Research context
// ────────────────────────────────────────────────────────────────────────────

/// Aggregated research output. Only constructible through
/// [`ResearchContextBuilder::finish`], which refuses partial contexts.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchContext {
    records: BTreeMap<TaskKind, TaskRecord>,
    cv_text: String,
    sufficiency: Sufficiency,
}

impl ResearchContext {
    pub fn cv_text(&self) -> &str {
        &self.cv_text
    }

    pub fn sufficiency(&self) -> &Sufficiency {
        &self.sufficiency
    }

    pub fn is_sufficient(&self) -> bool {
        matches!(self.sufficiency, Sufficiency::Sufficient)
    }

    pub fn result(&self, kind: TaskKind) -> Option<&TaskResult> {
        self.records.get(&kind).map(|r| &r.result)
    }

    pub fn records(&self) -> impl Iterator<Item = (TaskKind, &TaskRecord)> {
        self.records.iter().map(|(k, r)| (*k, r))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn company(&self) -> Option<&CompanyInsights> {
        match self.result(TaskKind::CompanyResearch) {
            Some(TaskResult::Success(Findings::Company(c))) => Some(c),
            _ => None,
        }
    }

    pub fn job(&self) -> Option<&JobInsights> {
        match self.result(TaskKind::JobInformation) {
            Some(TaskResult::Success(Findings::Job(j))) => Some(j),
            _ => None,
        }
    }

    pub fn cv_profile(&self) -> Option<&CvProfile> {
        match self.result(TaskKind::CvProfile) {
            Some(TaskResult::Success(Findings::CvProfile(p))) => Some(p),
            _ => None,
        }
    }

    pub fn failures(&self) -> Vec<(TaskKind, &TaskFailure)> {
        self.records
            .iter()
            .filter_map(|(kind, record)| match &record.result {
                TaskResult::Failure(f) => Some((*kind, f)),
                TaskResult::Success(_) => None,
            })
            .collect()
    }

    pub fn research_successes(&self) -> usize {
        self.records
            .iter()
            .filter(|(kind, record)| kind.is_research() && record.result.is_success())
            .count()
    }

    /// Keys and success tags only, stable across runs with identical inputs.
    #[cfg(test)]
    pub fn outcome_tags(&self) -> Vec<(TaskKind, bool)> {
        self.records
            .iter()
            .map(|(kind, record)| (*kind, record.result.is_success()))
            .collect()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ContextError {
    #[error("task '{0}' already has a recorded result")]
    AlreadyRecorded(TaskKind),

    #[error("task '{0}' is not registered for this run")]
    Unregistered(TaskKind),

    #[error("task '{task}' returned findings of kind '{found}'")]
    MismatchedFindings { task: TaskKind, found: TaskKind },

    #[error("research incomplete: no result for {0:?}")]
    Incomplete(Vec<TaskKind>),
}

/// Assembles a `ResearchContext` one task result at a time (insert-if-absent).
#[derive(Debug)]
pub struct ResearchContextBuilder {
    expected: BTreeSet<TaskKind>,
    records: BTreeMap<TaskKind, TaskRecord>,
    cv_text: String,
}

impl ResearchContextBuilder {
    pub fn new(cv_text: impl Into<String>, expected: impl IntoIterator<Item = TaskKind>) -> Self {
        Self {
            expected: expected.into_iter().collect(),
            records: BTreeMap::new(),
            cv_text: cv_text.into(),
        }
    }

    /// Records a terminal result. A second result for the same kind is rejected and the
    /// first one is kept.
    pub fn record(
        &mut self,
        kind: TaskKind,
        result: TaskResult,
        elapsed: Duration,
    ) -> Result<(), ContextError> {
        if !self.expected.contains(&kind) {
            return Err(ContextError::Unregistered(kind));
        }
        if self.records.contains_key(&kind) {
            return Err(ContextError::AlreadyRecorded(kind));
        }
        if let TaskResult::Success(findings) = &result {
            if findings.kind() != kind {
                return Err(ContextError::MismatchedFindings {
                    task: kind,
                    found: findings.kind(),
                });
            }
        }
        self.records.insert(
            kind,
            TaskRecord {
                result,
                elapsed_ms: elapsed.as_millis() as u64,
            },
        );
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.expected.iter().all(|k| self.records.contains_key(k))
    }

    /// Closes the barrier. Fails unless every registered kind has a result.
    pub fn finish(self, policy: MinimumSuccessPolicy) -> Result<ResearchContext, ContextError> {
        if !self.is_complete() {
            let missing = self
                .expected
                .iter()
                .filter(|k| !self.records.contains_key(k))
                .copied()
                .collect();
            return Err(ContextError::Incomplete(missing));
        }

        let research_tasks = self.expected.iter().filter(|k| k.is_research()).count();
        let successes = self
            .records
            .iter()
            .filter(|(kind, record)| kind.is_research() && record.result.is_success())
            .count();
        let required = policy.required(research_tasks);

        let sufficiency = if self.cv_text.trim().is_empty() {
            Sufficiency::Insufficient {
                reason: "CV text is empty".to_string(),
            }
        } else if successes < required {
            Sufficiency::Insufficient {
                reason: format!(
                    "{successes} of {research_tasks} research tasks succeeded, {required} required"
                ),
            }
        } else {
            Sufficiency::Sufficient
        };

        Ok(ResearchContext {
            records: self.records,
            cv_text: self.cv_text,
            sufficiency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company() -> TaskResult {
        TaskResult::Success(Findings::Company(CompanyInsights {
            summary: "Acme builds rockets".to_string(),
            sources: vec!["https://acme.example".to_string()],
        }))
    }

    fn network_failure() -> TaskResult {
        TaskResult::Failure(TaskFailure::new(FailureKind::NetworkError, "connection reset"))
    }

    fn research_kinds() -> [TaskKind; 2] {
        [TaskKind::CompanyResearch, TaskKind::JobInformation]
    }

    #[test]
    fn test_record_is_insert_if_absent() {
        let mut builder = ResearchContextBuilder::new("cv", research_kinds());
        builder
            .record(TaskKind::CompanyResearch, company(), Duration::ZERO)
            .unwrap();
        let second = builder.record(TaskKind::CompanyResearch, network_failure(), Duration::ZERO);
        assert_eq!(
            second,
            Err(ContextError::AlreadyRecorded(TaskKind::CompanyResearch))
        );

        builder
            .record(TaskKind::JobInformation, network_failure(), Duration::ZERO)
            .unwrap();
        let context = builder.finish(MinimumSuccessPolicy::default()).unwrap();
        assert!(context.result(TaskKind::CompanyResearch).unwrap().is_success());
    }

    #[test]
    fn test_unregistered_kind_is_rejected() {
        let mut builder = ResearchContextBuilder::new("cv", [TaskKind::CompanyResearch]);
        let result = builder.record(TaskKind::CvProfile, network_failure(), Duration::ZERO);
        assert_eq!(result, Err(ContextError::Unregistered(TaskKind::CvProfile)));
    }

    #[test]
    fn test_findings_must_match_task_kind() {
        let mut builder = ResearchContextBuilder::new("cv", research_kinds());
        let result = builder.record(TaskKind::JobInformation, company(), Duration::ZERO);
        assert!(matches!(
            result,
            Err(ContextError::MismatchedFindings { .. })
        ));
    }

    #[test]
    fn test_partial_context_cannot_be_finished() {
        let mut builder = ResearchContextBuilder::new("cv", research_kinds());
        builder
            .record(TaskKind::CompanyResearch, company(), Duration::ZERO)
            .unwrap();
        assert!(!builder.is_complete());
        let err = builder.finish(MinimumSuccessPolicy::default()).unwrap_err();
        assert_eq!(err, ContextError::Incomplete(vec![TaskKind::JobInformation]));
    }

    #[test]
    fn test_one_success_is_sufficient_by_default() {
        let mut builder = ResearchContextBuilder::new("Jane Doe", research_kinds());
        builder
            .record(TaskKind::CompanyResearch, company(), Duration::ZERO)
            .unwrap();
        builder
            .record(TaskKind::JobInformation, network_failure(), Duration::ZERO)
            .unwrap();
        let context = builder.finish(MinimumSuccessPolicy::default()).unwrap();

        assert!(context.is_sufficient());
        assert_eq!(context.len(), 2);
        assert_eq!(context.research_successes(), 1);
        assert_eq!(context.failures().len(), 1);
        assert!(context.company().is_some());
        assert!(context.job().is_none());
    }

    #[test]
    fn test_all_policy_requires_every_research_task() {
        let mut builder = ResearchContextBuilder::new("Jane Doe", research_kinds());
        builder
            .record(TaskKind::CompanyResearch, company(), Duration::ZERO)
            .unwrap();
        builder
            .record(TaskKind::JobInformation, network_failure(), Duration::ZERO)
            .unwrap();
        let context = builder.finish(MinimumSuccessPolicy::All).unwrap();
        assert!(!context.is_sufficient());
    }

    #[test]
    fn test_cv_profile_success_does_not_count_as_research() {
        let kinds = [
            TaskKind::CompanyResearch,
            TaskKind::JobInformation,
            TaskKind::CvProfile,
        ];
        let mut builder = ResearchContextBuilder::new("Jane Doe", kinds);
        builder
            .record(TaskKind::CompanyResearch, network_failure(), Duration::ZERO)
            .unwrap();
        builder
            .record(TaskKind::JobInformation, network_failure(), Duration::ZERO)
            .unwrap();
        builder
            .record(
                TaskKind::CvProfile,
                TaskResult::Success(Findings::CvProfile(CvProfile {
                    summary: "Backend engineer".to_string(),
                })),
                Duration::ZERO,
            )
            .unwrap();
        let context = builder.finish(MinimumSuccessPolicy::default()).unwrap();
        assert!(!context.is_sufficient());
        assert!(context.cv_profile().is_some());
    }

    #[test]
    fn test_blank_cv_is_insufficient_even_with_research() {
        let mut builder = ResearchContextBuilder::new("  \n", [TaskKind::CompanyResearch]);
        builder
            .record(TaskKind::CompanyResearch, company(), Duration::ZERO)
            .unwrap();
        let context = builder.finish(MinimumSuccessPolicy::default()).unwrap();
        assert_eq!(
            context.sufficiency(),
            &Sufficiency::Insufficient {
                reason: "CV text is empty".to_string()
            }
        );
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "all".parse::<MinimumSuccessPolicy>(),
            Ok(MinimumSuccessPolicy::All)
        );
        assert_eq!(
            "2".parse::<MinimumSuccessPolicy>(),
            Ok(MinimumSuccessPolicy::AtLeast(2))
        );
        assert!("0".parse::<MinimumSuccessPolicy>().is_err());
        assert!("some".parse::<MinimumSuccessPolicy>().is_err());
    }

    #[test]
    fn test_task_result_serializes_with_status_tag() {
        let json = serde_json::to_value(network_failure()).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["kind"], "network_error");
    }
}
