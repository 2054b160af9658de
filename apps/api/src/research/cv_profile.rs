use std::sync::Arc;

use async_trait::async_trait;

use crate::llm_client::prompts::{fill_template, with_reply_envelope};
use crate::llm_client::{complete_json, AgentReply, CompletionRequest, TextGenerator};
use crate::models::input::ResearchInput;
use crate::models::research::{CvProfile, Findings, TaskKind, TaskResult};
use crate::research::prompts::{CV_PROFILE_PROMPT_TEMPLATE, CV_PROFILE_ROLE};
use crate::research::task::{interpret_reply, truncate_chars, TaskUnit};

const MAX_CV_CHARS: usize = 30_000;

/// Condenses the CV into a profile. Supporting task: its success does not count toward
/// the minimum-success policy, and generation falls back to the raw CV when it fails.
pub struct CvProfileTask {
    llm: Arc<dyn TextGenerator>,
}

impl CvProfileTask {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl TaskUnit for CvProfileTask {
    fn kind(&self) -> TaskKind {
        TaskKind::CvProfile
    }

    async fn execute(&self, input: ResearchInput<'_>) -> TaskResult {
        let prompt = fill_template(
            CV_PROFILE_PROMPT_TEMPLATE,
            &[("cv_text", truncate_chars(input.cv_text, MAX_CV_CHARS))],
        );
        let system = with_reply_envelope(CV_PROFILE_ROLE);

        let reply = complete_json::<AgentReply>(
            self.llm.as_ref(),
            CompletionRequest {
                model: input.model,
                system: &system,
                prompt: &prompt,
                thinking_level: input.thinking_level,
            },
        )
        .await;

        match interpret_reply(reply, "cv profile") {
            Ok(summary) => TaskResult::Success(Findings::CvProfile(CvProfile { summary })),
            Err(failure) => TaskResult::Failure(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::input::InputBundle;
    use crate::models::params::GenerationParams;
    use crate::test_support::StubGenerator;

    #[tokio::test]
    async fn test_profile_is_built_from_cv_text_only() {
        let llm = Arc::new(StubGenerator::success("**Jane Doe**, backend engineer"));
        let task = CvProfileTask::new(llm.clone());
        let input = InputBundle::new(
            "https://acme.example",
            "https://acme.example/jobs/42",
            "Jane Doe, 5 years backend in Rust and Go",
            GenerationParams::default(),
        );

        let result = task.execute(input.research_input()).await;

        assert!(matches!(
            result,
            TaskResult::Success(Findings::CvProfile(ref p)) if p.summary.contains("Jane Doe")
        ));
        let request = llm.last_request().unwrap();
        assert!(request.prompt.contains("5 years backend"));
        assert!(!request.prompt.contains("acme.example"));
    }
}
