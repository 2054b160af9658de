use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::llm_client::prompts::{fill_template, with_reply_envelope};
use crate::llm_client::{complete_json, AgentReply, CompletionRequest, TextGenerator};
use crate::models::input::ResearchInput;
use crate::models::research::{Findings, JobInsights, TaskFailure, TaskKind, TaskResult};
use crate::research::prompts::{JOB_INFORMATION_PROMPT_TEMPLATE, JOB_INFORMATION_ROLE};
use crate::research::task::{interpret_reply, truncate_chars, TaskUnit};
use crate::search_client::PageExtractor;

/// Job pages with heavy chrome can run long; the role text is near the top.
const MAX_PAGE_CHARS: usize = 40_000;

/// Extracts the job posting page, then has the sub-agent model keep only the role.
pub struct JobInformationTask {
    extractor: Arc<dyn PageExtractor>,
    llm: Arc<dyn TextGenerator>,
}

impl JobInformationTask {
    pub fn new(extractor: Arc<dyn PageExtractor>, llm: Arc<dyn TextGenerator>) -> Self {
        Self { extractor, llm }
    }
}

#[async_trait]
impl TaskUnit for JobInformationTask {
    fn kind(&self) -> TaskKind {
        TaskKind::JobInformation
    }

    async fn execute(&self, input: ResearchInput<'_>) -> TaskResult {
        let content = match self.extractor.extract(input.job_url, input.extract_depth).await {
            Ok(content) => content,
            Err(e) => {
                return TaskResult::Failure(TaskFailure::new(
                    e.failure_kind(),
                    format!("could not extract {}: {e}", input.job_url),
                ))
            }
        };
        debug!(
            "Extracted {} chars from {} ({} depth)",
            content.chars().count(),
            input.job_url,
            input.extract_depth
        );

        let prompt = fill_template(
            JOB_INFORMATION_PROMPT_TEMPLATE,
            &[
                ("job_url", input.job_url),
                ("web_content", truncate_chars(&content, MAX_PAGE_CHARS)),
            ],
        );
        let system = with_reply_envelope(JOB_INFORMATION_ROLE);

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

        match interpret_reply(reply, "job information") {
            Ok(description) => TaskResult::Success(Findings::Job(JobInsights {
                description,
                source_url: input.job_url.to_string(),
            })),
            Err(failure) => TaskResult::Failure(failure),
        }
    }
}
