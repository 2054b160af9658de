use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::llm_client::prompts::{fill_template, with_reply_envelope};
use crate::llm_client::{complete_json, AgentReply, CompletionRequest, TextGenerator};
use crate::models::input::ResearchInput;
use crate::models::research::{
    CompanyInsights, FailureKind, Findings, TaskFailure, TaskKind, TaskResult,
};
use crate::research::prompts::{COMPANY_RESEARCH_PROMPT_TEMPLATE, COMPANY_RESEARCH_ROLE};
use crate::research::task::{interpret_reply, truncate_chars, TaskUnit};
use crate::search_client::{SearchHit, WebSearch};

const MAX_SEARCH_RESULTS: u32 = 6;
const MAX_SNIPPET_CHARS: usize = 1500;

/// Web search about the company behind `company_url`, condensed by the sub-agent model.
pub struct CompanyResearchTask {
    search: Arc<dyn WebSearch>,
    llm: Arc<dyn TextGenerator>,
}

impl CompanyResearchTask {
    pub fn new(search: Arc<dyn WebSearch>, llm: Arc<dyn TextGenerator>) -> Self {
        Self { search, llm }
    }
}

#[async_trait]
impl TaskUnit for CompanyResearchTask {
    fn kind(&self) -> TaskKind {
        TaskKind::CompanyResearch
    }

    async fn execute(&self, input: ResearchInput<'_>) -> TaskResult {
        let query = search_query(input.company_url);
        debug!("Company research query: {query}");

        let hits = match self.search.search(&query, MAX_SEARCH_RESULTS).await {
            Ok(hits) => hits,
            Err(e) => {
                return TaskResult::Failure(TaskFailure::new(
                    e.failure_kind(),
                    format!("web search failed: {e}"),
                ))
            }
        };
        if hits.is_empty() {
            return TaskResult::Failure(TaskFailure::new(
                FailureKind::Unknown,
                format!("web search found nothing for {}", input.company_url),
            ));
        }

        let prompt = fill_template(
            COMPANY_RESEARCH_PROMPT_TEMPLATE,
            &[
                ("company_url", input.company_url),
                ("search_results", &format_hits(&hits)),
            ],
        );
        let system = with_reply_envelope(COMPANY_RESEARCH_ROLE);

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

        match interpret_reply(reply, "company research") {
            Ok(summary) => TaskResult::Success(Findings::Company(CompanyInsights {
                summary,
                sources: hits.into_iter().map(|h| h.url).collect(),
            })),
            Err(failure) => TaskResult::Failure(failure),
        }
    }
}

/// Search query built from the site's host name, falling back to the raw input.
fn search_query(company_url: &str) -> String {
    let subject = Url::parse(company_url)
        .ok()
        .and_then(|url| url.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| company_url.to_string());
    format!("{subject} company mission vision values culture")
}

fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "[{}] {}\nURL: {}\n{}",
                i + 1,
                hit.title,
                hit.url,
                truncate_chars(&hit.content, MAX_SNIPPET_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::params::GenerationParams;
    use crate::models::input::InputBundle;
    use crate::search_client::SearchError;
    use crate::test_support::{StubGenerator, StubSearch};

    fn bundle() -> InputBundle {
        InputBundle::new(
            "https://www.acme.example",
            "https://acme.example/jobs/42",
            "Jane Doe, 5 years backend...",
            GenerationParams::default(),
        )
    }

    #[test]
    fn test_search_query_uses_host_without_www() {
        assert_eq!(
            search_query("https://www.acme.example/about"),
            "acme.example company mission vision values culture"
        );
        assert_eq!(
            search_query("acme"),
            "acme company mission vision values culture"
        );
    }

    #[tokio::test]
    async fn test_success_carries_summary_and_sources() {
        let search = Arc::new(StubSearch::hits(vec![SearchHit {
            title: "About Acme".to_string(),
            url: "https://acme.example/about".to_string(),
            content: "Acme's mission is to make rockets affordable.".to_string(),
        }]));
        let llm = Arc::new(StubGenerator::success("Mission: affordable rockets."));
        let task = CompanyResearchTask::new(search, llm.clone());

        let input = bundle();
        let result = task.execute(input.research_input()).await;

        match result {
            TaskResult::Success(Findings::Company(insights)) => {
                assert_eq!(insights.summary, "Mission: affordable rockets.");
                assert_eq!(insights.sources, vec!["https://acme.example/about"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(llm.calls(), 1);
        let request = llm.last_request().unwrap();
        assert_eq!(request.model, GenerationParams::default().sub_agent_model);
        assert!(request.prompt.contains("affordable"));
    }

    #[tokio::test]
    async fn test_search_failure_skips_model_call() {
        let search = Arc::new(StubSearch::failing(|| SearchError::Api {
            status: 429,
            message: "quota".to_string(),
        }));
        let llm = Arc::new(StubGenerator::success("unused"));
        let task = CompanyResearchTask::new(search, llm.clone());

        let input = bundle();
        let result = task.execute(input.research_input()).await;

        match result {
            TaskResult::Failure(failure) => assert_eq!(failure.kind, FailureKind::QuotaExceeded),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_error_status_is_a_failure() {
        let search = Arc::new(StubSearch::hits(vec![SearchHit {
            title: "Unrelated".to_string(),
            url: "https://other.example".to_string(),
            content: String::new(),
        }]));
        let llm = Arc::new(StubGenerator::error("results describe a different company"));
        let task = CompanyResearchTask::new(search, llm);

        let input = bundle();
        let result = task.execute(input.research_input()).await;
        assert!(matches!(
            result,
            TaskResult::Failure(TaskFailure {
                kind: FailureKind::Unknown,
                ..
            })
        ));
    }
}
