//! Generation Stage: one main-agent model call that turns a sufficient research
//! context into a cover letter.
//!
//! Successful findings are quoted; failed research steps are only named as
//! unavailable. The CV profile is preferred over raw CV text when it succeeded.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::generation::prompts::{
    GENERATION_PROMPT_TEMPLATE, GENERATION_ROLE_TEMPLATE, UNAVAILABLE_SECTION,
};
use crate::llm_client::prompts::{fill_template, with_reply_envelope};
use crate::llm_client::{
    complete_json, AgentReply, AgentStatus, CompletionRequest, LlmError, TextGenerator,
};
use crate::models::letter::GeneratedLetter;
use crate::models::params::GenerationParams;
use crate::models::research::{ResearchContext, Sufficiency};

/// Raw CV text is capped before it goes into the generation prompt.
const MAX_RAW_CV_CHARS: usize = 30_000;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("research context is insufficient: {0}")]
    InsufficientContext(String),

    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("model declined to write the letter: {0}")]
    Declined(String),

    #[error("model returned an empty letter")]
    EmptyLetter,
}

pub struct GenerationStage {
    llm: Arc<dyn TextGenerator>,
}

impl GenerationStage {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Writes the letter. Returns either a complete, non-empty letter or an error;
    /// an insufficient context is rejected before the model is called.
    pub async fn generate(
        &self,
        context: &ResearchContext,
        params: &GenerationParams,
    ) -> Result<GeneratedLetter, GenerationError> {
        if let Sufficiency::Insufficient { reason } = context.sufficiency() {
            return Err(GenerationError::InsufficientContext(reason.clone()));
        }

        let system = with_reply_envelope(&fill_template(
            GENERATION_ROLE_TEMPLATE,
            &[
                ("language_level", &params.language_level.to_string()),
                ("max_words", &params.max_words.to_string()),
            ],
        ));
        let prompt = build_generation_prompt(context);

        info!(
            "Generating letter with {} (thinking: {}, language: {}, max {} words)",
            params.main_agent_model, params.thinking_level, params.language_level, params.max_words
        );

        let reply: AgentReply = complete_json(
            self.llm.as_ref(),
            CompletionRequest {
                model: &params.main_agent_model,
                system: &system,
                prompt: &prompt,
                thinking_level: params.thinking_level,
            },
        )
        .await?;

        match reply.status {
            AgentStatus::Error => {
                warn!("Generator declined: {}", reply.message);
                Err(GenerationError::Declined(reply.message))
            }
            AgentStatus::Success => {
                let text = reply.message.trim();
                if text.is_empty() {
                    return Err(GenerationError::EmptyLetter);
                }
                info!("Letter generated: {} words", text.split_whitespace().count());
                Ok(GeneratedLetter::new(text, &params.main_agent_model))
            }
        }
    }
}

/// Fills the generation template from the context's successful findings.
fn build_generation_prompt(context: &ResearchContext) -> String {
    let company_section = match context.company() {
        Some(company) if company.sources.is_empty() => company.summary.clone(),
        Some(company) => format!(
            "{}\n\nSources: {}",
            company.summary,
            company.sources.join(", ")
        ),
        None => UNAVAILABLE_SECTION.to_string(),
    };

    let job_section = match context.job() {
        Some(job) => format!("{}\n\nPosting: {}", job.description, job.source_url),
        None => UNAVAILABLE_SECTION.to_string(),
    };

    let candidate_section = match context.cv_profile() {
        Some(profile) => profile.summary.clone(),
        None => format!(
            "CV TEXT:\n{}",
            crate::research::task::truncate_chars(context.cv_text(), MAX_RAW_CV_CHARS)
        ),
    };

    fill_template(
        GENERATION_PROMPT_TEMPLATE,
        &[
            ("company_section", &company_section),
            ("job_section", &job_section),
            ("candidate_section", &candidate_section),
        ],
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
