use crate::models::params::{GenerationParams, ThinkingLevel};

/// Validated inputs for one pipeline run. Built by the pipeline controller once the CV
/// text is extracted and both URLs have been checked; read-only afterwards.
#[derive(Debug, Clone)]
pub struct InputBundle {
    company_url: String,
    job_url: String,
    cv_text: String,
    params: GenerationParams,
}

impl InputBundle {
    pub fn new(
        company_url: impl Into<String>,
        job_url: impl Into<String>,
        cv_text: impl Into<String>,
        params: GenerationParams,
    ) -> Self {
        Self {
            company_url: company_url.into(),
            job_url: job_url.into(),
            cv_text: cv_text.into(),
            params,
        }
    }

    pub fn cv_text(&self) -> &str {
        &self.cv_text
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// The borrowed view handed to task units.
    pub fn research_input(&self) -> ResearchInput<'_> {
        ResearchInput {
            company_url: &self.company_url,
            job_url: &self.job_url,
            cv_text: &self.cv_text,
            extract_depth: self.params.extract_depth(),
            model: &self.params.sub_agent_model,
            thinking_level: self.params.thinking_level,
        }
    }
}

/// Read-only slice of an `InputBundle` visible to task units. Tasks read the fields
/// they need and nothing else; they cannot reach the main-agent settings.
#[derive(Debug, Clone, Copy)]
pub struct ResearchInput<'a> {
    pub company_url: &'a str,
    pub job_url: &'a str,
    pub cv_text: &'a str,
    /// "basic" or "advanced".
    pub extract_depth: &'a str,
    /// Sub-agent model identifier.
    pub model: &'a str,
    pub thinking_level: ThinkingLevel,
}
