//! Axum route handlers for the cover-letter API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::cv::CvSource;
use crate::errors::AppError;
use crate::models::params::{LanguageLevel, ParamOverrides, ThinkingLevel};
use crate::pipeline::controller::TaskOutcome;
use crate::pipeline::{PipelineRequest, PipelineState};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Fields collected from the multipart form.
#[derive(Debug, Default)]
struct CoverLetterForm {
    cv: Option<Bytes>,
    company_url: String,
    job_url: String,
    overrides: ParamOverrides,
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub run_id: Uuid,
    pub letter: String,
    pub model_used: String,
    pub generated_at: DateTime<Utc>,
    pub states: Vec<PipelineState>,
    pub tasks: Vec<TaskOutcome>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/cover-letters
///
/// Multipart form: `cv` (PDF file), `company_url`, `job_url`, plus optional
/// `sub_agent_model`, `main_agent_model`, `thinking_level`, `language_level`,
/// `advanced_extraction`, `max_words`. Runs the full pipeline for this request.
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let form = read_form(multipart).await?;
    let params = state
        .defaults
        .with_overrides(form.overrides)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = state
        .pipeline
        .run(PipelineRequest {
            cv: form.cv.map(CvSource::Pdf),
            company_url: form.company_url,
            job_url: form.job_url,
            params,
        })
        .await;

    info!("Run {} ended in state {:?}", report.run_id, report.final_state());
    let letter = report.outcome?;

    Ok(Json(CoverLetterResponse {
        run_id: report.run_id,
        letter: letter.text,
        model_used: letter.model_used,
        generated_at: letter.timestamp,
        states: report.states,
        tasks: report.tasks,
    }))
}

async fn read_form(mut multipart: Multipart) -> Result<CoverLetterForm, AppError> {
    let mut form = CoverLetterForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "cv" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("could not read cv: {e}")))?;
            form.cv = Some(bytes);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("could not read {name}: {e}")))?;
        let value = value.trim();
        let overrides = &mut form.overrides;
        match name.as_str() {
            "company_url" => form.company_url = value.to_string(),
            "job_url" => form.job_url = value.to_string(),
            "sub_agent_model" => overrides.sub_agent_model = Some(value.to_string()),
            "main_agent_model" => overrides.main_agent_model = Some(value.to_string()),
            "thinking_level" if !value.is_empty() => {
                overrides.thinking_level = Some(parse_field::<ThinkingLevel>(&name, value)?)
            }
            "language_level" if !value.is_empty() => {
                overrides.language_level = Some(parse_field::<LanguageLevel>(&name, value)?)
            }
            "advanced_extraction" if !value.is_empty() => {
                overrides.use_advanced_extraction = Some(parse_checkbox(value)?)
            }
            "max_words" if !value.is_empty() => {
                overrides.max_words = Some(parse_field::<u32>(&name, value)?)
            }
            _ => {}
        }
    }

    Ok(form)
}

fn parse_field<T>(name: &str, value: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| AppError::Validation(format!("invalid {name} '{value}': {e}")))
}

/// HTML checkboxes submit "on"; API clients tend to send "true".
fn parse_checkbox(value: &str) -> Result<bool, AppError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "invalid advanced_extraction '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checkbox() {
        assert!(parse_checkbox("on").unwrap());
        assert!(!parse_checkbox("False").unwrap());
        assert!(parse_checkbox("sometimes").is_err());
    }

    #[test]
    fn test_parse_field_names_the_field() {
        let err = parse_field::<ThinkingLevel>("thinking_level", "extreme").unwrap_err();
        assert!(err.to_string().contains("thinking_level"));
    }
}
