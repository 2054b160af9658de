use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pipeline::{FailureCode, StructuredFailure};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Pipeline failure: {0}")]
    Pipeline(StructuredFailure),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StructuredFailure> for AppError {
    fn from(failure: StructuredFailure) -> Self {
        AppError::Pipeline(failure)
    }
}

fn pipeline_status(code: FailureCode) -> StatusCode {
    match code {
        FailureCode::InputError => StatusCode::BAD_REQUEST,
        FailureCode::InsufficientResearch | FailureCode::GenerationFailure => {
            StatusCode::BAD_GATEWAY
        }
        FailureCode::ResearchTimeout => StatusCode::GATEWAY_TIMEOUT,
        FailureCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": {
                        "code": FailureCode::InputError,
                        "message": msg,
                        "failed_tasks": []
                    }
                }),
            ),
            AppError::Pipeline(failure) => {
                if failure.code == FailureCode::Internal {
                    tracing::error!("Pipeline invariant broken: {}", failure.message);
                }
                (pipeline_status(failure.code), json!({ "error": failure }))
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": {
                            "code": FailureCode::Internal,
                            "message": "An internal server error occurred",
                            "failed_tasks": []
                        }
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
