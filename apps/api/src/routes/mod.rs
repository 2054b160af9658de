pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

/// CV uploads are single PDFs; anything larger is rejected before parsing.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/cover-letters",
            post(handlers::handle_generate_cover_letter),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::generation::generator::GenerationStage;
    use crate::models::params::GenerationParams;
    use crate::models::research::{FailureKind, MinimumSuccessPolicy, TaskKind};
    use crate::pipeline::Pipeline;
    use crate::research::coordinator::ResearchCoordinator;
    use crate::research::task::{TaskSet, TaskUnit};
    use crate::test_support::{StubExtractor, StubGenerator, StubTask};

    const BOUNDARY: &str = "coverletter-test-boundary";

    fn app(company: StubTask, job: StubTask, llm: Arc<StubGenerator>) -> Router {
        let units: Vec<Arc<dyn TaskUnit>> = vec![Arc::new(company), Arc::new(job)];
        let pipeline = Pipeline::new(
            Arc::new(StubExtractor::text("Jane Doe, 5 years backend...")),
            TaskSet::new(units).unwrap(),
            ResearchCoordinator::new(Duration::from_secs(90), MinimumSuccessPolicy::default()),
            GenerationStage::new(llm),
            Duration::from_secs(180),
        );
        build_router(AppState {
            pipeline: Arc::new(pipeline),
            defaults: GenerationParams::default(),
        })
    }

    fn multipart_body(fields: &[(&str, &str)], with_cv: bool) -> String {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        if with_cv {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"cv\"; filename=\"cv.pdf\"\r\n\
                 Content-Type: application/pdf\r\n\r\n%PDF-1.7 stub\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn post(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/cover-letters")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const URLS: [(&str, &str); 2] = [
        ("company_url", "https://acme.example"),
        ("job_url", "https://acme.example/jobs/42"),
    ];

    #[tokio::test]
    async fn test_health() {
        let llm = Arc::new(StubGenerator::success("unused"));
        let response = app(StubTask::company_ok(), StubTask::job_ok(), llm)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "coverletter");
    }

    #[tokio::test]
    async fn test_generate_returns_letter_and_states() {
        let llm = Arc::new(StubGenerator::success("Dear Acme team"));
        let mut fields = URLS.to_vec();
        fields.push(("language_level", "B2"));
        fields.push(("main_agent_model", "claude-opus-4-1"));

        let response = app(StubTask::company_ok(), StubTask::job_ok(), llm.clone())
            .oneshot(post(multipart_body(&fields, true)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["letter"], "Dear Acme team");
        assert_eq!(body["model_used"], "claude-opus-4-1");
        assert_eq!(body["states"].as_array().unwrap().last().unwrap(), "done");
        assert!(llm.last_request().unwrap().system.contains("B2 level"));
    }

    #[tokio::test]
    async fn test_missing_cv_is_bad_request() {
        let llm = Arc::new(StubGenerator::success("unused"));
        let response = app(StubTask::company_ok(), StubTask::job_ok(), llm.clone())
            .oneshot(post(multipart_body(&URLS, false)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "INPUT_ERROR");
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_override_is_bad_request() {
        let llm = Arc::new(StubGenerator::success("unused"));
        let mut fields = URLS.to_vec();
        fields.push(("thinking_level", "extreme"));

        let response = app(StubTask::company_ok(), StubTask::job_ok(), llm)
            .oneshot(post(multipart_body(&fields, true)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_insufficient_research_lists_failed_tasks() {
        let llm = Arc::new(StubGenerator::success("unused"));
        let response = app(
            StubTask::failing(TaskKind::CompanyResearch, FailureKind::QuotaExceeded),
            StubTask::failing(TaskKind::JobInformation, FailureKind::NetworkError),
            llm.clone(),
        )
        .oneshot(post(multipart_body(&URLS, true)))
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "INSUFFICIENT_RESEARCH");
        assert_eq!(body["error"]["failed_tasks"].as_array().unwrap().len(), 2);
        assert_eq!(llm.calls(), 0);
    }
}
