use std::sync::Arc;

use crate::models::params::GenerationParams;
use crate::pipeline::Pipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Configured run defaults; form fields override them per request.
    pub defaults: GenerationParams,
}
