//! Pipeline Controller and its failure reporting.

pub mod controller;
pub mod failure;

pub use controller::{run_pipeline, Pipeline, PipelineRequest, PipelineState};
pub use failure::{FailureCode, StructuredFailure};
