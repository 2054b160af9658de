// Generation Stage: the single main-agent model call that writes the letter,
// plus the HTTP handler that drives a full pipeline run.
// All model calls go through llm_client; no direct Anthropic calls here.

pub mod generator;
pub mod handlers;
pub mod prompts;
