mod cli;
mod config;
mod cv;
mod errors;
mod generation;
mod llm_client;
mod models;
mod pipeline;
mod research;
mod routes;
mod search_client;
mod state;

#[cfg(test)]
mod test_support;

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{
    filter::filter_fn, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::cv::PdfTextExtractor;
use crate::generation::generator::GenerationStage;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::pipeline::Pipeline;
use crate::research::company::CompanyResearchTask;
use crate::research::coordinator::{ResearchCoordinator, AGENT_OUTPUT_TARGET};
use crate::research::cv_profile::CvProfileTask;
use crate::research::job_info::JobInformationTask;
use crate::research::task::{TaskSet, TaskUnit};
use crate::routes::build_router;
use crate::search_client::TavilyClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // .env first, so clap's env fallbacks see its values
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;
    init_tracing(&config, cli.verbose)?;

    let pipeline = build_pipeline(&config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            serve(config, pipeline).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Generate(args) => Ok(cli::run_generate(&pipeline, &config.defaults, args).await),
    }
}

/// Console logging on stderr, filtered by `RUST_LOG` (debug with `--verbose`). Task outputs go to
/// `AGENT_OUTPUT_LOG` when set and stay off the console.
fn init_tracing(config: &Config, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { config.rust_log.as_str() };
    let mut directives = if level.contains('=') {
        level.to_string()
    } else {
        format!("{}={}", env!("CARGO_PKG_NAME"), level)
    };

    let agent_output = match &config.agent_output_log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open AGENT_OUTPUT_LOG {}", path.display()))?;
            directives.push_str(&format!(",{AGENT_OUTPUT_TARGET}=off"));
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .with_filter(filter_fn(|meta| meta.target() == AGENT_OUTPUT_TARGET)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::new(directives)),
        )
        .with(agent_output)
        .init();
    Ok(())
}

/// Wires the production clients into a pipeline. Sub-agent and main-agent calls
/// share one Anthropic client; the model is chosen per call.
fn build_pipeline(config: &Config) -> Result<Arc<Pipeline>> {
    let llm: Arc<dyn TextGenerator> = Arc::new(
        LlmClient::new(config.anthropic_api_key.clone()).context("failed to build LLM client")?,
    );
    let tavily = Arc::new(
        TavilyClient::new(config.tavily_api_key.clone())
            .context("failed to build search client")?,
    );

    let units: Vec<Arc<dyn TaskUnit>> = vec![
        Arc::new(CompanyResearchTask::new(tavily.clone(), llm.clone())),
        Arc::new(JobInformationTask::new(tavily, llm.clone())),
        Arc::new(CvProfileTask::new(llm.clone())),
    ];
    let tasks = TaskSet::new(units)?;

    info!(
        "Pipeline ready: {} tasks, sub-agent {}, main-agent {}, policy {:?}",
        tasks.len(),
        config.defaults.sub_agent_model,
        config.defaults.main_agent_model,
        config.min_research_successes
    );

    Ok(Arc::new(Pipeline::new(
        Arc::new(PdfTextExtractor),
        tasks,
        ResearchCoordinator::new(config.task_timeout, config.min_research_successes),
        GenerationStage::new(llm),
        config.research_budget,
    )))
}

async fn serve(config: Config, pipeline: Arc<Pipeline>) -> Result<()> {
    info!("Starting coverletter API v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState {
        pipeline,
        defaults: config.defaults.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once a front-end host exists

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
