//! Command-line surface: `coverletter serve` and `coverletter generate`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::error;

use crate::cv::CvSource;
use crate::models::params::{GenerationParams, LanguageLevel, ParamOverrides, ThinkingLevel};
use crate::pipeline::{run_pipeline, Pipeline, PipelineRequest};

#[derive(Parser, Debug)]
#[command(name = "coverletter")]
#[command(about = "Researches a company and a job posting, then writes a tailored cover letter")]
#[command(version)]
pub struct Cli {
    /// Debug-level console logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API (default)
    Serve,
    /// Generate one letter and print it
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// CV file: a PDF, or plain text (.txt/.md)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: PathBuf,

    /// Company's official website
    #[arg(long, env = "COMPANY_URL")]
    pub company_url: Option<String>,

    /// Job posting URL
    #[arg(long, env = "JOB_DESCRIPTION_URL")]
    pub job_url: Option<String>,

    /// Model for the research sub-agents
    #[arg(short = 'm', long = "sa-model", value_name = "MODEL")]
    pub sa_model: Option<String>,

    /// Model that writes the letter
    #[arg(short = 'M', long = "ma-model", value_name = "MODEL")]
    pub ma_model: Option<String>,

    /// Reasoning effort: minimal, low, medium or high
    #[arg(long, value_name = "LEVEL")]
    pub thinking: Option<ThinkingLevel>,

    /// Target English level: B1, B2, C1 or C2
    #[arg(long, value_name = "LEVEL")]
    pub language: Option<LanguageLevel>,

    /// Advanced extraction depth for the job posting
    #[arg(short = 't', long = "tavily-advanced")]
    pub tavily_advanced: bool,

    /// Upper bound on letter length
    #[arg(long, value_name = "WORDS")]
    pub max_words: Option<u32>,
}

impl GenerateArgs {
    /// Flags left unset keep the configured defaults.
    pub fn overrides(&self) -> ParamOverrides {
        ParamOverrides {
            sub_agent_model: self.sa_model.clone(),
            main_agent_model: self.ma_model.clone(),
            thinking_level: self.thinking,
            language_level: self.language,
            use_advanced_extraction: self.tavily_advanced.then_some(true),
            max_words: self.max_words,
        }
    }
}

/// Runs one generation and prints `SUCCESS:` with the letter or `ERROR:` with the reason.
pub async fn run_generate(
    pipeline: &Pipeline,
    defaults: &GenerationParams,
    args: GenerateArgs,
) -> ExitCode {
    let params = match defaults.with_overrides(args.overrides()) {
        Ok(params) => params,
        Err(e) => {
            println!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    let cv = match CvSource::from_path(&args.file).await {
        Ok(cv) => cv,
        Err(e) => {
            error!("{e}");
            println!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    let request = PipelineRequest {
        cv: Some(cv),
        company_url: args.company_url.unwrap_or_default(),
        job_url: args.job_url.unwrap_or_default(),
        params,
    };

    match run_pipeline(pipeline, request).await {
        Ok(letter) => {
            println!("SUCCESS:\n{}", letter.text);
            ExitCode::SUCCESS
        }
        Err(failure) => {
            println!("ERROR: {failure}");
            ExitCode::FAILURE
        }
    }
}
