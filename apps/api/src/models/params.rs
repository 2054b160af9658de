use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SUB_AGENT_MODEL: &str = "claude-haiku-4-5";
pub const DEFAULT_MAIN_AGENT_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_MAX_WORDS: u32 = 300;

#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("unknown thinking level '{0}' (expected minimal, low, medium or high)")]
    ThinkingLevel(String),

    #[error("unknown language level '{0}' (expected B1, B2, C1 or C2)")]
    LanguageLevel(String),

    #[error("max_words must be between 50 and 1000, got {0}")]
    MaxWords(u32),
}

/// Reasoning effort requested from the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingLevel {
    Minimal,
    #[default]
    Low,
    Medium,
    High,
}

impl ThinkingLevel {
    /// Extended-thinking token budget. `None` disables thinking entirely.
    pub fn budget_tokens(self) -> Option<u32> {
        match self {
            ThinkingLevel::Minimal => None,
            ThinkingLevel::Low => Some(1024),
            ThinkingLevel::Medium => Some(4096),
            ThinkingLevel::High => Some(16384),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThinkingLevel::Minimal => "minimal",
            ThinkingLevel::Low => "low",
            ThinkingLevel::Medium => "medium",
            ThinkingLevel::High => "high",
        }
    }
}

impl FromStr for ThinkingLevel {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(ThinkingLevel::Minimal),
            "low" => Ok(ThinkingLevel::Low),
            "medium" => Ok(ThinkingLevel::Medium),
            "high" => Ok(ThinkingLevel::High),
            _ => Err(ParamError::ThinkingLevel(s.to_string())),
        }
    }
}

impl fmt::Display for ThinkingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CEFR proficiency level the letter's grammar and vocabulary should target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageLevel {
    B1,
    B2,
    #[default]
    C1,
    C2,
}

impl FromStr for LanguageLevel {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "B1" => Ok(LanguageLevel::B1),
            "B2" => Ok(LanguageLevel::B2),
            "C1" => Ok(LanguageLevel::C1),
            "C2" => Ok(LanguageLevel::C2),
            _ => Err(ParamError::LanguageLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LanguageLevel::B1 => "B1",
            LanguageLevel::B2 => "B2",
            LanguageLevel::C1 => "C1",
            LanguageLevel::C2 => "C2",
        };
        f.write_str(s)
    }
}

/// Per-run generation settings. Built once and passed by reference down the call chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub sub_agent_model: String,
    pub main_agent_model: String,
    pub thinking_level: ThinkingLevel,
    pub language_level: LanguageLevel,
    pub use_advanced_extraction: bool,
    /// Upper bound on letter length (the verbosity knob).
    pub max_words: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            sub_agent_model: DEFAULT_SUB_AGENT_MODEL.to_string(),
            main_agent_model: DEFAULT_MAIN_AGENT_MODEL.to_string(),
            thinking_level: ThinkingLevel::default(),
            language_level: LanguageLevel::default(),
            use_advanced_extraction: false,
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

/// Optional per-run overrides coming from CLI flags or form fields.
#[derive(Debug, Clone, Default)]
pub struct ParamOverrides {
    pub sub_agent_model: Option<String>,
    pub main_agent_model: Option<String>,
    pub thinking_level: Option<ThinkingLevel>,
    pub language_level: Option<LanguageLevel>,
    pub use_advanced_extraction: Option<bool>,
    pub max_words: Option<u32>,
}

impl GenerationParams {
    /// Applies overrides on top of `self` and validates the result.
    pub fn with_overrides(&self, overrides: ParamOverrides) -> Result<Self, ParamError> {
        let params = Self {
            sub_agent_model: non_blank(overrides.sub_agent_model)
                .unwrap_or_else(|| self.sub_agent_model.clone()),
            main_agent_model: non_blank(overrides.main_agent_model)
                .unwrap_or_else(|| self.main_agent_model.clone()),
            thinking_level: overrides.thinking_level.unwrap_or(self.thinking_level),
            language_level: overrides.language_level.unwrap_or(self.language_level),
            use_advanced_extraction: overrides
                .use_advanced_extraction
                .unwrap_or(self.use_advanced_extraction),
            max_words: overrides.max_words.unwrap_or(self.max_words),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        if !(50..=1000).contains(&self.max_words) {
            return Err(ParamError::MaxWords(self.max_words));
        }
        Ok(())
    }

    pub fn extract_depth(&self) -> &'static str {
        if self.use_advanced_extraction {
            "advanced"
        } else {
            "basic"
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
