use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The terminal artifact of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedLetter {
    pub text: String,
    pub model_used: String,
    pub timestamp: DateTime<Utc>,
}

impl GeneratedLetter {
    pub fn new(text: impl Into<String>, model_used: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model_used: model_used.into(),
            timestamp: Utc::now(),
        }
    }
}
