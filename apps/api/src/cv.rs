//! CV text extraction. PDF parsing itself is delegated to `pdf-extract`.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read CV file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("not a readable PDF: {0}")]
    Pdf(String),

    #[error("PDF extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// The CV as supplied by a caller: raw PDF bytes or already-extracted text.
#[derive(Debug, Clone)]
pub enum CvSource {
    Pdf(Bytes),
    Text(String),
}

impl CvSource {
    /// Reads a CV from disk. `.txt` and `.md` files are taken as plain text, anything
    /// else as a PDF.
    pub async fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ExtractError::Io {
                path: path.display().to_string(),
                source,
            })?;

        let is_text = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("md"));
        if is_text {
            return Ok(CvSource::Text(String::from_utf8_lossy(&bytes).into_owned()));
        }
        Ok(CvSource::Pdf(Bytes::from(bytes)))
    }
}

/// Text-extraction capability (`pdf_to_text`).
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn pdf_to_text(&self, pdf: Bytes) -> Result<String, ExtractError>;
}

/// `pdf-extract` backed extractor. Parsing is CPU-bound, so it runs on the blocking pool.
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn pdf_to_text(&self, pdf: Bytes) -> Result<String, ExtractError> {
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&pdf).map_err(|e| ExtractError::Pdf(e.to_string()))
        })
        .await??;
        Ok(normalize_whitespace(&text))
    }
}

/// Collapses runs of blank lines and trailing spaces left behind by PDF layout.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
