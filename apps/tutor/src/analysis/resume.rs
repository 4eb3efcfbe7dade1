//! Resume review: one-shot pass-through to the AI client. Nothing is stored.

use thiserror::Error;

use crate::llm_client::prompts::RESUME_ANALYSIS_PREFIX;
use crate::llm_client::{ask_or_describe, AiClient};

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("resume text cannot be empty")]
    Empty,

    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("the PDF contains no extractable text")]
    NoText,
}

pub fn build_resume_prompt(resume_text: &str) -> String {
    format!("{RESUME_ANALYSIS_PREFIX}{}", resume_text.trim())
}

/// Asks for data-science-focused feedback on a resume.
pub async fn analyze_resume(resume_text: &str, ai: &dyn AiClient) -> Result<String, ResumeError> {
    if resume_text.trim().is_empty() {
        return Err(ResumeError::Empty);
    }
    Ok(ask_or_describe(ai, &build_resume_prompt(resume_text)).await)
}

/// Pulls the text layer out of an uploaded PDF resume. CPU-bound; call from
/// `spawn_blocking`.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ResumeError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ResumeError::Pdf(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(ResumeError::NoText);
    }
    Ok(text)
}
