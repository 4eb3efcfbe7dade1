/// LLM Client: the single point of entry for all Gemini API calls in the tutor.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All LLM interactions MUST go through `AiClient`.
///
/// One best-effort request per `ask`: no retries, no rate limiting. Callers that
/// need a retry policy wrap the client themselves.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

use prompts::SYSTEM_PROMPT;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";
const REDACTED: &str = "[REDACTED]";
/// The model used for all LLM calls in the tutor.
pub const MODEL: &str = "gemini-1.5-pro";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API Error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error reported by the service itself (bad key, quota, blocked prompt).
    /// Displayed verbatim.
    #[error("{0}")]
    Service(String),

    #[error("API Error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("API Error: malformed response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No response generated.")]
    EmptyContent,
}

/// Text-generation seam used by the session controller and the analysis helpers.
///
/// `GeminiClient` is the production backend; tests swap in stubs.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Sends `prompt` (wrapped with the tutor instruction) and returns the reply text.
    async fn ask(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<GeminiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Sends `prompt` and returns the reply, or the error's message in its place.
/// Failures are shown to the user like any other answer.
pub async fn ask_or_describe(ai: &dyn AiClient, prompt: &str) -> String {
    match ai.ask(prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "AI request failed, showing the error as the answer");
            e.to_string()
        }
    }
}

/// Builds the single text sent to the model: tutor instruction plus the question.
pub fn build_prompt(question: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\nQuestion: {question}")
}

/// Gemini `generateContent` client.
///
/// The key travels in the `x-goog-api-key` header, never in the URL, so transport
/// errors cannot echo it back into the transcript.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, format!("{GEMINI_API_BASE}/{MODEL}:generateContent"))
    }

    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            endpoint,
        }
    }

    async fn send(&self, prompt: &str) -> Result<String, LlmError> {
        let full_prompt = build_prompt(prompt);
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &full_prompt,
                }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Http(e.without_url()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Gemini API returned an error status");
            return Err(parse_error_body(status.as_u16(), body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        if let Some(err) = parsed.error {
            return Err(LlmError::Service(err.message));
        }

        let text = parsed.into_text().ok_or(LlmError::EmptyContent)?;
        debug!(chars = text.len(), "LLM call succeeded");
        Ok(text)
    }
}

#[async_trait]
impl AiClient for GeminiClient {
    async fn ask(&self, prompt: &str) -> Result<String, LlmError> {
        self.send(prompt).await.map_err(|e| redact(e, &self.api_key))
    }
}

/// Replaces any echo of the API key in service-provided text.
fn redact(err: LlmError, api_key: &str) -> LlmError {
    if api_key.is_empty() {
        return err;
    }
    let scrub = |text: String| text.replace(api_key, REDACTED);
    match err {
        LlmError::Service(message) => LlmError::Service(scrub(message)),
        LlmError::Status { status, body } => LlmError::Status {
            status,
            body: scrub(body),
        },
        other => other,
    }
}

/// Maps a non-2xx body to `Service` when Gemini's error envelope is present.
fn parse_error_body(status: u16, body: String) -> LlmError {
    match serde_json::from_str::<GeminiError>(&body) {
        Ok(e) => LlmError::Service(e.error.message),
        Err(_) => LlmError::Status { status, body },
    }
}
