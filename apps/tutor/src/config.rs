use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if `GEMINI_API_KEY` is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// JSON file holding the persisted chat transcript.
    pub chat_history_file: PathBuf,
    /// Delay between revealed words on the streaming chat endpoint.
    pub stream_word_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            chat_history_file: std::env::var("CHAT_HISTORY_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("chat_history.json")),
            stream_word_delay_ms: std::env::var("STREAM_WORD_DELAY_MS")
                .unwrap_or_else(|_| "20".to_string())
                .parse::<u64>()
                .context("STREAM_WORD_DELAY_MS must be a whole number of milliseconds")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => anyhow::bail!("Required environment variable '{key}' is empty"),
        Err(e) => Err(e).with_context(|| {
            format!("Required environment variable '{key}' is not set (add it to `.env`)")
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_env_missing_names_the_variable() {
        let err = require_env("TUTOR_TEST_DEFINITELY_UNSET_VAR").unwrap_err();
        assert!(err.to_string().contains("TUTOR_TEST_DEFINITELY_UNSET_VAR"));
    }

    #[test]
    fn test_require_env_present() {
        std::env::set_var("TUTOR_TEST_PRESENT_VAR", "secret");
        assert_eq!(require_env("TUTOR_TEST_PRESENT_VAR").unwrap(), "secret");
    }

    #[test]
    fn test_require_env_blank_is_rejected() {
        std::env::set_var("TUTOR_TEST_BLANK_VAR", "   ");
        assert!(require_env("TUTOR_TEST_BLANK_VAR").is_err());
    }
}
