//! Errors from the tutor backend

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TutorError {
    /// Neither the environment nor the keyring holds a key
    #[error("No API key configured. Set ANTHROPIC_API_KEY or run :tutor-key <key>")]
    NoApiKey,

    #[error("Failed to access keyring: {0}")]
    Keyring(String),

    #[error("Invalid API key format. Key should start with 'sk-ant-'")]
    InvalidApiKey,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited. Retry after {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: u64 },

    /// The stream reported an error event
    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TutorError {
    /// Whether the learner has to fix their key before trying again
    pub fn requires_key(&self) -> bool {
        matches!(
            self,
            TutorError::NoApiKey | TutorError::InvalidApiKey | TutorError::Api { status: 401, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_errors_require_key() {
        assert!(TutorError::NoApiKey.requires_key());
        assert!(TutorError::Api { status: 401, message: String::new() }.requires_key());
        assert!(!TutorError::Api { status: 500, message: String::new() }.requires_key());
        assert!(!TutorError::Cancelled.requires_key());
    }
}
