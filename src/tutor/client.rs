//! HTTP client for the Anthropic Messages API

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::Explainer;
use super::error::TutorError;
use super::models::{MessagesRequest, TutorModel};
use super::prompt::{ExplanationRequest, SYSTEM_PROMPT};
use super::streaming;

pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: TutorModel,
}

impl ClaudeClient {
    const API_URL: &'static str = "https://api.anthropic.com/v1/messages";
    const API_VERSION: &'static str = "2023-06-01";

    pub fn new(api_key: String, model: TutorModel) -> Result<Self, TutorError> {
        let client = Client::builder().timeout(std::time::Duration::from_secs(120)).build()?;
        Ok(Self { client, api_key, model })
    }

    pub fn model(&self) -> TutorModel {
        self.model
    }

    /// Send a streaming request and forward the answer text through `tx`
    pub async fn send_streaming(
        &self,
        request: &MessagesRequest,
        tx: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<(), TutorError> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TutorError::Cancelled),
            response = self
                .client
                .post(Self::API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", Self::API_VERSION)
                .header("content-type", "application/json")
                .json(request)
                .send() => response?,
        };

        let response = check_status(response).await?;
        streaming::forward_text(response, tx, cancel).await
    }
}

/// Turn non-success statuses into errors
async fn check_status(response: Response) -> Result<Response, TutorError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_seconds = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return Err(TutorError::RateLimited { retry_after_seconds });
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(TutorError::Api { status: 401, message: "Invalid API key".to_string() });
    }

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(TutorError::Api { status: status.as_u16(), message });
    }

    Ok(response)
}

#[async_trait]
impl Explainer for ClaudeClient {
    async fn stream_explanation(
        &self,
        request: &ExplanationRequest,
        tx: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<(), TutorError> {
        let body = MessagesRequest::new(self.model, request.prompt())
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(600);
        tracing::debug!(model = %body.model, step = %request.step_title, "Requesting explanation");
        self.send_streaming(&body, tx, cancel).await
    }
}
