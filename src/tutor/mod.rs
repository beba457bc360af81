//! The AI tutor
//!
//! A [`Tutor`] asks an [`Explainer`] for an alternative explanation of the
//! current step. When no key is configured, or the request fails, the learner
//! gets a short fallback message instead of an error.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod prompt;
pub mod slot;
pub mod streaming;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use client::ClaudeClient;
pub use error::TutorError;
pub use models::TutorModel;
pub use prompt::ExplanationRequest;
pub use slot::{ExplanationSlot, StepKey};

pub const TUTOR_UNAVAILABLE: &str =
    "The tutor is not configured. Set ANTHROPIC_API_KEY or run :tutor-key <key>.";
pub const TUTOR_FAILED: &str = "Could not reach the tutor. Try again in a moment.";
pub const TUTOR_EMPTY: &str = "Sorry, the tutor could not come up with an explanation right now.";

/// Anything that can stream an explanation
#[async_trait]
pub trait Explainer: Send + Sync {
    /// Send answer text through `tx` as it arrives
    async fn stream_explanation(
        &self,
        request: &ExplanationRequest,
        tx: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<(), TutorError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorEvent {
    Chunk(String),
    Finished,
    /// The request produced no usable answer; show this instead
    Fallback(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorUpdate {
    pub key: StepKey,
    pub event: TutorEvent,
}

pub struct Tutor<E> {
    explainer: Option<Arc<E>>,
}

impl<E> Clone for Tutor<E> {
    fn clone(&self) -> Self {
        Self { explainer: self.explainer.clone() }
    }
}

impl Tutor<ClaudeClient> {
    /// Connect using whatever key is configured
    pub fn connect(model: TutorModel) -> Self {
        let client = auth::resolve_api_key().and_then(|key| ClaudeClient::new(key, model));
        match client {
            Ok(client) => {
                tracing::info!("Tutor ready ({})", model.display_name());
                Self::new(client)
            }
            Err(e) => {
                tracing::info!("Tutor unavailable: {}", e);
                Self::unavailable()
            }
        }
    }
}

impl<E: Explainer + 'static> Tutor<E> {
    pub fn new(explainer: E) -> Self {
        Self { explainer: Some(Arc::new(explainer)) }
    }

    pub fn unavailable() -> Self {
        Self { explainer: None }
    }

    pub fn is_available(&self) -> bool {
        self.explainer.is_some()
    }

    /// Full explanation text, or a fallback message
    pub async fn explain(&self, request: &ExplanationRequest) -> String {
        let Some(explainer) = &self.explainer else {
            return TUTOR_UNAVAILABLE.to_string();
        };

        let (tx, mut rx) = mpsc::channel(32);
        let stream = explainer.stream_explanation(request, tx, CancellationToken::new());
        let collect = async {
            let mut text = String::new();
            while let Some(chunk) = rx.recv().await {
                text.push_str(&chunk);
            }
            text
        };
        let (result, text) = tokio::join!(stream, collect);

        match result {
            Err(e) => {
                tracing::warn!("Tutor request failed: {}", e);
                TUTOR_FAILED.to_string()
            }
            Ok(()) if text.trim().is_empty() => TUTOR_EMPTY.to_string(),
            Ok(()) => text,
        }
    }

    /// Run a request in the background, reporting progress through `updates`
    ///
    /// Cancel the returned token to abandon the request.
    pub fn spawn(
        &self,
        key: StepKey,
        request: ExplanationRequest,
        updates: mpsc::UnboundedSender<TutorUpdate>,
    ) -> CancellationToken {
        let cancel = CancellationToken::new();
        let send = move |event| {
            let _ = updates.send(TutorUpdate { key, event });
        };

        let Some(explainer) = self.explainer.clone() else {
            send(TutorEvent::Fallback(TUTOR_UNAVAILABLE));
            return cancel;
        };

        let token = cancel.clone();
        tokio::spawn(async move {
            let (tx, mut rx) = mpsc::channel(32);
            let stream = explainer.stream_explanation(&request, tx, token);
            let forward = async {
                let mut any_text = false;
                while let Some(chunk) = rx.recv().await {
                    any_text |= !chunk.trim().is_empty();
                    send(TutorEvent::Chunk(chunk));
                }
                any_text
            };
            let (result, any_text) = tokio::join!(stream, forward);

            match result {
                Ok(()) if any_text => send(TutorEvent::Finished),
                Ok(()) => send(TutorEvent::Fallback(TUTOR_EMPTY)),
                Err(TutorError::Cancelled) => tracing::debug!("Tutor request cancelled"),
                Err(e) => {
                    tracing::warn!("Tutor request failed: {}", e);
                    send(TutorEvent::Fallback(TUTOR_FAILED));
                }
            }
        });

        cancel
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Replies with fixed chunks, or fails
    struct Scripted {
        chunks: Vec<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl Explainer for Scripted {
        async fn stream_explanation(
            &self,
            _request: &ExplanationRequest,
            tx: mpsc::Sender<String>,
            cancel: CancellationToken,
        ) -> Result<(), TutorError> {
            for chunk in &self.chunks {
                if cancel.is_cancelled() {
                    return Err(TutorError::Cancelled);
                }
                let _ = tx.send(chunk.to_string()).await;
            }
            if self.fail { Err(TutorError::Stream("overloaded".into())) } else { Ok(()) }
        }
    }

    /// Never answers until cancelled
    struct Stalled;

    #[async_trait]
    impl Explainer for Stalled {
        async fn stream_explanation(
            &self,
            _request: &ExplanationRequest,
            _tx: mpsc::Sender<String>,
            cancel: CancellationToken,
        ) -> Result<(), TutorError> {
            cancel.cancelled().await;
            Err(TutorError::Cancelled)
        }
    }

    fn request() -> ExplanationRequest {
        ExplanationRequest::new("Our First Brain", "The Q-Table", "A notebook of scores.")
    }

    fn tutor(chunks: Vec<&'static str>, fail: bool) -> Tutor<Scripted> {
        Tutor::new(Scripted { chunks, fail })
    }

    #[tokio::test]
    async fn explain_joins_chunks() {
        let text = tutor(vec!["Imagine ", "a notebook."], false).explain(&request()).await;
        assert_eq!(text, "Imagine a notebook.");
    }

    #[tokio::test]
    async fn explain_falls_back_without_key() {
        let text = Tutor::<Scripted>::unavailable().explain(&request()).await;
        assert_eq!(text, TUTOR_UNAVAILABLE);
    }

    #[tokio::test]
    async fn explain_falls_back_on_error() {
        let text = tutor(vec!["partial"], true).explain(&request()).await;
        assert_eq!(text, TUTOR_FAILED);
    }

    #[tokio::test]
    async fn explain_falls_back_on_empty_answer() {
        let text = tutor(vec!["  "], false).explain(&request()).await;
        assert_eq!(text, TUTOR_EMPTY);
    }

    async fn drain(mut rx: mpsc::UnboundedReceiver<TutorUpdate>) -> Vec<TutorEvent> {
        let mut events = Vec::new();
        while let Some(update) = rx.recv().await {
            events.push(update.event);
        }
        events
    }

    #[tokio::test]
    async fn spawn_streams_updates() {
        let (tx, rx) = mpsc::unbounded_channel();
        let key = StepKey::new(1, 2);
        tutor(vec!["a", "b"], false).spawn(key, request(), tx);

        assert_eq!(
            drain(rx).await,
            vec![TutorEvent::Chunk("a".into()), TutorEvent::Chunk("b".into()), TutorEvent::Finished]
        );
    }

    #[tokio::test]
    async fn spawn_without_key_reports_fallback() {
        let (tx, rx) = mpsc::unbounded_channel();
        Tutor::<Scripted>::unavailable().spawn(StepKey::new(0, 0), request(), tx);
        assert_eq!(drain(rx).await, vec![TutorEvent::Fallback(TUTOR_UNAVAILABLE)]);
    }

    #[tokio::test]
    async fn spawn_reports_failure() {
        let (tx, rx) = mpsc::unbounded_channel();
        tutor(vec![], true).spawn(StepKey::new(0, 0), request(), tx);
        assert_eq!(drain(rx).await, vec![TutorEvent::Fallback(TUTOR_FAILED)]);
    }

    #[tokio::test]
    async fn cancelled_request_reports_nothing() {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = Tutor::new(Stalled).spawn(StepKey::new(0, 0), request(), tx);
        cancel.cancel();
        assert!(drain(rx).await.is_empty());
    }

    #[tokio::test]
    async fn slot_ignores_update_for_previous_step() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = ExplanationSlot::new();
        let old = StepKey::new(0, 0);
        slot.begin(old);
        slot.attach(tutor(vec!["old"], false).spawn(old, request(), tx));

        let new = StepKey::new(0, 1);
        slot.follow(new);
        slot.begin(new);

        while let Some(update) = rx.recv().await {
            assert!(!slot.apply(update));
        }
        assert_eq!(slot.text(), "");
        assert!(slot.is_loading());
    }
}
