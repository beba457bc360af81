//! The explanation shown next to the current step

use tokio_util::sync::CancellationToken;

use super::{TutorEvent, TutorUpdate};

/// Which step an explanation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepKey {
    pub phase: usize,
    pub step: usize,
}

impl StepKey {
    pub fn new(phase: usize, step: usize) -> Self {
        Self { phase, step }
    }
}

/// Holds at most one explanation, for one step
///
/// Updates for any other step are dropped, so a slow answer never lands on
/// the wrong page.
#[derive(Debug, Default)]
pub struct ExplanationSlot {
    key: Option<StepKey>,
    text: String,
    loading: bool,
    cancel: Option<CancellationToken>,
}

impl ExplanationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `key`. Refused while the same step is still loading.
    pub fn begin(&mut self, key: StepKey) -> bool {
        if self.loading && self.key == Some(key) {
            return false;
        }
        self.cancel_in_flight();
        self.key = Some(key);
        self.text.clear();
        self.loading = true;
        true
    }

    /// Remember how to stop the request started by [`begin`](Self::begin)
    pub fn attach(&mut self, cancel: CancellationToken) {
        self.cancel = Some(cancel);
    }

    /// Apply an update. Returns false when it was stale.
    pub fn apply(&mut self, update: TutorUpdate) -> bool {
        if self.key != Some(update.key) || !self.loading {
            tracing::debug!(?update.key, "Dropping stale tutor update");
            return false;
        }
        match update.event {
            TutorEvent::Chunk(chunk) => self.text.push_str(&chunk),
            TutorEvent::Finished => self.finish(),
            TutorEvent::Fallback(message) => {
                self.text = message.to_string();
                self.finish();
            }
        }
        true
    }

    fn finish(&mut self) {
        self.loading = false;
        self.cancel = None;
    }

    /// The learner moved; forget anything about another step
    pub fn follow(&mut self, key: StepKey) {
        if self.key.is_some_and(|k| k != key) {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.cancel_in_flight();
        self.key = None;
        self.text.clear();
        self.loading = false;
    }

    fn cancel_in_flight(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn key(&self) -> Option<StepKey> {
        self.key
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether there is anything to show
    pub fn is_active(&self) -> bool {
        self.key.is_some()
    }
}
