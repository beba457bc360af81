//! What the tutor is asked

use serde::{Deserialize, Serialize};

/// The step the learner wants explained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub phase_title: String,
    pub step_title: String,
    pub step_content: String,
}

pub const SYSTEM_PROMPT: &str = "You are an artificial intelligence tutor for absolute beginners. \
    You explain ideas with everyday analogies such as learning to ride a bike, cooking or \
    playing video games. You are short, clear and encouraging.";

/// Step bodies longer than this are cut before being sent
const MAX_CONTENT_CHARS: usize = 4000;

impl ExplanationRequest {
    pub fn new(
        phase_title: impl Into<String>,
        step_title: impl Into<String>,
        step_content: impl Into<String>,
    ) -> Self {
        Self {
            phase_title: phase_title.into(),
            step_title: step_title.into(),
            step_content: step_content.into(),
        }
    }

    /// User message sent to the model
    pub fn prompt(&self) -> String {
        let content: String = self.step_content.chars().take(MAX_CONTENT_CHARS).collect();
        format!(
            "The learner is in the phase \"{}\", on the topic \"{}\".\n\
             The current explanation is:\n\"\"\"\n{}\n\"\"\"\n\n\
             The learner asked for a more detailed explanation or a real-world analogy. \
             Write a short explanation of at most two paragraphs.",
            self.phase_title,
            self.step_title,
            content.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_phase_and_step() {
        let request = ExplanationRequest::new("Our First Brain", "The Q-Table", "A notebook.");
        let prompt = request.prompt();
        assert!(prompt.contains("\"Our First Brain\""));
        assert!(prompt.contains("\"The Q-Table\""));
        assert!(prompt.contains("A notebook."));
        assert!(prompt.contains("two paragraphs"));
    }

    #[test]
    fn long_content_is_truncated() {
        let request = ExplanationRequest::new("P", "S", "x".repeat(MAX_CONTENT_CHARS * 2));
        let xs = request.prompt().chars().filter(|c| *c == 'x').count();
        assert_eq!(xs, MAX_CONTENT_CHARS);
    }
}
