//! Curriculum model
//!
//! A curriculum is an ordered list of phases, each holding an ordered list of
//! steps. Steps are plain content, a video, or the phase quiz. The catalog is
//! immutable once loaded and is validated before use.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier of a phase (not necessarily its index)
pub type PhaseId = u32;

/// Errors found while validating a curriculum catalog
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CurriculumError {
    #[error("curriculum has no phases")]
    NoPhases,

    #[error("phase {phase_id} has no steps")]
    EmptyPhase { phase_id: PhaseId },

    #[error("phase id {phase_id} is used more than once")]
    DuplicatePhaseId { phase_id: PhaseId },

    #[error("phase {phase_id} has more than one step with id '{step_id}'")]
    DuplicateStepId { phase_id: PhaseId, step_id: String },

    #[error("phase {phase_id} has more than one quiz step")]
    MultipleQuizzes { phase_id: PhaseId },

    #[error("video step '{step_id}' in phase {phase_id} has an empty url")]
    MissingVideoUrl { phase_id: PhaseId, step_id: String },

    #[error("quiz step '{step_id}' in phase {phase_id} has no questions")]
    EmptyQuiz { phase_id: PhaseId, step_id: String },

    #[error("question '{question_id}' in phase {phase_id} needs at least two options")]
    TooFewOptions { phase_id: PhaseId, question_id: String },

    #[error("question '{question_id}' in phase {phase_id} points at missing option {index}")]
    CorrectIndexOutOfRange { phase_id: PhaseId, question_id: String, index: usize },

    #[error("question id '{question_id}' is repeated in phase {phase_id}")]
    DuplicateQuestionId { phase_id: PhaseId, question_id: String },
}

/// The full, ordered catalog of phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    pub phases: Vec<Phase>,
}

impl Curriculum {
    /// Build a curriculum and validate it
    pub fn new(phases: Vec<Phase>) -> Result<Self, CurriculumError> {
        let curriculum = Self { phases };
        curriculum.validate()?;
        Ok(curriculum)
    }

    /// Number of phases
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Get a phase by index
    pub fn phase(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    /// Get a step by phase and step index
    pub fn step(&self, phase_index: usize, step_index: usize) -> Option<&Step> {
        self.phases.get(phase_index).and_then(|p| p.steps.get(step_index))
    }

    /// Find the index of a phase by its id
    pub fn phase_index_of(&self, id: PhaseId) -> Option<usize> {
        self.phases.iter().position(|p| p.id == id)
    }

    /// Ids of every phase, in catalog order
    pub fn phase_ids(&self) -> impl Iterator<Item = PhaseId> + '_ {
        self.phases.iter().map(|p| p.id)
    }

    /// Total number of steps across all phases
    pub fn step_count(&self) -> usize {
        self.phases.iter().map(|p| p.steps.len()).sum()
    }

    /// Check the structural rules every catalog must satisfy
    pub fn validate(&self) -> Result<(), CurriculumError> {
        if self.phases.is_empty() {
            return Err(CurriculumError::NoPhases);
        }

        let mut phase_ids = HashSet::new();
        for phase in &self.phases {
            if !phase_ids.insert(phase.id) {
                return Err(CurriculumError::DuplicatePhaseId { phase_id: phase.id });
            }
            phase.validate()?;
        }

        Ok(())
    }
}

/// A phase: one chapter of the curriculum, closed by its quiz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub steps: Vec<Step>,
}

impl Phase {
    /// Index of the last step
    pub fn last_step_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Index of the quiz step, if the phase has one
    pub fn quiz_step_index(&self) -> Option<usize> {
        self.steps.iter().position(Step::is_quiz)
    }

    /// Whether this phase closes with a quiz
    pub fn has_quiz(&self) -> bool {
        self.quiz_step_index().is_some()
    }

    fn validate(&self) -> Result<(), CurriculumError> {
        let phase_id = self.id;
        if self.steps.is_empty() {
            return Err(CurriculumError::EmptyPhase { phase_id });
        }

        let mut step_ids = HashSet::new();
        let mut quiz_seen = false;

        for step in &self.steps {
            if !step_ids.insert(step.id.as_str()) {
                return Err(CurriculumError::DuplicateStepId { phase_id, step_id: step.id.clone() });
            }

            match &step.kind {
                StepKind::Content => {}
                StepKind::Video { video_url } => {
                    if video_url.trim().is_empty() {
                        return Err(CurriculumError::MissingVideoUrl {
                            phase_id,
                            step_id: step.id.clone(),
                        });
                    }
                }
                StepKind::Quiz { questions } => {
                    if quiz_seen {
                        return Err(CurriculumError::MultipleQuizzes { phase_id });
                    }
                    quiz_seen = true;
                    validate_questions(phase_id, &step.id, questions)?;
                }
            }
        }

        Ok(())
    }
}

fn validate_questions(
    phase_id: PhaseId,
    step_id: &str,
    questions: &[QuizQuestion],
) -> Result<(), CurriculumError> {
    if questions.is_empty() {
        return Err(CurriculumError::EmptyQuiz { phase_id, step_id: step_id.to_string() });
    }

    let mut seen = HashSet::new();
    for q in questions {
        if !seen.insert(q.id.as_str()) {
            return Err(CurriculumError::DuplicateQuestionId {
                phase_id,
                question_id: q.id.clone(),
            });
        }
        if q.options.len() < 2 {
            return Err(CurriculumError::TooFewOptions { phase_id, question_id: q.id.clone() });
        }
        if q.correct_index >= q.options.len() {
            return Err(CurriculumError::CorrectIndexOutOfRange {
                phase_id,
                question_id: q.id.clone(),
                index: q.correct_index,
            });
        }
    }

    Ok(())
}

/// A single step within a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub title: String,
    /// Markdown body
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub kind: StepKind,
}

impl Step {
    pub fn is_quiz(&self) -> bool {
        matches!(self.kind, StepKind::Quiz { .. })
    }

    /// Questions of a quiz step (empty for other kinds)
    pub fn questions(&self) -> &[QuizQuestion] {
        match &self.kind {
            StepKind::Quiz { questions } => questions,
            _ => &[],
        }
    }

    pub fn video_url(&self) -> Option<&str> {
        match &self.kind {
            StepKind::Video { video_url } => Some(video_url),
            _ => None,
        }
    }
}

/// What a step shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StepKind {
    Content,
    Video { video_url: String },
    Quiz { questions: Vec<QuizQuestion> },
}

/// A multiple choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_index
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn fixture_is_valid() {
        let c = curriculum();
        assert_eq!(c.phase_count(), 3);
        assert_eq!(c.step_count(), 4 + 7 + 3);
    }

    #[test]
    fn quiz_step_index_points_at_quiz() {
        let p = phase(1, 3);
        assert_eq!(p.quiz_step_index(), Some(3));
        assert_eq!(p.last_step_index(), 3);
        assert!(p.has_quiz());
    }

    #[test]
    fn phase_lookup_by_id() {
        let c = curriculum();
        assert_eq!(c.phase_index_of(20), Some(1));
        assert_eq!(c.phase_index_of(99), None);
    }

    #[test]
    fn rejects_empty_catalog() {
        assert_eq!(Curriculum::new(vec![]), Err(CurriculumError::NoPhases));
    }

    #[test]
    fn rejects_duplicate_phase_ids() {
        let err = Curriculum::new(vec![phase(1, 1), phase(1, 1)]).unwrap_err();
        assert_eq!(err, CurriculumError::DuplicatePhaseId { phase_id: 1 });
    }

    #[test]
    fn rejects_phase_without_steps() {
        let empty =
            Phase { id: 4, title: "Empty".into(), description: String::new(), steps: vec![] };
        assert_eq!(
            Curriculum::new(vec![empty]).unwrap_err(),
            CurriculumError::EmptyPhase { phase_id: 4 }
        );
    }

    #[test]
    fn rejects_second_quiz_in_phase() {
        let mut p = phase(1, 1);
        p.steps.push(quiz("quiz2", vec![question("x", 0)]));
        assert_eq!(
            Curriculum::new(vec![p]).unwrap_err(),
            CurriculumError::MultipleQuizzes { phase_id: 1 }
        );
    }

    #[test]
    fn rejects_out_of_range_answer() {
        let p = Phase {
            id: 2,
            title: "Bad".into(),
            description: String::new(),
            steps: vec![quiz("quiz", vec![question("q", 7)])],
        };
        assert!(matches!(
            Curriculum::new(vec![p]),
            Err(CurriculumError::CorrectIndexOutOfRange { index: 7, .. })
        ));
    }

    #[test]
    fn rejects_single_option_question() {
        let mut q = question("q", 0);
        q.options.truncate(1);
        let p = Phase {
            id: 2,
            title: "Bad".into(),
            description: String::new(),
            steps: vec![quiz("quiz", vec![q])],
        };
        assert!(matches!(Curriculum::new(vec![p]), Err(CurriculumError::TooFewOptions { .. })));
    }

    #[test]
    fn rejects_blank_video_url() {
        let video = Step {
            id: "v".into(),
            title: "Video".into(),
            content: String::new(),
            kind: StepKind::Video { video_url: "  ".into() },
        };
        let p = Phase { id: 5, title: "V".into(), description: String::new(), steps: vec![video] };
        assert!(matches!(Curriculum::new(vec![p]), Err(CurriculumError::MissingVideoUrl { .. })));
    }

    #[test]
    fn phase_without_quiz_is_allowed() {
        let p = Phase {
            id: 1,
            title: "Reading".into(),
            description: String::new(),
            steps: vec![content("a"), content("b")],
        };
        let c = Curriculum::new(vec![p]).unwrap();
        assert!(!c.phases[0].has_quiz());
    }

    #[test]
    fn step_kind_uses_kind_tag() {
        let json = r#"{
            "id": "video_lesson",
            "title": "Video",
            "content": "Watch this",
            "kind": "video",
            "video_url": "https://example.com/v"
        }"#;
        let step: Step = serde_json::from_str(json).unwrap();
        assert_eq!(step.video_url(), Some("https://example.com/v"));
        assert!(!step.is_quiz());
    }

    #[test]
    fn quiz_step_deserializes_questions() {
        let json = r#"{
            "id": "quiz",
            "title": "Quiz",
            "kind": "quiz",
            "questions": [
                {"id": "q1", "question": "2+2?", "options": ["3", "4"], "correct_index": 1}
            ]
        }"#;
        let step: Step = serde_json::from_str(json).unwrap();
        assert_eq!(step.questions().len(), 1);
        assert!(step.questions()[0].is_correct(1));
        assert!(step.content.is_empty());
    }
}
