//! One attempt at a phase quiz

use std::collections::HashMap;

use crate::curriculum::QuizQuestion;

/// Minimum percentage that passes a quiz (inclusive)
pub const PASSING_SCORE: f64 = 75.0;

/// Whether a percentage passes
pub fn is_passing(score: f64) -> bool {
    score >= PASSING_SCORE
}

/// Result of a submitted attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl QuizScore {
    /// Score as a percentage in [0, 100]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 * self.correct as f64 / self.total as f64
    }

    pub fn passed(&self) -> bool {
        is_passing(self.percent())
    }
}

/// Transient state of an in-progress quiz. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizAttempt {
    pub current_question: usize,
    /// Question id to chosen option
    pub answers: HashMap<String, usize>,
    pub submitted: bool,
}

impl QuizAttempt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer. Returns false when nothing changed.
    pub fn select(&mut self, questions: &[QuizQuestion], question_id: &str, option: usize) -> bool {
        if self.submitted {
            return false;
        }
        let Some(question) = questions.iter().find(|q| q.id == question_id) else {
            return false;
        };
        if option >= question.options.len() {
            return false;
        }
        self.answers.insert(question.id.clone(), option) != Some(option)
    }

    /// Move the question cursor, clamped to the quiz
    pub fn move_question(&mut self, question_count: usize, delta: isize) -> bool {
        if self.submitted || question_count == 0 {
            return false;
        }
        let target = self.current_question.saturating_add_signed(delta).min(question_count - 1);
        let changed = target != self.current_question;
        self.current_question = target;
        changed
    }

    /// Option chosen for a question, if any
    pub fn answer(&self, question_id: &str) -> Option<usize> {
        self.answers.get(question_id).copied()
    }

    pub fn all_answered(&self, questions: &[QuizQuestion]) -> bool {
        questions.iter().all(|q| self.answers.contains_key(&q.id))
    }

    /// Score the answers without submitting
    pub fn score(&self, questions: &[QuizQuestion]) -> QuizScore {
        let correct = questions
            .iter()
            .filter(|q| self.answer(&q.id).is_some_and(|a| q.is_correct(a)))
            .count();
        QuizScore { correct, total: questions.len() }
    }

    /// Submit once every question is answered
    pub fn submit(&mut self, questions: &[QuizQuestion]) -> Option<QuizScore> {
        if self.submitted || questions.is_empty() || !self.all_answered(questions) {
            return None;
        }
        self.submitted = true;
        Some(self.score(questions))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::curriculum::model::fixtures::question;

    fn four() -> Vec<QuizQuestion> {
        vec![question("q1", 0), question("q2", 1), question("q3", 2), question("q4", 3)]
    }

    #[test]
    fn select_records_and_overwrites() {
        let qs = four();
        let mut a = QuizAttempt::new();
        assert!(a.select(&qs, "q1", 2));
        assert!(a.select(&qs, "q1", 0));
        assert!(!a.select(&qs, "q1", 0));
        assert_eq!(a.answer("q1"), Some(0));
    }

    #[test]
    fn select_ignores_unknown_question_and_bad_option() {
        let qs = four();
        let mut a = QuizAttempt::new();
        assert!(!a.select(&qs, "nope", 0));
        assert!(!a.select(&qs, "q1", 4));
        assert!(a.answers.is_empty());
    }

    #[test]
    fn move_question_clamps() {
        let mut a = QuizAttempt::new();
        assert!(!a.move_question(4, -1));
        assert!(a.move_question(4, 10));
        assert_eq!(a.current_question, 3);
        assert!(a.move_question(4, -2));
        assert_eq!(a.current_question, 1);
        assert!(a.move_question(4, -5));
        assert_eq!(a.current_question, 0);
    }

    #[test]
    fn submit_requires_every_answer() {
        let qs = four();
        let mut a = QuizAttempt::new();
        a.select(&qs, "q1", 0);
        assert_eq!(a.submit(&qs), None);
        assert!(!a.submitted);
    }

    #[test]
    fn three_of_four_passes() {
        let qs = four();
        let mut a = QuizAttempt::new();
        for (id, opt) in [("q1", 0), ("q2", 1), ("q3", 2), ("q4", 0)] {
            a.select(&qs, id, opt);
        }
        let score = a.submit(&qs).unwrap();
        assert_eq!(score.percent(), 75.0);
        assert!(score.passed());
    }

    #[test]
    fn two_of_four_fails() {
        let qs = four();
        let mut a = QuizAttempt::new();
        for (id, opt) in [("q1", 0), ("q2", 1), ("q3", 0), ("q4", 0)] {
            a.select(&qs, id, opt);
        }
        let score = a.submit(&qs).unwrap();
        assert_eq!(score.percent(), 50.0);
        assert!(!score.passed());
    }

    #[test]
    fn submitted_attempt_is_frozen() {
        let qs = four();
        let mut a = QuizAttempt::new();
        for q in &qs {
            a.select(&qs, &q.id, 0);
        }
        assert!(a.submit(&qs).is_some());
        assert_eq!(a.submit(&qs), None);
        assert!(!a.select(&qs, "q2", 1));
        assert!(!a.move_question(4, 1));
    }

    proptest! {
        #[test]
        fn score_is_deterministic_and_bounded(choices in proptest::collection::vec(0usize..4, 4)) {
            let qs = four();
            let mut a = QuizAttempt::new();
            for (q, c) in qs.iter().zip(&choices) {
                a.select(&qs, &q.id, *c);
            }
            let expected = qs.iter().zip(&choices).filter(|(q, c)| q.correct_index == **c).count();
            let score = a.submit(&qs).unwrap();
            prop_assert_eq!(score.correct, expected);
            prop_assert_eq!(score.percent(), 100.0 * expected as f64 / 4.0);
            prop_assert!((0.0..=100.0).contains(&score.percent()));
            prop_assert_eq!(a.score(&qs), score);
        }
    }
}
