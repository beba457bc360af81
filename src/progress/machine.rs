//! The progress state machine
//!
//! [`reduce`] is a pure function from (catalog, state, action) to the next
//! state plus the persistence effect it calls for. [`ProgressMachine`] owns the
//! state, runs the reducer and performs the effect against a [`ProgressStore`].
//!
//! Actions whose preconditions are not met (locked targets, no quiz on the
//! current step, nothing after the last step) leave the state untouched.

use crate::curriculum::{Curriculum, Phase, PhaseId, QuizQuestion, Step};

use super::gating::Gate;
use super::quiz::{QuizAttempt, QuizScore, is_passing};
use super::snapshot::ProgressSnapshot;
use super::store::ProgressStore;

/// Something the learner asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Next,
    Previous,
    JumpToPhase(usize),
    JumpToStep { phase: usize, step: usize },
    StartQuiz,
    SelectAnswer { question_id: String, option: usize },
    MoveQuestion(isize),
    SubmitQuiz,
    AdvancePhase,
    Reset,
}

/// What the store should do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Save the full snapshot
    Persist,
    /// Forget the saved snapshot
    Clear,
}

/// Notable things a transition did, for badges and status messages
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    QuizSubmitted { phase_id: PhaseId, score: QuizScore },
    PhaseAdvanced { completed: PhaseId },
    Reset,
}

/// Snapshot plus the transient quiz attempt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearnerState {
    pub snapshot: ProgressSnapshot,
    /// Present exactly when `snapshot.is_quiz_mode` is set
    pub quiz: Option<QuizAttempt>,
}

impl LearnerState {
    fn leave_quiz(&mut self) {
        self.snapshot.is_quiz_mode = false;
        self.quiz = None;
    }

    fn move_to(&mut self, phase: usize, step: usize) {
        self.snapshot.current_phase_index = phase;
        self.snapshot.current_step_index = step;
        self.snapshot.raise_max_step(phase, step);
        self.leave_quiz();
    }
}

/// Result of reducing one action
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: LearnerState,
    pub effect: Effect,
    pub outcome: Option<Outcome>,
}

/// Compute the next state for `action`
pub fn reduce(curriculum: &Curriculum, state: &LearnerState, action: &Action) -> Transition {
    if let Action::Reset = action {
        return Transition {
            state: LearnerState::default(),
            effect: Effect::Clear,
            outcome: Some(Outcome::Reset),
        };
    }

    let mut next = state.clone();
    let outcome = apply(curriculum, &mut next, action);

    let effect = if next.snapshot != state.snapshot { Effect::Persist } else { Effect::None };
    Transition { state: next, effect, outcome }
}

fn apply(curriculum: &Curriculum, state: &mut LearnerState, action: &Action) -> Option<Outcome> {
    let phase_index = state.snapshot.current_phase_index;
    let step_index = state.snapshot.current_step_index;
    let phase = curriculum.phase(phase_index)?;

    match action {
        Action::Next => {
            if !state.snapshot.is_quiz_mode && step_index < phase.last_step_index() {
                state.move_to(phase_index, step_index + 1);
            }
        }

        Action::Previous => {
            if state.snapshot.is_quiz_mode {
                state.leave_quiz();
            } else if step_index > 0 {
                state.move_to(phase_index, step_index - 1);
            } else if let Some(prev) = phase_index.checked_sub(1) {
                let last = curriculum.phase(prev).map_or(0, Phase::last_step_index);
                state.move_to(prev, last);
            }
        }

        Action::JumpToPhase(target) => {
            if Gate::new(curriculum, &state.snapshot).is_phase_unlocked(*target) {
                state.move_to(*target, 0);
            } else {
                tracing::debug!(phase = target, "Ignoring jump to locked phase");
            }
        }

        Action::JumpToStep { phase: target, step } => {
            if Gate::new(curriculum, &state.snapshot).is_step_reachable(*target, *step) {
                state.move_to(*target, *step);
            } else {
                tracing::debug!(phase = target, step, "Ignoring jump to locked step");
            }
        }

        Action::StartQuiz => {
            if phase.steps.get(step_index).is_some_and(Step::is_quiz) {
                state.snapshot.is_quiz_mode = true;
                state.quiz = Some(QuizAttempt::new());
            }
        }

        Action::SelectAnswer { question_id, option } => {
            let questions = current_questions(phase, step_index);
            if let Some(quiz) = state.quiz.as_mut() {
                quiz.select(questions, question_id, *option);
            }
        }

        Action::MoveQuestion(delta) => {
            let count = current_questions(phase, step_index).len();
            if let Some(quiz) = state.quiz.as_mut() {
                quiz.move_question(count, *delta);
            }
        }

        Action::SubmitQuiz => {
            let questions = current_questions(phase, step_index);
            let score = state.quiz.as_mut().and_then(|quiz| quiz.submit(questions))?;
            state.snapshot.quiz_scores.insert(phase.id, score.percent());
            tracing::info!(
                phase = phase.id,
                correct = score.correct,
                total = score.total,
                "Quiz submitted"
            );
            return Some(Outcome::QuizSubmitted { phase_id: phase.id, score });
        }

        Action::AdvancePhase => {
            let target = phase_index + 1;
            if target < curriculum.phase_count() {
                state.snapshot.completed_phase_ids.insert(phase.id);
                state.move_to(target, 0);
                tracing::info!(completed = phase.id, "Advanced to phase {}", target);
                return Some(Outcome::PhaseAdvanced { completed: phase.id });
            }
        }

        Action::Reset => {}
    }

    None
}

fn current_questions(phase: &Phase, step_index: usize) -> &[QuizQuestion] {
    phase.steps.get(step_index).map_or(&[], Step::questions)
}

/// Owns the learner state and keeps the store in sync with it
pub struct ProgressMachine<S: ProgressStore> {
    curriculum: Curriculum,
    state: LearnerState,
    store: S,
}

impl<S: ProgressStore> ProgressMachine<S> {
    /// Start from the saved snapshot, or from the beginning when there is none usable
    pub fn restore(curriculum: Curriculum, store: S) -> Self {
        let snapshot = match store.load() {
            Ok(Some(snapshot)) if snapshot.resolves_against(&curriculum) => snapshot,
            Ok(Some(_)) => {
                tracing::warn!("Saved progress does not match the curriculum, starting over");
                ProgressSnapshot::default()
            }
            Ok(None) => ProgressSnapshot::default(),
            Err(e) => {
                tracing::warn!("Failed to load progress: {}", e);
                ProgressSnapshot::default()
            }
        };

        let mut state = LearnerState { snapshot, quiz: None };
        let (phase, step) = (state.snapshot.current_phase_index, state.snapshot.current_step_index);

        if state.snapshot.is_quiz_mode {
            if curriculum.step(phase, step).is_some_and(Step::is_quiz) {
                state.quiz = Some(QuizAttempt::new());
            } else {
                state.snapshot.is_quiz_mode = false;
            }
        }
        state.snapshot.raise_max_step(phase, step);

        Self { curriculum, state, store }
    }

    /// Run one action to completion
    pub fn dispatch(&mut self, action: Action) -> Option<Outcome> {
        let transition = reduce(&self.curriculum, &self.state, &action);
        self.state = transition.state;
        self.perform(transition.effect);
        transition.outcome
    }

    fn perform(&self, effect: Effect) {
        let result = match effect {
            Effect::None => return,
            Effect::Persist => self.store.save(&self.state.snapshot),
            Effect::Clear => self.store.clear(),
        };
        if let Err(e) = result {
            tracing::warn!("Progress store failed ({:?}): {}", effect, e);
        }
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn state(&self) -> &LearnerState {
        &self.state
    }

    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.state.snapshot
    }

    pub fn quiz(&self) -> Option<&QuizAttempt> {
        self.state.quiz.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gate(&self) -> Gate<'_> {
        Gate::new(&self.curriculum, &self.state.snapshot)
    }

    pub fn current_phase(&self) -> &Phase {
        // Restored and reduced snapshots always resolve
        &self.curriculum.phases[self.state.snapshot.current_phase_index]
    }

    pub fn current_step(&self) -> &Step {
        &self.current_phase().steps[self.state.snapshot.current_step_index]
    }

    pub fn is_quiz_mode(&self) -> bool {
        self.state.snapshot.is_quiz_mode
    }

    fn has_next_phase(&self) -> bool {
        self.state.snapshot.current_phase_index + 1 < self.curriculum.phase_count()
    }

    /// Score of the submitted attempt in progress, if any
    pub fn submitted_score(&self) -> Option<QuizScore> {
        let quiz = self.state.quiz.as_ref().filter(|q| q.submitted)?;
        Some(quiz.score(self.current_step().questions()))
    }

    /// Whether to offer moving on to the next phase
    pub fn advance_phase_available(&self) -> bool {
        if !self.has_next_phase() {
            return false;
        }
        let phase = self.current_phase();
        if phase.has_quiz() {
            self.state.snapshot.score(phase.id).is_some_and(is_passing)
        } else {
            self.state.snapshot.current_step_index == phase.last_step_index()
        }
    }

    /// Whether to offer another attempt at the quiz
    pub fn retry_available(&self) -> bool {
        self.submitted_score().is_some_and(|s| !s.passed())
    }

    /// The learner has done everything the curriculum asks
    pub fn is_curriculum_finished(&self) -> bool {
        if self.gate().all_phases_completed() {
            return true;
        }
        let last_index = self.curriculum.phase_count().saturating_sub(1);
        let Some(last) = self.curriculum.phase(last_index) else {
            return false;
        };
        if !self.gate().is_phase_unlocked(last_index) {
            return false;
        }
        if last.has_quiz() {
            self.state.snapshot.score(last.id).is_some_and(is_passing)
        } else {
            self.state.snapshot.max_step(last_index) >= last.last_step_index()
        }
    }

    /// Open every phase and step
    #[cfg(any(test, feature = "dev-unlock"))]
    pub fn dev_unlock_all(&mut self) {
        let snapshot = &mut self.state.snapshot;
        for (index, phase) in self.curriculum.phases.iter().enumerate() {
            snapshot.completed_phase_ids.insert(phase.id);
            snapshot.raise_max_step(index, phase.last_step_index());
        }
        tracing::info!("Unlocked every phase");
        self.perform(Effect::Persist);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::curriculum::model::fixtures::curriculum;
    use crate::progress::store::{MemoryStore, StoreError};

    fn machine() -> ProgressMachine<MemoryStore> {
        ProgressMachine::restore(curriculum(), MemoryStore::new())
    }

    fn answer<S: ProgressStore>(m: &mut ProgressMachine<S>, choices: [usize; 4]) {
        for (i, option) in choices.into_iter().enumerate() {
            m.dispatch(Action::SelectAnswer { question_id: format!("q{}", i + 1), option });
        }
    }

    /// Walk to the quiz of the current phase and start it
    fn open_quiz<S: ProgressStore>(m: &mut ProgressMachine<S>) {
        while !m.current_step().is_quiz() {
            m.dispatch(Action::Next);
        }
        m.dispatch(Action::StartQuiz);
    }

    fn pass_current_phase<S: ProgressStore>(m: &mut ProgressMachine<S>) {
        open_quiz(m);
        answer(m, [0, 1, 2, 3]);
        m.dispatch(Action::SubmitQuiz);
        m.dispatch(Action::AdvancePhase);
    }

    #[test]
    fn starts_at_canonical_snapshot() {
        let m = machine();
        assert_eq!(m.snapshot(), &ProgressSnapshot::default());
        assert!(m.quiz().is_none());
    }

    #[test]
    fn next_moves_forward_and_raises_mark() {
        let mut m = machine();
        m.dispatch(Action::Next);
        assert_eq!(m.snapshot().current_step_index, 1);
        assert_eq!(m.snapshot().max_step(0), 1);
        assert_eq!(m.store().save_count(), 1);
    }

    #[test]
    fn next_on_last_step_is_noop() {
        let mut m = machine();
        for _ in 0..3 {
            m.dispatch(Action::Next);
        }
        let before = m.state().clone();
        let saves = m.store().save_count();
        m.dispatch(Action::Next);
        assert_eq!(m.state(), &before);
        assert_eq!(m.store().save_count(), saves);
    }

    #[test]
    fn next_into_quiz_step_updates_mark() {
        let mut m = machine();
        m.dispatch(Action::Next);
        m.dispatch(Action::Next);
        m.dispatch(Action::Next);
        assert_eq!(m.snapshot().current_step_index, 3);
        assert!(m.current_step().is_quiz());
        assert_eq!(m.snapshot().max_step(0), 3);
    }

    #[test]
    fn previous_steps_back_then_crosses_phase() {
        let mut m = machine();
        pass_current_phase(&mut m);
        m.dispatch(Action::Next);
        m.dispatch(Action::Previous);
        assert_eq!((m.snapshot().current_phase_index, m.snapshot().current_step_index), (1, 0));

        m.dispatch(Action::Previous);
        assert_eq!((m.snapshot().current_phase_index, m.snapshot().current_step_index), (0, 3));
        assert_eq!(m.snapshot().max_step(0), 3);
    }

    #[test]
    fn previous_at_start_is_noop() {
        let mut m = machine();
        m.dispatch(Action::Previous);
        assert_eq!(m.snapshot(), &ProgressSnapshot::default());
        assert_eq!(m.store().save_count(), 0);
    }

    #[test]
    fn previous_in_quiz_mode_only_exits_quiz() {
        let mut m = machine();
        open_quiz(&mut m);
        answer(&mut m, [0, 0, 0, 0]);
        let position = (m.snapshot().current_phase_index, m.snapshot().current_step_index);

        m.dispatch(Action::Previous);
        assert!(!m.is_quiz_mode());
        assert!(m.quiz().is_none());
        assert_eq!((m.snapshot().current_phase_index, m.snapshot().current_step_index), position);
    }

    #[test]
    fn next_is_ignored_in_quiz_mode() {
        let mut m = machine();
        open_quiz(&mut m);
        let before = m.state().clone();
        m.dispatch(Action::Next);
        assert_eq!(m.state(), &before);
    }

    #[test]
    fn start_quiz_needs_quiz_step() {
        let mut m = machine();
        m.dispatch(Action::StartQuiz);
        assert!(!m.is_quiz_mode());
        assert!(m.quiz().is_none());
    }

    #[test]
    fn quiz_answers_do_not_persist() {
        let mut m = machine();
        open_quiz(&mut m);
        let saves = m.store().save_count();
        answer(&mut m, [1, 1, 1, 1]);
        m.dispatch(Action::MoveQuestion(2));
        assert_eq!(m.store().save_count(), saves);
        assert_eq!(m.quiz().map(|q| q.current_question), Some(2));
    }

    #[test]
    fn passing_quiz_offers_advance() {
        let mut m = machine();
        open_quiz(&mut m);
        answer(&mut m, [0, 1, 2, 0]);
        let outcome = m.dispatch(Action::SubmitQuiz);

        assert_eq!(
            outcome,
            Some(Outcome::QuizSubmitted { phase_id: 10, score: QuizScore { correct: 3, total: 4 } })
        );
        assert_eq!(m.snapshot().score(10), Some(75.0));
        assert!(m.advance_phase_available());
        assert!(!m.retry_available());

        m.dispatch(Action::AdvancePhase);
        assert_eq!(m.snapshot().completed_phase_ids, BTreeSet::from([10]));
        assert_eq!((m.snapshot().current_phase_index, m.snapshot().current_step_index), (1, 0));
        assert!(!m.is_quiz_mode());
        assert_eq!(m.snapshot().max_step(1), 0);
    }

    #[test]
    fn failing_quiz_offers_only_retry() {
        let mut m = machine();
        open_quiz(&mut m);
        answer(&mut m, [0, 1, 0, 0]);
        m.dispatch(Action::SubmitQuiz);

        assert_eq!(m.snapshot().score(10), Some(50.0));
        assert!(m.retry_available());
        assert!(!m.advance_phase_available());

        m.dispatch(Action::StartQuiz);
        let quiz = m.quiz().unwrap();
        assert!(!quiz.submitted);
        assert!(quiz.answers.is_empty());
        // The last score stays until the next submission
        assert_eq!(m.snapshot().score(10), Some(50.0));
    }

    #[test]
    fn submit_needs_every_answer() {
        let mut m = machine();
        open_quiz(&mut m);
        m.dispatch(Action::SelectAnswer { question_id: "q1".into(), option: 0 });
        assert_eq!(m.dispatch(Action::SubmitQuiz), None);
        assert!(m.snapshot().quiz_scores.is_empty());
    }

    #[test]
    fn jump_to_locked_step_is_noop() {
        let mut m = machine();
        m.dispatch(Action::Next);
        let before = m.state().clone();
        let saves = m.store().save_count();

        m.dispatch(Action::JumpToStep { phase: 1, step: 5 });
        m.dispatch(Action::JumpToPhase(2));
        m.dispatch(Action::JumpToStep { phase: 0, step: 3 });

        assert_eq!(m.state(), &before);
        assert_eq!(m.store().save_count(), saves);
    }

    #[test]
    fn jump_within_visited_steps() {
        let mut m = machine();
        m.dispatch(Action::Next);
        m.dispatch(Action::Next);
        m.dispatch(Action::JumpToStep { phase: 0, step: 0 });
        assert_eq!(m.snapshot().current_step_index, 0);
        assert_eq!(m.snapshot().max_step(0), 2);
    }

    #[test]
    fn jump_to_phase_exits_quiz() {
        let mut m = machine();
        open_quiz(&mut m);
        m.dispatch(Action::JumpToPhase(0));
        assert!(!m.is_quiz_mode());
        assert_eq!(m.snapshot().current_step_index, 0);
    }

    #[test]
    fn advance_on_last_phase_is_noop() {
        let mut m = machine();
        pass_current_phase(&mut m);
        pass_current_phase(&mut m);
        assert_eq!(m.snapshot().current_phase_index, 2);

        open_quiz(&mut m);
        answer(&mut m, [0, 1, 2, 3]);
        m.dispatch(Action::SubmitQuiz);
        assert!(!m.advance_phase_available());
        assert!(m.is_curriculum_finished());

        let before = m.state().clone();
        assert_eq!(m.dispatch(Action::AdvancePhase), None);
        assert_eq!(m.state(), &before);
    }

    #[test]
    fn completed_set_gains_id_once() {
        let mut m = machine();
        pass_current_phase(&mut m);
        m.dispatch(Action::JumpToPhase(0));
        m.dispatch(Action::AdvancePhase);
        assert_eq!(m.snapshot().completed_phase_ids, BTreeSet::from([10]));
    }

    #[test]
    fn advancing_again_keeps_visited_steps_open() {
        let mut m = machine();
        pass_current_phase(&mut m);
        for _ in 0..4 {
            m.dispatch(Action::Next);
        }
        m.dispatch(Action::JumpToPhase(0));
        m.dispatch(Action::AdvancePhase);
        assert_eq!(m.snapshot().max_step(1), 4);
    }

    #[test]
    fn reset_clears_once_and_saves_nothing() {
        let mut m = machine();
        pass_current_phase(&mut m);
        m.dispatch(Action::Next);
        open_quiz(&mut m);

        let saves = m.store().save_count();
        assert_eq!(m.dispatch(Action::Reset), Some(Outcome::Reset));

        assert_eq!(m.snapshot(), &ProgressSnapshot::default());
        assert!(m.quiz().is_none());
        assert_eq!(m.store().clear_count(), 1);
        assert_eq!(m.store().save_count(), saves);
        assert!(m.store().load().unwrap().is_none());
    }

    #[test]
    fn reset_after_progress_restores_fresh_session() {
        let store = MemoryStore::new();
        {
            let mut m = ProgressMachine::restore(curriculum(), &store);
            pass_current_phase(&mut m);
            m.dispatch(Action::Reset);
        }
        let fresh = ProgressMachine::restore(curriculum(), &store);
        assert_eq!(fresh.snapshot(), &ProgressSnapshot::default());
        assert_eq!(store.clear_count(), 1);
    }

    #[test]
    fn restore_uses_saved_snapshot() {
        let store = MemoryStore::new();
        {
            let mut m = ProgressMachine::restore(curriculum(), &store);
            m.dispatch(Action::Next);
            m.dispatch(Action::Next);
        }
        let m = ProgressMachine::restore(curriculum(), &store);
        assert_eq!(m.snapshot().current_step_index, 2);
        assert_eq!(m.snapshot().max_step(0), 2);
    }

    #[test]
    fn restore_ignores_malformed_record() {
        let m = ProgressMachine::restore(curriculum(), MemoryStore::with_record("{ nope"));
        assert_eq!(m.snapshot(), &ProgressSnapshot::default());
    }

    #[test]
    fn restore_ignores_snapshot_that_does_not_resolve() {
        let mut stale = ProgressSnapshot::default();
        stale.current_phase_index = 8;
        let record = serde_json::to_string(&stale).unwrap();
        let m = ProgressMachine::restore(curriculum(), MemoryStore::with_record(record));
        assert_eq!(m.snapshot(), &ProgressSnapshot::default());
    }

    #[test]
    fn restore_quiz_mode_gets_fresh_attempt() {
        let mut saved = ProgressSnapshot::default();
        saved.current_step_index = 3;
        saved.raise_max_step(0, 3);
        saved.is_quiz_mode = true;
        let record = serde_json::to_string(&saved).unwrap();

        let m = ProgressMachine::restore(curriculum(), MemoryStore::with_record(record));
        assert!(m.is_quiz_mode());
        assert_eq!(m.quiz(), Some(&QuizAttempt::new()));
    }

    #[test]
    fn restore_drops_quiz_mode_off_quiz_step() {
        let mut saved = ProgressSnapshot::default();
        saved.is_quiz_mode = true;
        let record = serde_json::to_string(&saved).unwrap();

        let m = ProgressMachine::restore(curriculum(), MemoryStore::with_record(record));
        assert!(!m.is_quiz_mode());
        assert!(m.quiz().is_none());
    }

    struct BrokenStore;

    fn broken() -> StoreError {
        StoreError::Io { path: "progress.json".into(), source: std::io::Error::other("disk full") }
    }

    impl ProgressStore for BrokenStore {
        fn save(&self, _: &ProgressSnapshot) -> Result<(), StoreError> {
            Err(broken())
        }

        fn load(&self) -> Result<Option<ProgressSnapshot>, StoreError> {
            Err(broken())
        }

        fn clear(&self) -> Result<(), StoreError> {
            Err(broken())
        }
    }

    #[test]
    fn store_failures_are_swallowed() {
        let mut m = ProgressMachine::restore(curriculum(), BrokenStore);
        m.dispatch(Action::Next);
        assert_eq!(m.snapshot().current_step_index, 1);
        m.dispatch(Action::Reset);
        assert_eq!(m.snapshot(), &ProgressSnapshot::default());
    }

    #[test]
    fn dev_unlock_opens_everything() {
        let mut m = machine();
        m.dev_unlock_all();
        let gate = m.gate();
        assert!((0..3).all(|p| gate.is_phase_unlocked(p)));
        assert!(gate.is_step_reachable(1, 6));
        assert!(m.is_curriculum_finished());
    }

    fn jump_to_step((phase, step): (usize, usize)) -> Action {
        Action::JumpToStep { phase, step }
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            3 => Just(Action::Next),
            1 => Just(Action::Previous),
            1 => (0usize..4).prop_map(Action::JumpToPhase),
            1 => (0usize..4, 0usize..8).prop_map(jump_to_step),
            2 => Just(Action::StartQuiz),
            3 => (1usize..=4, 0usize..5).prop_map(|(q, option)| Action::SelectAnswer {
                question_id: format!("q{q}"),
                option,
            }),
            1 => (-2isize..=2).prop_map(Action::MoveQuestion),
            2 => Just(Action::SubmitQuiz),
            2 => Just(Action::AdvancePhase),
        ]
    }

    proptest! {
        #[test]
        fn high_water_marks_never_drop(actions in proptest::collection::vec(action(), 0..120)) {
            let c = curriculum();
            let mut state = LearnerState::default();
            for a in &actions {
                let next = reduce(&c, &state, a).state;
                for (phase, mark) in &state.snapshot.max_step_reached {
                    prop_assert!(next.snapshot.max_step(*phase) >= *mark);
                }
                state = next;
            }
        }

        #[test]
        fn state_invariants_hold(actions in proptest::collection::vec(action(), 0..120)) {
            let c = curriculum();
            let mut state = LearnerState::default();
            for a in &actions {
                state = reduce(&c, &state, a).state;
                let s = &state.snapshot;
                prop_assert!(s.resolves_against(&c));
                prop_assert_eq!(state.quiz.is_some(), s.is_quiz_mode);
                prop_assert!(s.max_step(s.current_phase_index) >= s.current_step_index);
                prop_assert!(Gate::new(&c, s).is_phase_unlocked(s.current_phase_index));
            }
        }

        #[test]
        fn locked_targets_are_ignored(
            actions in proptest::collection::vec(action(), 0..80),
            phase in 0usize..3,
            step in 0usize..7,
        ) {
            let c = curriculum();
            let mut state = LearnerState::default();
            for a in &actions {
                state = reduce(&c, &state, a).state;
            }
            let gate = Gate::new(&c, &state.snapshot);
            if !gate.is_phase_unlocked(phase) {
                for a in [Action::JumpToPhase(phase), Action::JumpToStep { phase, step }] {
                    let t = reduce(&c, &state, &a);
                    prop_assert_eq!(&t.state, &state);
                    prop_assert_eq!(t.effect, Effect::None);
                }
            }
        }

        #[test]
        fn reset_is_canonical(actions in proptest::collection::vec(action(), 0..80)) {
            let c = curriculum();
            let mut state = LearnerState::default();
            for a in &actions {
                state = reduce(&c, &state, a).state;
            }
            let t = reduce(&c, &state, &Action::Reset);
            prop_assert_eq!(t.state, LearnerState::default());
            prop_assert_eq!(t.effect, Effect::Clear);
        }
    }
}
