//! Key handling and the glue between progress, tutor and screen state
//!
//! Kept apart from the terminal so the whole key flow can run in tests.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use tokio::sync::mpsc;

use super::command::{Command, ParseResult, parse_command};
use super::input::{KeyAction, key_with_modifier_to_action};
use super::state::{AppState, Overlay, Panel, TreeRow, tree_rows};
use crate::progress::{Achievements, Action, Outcome, ProgressMachine, ProgressStore};
use crate::theme::Theme;
use crate::tutor::{
    Explainer, ExplanationRequest, ExplanationSlot, StepKey, Tutor, TutorModel, TutorUpdate, auth,
};
use crate::ui::{self, ProgressView, TutorView, View};

/// What the caller should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
    /// Key or model changed; build a new tutor
    ReconnectTutor,
}

pub struct Controller<S: ProgressStore, E> {
    pub state: AppState,
    machine: ProgressMachine<S>,
    achievements: Achievements,
    achievements_path: Option<PathBuf>,
    tutor: Tutor<E>,
    tutor_model: TutorModel,
    slot: ExplanationSlot,
    updates_tx: mpsc::UnboundedSender<TutorUpdate>,
    updates_rx: mpsc::UnboundedReceiver<TutorUpdate>,
}

impl<S: ProgressStore, E: Explainer + 'static> Controller<S, E> {
    pub fn new(
        machine: ProgressMachine<S>,
        achievements: Achievements,
        achievements_path: Option<PathBuf>,
        tutor: Tutor<E>,
        tutor_model: TutorModel,
    ) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let mut controller = Self {
            state: AppState::default(),
            machine,
            achievements,
            achievements_path,
            tutor,
            tutor_model,
            slot: ExplanationSlot::new(),
            updates_tx,
            updates_rx,
        };
        controller.sync_selection();
        controller.reset_quiz_cursor();
        controller
    }

    pub fn machine(&self) -> &ProgressMachine<S> {
        &self.machine
    }

    pub fn achievements(&self) -> &Achievements {
        &self.achievements
    }

    pub fn slot(&self) -> &ExplanationSlot {
        &self.slot
    }

    pub fn tutor_model(&self) -> TutorModel {
        self.tutor_model
    }

    pub fn set_tutor(&mut self, tutor: Tutor<E>) {
        self.slot.clear();
        self.tutor = tutor;
    }

    pub fn draw(&mut self, frame: &mut Frame, theme: &Theme) {
        let view = View {
            progress: ProgressView::of(&self.machine),
            tutor: TutorView {
                slot: &self.slot,
                available: self.tutor.is_available(),
                model: self.tutor_model,
            },
            achievements: &self.achievements,
            theme,
        };
        ui::draw(frame, &mut self.state, &view);
    }

    /// Apply tutor updates that arrived since the last frame
    pub fn drain_tutor_updates(&mut self) -> bool {
        let mut changed = false;
        while let Ok(update) = self.updates_rx.try_recv() {
            changed |= self.slot.apply(update);
        }
        changed
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        if self.state.command_line.active {
            return self.handle_command_input(key.code);
        }
        if self.state.overlay != Overlay::None {
            self.handle_overlay_key(key.code);
            return Flow::Continue;
        }

        let in_quiz = self.machine.is_quiz_mode();
        let Some(action) = key_with_modifier_to_action(key.code, key.modifiers, in_quiz) else {
            return Flow::Continue;
        };

        match action {
            KeyAction::Quit => return Flow::Quit,
            KeyAction::Help => self.state.overlay = Overlay::Help,
            KeyAction::CommandLine => self.state.command_line.enter_command_mode(),
            KeyAction::Explain => self.explain(),
            _ if in_quiz => self.handle_quiz_action(action),
            _ => self.handle_browse_action(action),
        }
        Flow::Continue
    }

    fn handle_overlay_key(&mut self, key: KeyCode) {
        match (self.state.overlay, key) {
            (Overlay::ConfirmReset, KeyCode::Char('y') | KeyCode::Char('Y')) => {
                self.state.overlay = Overlay::None;
                self.dispatch(Action::Reset);
            }
            (Overlay::ConfirmReset, KeyCode::Char('n') | KeyCode::Esc) => {
                self.state.overlay = Overlay::None;
                self.state.command_line.set_message("Reset cancelled");
            }
            (Overlay::ConfirmReset, _) => {}
            (_, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?')) => {
                self.state.overlay = Overlay::None;
            }
            _ => {}
        }
    }

    fn handle_browse_action(&mut self, action: KeyAction) {
        let curriculum_focused = self.state.focused_panel == Panel::Curriculum;
        let page = self.state.content.visible_height.max(2) as isize;

        match action {
            KeyAction::Previous => self.dispatch(Action::Previous),
            KeyAction::Next => self.dispatch(Action::Next),
            KeyAction::Up | KeyAction::Down | KeyAction::Top | KeyAction::Bottom
                if curriculum_focused =>
            {
                let delta = match action {
                    KeyAction::Up => -1,
                    KeyAction::Down => 1,
                    KeyAction::Top => isize::MIN,
                    _ => isize::MAX,
                };
                let rows = self.rows().len();
                self.state.curriculum.move_selection(rows, delta);
            }
            KeyAction::Up => self.state.content.scroll_by(-1),
            KeyAction::Down => self.state.content.scroll_by(1),
            KeyAction::Top => self.state.content.scroll_offset = 0,
            KeyAction::Bottom => self.state.content.scroll_offset = self.state.content.max_scroll(),
            KeyAction::PageUp => self.state.content.scroll_by(-page),
            KeyAction::PageDown => self.state.content.scroll_by(page),
            KeyAction::HalfPageUp => self.state.content.scroll_by(-page / 2),
            KeyAction::HalfPageDown => self.state.content.scroll_by(page / 2),
            KeyAction::Select if curriculum_focused => self.open_selected_row(),
            KeyAction::Select => self.primary_action(),
            KeyAction::Back => {
                if self.slot.is_active() {
                    self.slot.clear();
                } else {
                    self.state.focused_panel = Panel::Content;
                }
            }
            KeyAction::SwitchPanel => {
                self.state.focused_panel = match self.state.focused_panel {
                    Panel::Content if self.state.panel_visibility.curriculum => Panel::Curriculum,
                    _ => Panel::Content,
                };
            }
            KeyAction::ToggleCurriculum => {
                let visible = !self.state.panel_visibility.curriculum;
                self.state.panel_visibility.curriculum = visible;
                if !visible {
                    self.state.focused_panel = Panel::Content;
                }
            }
            _ => {}
        }
    }

    /// Enter on the content panel: continue, start the quiz, or step forward
    fn primary_action(&mut self) {
        let phase = self.machine.current_phase();
        let on_last_step = self.machine.snapshot().current_step_index == phase.last_step_index();

        if self.machine.advance_phase_available() && on_last_step {
            self.dispatch(Action::AdvancePhase);
        } else if self.machine.current_step().is_quiz() {
            self.dispatch(Action::StartQuiz);
        } else {
            self.dispatch(Action::Next);
        }
    }

    fn open_selected_row(&mut self) {
        let Some(row) = self.rows().get(self.state.curriculum.selected_index).copied() else {
            return;
        };
        match row {
            TreeRow::Phase(phase) => {
                let curriculum = self.machine.curriculum();
                self.state.curriculum.toggle_phase(curriculum, phase);
            }
            TreeRow::Step { phase, step } => {
                if self.machine.gate().is_step_reachable(phase, step) {
                    self.dispatch(Action::JumpToStep { phase, step });
                    self.state.focused_panel = Panel::Content;
                } else {
                    self.state.command_line.set_error("That step is still locked");
                }
            }
        }
    }

    fn handle_quiz_action(&mut self, action: KeyAction) {
        let submitted = self.machine.submitted_score().is_some();

        match action {
            KeyAction::Back => self.dispatch(Action::Previous),
            KeyAction::Select if submitted => {
                if self.machine.advance_phase_available() {
                    self.dispatch(Action::AdvancePhase);
                } else if self.machine.retry_available() {
                    self.dispatch(Action::StartQuiz);
                }
            }
            _ if submitted => {}
            KeyAction::Up | KeyAction::Down => {
                let delta = if action == KeyAction::Up { -1 } else { 1 };
                let count = self.current_question().map_or(0, |q| q.options.len());
                self.state.quiz_cursor.move_by(count, delta);
            }
            KeyAction::Previous => self.dispatch(Action::MoveQuestion(-1)),
            KeyAction::Next => self.dispatch(Action::MoveQuestion(1)),
            KeyAction::Select => {
                let option = self.state.quiz_cursor.option;
                self.answer(option);
            }
            KeyAction::Choose(n) => self.answer(n.saturating_sub(1)),
            KeyAction::SubmitQuiz => {
                let ready = match (self.machine.quiz(), self.machine.current_step()) {
                    (Some(attempt), step) => attempt.all_answered(step.questions()),
                    (None, _) => false,
                };
                if ready {
                    self.dispatch(Action::SubmitQuiz);
                } else {
                    self.state.command_line.set_error("Answer every question before submitting");
                }
            }
            _ => {}
        }
    }

    /// Record `option` for the current question and move to the next one
    fn answer(&mut self, option: usize) {
        let Some(question) = self.current_question() else {
            return;
        };
        if option >= question.options.len() {
            return;
        }
        let question_id = question.id.clone();
        self.state.quiz_cursor.option = option;
        self.dispatch(Action::SelectAnswer { question_id, option });
        self.dispatch(Action::MoveQuestion(1));
    }

    fn current_question(&self) -> Option<&crate::curriculum::QuizQuestion> {
        let attempt = self.machine.quiz()?;
        self.machine.current_step().questions().get(attempt.current_question)
    }

    fn rows(&self) -> Vec<TreeRow> {
        tree_rows(self.machine.curriculum(), &self.state.curriculum.expanded_phases)
    }

    fn current_key(&self) -> StepKey {
        let snapshot = self.machine.snapshot();
        StepKey::new(snapshot.current_phase_index, snapshot.current_step_index)
    }

    /// Run an action and bring everything around the machine up to date
    pub fn dispatch(&mut self, action: Action) {
        let before = self.current_key();
        let question_before = self.machine.quiz().map(|q| q.current_question);

        let outcome = self.machine.dispatch(action);

        if let Some(outcome) = &outcome {
            self.achievements.record(outcome);
            self.report(outcome);
        }
        self.update_badges(outcome.is_some());

        let after = self.current_key();
        if after != before {
            self.state.content.reset();
            self.sync_selection();
        }
        self.slot.follow(after);

        if self.machine.quiz().map(|q| q.current_question) != question_before {
            self.reset_quiz_cursor();
        }
    }

    fn report(&mut self, outcome: &Outcome) {
        let message = match outcome {
            Outcome::QuizSubmitted { score, .. } if score.passed() => {
                format!("Passed with {:.0}%! The next phase is unlocked.", score.percent())
            }
            Outcome::QuizSubmitted { score, .. } => {
                format!("{:.0}%. Review the lesson and try again.", score.percent())
            }
            Outcome::PhaseAdvanced { .. } => {
                let title = &self.machine.current_phase().title;
                format!("Welcome to phase {}: {title}", self.current_key().phase + 1)
            }
            Outcome::Reset => "Progress reset. Starting from the beginning.".to_string(),
        };
        self.state.command_line.set_message(message);
    }

    /// Unlock earned badges, saving when `recorded` changed the record or a badge was won
    fn update_badges(&mut self, recorded: bool) {
        let finished = self.machine.is_curriculum_finished();
        let fresh = self.achievements.evaluate(
            self.machine.curriculum(),
            self.machine.snapshot(),
            finished,
        );
        if let Some(badge) = fresh.last() {
            self.state.command_line.set_message(format!("★ Badge unlocked: {}", badge.title()));
        }
        if recorded || !fresh.is_empty() {
            self.save_achievements();
        }
    }

    fn save_achievements(&self) {
        let Some(path) = &self.achievements_path else {
            return;
        };
        if let Err(e) = self.achievements.save(path) {
            tracing::warn!("Failed to save achievements: {:#}", e);
        }
    }

    fn sync_selection(&mut self) {
        let key = self.current_key();
        let curriculum = self.machine.curriculum();
        self.state.curriculum.select_step(curriculum, key.phase, key.step);
    }

    /// Put the option cursor on the chosen answer, or the first option
    fn reset_quiz_cursor(&mut self) {
        let quiz = self.machine.quiz();
        let chosen = self.current_question().and_then(|q| quiz.and_then(|a| a.answer(&q.id)));
        self.state.quiz_cursor.option = chosen.unwrap_or(0);
    }

    /// Ask the tutor about the current step
    pub fn explain(&mut self) {
        let key = self.current_key();
        if !self.slot.begin(key) {
            self.state.command_line.set_message("The tutor is still answering...");
            return;
        }
        if self.tutor.is_available() {
            self.achievements.record_tutor_use();
            self.update_badges(true);
        }

        let phase = self.machine.current_phase();
        let step = self.machine.current_step();
        let request = ExplanationRequest::new(&phase.title, &step.title, &step.content);
        tracing::debug!(phase = key.phase, step = key.step, "Asking the tutor");
        let cancel = self.tutor.spawn(key, request, self.updates_tx.clone());
        self.slot.attach(cancel);
    }

    fn handle_command_input(&mut self, key: KeyCode) -> Flow {
        let line = &mut self.state.command_line;
        match key {
            KeyCode::Esc => line.exit_input_mode(),
            KeyCode::Enter => {
                let input = line.input.clone();
                line.add_to_history(input.clone());
                line.exit_input_mode();
                return self.run_command(&input);
            }
            KeyCode::Backspace if line.input.is_empty() => line.exit_input_mode(),
            KeyCode::Backspace => line.delete_char(),
            KeyCode::Left => line.move_left(),
            KeyCode::Right => line.move_right(),
            KeyCode::Up => line.history_up(),
            KeyCode::Down => line.history_down(),
            KeyCode::Char(c) => line.insert_char(c),
            _ => {}
        }
        Flow::Continue
    }

    pub fn run_command(&mut self, input: &str) -> Flow {
        let command = match parse_command(input) {
            ParseResult::Ok(command) => command,
            ParseResult::UnknownCommand(cmd) => {
                self.state.command_line.set_error(format!("Unknown command: {cmd}"));
                return Flow::Continue;
            }
            ParseResult::MissingArgument(cmd) => {
                self.state.command_line.set_error(format!(":{cmd} needs an argument"));
                return Flow::Continue;
            }
            ParseResult::InvalidArgument { command, argument } => {
                let message = format!("Invalid argument for :{command}: {argument}");
                self.state.command_line.set_error(message);
                return Flow::Continue;
            }
        };

        match command {
            Command::Quit => return Flow::Quit,
            Command::Help => self.state.overlay = Overlay::Help,
            Command::Badges => self.state.overlay = Overlay::Badges,
            Command::Reset => self.state.overlay = Overlay::ConfirmReset,
            Command::Nop => self.state.command_line.message = None,
            Command::Explain => self.explain(),
            Command::Phase(phase) => {
                if phase >= self.machine.curriculum().phase_count() {
                    self.state.command_line.set_error(format!("There is no phase {}", phase + 1));
                } else if !self.machine.gate().is_phase_unlocked(phase) {
                    let message = format!("Phase {} is still locked", phase + 1);
                    self.state.command_line.set_error(message);
                } else {
                    self.dispatch(Action::JumpToPhase(phase));
                }
            }
            Command::Step { phase, step } => {
                if self.machine.gate().is_step_reachable(phase, step) {
                    self.dispatch(Action::JumpToStep { phase, step });
                } else {
                    let message =
                        format!("Step {}.{} is locked or does not exist", phase + 1, step + 1);
                    self.state.command_line.set_error(message);
                }
            }
            Command::TutorKey(key) => match auth::store_api_key(&key) {
                Ok(()) => {
                    self.state.command_line.set_message("API key saved");
                    return Flow::ReconnectTutor;
                }
                Err(e) => self.state.command_line.set_error(e.to_string()),
            },
            Command::TutorForget => {
                if let Err(e) = auth::forget_api_key() {
                    tracing::warn!("Failed to forget API key: {}", e);
                }
                self.state.command_line.set_message("API key forgotten");
                return Flow::ReconnectTutor;
            }
            Command::TutorModel(model) => {
                self.tutor_model = model;
                let message = format!("Tutor model: {}", model.display_name());
                self.state.command_line.set_message(message);
                return Flow::ReconnectTutor;
            }
        }
        Flow::Continue
    }
}
