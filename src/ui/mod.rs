//! UI rendering components

pub mod command_line;
pub mod content;
pub mod curriculum;
pub mod dialogs;
pub mod layout;
pub mod main_screen;
pub mod quiz_panel;
pub mod text;
pub mod tutor_panel;

use ratatui::Frame;

use crate::app::state::AppState;
use crate::curriculum::{Curriculum, Phase, Step};
use crate::progress::{Achievements, Gate, LearnerState, ProgressMachine, ProgressStore, QuizScore};
use crate::theme::Theme;
use crate::tutor::{ExplanationSlot, TutorModel};

/// Read-only view of learner progress for one frame
#[derive(Debug, Clone, Copy)]
pub struct ProgressView<'a> {
    pub curriculum: &'a Curriculum,
    pub learner: &'a LearnerState,
    pub submitted: Option<QuizScore>,
    pub can_advance: bool,
    pub can_retry: bool,
    pub finished: bool,
}

impl<'a> ProgressView<'a> {
    pub fn of<S: ProgressStore>(machine: &'a ProgressMachine<S>) -> Self {
        Self {
            curriculum: machine.curriculum(),
            learner: machine.state(),
            submitted: machine.submitted_score(),
            can_advance: machine.advance_phase_available(),
            can_retry: machine.retry_available(),
            finished: machine.is_curriculum_finished(),
        }
    }

    pub fn gate(&self) -> Gate<'a> {
        Gate::new(self.curriculum, &self.learner.snapshot)
    }

    pub fn phase_index(&self) -> usize {
        self.learner.snapshot.current_phase_index
    }

    pub fn step_index(&self) -> usize {
        self.learner.snapshot.current_step_index
    }

    pub fn phase(&self) -> Option<&'a Phase> {
        self.curriculum.phase(self.phase_index())
    }

    pub fn step(&self) -> Option<&'a Step> {
        self.curriculum.step(self.phase_index(), self.step_index())
    }
}

/// Tutor state for one frame
#[derive(Debug, Clone, Copy)]
pub struct TutorView<'a> {
    pub slot: &'a ExplanationSlot,
    pub available: bool,
    pub model: TutorModel,
}

/// Everything a frame draws from
pub struct View<'a> {
    pub progress: ProgressView<'a>,
    pub tutor: TutorView<'a>,
    pub achievements: &'a Achievements,
    pub theme: &'a Theme,
}

/// Main draw function
pub fn draw(frame: &mut Frame, state: &mut AppState, view: &View) {
    let area = frame.area();
    main_screen::draw(frame, area, state, view);

    if view.progress.learner.snapshot.is_quiz_mode {
        quiz_panel::draw(frame, area, state, &view.progress, view.theme);
    }

    dialogs::draw(frame, area, state.overlay, view);
}
