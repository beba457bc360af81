//! Main screen: curriculum, content and tutor panels over the command line

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};

use super::{View, command_line, content, curriculum, tutor_panel};
use crate::app::state::{AppState, Panel};

/// Minimum width for the curriculum panel
const CURRICULUM_MIN_WIDTH: u16 = 24;

pub fn draw(frame: &mut Frame, area: Rect, state: &mut AppState, view: &View) {
    let [main_area, command_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);

    let show_tutor = view.tutor.slot.is_active();
    let chunks = create_layout(main_area, state.panel_visibility.curriculum, show_tutor);
    let mut panels = chunks.iter().copied();

    if state.panel_visibility.curriculum {
        if let Some(rect) = panels.next() {
            let focused = state.focused_panel == Panel::Curriculum;
            let tree = &mut state.curriculum;
            curriculum::draw(frame, rect, tree, &view.progress, view.theme, focused);
        }
    }

    if let Some(rect) = panels.next() {
        let focused = state.focused_panel == Panel::Content;
        content::draw(frame, rect, &mut state.content, &view.progress, view.theme, focused);
    }

    if show_tutor {
        if let Some(rect) = panels.next() {
            tutor_panel::draw(frame, rect, &view.tutor, view.theme);
        }
    }

    command_line::draw(frame, command_area, &state.command_line, view.theme);
}

/// Split the main area between the visible panels
fn create_layout(area: Rect, show_curriculum: bool, show_tutor: bool) -> Vec<Rect> {
    let mut constraints = Vec::new();

    // Curriculum panel (left): 25% width, min 24 cols
    if show_curriculum {
        constraints.push(Constraint::Length((area.width / 4).max(CURRICULUM_MIN_WIDTH)));
    }

    constraints.push(Constraint::Min(30));

    // Tutor panel (right): 30% width
    if show_tutor {
        constraints.push(Constraint::Length(area.width * 3 / 10));
    }

    Layout::default().direction(Direction::Horizontal).constraints(constraints).split(area).to_vec()
}
