//! Application state definitions

use std::collections::BTreeSet;

use crate::curriculum::Curriculum;

/// Which panel is currently focused
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Panel {
    Curriculum,
    #[default]
    Content,
}

/// Modal drawn over the main screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Overlay {
    #[default]
    None,
    Help,
    Badges,
    /// Asking before wiping all progress
    ConfirmReset,
}

/// Panel visibility settings
#[derive(Debug, Clone)]
pub struct PanelVisibility {
    /// Show the curriculum (left) panel
    pub curriculum: bool,
    /// Show the tutor (right) panel
    pub tutor: bool,
}

impl Default for PanelVisibility {
    fn default() -> Self {
        Self { curriculum: true, tutor: false }
    }
}

/// A row of the curriculum tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeRow {
    Phase(usize),
    Step { phase: usize, step: usize },
}

/// Flatten the tree, listing steps only under expanded phases
pub fn tree_rows(curriculum: &Curriculum, expanded: &BTreeSet<usize>) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    for (phase_idx, phase) in curriculum.phases.iter().enumerate() {
        rows.push(TreeRow::Phase(phase_idx));
        if expanded.contains(&phase_idx) {
            rows.extend(
                (0..phase.steps.len()).map(|step| TreeRow::Step { phase: phase_idx, step }),
            );
        }
    }
    rows
}

/// State for the curriculum tree browser
#[derive(Debug, Clone, Default)]
pub struct CurriculumState {
    /// Currently selected row (flat index in tree)
    pub selected_index: usize,
    /// Which phase indices are expanded
    pub expanded_phases: BTreeSet<usize>,
    /// Scroll offset for long curricula
    pub scroll_offset: usize,
    /// Visible height in rows (updated on render)
    pub visible_height: usize,
}

impl CurriculumState {
    /// Ensure the selected item is visible by adjusting scroll offset
    pub fn ensure_selection_visible(&mut self) {
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        }
        let visible = self.visible_height.saturating_sub(2);
        if visible > 0 && self.selected_index >= self.scroll_offset + visible {
            self.scroll_offset = self.selected_index.saturating_sub(visible) + 1;
        }
    }

    /// Expand `phase` and put the selection on the given step row
    pub fn select_step(&mut self, curriculum: &Curriculum, phase: usize, step: usize) {
        self.expanded_phases.insert(phase);
        let rows = tree_rows(curriculum, &self.expanded_phases);
        if let Some(idx) = rows.iter().position(|r| *r == TreeRow::Step { phase, step }) {
            self.selected_index = idx;
        }
        self.ensure_selection_visible();
    }

    /// Move the selection, clamped to the tree
    pub fn move_selection(&mut self, row_count: usize, delta: isize) {
        if row_count == 0 {
            self.selected_index = 0;
            return;
        }
        self.selected_index = self.selected_index.saturating_add_signed(delta).min(row_count - 1);
        self.ensure_selection_visible();
    }

    /// Open or close a phase, keeping the selection on its row
    pub fn toggle_phase(&mut self, curriculum: &Curriculum, phase: usize) {
        if !self.expanded_phases.remove(&phase) {
            self.expanded_phases.insert(phase);
        }
        let rows = tree_rows(curriculum, &self.expanded_phases);
        if let Some(idx) = rows.iter().position(|r| *r == TreeRow::Phase(phase)) {
            self.selected_index = idx;
        }
        self.ensure_selection_visible();
    }
}

/// State for content rendering
#[derive(Debug, Clone, Default)]
pub struct ContentState {
    /// Current scroll position (lines from top)
    pub scroll_offset: usize,
    /// Total rendered lines (updated on render)
    pub total_lines: usize,
    /// Visible height in lines (updated on render)
    pub visible_height: usize,
}

impl ContentState {
    /// Get the maximum allowed scroll offset
    pub fn max_scroll(&self) -> usize {
        self.total_lines.saturating_sub(self.visible_height / 2)
    }

    pub fn scroll_by(&mut self, delta: isize) {
        self.scroll_offset = self.scroll_offset.saturating_add_signed(delta).min(self.max_scroll());
    }

    pub fn reset(&mut self) {
        self.scroll_offset = 0;
    }
}

/// Option cursor inside the quiz overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuizCursor {
    pub option: usize,
}

impl QuizCursor {
    pub fn move_by(&mut self, option_count: usize, delta: isize) {
        if option_count == 0 {
            self.option = 0;
            return;
        }
        self.option = self.option.saturating_add_signed(delta).min(option_count - 1);
    }
}

/// State for the command line input
#[derive(Debug, Clone, Default)]
pub struct CommandLineState {
    /// Accepting a `:` command
    pub active: bool,
    pub input: String,
    /// Cursor position in input, in characters
    pub cursor: usize,
    /// Status/error message to display (when not in input mode)
    pub message: Option<String>,
    pub is_error: bool,
    pub history: Vec<String>,
    /// Current history index when navigating
    pub history_index: Option<usize>,
}

impl CommandLineState {
    const MAX_HISTORY: usize = 100;

    pub fn enter_command_mode(&mut self) {
        self.active = true;
        self.input.clear();
        self.cursor = 0;
        self.message = None;
        self.history_index = None;
    }

    pub fn exit_input_mode(&mut self) {
        self.active = false;
        self.input.clear();
        self.cursor = 0;
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.is_error = false;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.is_error = true;
    }

    fn char_to_byte_index(&self, char_idx: usize) -> usize {
        self.input.char_indices().nth(char_idx).map(|(i, _)| i).unwrap_or(self.input.len())
    }

    fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = self.char_to_byte_index(self.cursor);
        self.input.insert(byte_idx, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_idx = self.char_to_byte_index(self.cursor);
            self.input.remove(byte_idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    /// What the bottom line shows
    pub fn display_text(&self) -> String {
        if self.active {
            format!(":{}", self.input)
        } else {
            self.message.clone().unwrap_or_default()
        }
    }

    pub fn add_to_history(&mut self, cmd: String) {
        if !cmd.is_empty() && self.history.last() != Some(&cmd) {
            if self.history.len() >= Self::MAX_HISTORY {
                self.history.remove(0);
            }
            self.history.push(cmd);
        }
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let idx = match self.history_index {
            None => self.history.len() - 1,
            Some(i) => i.saturating_sub(1),
        };
        self.history_index = Some(idx);
        self.input = self.history[idx].clone();
        self.cursor = self.char_count();
    }

    pub fn history_down(&mut self) {
        let Some(i) = self.history_index else {
            return;
        };
        if i + 1 < self.history.len() {
            self.history_index = Some(i + 1);
            self.input = self.history[i + 1].clone();
        } else {
            self.history_index = None;
            self.input.clear();
        }
        self.cursor = self.char_count();
    }
}

/// Everything about the screen that is not learner progress
#[derive(Debug, Default)]
pub struct AppState {
    pub panel_visibility: PanelVisibility,
    pub focused_panel: Panel,
    pub overlay: Overlay,
    pub curriculum: CurriculumState,
    pub content: ContentState,
    pub quiz_cursor: QuizCursor,
    pub command_line: CommandLineState,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::curriculum::model::fixtures::curriculum;

    #[test]
    fn collapsed_tree_lists_phases_only() {
        let c = curriculum();
        let rows = tree_rows(&c, &BTreeSet::new());
        assert_eq!(rows, vec![TreeRow::Phase(0), TreeRow::Phase(1), TreeRow::Phase(2)]);
    }

    #[test]
    fn expanded_phase_lists_its_steps() {
        let c = curriculum();
        let rows = tree_rows(&c, &BTreeSet::from([0]));
        // 3 content steps and a quiz under phase 0
        assert_eq!(rows.len(), 3 + 4);
        assert_eq!(rows[1], TreeRow::Step { phase: 0, step: 0 });
        assert_eq!(rows[5], TreeRow::Phase(1));
    }

    #[test]
    fn select_step_expands_and_finds_row() {
        let c = curriculum();
        let mut state = CurriculumState { visible_height: 40, ..Default::default() };
        state.select_step(&c, 1, 2);
        assert!(state.expanded_phases.contains(&1));
        assert_eq!(state.selected_index, 4);
    }

    #[test]
    fn toggle_phase_collapses() {
        let c = curriculum();
        let mut state = CurriculumState::default();
        state.select_step(&c, 0, 1);
        state.toggle_phase(&c, 0);
        assert!(state.expanded_phases.is_empty());
        assert_eq!(state.selected_index, 0);
    }

    #[test]
    fn ensure_selection_visible_scrolls_down() {
        let mut state =
            CurriculumState { selected_index: 12, visible_height: 10, ..Default::default() };
        state.ensure_selection_visible();
        assert_eq!(state.scroll_offset, 5);
    }

    #[test]
    fn quiz_cursor_clamps() {
        let mut cursor = QuizCursor::default();
        cursor.move_by(4, -1);
        assert_eq!(cursor.option, 0);
        cursor.move_by(4, 9);
        assert_eq!(cursor.option, 3);
    }

    #[test]
    fn content_scroll_clamps() {
        let mut content =
            ContentState { total_lines: 30, visible_height: 10, ..Default::default() };
        content.scroll_by(100);
        assert_eq!(content.scroll_offset, 25);
        content.scroll_by(-100);
        assert_eq!(content.scroll_offset, 0);
    }

    #[test]
    fn command_line_edits_multibyte() {
        let mut cl = CommandLineState::default();
        cl.enter_command_mode();
        for c in "héllo".chars() {
            cl.insert_char(c);
        }
        cl.move_left();
        cl.delete_char();
        assert_eq!(cl.input, "hélo");
        assert_eq!(cl.display_text(), ":hélo");
    }

    #[test]
    fn history_navigation() {
        let mut cl = CommandLineState::default();
        cl.add_to_history("phase 1".into());
        cl.add_to_history("badges".into());
        cl.add_to_history("badges".into());
        assert_eq!(cl.history.len(), 2);

        cl.history_up();
        assert_eq!(cl.input, "badges");
        cl.history_up();
        assert_eq!(cl.input, "phase 1");
        cl.history_down();
        assert_eq!(cl.input, "badges");
        cl.history_down();
        assert!(cl.input.is_empty());
    }
}
