//! Curriculum tree with lock and completion marks

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::ProgressView;
use crate::app::state::{CurriculumState, TreeRow, tree_rows};
use crate::progress::{PhaseStatus, StepStatus};
use crate::theme::Theme;

const MARK_LOCKED: &str = "◌";
const MARK_OPEN: &str = "○";
const MARK_CURRENT: &str = "●";
const MARK_COMPLETED: &str = "✓";

pub fn draw(
    frame: &mut Frame,
    area: Rect,
    tree: &mut CurriculumState,
    progress: &ProgressView,
    theme: &Theme,
    focused: bool,
) {
    let border_color = if focused { theme.border_focused } else { theme.border };

    let block = Block::default()
        .title(" Curriculum ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme.bg_primary));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    tree.visible_height = inner.height as usize;
    tree.ensure_selection_visible();

    let lines: Vec<Line> = build_lines(tree, progress, theme, focused)
        .into_iter()
        .skip(tree.scroll_offset)
        .take(inner.height as usize)
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// One styled line per tree row
pub fn build_lines(
    tree: &CurriculumState,
    progress: &ProgressView,
    theme: &Theme,
    focused: bool,
) -> Vec<Line<'static>> {
    let gate = progress.gate();
    let selected_style =
        Style::new().fg(theme.bg_primary).bg(theme.accent_primary).add_modifier(Modifier::BOLD);
    let current_style = Style::default().fg(theme.accent_secondary);

    tree_rows(progress.curriculum, &tree.expanded_phases)
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let (text, style) = match row {
                TreeRow::Phase(phase_idx) => {
                    let Some(phase) = progress.curriculum.phase(phase_idx) else {
                        return Line::from("");
                    };
                    let icon = if tree.expanded_phases.contains(&phase_idx) { "▼" } else { "▶" };
                    let status = gate.phase_status(phase_idx);
                    let (mark, style) = match status {
                        PhaseStatus::Locked => (MARK_LOCKED, Style::default().fg(theme.locked)),
                        PhaseStatus::Open => (MARK_OPEN, Style::default().fg(theme.fg_primary)),
                        PhaseStatus::Current => {
                            (MARK_CURRENT, current_style.add_modifier(Modifier::BOLD))
                        }
                        PhaseStatus::Completed => {
                            (MARK_COMPLETED, Style::default().fg(theme.success))
                        }
                    };
                    (format!("{icon} {mark} {}. {}", phase_idx + 1, phase.title), style)
                }
                TreeRow::Step { phase, step } => {
                    let Some(s) = progress.curriculum.step(phase, step) else {
                        return Line::from("");
                    };
                    let (mark, style) = match gate.step_status(phase, step) {
                        StepStatus::Locked => (MARK_LOCKED, Style::default().fg(theme.locked)),
                        StepStatus::Open => (MARK_OPEN, Style::default().fg(theme.fg_secondary)),
                        StepStatus::Current => (MARK_CURRENT, current_style),
                    };
                    let suffix = if s.is_quiz() { " (quiz)" } else { "" };
                    (format!("    {mark} {}{suffix}", s.title), style)
                }
            };
            let selected = focused && index == tree.selected_index;
            Line::from(Span::styled(text, if selected { selected_style } else { style }))
        })
        .collect()
}
