//! Step content panel

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::ProgressView;
use super::text::styled_lines;
use crate::app::state::ContentState;
use crate::curriculum::{ContentBlock, Step, markdown};
use crate::progress::PASSING_SCORE;
use crate::theme::Theme;

pub fn draw(
    frame: &mut Frame,
    area: Rect,
    content: &mut ContentState,
    progress: &ProgressView,
    theme: &Theme,
    focused: bool,
) {
    let border_color = if focused { theme.border_focused } else { theme.border };
    let title =
        progress.step().map_or_else(|| " Content ".to_string(), |s| format!(" {} ", s.title));

    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(position_label(progress)).right_aligned())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme.bg_primary));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(step) = progress.step() else {
        return;
    };

    let [body_area, footer_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(2)]).areas(inner);

    let width = body_area.width.saturating_sub(2) as usize;
    let lines = step_lines(step, theme, width);

    content.total_lines = lines.len();
    content.visible_height = body_area.height as usize;
    content.scroll_offset = content.scroll_offset.min(content.max_scroll());

    let visible: Vec<Line> =
        lines.into_iter().skip(content.scroll_offset).take(body_area.height as usize).collect();
    frame.render_widget(Paragraph::new(visible), body_area);

    frame.render_widget(Paragraph::new(footer_lines(progress, theme)), footer_area);
}

/// "Phase 1/3 · Step 2/7"
fn position_label(progress: &ProgressView) -> String {
    let steps = progress.phase().map_or(0, |p| p.steps.len());
    format!(
        " Phase {}/{} · Step {}/{} ",
        progress.phase_index() + 1,
        progress.curriculum.phase_count(),
        progress.step_index() + 1,
        steps
    )
}

/// Body of a step: markdown, then the video link or quiz summary
pub fn step_lines(step: &Step, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut lines = render_blocks(&markdown::parse(&step.content), theme, width);

    if let Some(url) = step.video_url() {
        lines.push(Line::from(vec![
            Span::styled("▶ Video: ", Style::default().fg(theme.accent_secondary)),
            Span::styled(
                url.to_string(),
                Style::default().fg(theme.info).add_modifier(Modifier::UNDERLINED),
            ),
        ]));
        lines.push(Line::from(""));
    }

    if step.is_quiz() {
        lines.push(Line::from(Span::styled(
            format!(
                "{} questions. You need {}% to unlock the next phase.",
                step.questions().len(),
                PASSING_SCORE
            ),
            Style::default().fg(theme.fg_muted),
        )));
    }

    lines
}

/// Render markdown blocks to styled lines
pub fn render_blocks(blocks: &[ContentBlock], theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let body = Style::default().fg(theme.fg_primary);
    let mut lines = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Heading { level, text } => {
                let style = match level {
                    1 => Style::default()
                        .fg(theme.accent_primary)
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    2 => Style::default().fg(theme.accent_secondary).add_modifier(Modifier::BOLD),
                    _ => Style::default().fg(theme.info).add_modifier(Modifier::BOLD),
                };
                lines.extend(styled_lines(text, width, style, theme));
                lines.push(Line::from(""));
            }
            ContentBlock::Paragraph(text) => {
                lines.extend(styled_lines(text, width, body, theme));
                lines.push(Line::from(""));
            }
            ContentBlock::Code { language, code } => {
                let label = language.as_deref().unwrap_or("code");
                lines.push(Line::from(Span::styled(
                    format!("┌─ {label} ─"),
                    Style::default().fg(theme.border),
                )));
                for line in code.lines() {
                    lines.push(Line::from(vec![
                        Span::styled("│ ", Style::default().fg(theme.border)),
                        Span::styled(line.to_string(), Style::default().fg(theme.code)),
                    ]));
                }
                lines.push(Line::from(Span::styled("└──────", Style::default().fg(theme.border))));
                lines.push(Line::from(""));
            }
            ContentBlock::UnorderedList(items) => {
                for item in items {
                    push_item(&mut lines, "  • ", item, width, body, theme);
                }
                lines.push(Line::from(""));
            }
            ContentBlock::OrderedList(items) => {
                for (i, item) in items.iter().enumerate() {
                    push_item(&mut lines, &format!("  {}. ", i + 1), item, width, body, theme);
                }
                lines.push(Line::from(""));
            }
            ContentBlock::Blockquote(text) => {
                let muted = Style::default().fg(theme.fg_muted).add_modifier(Modifier::ITALIC);
                let bar = Style::default().fg(theme.accent_primary);
                for line in styled_lines(text, width.saturating_sub(4), muted, theme) {
                    let mut spans = vec![Span::styled("  │ ", bar)];
                    spans.extend(line.spans);
                    lines.push(Line::from(spans));
                }
                lines.push(Line::from(""));
            }
            ContentBlock::HorizontalRule => {
                lines.push(Line::from(Span::styled(
                    "─".repeat(width.saturating_sub(4).min(32)),
                    Style::default().fg(theme.border),
                )));
                lines.push(Line::from(""));
            }
        }
    }

    lines
}

/// A list item with a marker and a hanging indent
fn push_item(
    lines: &mut Vec<Line<'static>>,
    marker: &str,
    item: &str,
    width: usize,
    style: Style,
    theme: &Theme,
) {
    let indent = " ".repeat(marker.chars().count());
    let wrapped = styled_lines(item, width.saturating_sub(indent.len()), style, theme);
    for (i, line) in wrapped.into_iter().enumerate() {
        let prefix = if i == 0 {
            Span::styled(marker.to_string(), Style::default().fg(theme.accent_secondary))
        } else {
            Span::raw(indent.clone())
        };
        let mut spans = vec![prefix];
        spans.extend(line.spans);
        lines.push(Line::from(spans));
    }
}

/// Hint lines under the body
pub fn footer_lines(progress: &ProgressView, theme: &Theme) -> Vec<Line<'static>> {
    let key = Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(theme.fg_muted);

    let mut status = Vec::new();
    if progress.finished {
        status.push(Span::styled(
            "★ Curriculum complete! ",
            Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
        ));
    }
    if let (Some(phase), Some(step)) = (progress.phase(), progress.step()) {
        if step.is_quiz() {
            if let Some(score) = progress.learner.snapshot.score(phase.id) {
                let color = if score >= PASSING_SCORE { theme.success } else { theme.warning };
                status.push(Span::styled(
                    format!("Best score: {score:.0}%"),
                    Style::default().fg(color),
                ));
            }
        }
    }

    let on_last_step =
        progress.phase().is_some_and(|p| progress.step_index() == p.last_step_index());
    let mut hints = vec![Span::styled("[h/l]", key), Span::styled(" step  ", muted)];
    if progress.can_advance && on_last_step {
        hints.push(Span::styled("[Enter]", key));
        let next = format!(" continue to phase {}  ", progress.phase_index() + 2);
        hints.push(Span::styled(next, muted));
    } else if progress.step().is_some_and(Step::is_quiz) {
        hints.push(Span::styled("[Enter]", key));
        hints.push(Span::styled(" start quiz  ", muted));
    }
    hints.push(Span::styled("[e]", key));
    hints.push(Span::styled(" explain  ", muted));
    hints.push(Span::styled("[?]", key));
    hints.push(Span::styled(" help", muted));

    vec![Line::from(status), Line::from(hints)]
}
