//! Command line at the bottom of the screen

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::state::CommandLineState;
use crate::theme::Theme;

pub fn draw(frame: &mut Frame, area: Rect, state: &CommandLineState, theme: &Theme) {
    let line = if state.active {
        // +1 for the ':' prefix
        build_line_with_cursor(
            &state.display_text(),
            state.cursor + 1,
            Style::default().fg(theme.accent_primary),
            theme,
        )
    } else {
        let (text, style) = match &state.message {
            Some(msg) if state.is_error => (msg.clone(), Style::default().fg(theme.error)),
            Some(msg) => (msg.clone(), Style::default().fg(theme.info)),
            None => (
                "Press : for commands, ? for help".to_string(),
                Style::default().fg(theme.fg_muted),
            ),
        };
        Line::from(Span::styled(text, style))
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Split `text` around a block cursor at character `cursor_pos`
fn build_line_with_cursor(
    text: &str,
    cursor_pos: usize,
    base_style: Style,
    theme: &Theme,
) -> Line<'static> {
    let before: String = text.chars().take(cursor_pos).collect();
    let at = text.chars().nth(cursor_pos).unwrap_or(' ');
    let after: String = text.chars().skip(cursor_pos + 1).collect();

    let cursor_style =
        Style::default().fg(theme.bg_primary).bg(theme.fg_primary).add_modifier(Modifier::BOLD);

    let mut spans = Vec::with_capacity(3);
    if !before.is_empty() {
        spans.push(Span::styled(before, base_style));
    }
    spans.push(Span::styled(at.to_string(), cursor_style));
    if !after.is_empty() {
        spans.push(Span::styled(after, base_style));
    }
    Line::from(spans)
}
