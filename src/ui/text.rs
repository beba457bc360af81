//! Wrapping and inline styling for prose
//!
//! Text is wrapped first, then backtick code and `**bold**` runs are styled
//! line by line. Markers are dropped from the output.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::theme::Theme;

/// Wrap `text` to `width` columns and style inline markers
pub fn styled_lines(text: &str, width: usize, base: Style, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for source in text.lines() {
        if source.trim().is_empty() {
            lines.push(Line::from(""));
            continue;
        }
        let mut inline = InlineState::default();
        for wrapped in textwrap::wrap(source, width.max(1)) {
            lines.push(inline.style_line(&wrapped, base, theme));
        }
    }
    lines
}

/// Markers still open at the end of a wrapped line
#[derive(Default)]
struct InlineState {
    code: bool,
    bold: bool,
}

impl InlineState {
    fn style(&self, base: Style, theme: &Theme) -> Style {
        let mut style = base;
        if self.code {
            style = style.fg(theme.code).bg(theme.bg_secondary);
        }
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        style
    }

    fn style_line(&mut self, text: &str, base: Style, theme: &Theme) -> Line<'static> {
        let mut spans = Vec::new();
        let mut current = String::new();
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            let toggles_bold = c == '*' && !self.code && chars.peek() == Some(&'*');
            if c != '`' && !toggles_bold {
                current.push(c);
                continue;
            }
            if !current.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut current), self.style(base, theme)));
            }
            if toggles_bold {
                chars.next();
                self.bold = !self.bold;
            } else {
                self.code = !self.code;
            }
        }
        if !current.is_empty() || spans.is_empty() {
            spans.push(Span::styled(current, self.style(base, theme)));
        }
        Line::from(spans)
    }
}

/// Concatenated text of a line, for tests and width checks
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}
