//! Tutor side panel

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::TutorView;
use super::text::styled_lines;
use crate::theme::Theme;

pub fn draw(frame: &mut Frame, area: Rect, tutor: &TutorView, theme: &Theme) {
    let title = if tutor.slot.is_loading() {
        format!(" Tutor · {} (thinking...) ", tutor.model.display_name())
    } else {
        format!(" Tutor · {} ", tutor.model.display_name())
    };

    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(" [e] ask again  [Esc] close ").centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent_secondary))
        .style(Style::default().bg(theme.bg_secondary));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = panel_lines(tutor, theme, inner.width.saturating_sub(1) as usize);

    // Keep the newest text in view while it streams
    let overflow = lines.len().saturating_sub(inner.height as usize);
    let visible: Vec<Line> = lines.into_iter().skip(overflow).collect();
    frame.render_widget(Paragraph::new(visible), inner);
}

pub fn panel_lines(tutor: &TutorView, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let text = tutor.slot.text();
    if text.is_empty() {
        let message = if tutor.slot.is_loading() { "Thinking..." } else { "No explanation yet." };
        return vec![Line::from(Span::styled(
            message,
            Style::default().fg(theme.fg_muted).add_modifier(Modifier::ITALIC),
        ))];
    }

    let mut lines = styled_lines(text, width, Style::default().fg(theme.fg_primary), theme);
    if tutor.slot.is_loading() {
        lines.push(Line::from(Span::styled("▍", Style::default().fg(theme.accent_secondary))));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutor::{ExplanationSlot, StepKey, TutorEvent, TutorModel, TutorUpdate};
    use crate::ui::text::line_text;

    fn view(slot: &ExplanationSlot) -> TutorView<'_> {
        TutorView { slot, available: true, model: TutorModel::default() }
    }

    #[test]
    fn loading_without_text_says_thinking() {
        let mut slot = ExplanationSlot::new();
        slot.begin(StepKey::new(0, 0));
        let lines = panel_lines(&view(&slot), &Theme::default(), 40);
        assert_eq!(line_text(&lines[0]), "Thinking...");
    }

    #[test]
    fn streamed_text_is_wrapped_with_a_cursor() {
        let key = StepKey::new(0, 1);
        let mut slot = ExplanationSlot::new();
        slot.begin(key);
        let chunk = TutorEvent::Chunk("Think of a dog learning tricks".into());
        slot.apply(TutorUpdate { key, event: chunk });

        let lines = panel_lines(&view(&slot), &Theme::default(), 12);
        assert!(lines.len() > 2);
        assert_eq!(lines.last().map(line_text).as_deref(), Some("▍"));

        slot.apply(TutorUpdate { key, event: TutorEvent::Finished });
        let lines = panel_lines(&view(&slot), &Theme::default(), 12);
        assert_ne!(lines.last().map(line_text).as_deref(), Some("▍"));
    }
}
