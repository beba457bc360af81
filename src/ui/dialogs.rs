//! Help, badges and reset confirmation overlays

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::View;
use super::layout::{centered_fixed, centered_rect};
use crate::app::state::Overlay;
use crate::progress::{Achievements, Badge};
use crate::theme::Theme;

const HELP: &[(&str, &str)] = &[
    ("h / l", "previous / next step"),
    ("j / k", "move selection or scroll"),
    ("Enter", "open, start quiz or continue"),
    ("Tab", "switch panel"),
    ("[", "toggle curriculum panel"),
    ("e", "ask the tutor to explain this step"),
    ("1-9", "pick an answer (quiz)"),
    ("s", "submit the quiz"),
    ("Esc", "leave the quiz or close a panel"),
    (":phase N", "jump to an unlocked phase"),
    (":step P S", "jump to a visited step"),
    (":badges", "show earned badges"),
    (":tutor-key K", "save an API key for the tutor"),
    (":tutor-model M", "haiku, sonnet or opus"),
    (":reset", "forget all progress"),
    (":q", "quit"),
];

pub fn draw(frame: &mut Frame, area: Rect, overlay: Overlay, view: &View) {
    match overlay {
        Overlay::None => {}
        Overlay::Help => draw_help(frame, area, view),
        Overlay::Badges => draw_badges(frame, area, view.achievements, view.theme),
        Overlay::ConfirmReset => draw_confirm_reset(frame, area, view.theme),
    }
}

fn framed(title: &str, theme: &Theme, accent: ratatui::style::Color) -> Block<'static> {
    Block::default()
        .title(format!(" {title} "))
        .title_bottom(Line::from(" [Esc] close ").centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .style(Style::default().bg(theme.bg_secondary))
}

fn draw_help(frame: &mut Frame, area: Rect, view: &View) {
    let theme = view.theme;
    let rect = centered_rect(60, 80, area);
    frame.render_widget(Clear, rect);
    let block = framed("Help", theme, theme.border_focused);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let mut lines: Vec<Line> = HELP
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(
                    format!("{key:>16}  "),
                    Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD),
                ),
                Span::styled(*what, Style::default().fg(theme.fg_primary)),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    let tutor = if view.tutor.available {
        format!("Tutor: {}", view.tutor.model.display_name())
    } else {
        "Tutor: not configured".to_string()
    };
    lines.push(Line::from(Span::styled(tutor, Style::default().fg(theme.fg_muted))));

    frame.render_widget(Paragraph::new(lines), inner);
}

/// One line per badge, earned ones first
pub fn badge_lines(achievements: &Achievements, theme: &Theme) -> Vec<Line<'static>> {
    let muted = Style::default().fg(theme.fg_muted);
    if achievements.unlocked.is_empty() {
        let hint = "No badges yet. Finish a phase to earn your first one.";
        return vec![Line::from(Span::styled(hint, muted))];
    }
    let star = Style::default().fg(theme.warning);
    let title = Style::default().fg(theme.fg_secondary).add_modifier(Modifier::BOLD);
    let mut lines: Vec<Line> = achievements
        .unlocked
        .iter()
        .map(|badge| {
            Line::from(vec![
                Span::styled("★ ", star),
                Span::styled(badge.title(), title),
                Span::styled(format!("  {}", badge.description()), muted),
            ])
        })
        .collect();
    if !achievements.unlocked.contains(&Badge::Curious) {
        let asked = format!("Tutor explanations asked: {}", achievements.tutor_uses);
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(asked, muted)));
    }
    lines
}

fn draw_badges(frame: &mut Frame, area: Rect, achievements: &Achievements, theme: &Theme) {
    let rect = centered_rect(60, 60, area);
    frame.render_widget(Clear, rect);
    let block = framed("Badges", theme, theme.warning);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);
    frame.render_widget(Paragraph::new(badge_lines(achievements, theme)), inner);
}

fn draw_confirm_reset(frame: &mut Frame, area: Rect, theme: &Theme) {
    let rect = centered_fixed(52, 7, area);
    frame.render_widget(Clear, rect);
    let block = Block::default()
        .title(" Reset progress ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.error))
        .style(Style::default().bg(theme.bg_secondary));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let question = Style::default().fg(theme.fg_primary).add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(theme.fg_muted);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Forget every phase, score and badge?", question)),
        Line::from(""),
        Line::from(Span::styled("[y] Yes, start over    [n] Cancel", muted)),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}
