//! Quiz overlay

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::ProgressView;
use super::layout::centered_rect;
use super::text::styled_lines;
use crate::app::state::AppState;
use crate::curriculum::QuizQuestion;
use crate::progress::{PASSING_SCORE, QuizAttempt, QuizScore};
use crate::theme::Theme;

/// Draw the quiz as a centered overlay
pub fn draw(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    progress: &ProgressView,
    theme: &Theme,
) {
    let Some(attempt) = progress.learner.quiz.as_ref() else {
        return;
    };
    let questions = progress.step().map_or(&[][..], |s| s.questions());

    let overlay_area = centered_rect(70, 70, area);
    frame.render_widget(Clear, overlay_area);

    let title = match progress.submitted {
        Some(_) => " Quiz Results ".to_string(),
        None => progress.phase().map_or(" Quiz ".to_string(), |p| format!(" Quiz: {} ", p.title)),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .style(Style::default().bg(theme.bg_secondary));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let width = inner.width.saturating_sub(2) as usize;
    let lines = match progress.submitted {
        Some(score) => result_lines(score, attempt, questions, progress, theme, width),
        None => question_lines(attempt, questions, state.quiz_cursor.option, theme, width),
    };
    let alignment = if progress.submitted.is_some() { Alignment::Center } else { Alignment::Left };
    frame.render_widget(Paragraph::new(lines).alignment(alignment), inner);
}

/// Current question with its options
pub fn question_lines(
    attempt: &QuizAttempt,
    questions: &[QuizQuestion],
    cursor: usize,
    theme: &Theme,
    width: usize,
) -> Vec<Line<'static>> {
    let Some(question) = questions.get(attempt.current_question) else {
        return vec![Line::from("This quiz has no questions.")];
    };
    let answered = questions.iter().filter(|q| attempt.answer(&q.id).is_some()).count();
    let chosen = attempt.answer(&question.id);

    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "Question {} of {}  ·  {answered}/{} answered",
                attempt.current_question + 1,
                questions.len(),
                questions.len()
            ),
            Style::default().fg(theme.fg_muted),
        )),
        Line::from(""),
    ];
    lines.extend(styled_lines(
        &question.question,
        width,
        Style::default().fg(theme.fg_primary).add_modifier(Modifier::BOLD),
        theme,
    ));
    lines.push(Line::from(""));

    for (i, option) in question.options.iter().enumerate() {
        let marker = if chosen == Some(i) { "●" } else { "○" };
        let letter = (b'A' + i as u8) as char;
        let style = if i == cursor {
            Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD)
        } else if chosen == Some(i) {
            Style::default().fg(theme.accent_secondary)
        } else {
            Style::default().fg(theme.fg_secondary)
        };
        let pointer = if i == cursor { "›" } else { " " };
        let text = format!("{pointer} {marker} {letter}) {option}");
        lines.push(Line::from(Span::styled(text, style)));
    }

    lines.push(Line::from(""));
    let hint = if answered == questions.len() {
        "[j/k] choose  [Enter] answer  [h/l] question  [s] submit  [Esc] leave"
    } else {
        "[j/k] choose  [Enter] answer  [h/l] question  [Esc] leave"
    };
    lines.push(Line::from(Span::styled(hint, Style::default().fg(theme.fg_muted))));
    lines
}

/// Score, per-question marks and what to do next
pub fn result_lines(
    score: QuizScore,
    attempt: &QuizAttempt,
    questions: &[QuizQuestion],
    progress: &ProgressView,
    theme: &Theme,
    width: usize,
) -> Vec<Line<'static>> {
    let passed = score.passed();
    let headline = if passed {
        format!("Passed! {}/{} correct ({:.0}%)", score.correct, score.total, score.percent())
    } else {
        format!(
            "{}/{} correct ({:.0}%). You need {PASSING_SCORE}% to pass.",
            score.correct,
            score.total,
            score.percent()
        )
    };
    let color = if passed { theme.success } else { theme.error };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(headline, Style::default().fg(color).add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];

    let marks: Vec<Span> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let correct = attempt.answer(&q.id).is_some_and(|a| q.is_correct(a));
            let (mark, color) = if correct { ("✓", theme.success) } else { ("✗", theme.error) };
            Span::styled(format!(" Q{}{mark} ", i + 1), Style::default().fg(color))
        })
        .collect();
    lines.push(Line::from(marks));
    lines.push(Line::from(""));

    let explanation = Style::default().fg(theme.fg_secondary);
    for q in questions.iter().filter(|q| !q.explanation.is_empty()) {
        let correct = attempt.answer(&q.id).is_some_and(|a| q.is_correct(a));
        if !correct {
            lines.extend(styled_lines(&q.explanation, width, explanation, theme));
        }
    }
    lines.push(Line::from(""));

    let hint = if progress.can_advance {
        let next = progress.phase_index() + 2;
        format!("[Enter] Continue to phase {next}    [Esc] Back to the lesson")
    } else if progress.can_retry {
        "[Enter] Try again    [Esc] Back to the lesson".to_string()
    } else if progress.finished {
        "You finished the curriculum!    [Esc] Back to the lesson".to_string()
    } else {
        "[Esc] Back to the lesson".to_string()
    };
    lines.push(Line::from(Span::styled(hint, Style::default().fg(theme.fg_muted))));
    lines
}
