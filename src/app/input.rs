//! Key bindings

use crossterm::event::{KeyCode, KeyModifiers};

/// Actions a key press can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    // Navigation
    Up,
    Down,
    Top,
    Bottom,
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,

    /// Previous step, or previous question inside a quiz
    Previous,
    /// Next step, or next question inside a quiz
    Next,

    // Selection
    Select,
    Back,
    /// Pick an option directly by its 1-based number
    Choose(usize),
    SubmitQuiz,

    // Panels
    SwitchPanel,
    ToggleCurriculum,

    Explain,
    Help,
    CommandLine,
    Quit,
}

/// Vim-style keys while reading
pub fn browse_key_to_action(key: KeyCode) -> Option<KeyAction> {
    match key {
        KeyCode::Char('j') | KeyCode::Down => Some(KeyAction::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(KeyAction::Up),
        KeyCode::Char('h') | KeyCode::Left => Some(KeyAction::Previous),
        KeyCode::Char('l') | KeyCode::Right => Some(KeyAction::Next),
        KeyCode::Char('g') | KeyCode::Home => Some(KeyAction::Top),
        KeyCode::Char('G') | KeyCode::End => Some(KeyAction::Bottom),
        KeyCode::Char('d') | KeyCode::PageDown => Some(KeyAction::PageDown),
        KeyCode::Char('u') | KeyCode::PageUp => Some(KeyAction::PageUp),
        KeyCode::Enter => Some(KeyAction::Select),
        KeyCode::Esc => Some(KeyAction::Back),
        KeyCode::Tab => Some(KeyAction::SwitchPanel),
        KeyCode::Char('[') => Some(KeyAction::ToggleCurriculum),
        KeyCode::Char('e') => Some(KeyAction::Explain),
        KeyCode::Char('?') => Some(KeyAction::Help),
        KeyCode::Char(':') => Some(KeyAction::CommandLine),
        // 'q' is left unmapped, use :q to quit
        _ => None,
    }
}

/// Keys while a quiz is on screen
pub fn quiz_key_to_action(key: KeyCode) -> Option<KeyAction> {
    match key {
        KeyCode::Char('j') | KeyCode::Down => Some(KeyAction::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(KeyAction::Up),
        KeyCode::Char('h') | KeyCode::Left => Some(KeyAction::Previous),
        KeyCode::Char('l') | KeyCode::Right => Some(KeyAction::Next),
        KeyCode::Char(c @ '1'..='9') => c.to_digit(10).map(|d| KeyAction::Choose(d as usize)),
        KeyCode::Enter | KeyCode::Char(' ') => Some(KeyAction::Select),
        KeyCode::Char('s') => Some(KeyAction::SubmitQuiz),
        KeyCode::Esc => Some(KeyAction::Back),
        KeyCode::Char('e') => Some(KeyAction::Explain),
        KeyCode::Char('?') => Some(KeyAction::Help),
        KeyCode::Char(':') => Some(KeyAction::CommandLine),
        _ => None,
    }
}

/// Key mapping with modifiers (for Ctrl combinations)
pub fn key_with_modifier_to_action(
    key: KeyCode,
    modifiers: KeyModifiers,
    in_quiz: bool,
) -> Option<KeyAction> {
    if modifiers.contains(KeyModifiers::CONTROL) {
        match key {
            KeyCode::Char('c') => Some(KeyAction::Quit),
            KeyCode::Char('d') => Some(KeyAction::HalfPageDown),
            KeyCode::Char('u') => Some(KeyAction::HalfPageUp),
            KeyCode::Char('f') => Some(KeyAction::PageDown),
            KeyCode::Char('b') => Some(KeyAction::PageUp),
            _ => None,
        }
    } else if in_quiz {
        quiz_key_to_action(key)
    } else {
        browse_key_to_action(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vim_j_maps_to_down() {
        assert_eq!(browse_key_to_action(KeyCode::Char('j')), Some(KeyAction::Down));
    }

    #[test]
    fn h_and_l_move_between_steps() {
        assert_eq!(browse_key_to_action(KeyCode::Char('h')), Some(KeyAction::Previous));
        assert_eq!(browse_key_to_action(KeyCode::Right), Some(KeyAction::Next));
    }

    #[test]
    fn unknown_key_returns_none() {
        assert_eq!(browse_key_to_action(KeyCode::Char('x')), None);
        assert_eq!(browse_key_to_action(KeyCode::Char('q')), None);
    }

    #[test]
    fn digits_choose_only_in_quiz() {
        assert_eq!(quiz_key_to_action(KeyCode::Char('3')), Some(KeyAction::Choose(3)));
        assert_eq!(quiz_key_to_action(KeyCode::Char('0')), None);
        assert_eq!(browse_key_to_action(KeyCode::Char('3')), None);
    }

    #[test]
    fn s_submits_only_in_quiz() {
        assert_eq!(quiz_key_to_action(KeyCode::Char('s')), Some(KeyAction::SubmitQuiz));
        assert_eq!(browse_key_to_action(KeyCode::Char('s')), None);
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        for in_quiz in [false, true] {
            assert_eq!(
                key_with_modifier_to_action(KeyCode::Char('c'), KeyModifiers::CONTROL, in_quiz),
                Some(KeyAction::Quit)
            );
        }
    }

    #[test]
    fn ctrl_d_half_page_down() {
        assert_eq!(
            key_with_modifier_to_action(KeyCode::Char('d'), KeyModifiers::CONTROL, false),
            Some(KeyAction::HalfPageDown)
        );
    }

    #[test]
    fn no_modifier_picks_context() {
        assert_eq!(
            key_with_modifier_to_action(KeyCode::Char('1'), KeyModifiers::NONE, true),
            Some(KeyAction::Choose(1))
        );
        assert_eq!(
            key_with_modifier_to_action(KeyCode::Tab, KeyModifiers::NONE, false),
            Some(KeyAction::SwitchPanel)
        );
    }
}
