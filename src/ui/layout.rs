//! Layout utilities

use ratatui::layout::{Constraint, Layout, Rect};

/// Create a centered rectangle with the given percentage of width and height
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(r);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}

/// A rectangle of fixed size centered in `r`, shrunk to fit
pub fn centered_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect { x: r.x + (r.width - width) / 2, y: r.y + (r.height - height) / 2, width, height }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 50, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 25);
        assert_eq!(inner.x, 20);
    }

    #[test]
    fn centered_fixed_shrinks_to_fit() {
        let outer = Rect::new(10, 5, 30, 8);
        let inner = centered_fixed(50, 4, outer);
        assert_eq!(inner, Rect::new(10, 7, 30, 4));
    }
}
