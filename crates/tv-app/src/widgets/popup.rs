//! Helpers for centered popups.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// A rect `percent_x` wide and `height` rows tall, centered in `r`.
pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height.min(r.height)),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_is_clamped_to_area() {
        let area = Rect::new(0, 0, 100, 10);
        let popup = centered_rect(50, 30, area);
        assert!(popup.height <= area.height);
        assert_eq!(popup.width, 50);
        assert_eq!(popup.x, 25);
    }
}
