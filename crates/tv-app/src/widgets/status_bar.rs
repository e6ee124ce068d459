//! Status bar — bottom lines: last core notice and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_ACCENT, C_MUTED, C_PENDING, C_PLAYING};

/// Draw the log bar: last core notice, dimmed. `online` is false once the
/// core has stopped answering.
pub fn draw_log_bar(frame: &mut Frame, area: Rect, last_log: Option<&str>, online: bool) {
    let conn_span = if online {
        Span::styled("●", Style::default().fg(C_PLAYING))
    } else {
        Span::styled("○", Style::default().fg(C_ACCENT))
    };
    let log_span = Span::styled(last_log.unwrap_or(""), Style::default().fg(C_MUTED));
    frame.render_widget(
        Paragraph::new(Line::from(vec![conn_span, Span::raw(" "), log_span])),
        area,
    );
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, confirming: bool) {
    let (label, keys) = if confirming {
        ("CONFIRM", " Enter/w watch  Esc/n cancel")
    } else {
        (
            "BROWSE",
            " ↑↓/jk select  Enter pick  r reload  y copy url  ? help  q quit",
        )
    };
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default().fg(C_PENDING).add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
