//! ConfirmDialog — modal shown while a picked channel awaits confirmation.
//!
//! Visibility follows the published phase; the dialog keeps no state of its
//! own beyond what `AppState` carries.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    components::channel_entry::{truncate, ChannelEntry},
    theme::{C_ACCENT, C_MUTED, C_PANEL_BORDER_FOCUSED, C_POPUP_BG, C_PRIMARY, C_SECONDARY},
    widgets::popup::centered_rect,
};

const DIALOG_HEIGHT: u16 = 9;
const WATCH_LABEL: &str = "[ Watch ]";
/// Row of the button line inside the border.
const WATCH_ROW: u16 = 4;

#[derive(Default)]
pub struct ConfirmDialog {
    /// Last drawn popup and `[ Watch ]` rects, for click hit-testing.
    area: Option<Rect>,
    watch_button: Option<Rect>,
}

fn contains(r: Rect, column: u16, row: u16) -> bool {
    column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
}

impl ConfirmDialog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Component for ConfirmDialog {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !state.is_confirming() {
            return vec![];
        }
        match key.code {
            KeyCode::Enter | KeyCode::Char('w') | KeyCode::Char('y') => vec![Action::Confirm],
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('n') => vec![Action::Cancel],
            // Swallow everything else while the modal is up.
            _ => vec![Action::Noop],
        }
    }

    /// Only the `[ Watch ]` button confirms. Other clicks inside the popup
    /// are swallowed; a click outside dismisses it.
    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        if !state.is_confirming() {
            return vec![];
        }
        let MouseEventKind::Down(MouseButton::Left) = event.kind else {
            return vec![];
        };
        let (column, row) = (event.column, event.row);
        if self.watch_button.is_some_and(|r| contains(r, column, row)) {
            return vec![Action::Confirm];
        }
        if self.area.is_some_and(|r| contains(r, column, row)) {
            return vec![Action::Noop];
        }
        vec![Action::Cancel]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        self.area = None;
        self.watch_button = None;
        let Some(item) = state.pending_item() else {
            return;
        };
        if !state.is_confirming() {
            return;
        }
        let entry = ChannelEntry::new(item);
        let popup = centered_rect(60, DIALOG_HEIGHT, area);
        self.area = Some(popup);
        // Lines are truncated rather than wrapped so the button row is fixed.
        let text_width = (popup.width as usize).saturating_sub(3);
        if popup.height > WATCH_ROW + 1 {
            self.watch_button = Some(Rect {
                x: popup.x + 2,
                y: popup.y + 1 + WATCH_ROW,
                width: (WATCH_LABEL.len() as u16).min(popup.width.saturating_sub(3)),
                height: 1,
            });
        }

        let mut byline = entry.presenter().to_string();
        if !entry.description().is_empty() {
            byline.push_str(" | ");
            byline.push_str(entry.description());
        }

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!(" {}", truncate(entry.title(), text_width)),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!(" {}", truncate(&byline, text_width)),
                Style::default().fg(C_SECONDARY),
            )),
            Line::from(""),
            Line::from(vec![
                Span::raw(" "),
                Span::styled(
                    WATCH_LABEL,
                    Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
                ),
                Span::styled("  enter", Style::default().fg(C_MUTED)),
                Span::styled("    esc cancel", Style::default().fg(C_MUTED)),
            ]),
        ];

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(C_PANEL_BORDER_FOCUSED))
                        .title(Span::styled(" watch this? ", Style::default().fg(C_PRIMARY)))
                        .style(Style::default().bg(C_POPUP_BG)),
                ),
            popup,
        );
    }
}
