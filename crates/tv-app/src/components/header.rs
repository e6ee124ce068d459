//! Header component — 1-row top bar: app name, catalog source, phase badge.
//!
//! Not focusable.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tv_proto::protocol::PlaybackPhase;

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    components::channel_entry::truncate,
    theme::{C_ACCENT, C_MUTED, C_PENDING, C_PLAYING, C_SECONDARY},
};

pub struct Header;

fn phase_color(phase: PlaybackPhase) -> Color {
    match phase {
        PlaybackPhase::Idle => C_MUTED,
        PlaybackPhase::Ready => C_SECONDARY,
        PlaybackPhase::Confirming => C_PENDING,
        PlaybackPhase::Playing => C_PLAYING,
    }
}

impl Component for Header {
    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let snap = &state.snapshot;
        let badge = if snap.loading {
            " loading ".to_string()
        } else {
            format!(" {} ", snap.phase.label())
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(badge.len() as u16)])
            .split(area);

        let source_room = (cols[0].width as usize).saturating_sub(6);
        let left = Line::from(vec![
            Span::styled(
                " tv ",
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" ", Style::default()),
            Span::styled(truncate(&snap.source, source_room), Style::default().fg(C_MUTED)),
        ]);
        frame.render_widget(Paragraph::new(left), cols[0]);

        let badge_color = if snap.loading {
            C_PENDING
        } else {
            phase_color(snap.phase)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                badge,
                Style::default().fg(badge_color).add_modifier(Modifier::BOLD),
            )),
            cols[1],
        );
    }
}
