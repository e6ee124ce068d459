//! NowPlaying component — read-only view of the active item and the last
//! sink push.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use tv_proto::protocol::SinkStatus;

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{C_ERROR, C_MUTED, C_PENDING, C_PLAYING, C_PRIMARY, C_SECONDARY, C_TAG},
    widgets::pane_chrome::{pane_chrome, Badge},
};

pub struct NowPlaying;

fn sink_line(status: &SinkStatus) -> Span<'static> {
    match status {
        SinkStatus::Idle => Span::styled("not started", Style::default().fg(C_MUTED)),
        SinkStatus::Playing => Span::styled("playing", Style::default().fg(C_PLAYING)),
        SinkStatus::NoSource => Span::styled(
            "no playable source (empty embed)",
            Style::default().fg(C_PENDING),
        ),
        SinkStatus::Error(e) => Span::styled(format!("error: {}", e), Style::default().fg(C_ERROR)),
    }
}

fn label(text: &'static str) -> Span<'static> {
    Span::styled(format!("{:<10}", text), Style::default().fg(C_MUTED))
}

impl Component for NowPlaying {
    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let snap = &state.snapshot;
        let item = &snap.active_item;
        let badge = match snap.sink_status {
            SinkStatus::Playing => Some(Badge {
                text: "ON AIR",
                color: C_PLAYING,
            }),
            SinkStatus::Error(_) => Some(Badge {
                text: "ERR",
                color: C_ERROR,
            }),
            _ => None,
        };
        let block = pane_chrome("now playing", focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![
            Line::from(Span::styled(
                item.title.clone(),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled(item.presenter.clone(), Style::default().fg(C_TAG)),
                Span::styled(
                    item.timecode
                        .as_ref()
                        .map(|t| format!("  · {}", t))
                        .unwrap_or_default(),
                    Style::default().fg(C_SECONDARY),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                item.description.clone(),
                Style::default().fg(C_SECONDARY),
            )),
            Line::from(""),
            Line::from(vec![
                label("watch"),
                Span::styled(
                    item.video_ref.clone().unwrap_or_else(|| "—".to_string()),
                    Style::default().fg(C_SECONDARY),
                ),
            ]),
            Line::from(vec![
                label("embed"),
                Span::styled(
                    snap.now_playing_url
                        .clone()
                        .unwrap_or_else(|| "—".to_string()),
                    Style::default().fg(C_SECONDARY),
                ),
            ]),
            Line::from(vec![label("player"), sink_line(&snap.sink_status)]),
        ];
        if let Some(err) = &snap.last_load_error {
            lines.push(Line::from(vec![
                label("catalog"),
                Span::styled(err.clone(), Style::default().fg(C_MUTED)),
            ]));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }
}
