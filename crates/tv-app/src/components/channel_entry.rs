//! ChannelEntry — one row of the channel list.
//!
//! Built from a `&CatalogItem` on every render and holds no state of its
//! own. Its only outbound signal is `picked()`, which carries the full item.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::ListItem,
};
use tv_proto::protocol::CatalogItem;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::action::Action;
use crate::theme::{C_ACCENT, C_MUTED, C_PLAYING, C_PRIMARY, C_SECONDARY, C_SELECTION_BG, C_TAG};

/// Rows each entry occupies in the list.
pub const ENTRY_HEIGHT: u16 = 2;

pub struct ChannelEntry<'a> {
    item: &'a CatalogItem,
}

impl<'a> ChannelEntry<'a> {
    pub fn new(item: &'a CatalogItem) -> Self {
        Self { item }
    }

    pub fn id(&self) -> &'a str {
        &self.item.id
    }

    pub fn title(&self) -> &'a str {
        &self.item.title
    }

    pub fn presenter(&self) -> &'a str {
        &self.item.presenter
    }

    pub fn description(&self) -> &'a str {
        &self.item.description
    }

    pub fn video_ref(&self) -> Option<&'a str> {
        self.item.video_ref.as_deref()
    }

    pub fn timecode_label(&self) -> Option<String> {
        self.item.timecode.as_ref().map(|t| t.to_string())
    }

    pub fn picked(&self) -> Action {
        Action::Pick(self.item.clone())
    }

    pub fn render(&self, width: u16, selected: bool, active: bool) -> ListItem<'static> {
        let width = width as usize;
        let marker = if active { "▶ " } else { "  " };
        let badge = self
            .timecode_label()
            .map(|t| format!(" {} ", t))
            .unwrap_or_default();

        let title = if self.title().is_empty() {
            "(untitled)"
        } else {
            self.title()
        };
        let title_style = match (active, selected) {
            (true, _) => Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD),
            (false, true) => Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            (false, false) => Style::default().fg(C_PRIMARY),
        };

        let mut head = vec![Span::styled(
            marker.to_string(),
            Style::default().fg(if active { C_PLAYING } else { C_MUTED }),
        )];
        let fixed = marker.width() + badge.width();
        let room = width.saturating_sub(fixed);
        let title_text = truncate(title, room);
        let mut used = title_text.width();
        head.push(Span::styled(title_text, title_style));

        if !self.presenter().is_empty() && room > used + 3 {
            let presenter = truncate(self.presenter(), room - used - 2);
            used += 2 + presenter.width();
            head.push(Span::raw("  "));
            head.push(Span::styled(presenter, Style::default().fg(C_TAG)));
        }
        if !badge.is_empty() {
            head.push(Span::raw(" ".repeat(room.saturating_sub(used))));
            head.push(Span::styled(badge, Style::default().fg(C_ACCENT)));
        }

        let desc = truncate(self.description(), width.saturating_sub(2));
        let body = Line::from(vec![
            Span::raw("  "),
            Span::styled(desc, Style::default().fg(C_SECONDARY)),
        ]);

        let item = ListItem::new(Text::from(vec![Line::from(head), body]));
        if selected {
            item.style(Style::default().bg(C_SELECTION_BG))
        } else {
            item
        }
    }
}

/// Cut `s` to at most `max` terminal columns, ending in `…` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
