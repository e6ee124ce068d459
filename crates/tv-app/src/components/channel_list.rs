//! ChannelList component — scrollable list of channel entries.

use std::sync::Arc;
use std::time::Instant;

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{List, ListState, Paragraph},
    Frame,
};
use tv_proto::protocol::{Catalog, CatalogItem};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    components::channel_entry::{ChannelEntry, ENTRY_HEIGHT},
    theme::C_MUTED,
    widgets::{pane_chrome::pane_chrome, scrollable_list::ScrollableList},
};

pub struct ChannelList {
    list: ScrollableList<CatalogItem>,
    list_state: ListState,
    /// Catalog currently mirrored into `list`.
    shown: Option<Arc<Catalog>>,
    last_click: Option<(usize, Instant)>,
}

impl Default for ChannelList {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelList {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(),
            list_state: ListState::default(),
            shown: None,
            last_click: None,
        }
    }

    pub fn selected_item(&self) -> Option<&CatalogItem> {
        self.list.selected_item()
    }

    fn pick_selected(&self) -> Vec<Action> {
        self.list
            .selected_item()
            .map(|item| vec![ChannelEntry::new(item).picked()])
            .unwrap_or_default()
    }

    /// Mirror the published catalog. The cursor follows the previously
    /// selected id when it survives the swap, otherwise the active item.
    fn sync(&mut self, state: &AppState) {
        let catalog = &state.snapshot.catalog;
        if self.shown.as_ref().is_some_and(|c| Arc::ptr_eq(c, catalog)) {
            return;
        }
        let prev_id = self.list.selected_item().map(|i| i.id.clone());
        self.list.set_items(catalog.items.clone());
        let target = prev_id
            .and_then(|id| catalog.position(&id))
            .or_else(|| catalog.position(&state.active_item().id));
        if let Some(idx) = target {
            self.list.select_index(idx);
        }
        self.shown = Some(Arc::clone(catalog));
    }
}

impl Component for ChannelList {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5
        } else {
            1
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select_up(step),
            KeyCode::Down | KeyCode::Char('j') => self.list.select_down(step),
            KeyCode::PageUp => self.list.select_up(10),
            KeyCode::PageDown => self.list.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.list.select_last(),
            KeyCode::Enter => return self.pick_selected(),
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        // +1 for the top border
        let rel_row = (event.row.saturating_sub(area.y + 1) / ENTRY_HEIGHT) as usize;
        // Border rows are not entries.
        let on_border =
            event.row <= area.y || event.row.saturating_add(1) >= area.y + area.height;
        match event.kind {
            MouseEventKind::ScrollUp => self.list.select_up(1),
            MouseEventKind::ScrollDown => self.list.select_down(1),
            MouseEventKind::Down(MouseButton::Left) if on_border => {}
            MouseEventKind::Down(MouseButton::Left) => {
                let is_double = self
                    .last_click
                    .map(|(row, t)| row == rel_row && t.elapsed().as_millis() < 400)
                    .unwrap_or(false);
                if self.list.handle_click(rel_row) && is_double {
                    self.last_click = None;
                    return self.pick_selected();
                }
                self.last_click = Some((rel_row, Instant::now()));
            }
            _ => {}
        }
        vec![]
    }

    fn on_state(&mut self, state: &AppState) {
        self.sync(state);
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let title = format!("channels ({})", self.list.len());
        let block = pane_chrome(&title, focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.list.is_empty() {
            let msg = if state.snapshot.loading {
                "  loading catalog…"
            } else {
                "  no channels loaded (r to reload)"
            };
            frame.render_widget(
                Paragraph::new(Span::styled(msg, Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let rows = (inner.height / ENTRY_HEIGHT) as usize;
        self.list.ensure_visible(rows);
        let sel_in_view = self.list.selected_in_view(rows);

        let items: Vec<_> = self
            .list
            .visible_items(rows)
            .into_iter()
            .enumerate()
            .map(|(view_row, (_, item))| {
                ChannelEntry::new(item).render(
                    inner.width,
                    view_row == sel_in_view,
                    state.is_active(item),
                )
            })
            .collect();

        self.list_state.select(Some(sel_in_view));
        frame.render_stateful_widget(List::new(items), inner, &mut self.list_state);
    }
}
