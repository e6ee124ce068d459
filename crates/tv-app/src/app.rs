//! App — component-based terminal event loop.
//!
//! - `App` owns all components and `AppState`.
//! - Background tasks feed `AppMessage`s in over an mpsc channel.
//! - Components return `Vec<Action>`; `dispatch` turns those into core
//!   commands or local UI changes.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::Block,
    Frame, Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use tv_proto::protocol::{SelectionSnapshot, SinkStatus};
use tv_proto::state::StateStore;

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    components::{
        channel_entry::ChannelEntry, channel_list::ChannelList, confirm_dialog::ConfirmDialog,
        header::Header, help_overlay::HelpOverlay, now_playing::NowPlaying,
    },
    core::CoreEvent,
    theme::C_BG,
    widgets::{status_bar, toast::ToastManager},
    BroadcastMessage,
};

enum AppMessage {
    Event(Event),
    StateUpdated(SelectionSnapshot),
    Log(String),
}

/// Last-drawn rects, for mouse hit-testing.
#[derive(Default, Clone, Copy)]
struct PaneAreas {
    channel_list: Rect,
    full: Rect,
}

pub struct App {
    state: AppState,
    header: Header,
    channel_list: ChannelList,
    now_playing: NowPlaying,
    confirm_dialog: ConfirmDialog,
    help_overlay: HelpOverlay,
    toast: ToastManager,
    areas: PaneAreas,
    event_tx: mpsc::Sender<CoreEvent>,
    state_store: StateStore,
    core_online: bool,
    should_quit: bool,
}

impl App {
    pub fn new(
        log_path: PathBuf,
        event_tx: mpsc::Sender<CoreEvent>,
        state_store: StateStore,
    ) -> Self {
        Self {
            state: AppState::new(SelectionSnapshot::default(), log_path),
            header: Header,
            channel_list: ChannelList::new(),
            now_playing: NowPlaying,
            confirm_dialog: ConfirmDialog::new(),
            help_overlay: HelpOverlay::new(),
            toast: ToastManager::new(),
            areas: PaneAreas::default(),
            event_tx,
            state_store,
            core_online: true,
            should_quit: false,
        }
    }

    pub async fn run(
        mut self,
        mut broadcast_rx: broadcast::Receiver<BroadcastMessage>,
    ) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);

        // Pick up whatever the core has already published.
        let initial = self.state_store.get_state().await;
        self.apply_snapshot(initial);

        // ── Background task: keyboard/mouse events ────────────────────────────
        let key_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if key_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: broadcast receiver (TvCore → AppMessage) ─────────
        let bc_tx = tx.clone();
        let bc_store = self.state_store.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(msg) => {
                        let app_msg = match msg {
                            BroadcastMessage::StateUpdated => {
                                AppMessage::StateUpdated(bc_store.get_state().await)
                            }
                            BroadcastMessage::Log(s) => AppMessage::Log(s),
                        };
                        if bc_tx.send(app_msg).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("broadcast receiver lagged by {} messages", n);
                        // The next StateUpdated carries everything we missed.
                        let state = bc_store.get_state().await;
                        if bc_tx.send(AppMessage::StateUpdated(state)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        drop(tx);

        // Toast expiry + spinner animation
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    self.handle_message(msg).await;
                    while let Ok(next) = rx.try_recv() {
                        self.handle_message(next).await;
                    }
                    needs_redraw = true;
                }
                _ = ui_tick.tick() => {
                    self.toast.tick();
                    needs_redraw = !self.toast.is_empty() || self.state.snapshot.loading;
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        info!("tui: exited");
        Ok(())
    }

    async fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                for action in self.handle_key(key) {
                    self.dispatch(action).await;
                }
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                for action in self.handle_mouse(mouse) {
                    self.dispatch(action).await;
                }
            }
            AppMessage::Event(_) => {}
            AppMessage::StateUpdated(snapshot) => self.apply_snapshot(snapshot),
            AppMessage::Log(line) => self.state.push_log(line),
        }
    }

    /// Adopt a newer snapshot and raise toasts for what changed.
    fn apply_snapshot(&mut self, snapshot: SelectionSnapshot) {
        if snapshot.rev < self.state.snapshot.rev {
            return;
        }
        let prev = std::mem::replace(&mut self.state.snapshot, snapshot);
        let next = &self.state.snapshot;

        if next.loading {
            self.toast.spinner("loading catalog");
        } else {
            self.toast.dismiss_spinner();
            if prev.loading && next.last_load_error.is_none() {
                self.toast.success(format!("{} channels", next.catalog.len()));
            }
        }
        if next.source != prev.source && prev.rev > 0 {
            self.toast.info(format!("source: {}", next.source));
        }
        if next.sink_status != prev.sink_status {
            match &next.sink_status {
                SinkStatus::Playing => self
                    .toast
                    .success(format!("watching {}", next.active_item.title)),
                SinkStatus::NoSource => self.toast.warning("no playable video for this channel"),
                SinkStatus::Error(e) => self.toast.error(format!("player: {}", e)),
                SinkStatus::Idle => {}
            }
        }

        self.channel_list.on_state(&self.state);
        self.header.on_state(&self.state);
        self.now_playing.on_state(&self.state);
        self.confirm_dialog.on_state(&self.state);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Action::Quit];
        }

        // Overlays capture input while visible.
        if self.help_overlay.visible {
            return self.help_overlay.handle_key(key, &self.state);
        }
        if self.state.is_confirming() {
            return self.confirm_dialog.handle_key(key, &self.state);
        }

        match key.code {
            KeyCode::Char('q') => vec![Action::Quit],
            KeyCode::Char('?') => vec![Action::ToggleHelp],
            KeyCode::Char('r') => vec![Action::Reload],
            KeyCode::Char('y') => ChannelEntry::new(self.state.active_item())
                .video_ref()
                .map(|url| vec![Action::CopyToClipboard(url.to_string())])
                .unwrap_or_default(),
            _ => self.channel_list.handle_key(key, &self.state),
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        if self.help_overlay.visible {
            return vec![];
        }
        if self.state.is_confirming() {
            return self
                .confirm_dialog
                .handle_mouse(event, self.areas.full, &self.state);
        }
        let r = self.areas.channel_list;
        if event.column >= r.x
            && event.column < r.x + r.width
            && event.row >= r.y
            && event.row < r.y + r.height
        {
            return self.channel_list.handle_mouse(event, r, &self.state);
        }
        vec![]
    }

    async fn dispatch(&mut self, action: Action) {
        if let Some(cmd) = action.to_command() {
            debug!("tui: dispatch {:?}", cmd);
            if self.event_tx.send(CoreEvent::ClientCommand(cmd)).await.is_err() {
                self.core_online = false;
                self.toast.error("core stopped");
            }
            return;
        }
        match action {
            Action::Quit => self.should_quit = true,
            Action::ToggleHelp => self.help_overlay.toggle(),
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        let display = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text
                        };
                        self.toast.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }
            Action::Pick(_)
            | Action::Confirm
            | Action::Cancel
            | Action::Reload
            | Action::Noop => {}
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);

        self.areas = PaneAreas {
            channel_list: body[0],
            full: area,
        };

        let overlay = self.help_overlay.visible || self.state.is_confirming();
        self.header.draw(frame, rows[0], false, &self.state);
        self.channel_list.draw(frame, body[0], !overlay, &self.state);
        self.now_playing.draw(frame, body[1], false, &self.state);
        status_bar::draw_log_bar(
            frame,
            rows[2],
            self.state.logs.last().map(String::as_str),
            self.core_online,
        );
        status_bar::draw_keys_bar(frame, rows[3], self.state.is_confirming());

        self.confirm_dialog.draw(frame, area, true, &self.state);
        self.help_overlay.draw(frame, area, true, &self.state);
        self.toast.draw(frame, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEventState;
    use tv_proto::protocol::{CatalogItem, Command, PlaybackPhase};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app() -> (App, mpsc::Receiver<CoreEvent>) {
        let (tx, rx) = mpsc::channel(8);
        let store = StateStore::new("channels.json");
        (App::new(PathBuf::from("tv.log"), tx, store), rx)
    }

    #[test]
    fn test_confirm_dialog_captures_keys() {
        let (mut app, _rx) = app();
        let mut snap = SelectionSnapshot::default();
        snap.rev = 1;
        snap.phase = PlaybackPhase::Confirming;
        snap.pending_item = Some(CatalogItem::seeded_default());
        app.apply_snapshot(snap);

        assert_eq!(
            app.handle_key(key(KeyCode::Char('q'))),
            vec![Action::Cancel]
        );
        assert_eq!(app.handle_key(key(KeyCode::Enter)), vec![Action::Confirm]);
    }

    #[test]
    fn test_stale_snapshot_is_ignored() {
        let (mut app, _rx) = app();
        let mut newer = SelectionSnapshot::default();
        newer.rev = 5;
        newer.source = "b.json".into();
        app.apply_snapshot(newer);
        let mut older = SelectionSnapshot::default();
        older.rev = 3;
        older.source = "a.json".into();
        app.apply_snapshot(older);
        assert_eq!(app.state.snapshot.source, "b.json");
    }

    #[tokio::test]
    async fn test_global_keys() {
        let (mut app, mut rx) = app();
        assert_eq!(
            app.handle_key(key(KeyCode::Char('y'))),
            vec![Action::CopyToClipboard(
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ".into()
            )]
        );

        for action in app.handle_key(key(KeyCode::Char('r'))) {
            app.dispatch(action).await;
        }
        match rx.recv().await {
            Some(CoreEvent::ClientCommand(cmd)) => assert_eq!(cmd, Command::Reload),
            other => panic!("expected reload, got {:?}", other),
        }

        for action in app.handle_key(key(KeyCode::Char('?'))) {
            app.dispatch(action).await;
        }
        assert!(app.help_overlay.visible);
        assert_eq!(
            app.handle_key(key(KeyCode::Char('q'))),
            vec![Action::ToggleHelp]
        );

        app.dispatch(Action::Quit).await;
        assert!(app.should_quit);
    }
}
