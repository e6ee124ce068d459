//! TvCore — single-owner event loop for the coordinator and the sink.
//!
//! The terminal surface and the HTTP API send `CoreEvent::ClientCommand`s;
//! catalog fetches run in their own tasks and report back with
//! `CoreEvent::CatalogLoaded`. Nothing else touches the coordinator.
//!
//! After every transition the core writes a fresh snapshot into the
//! `StateStore` and broadcasts `BroadcastMessage::StateUpdated`.
//!
//! Loads are stamped with a generation. A result whose generation is older
//! than the most recently started load is dropped, so the last load started
//! is the one that sticks.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use tv_proto::config::Config;
use tv_proto::error::LoadFailure;
use tv_proto::protocol::{Catalog, Command, SinkStatus};
use tv_proto::resolver::VideoUrlResolver;
use tv_proto::state::StateStore;

use crate::coordinator::{PlaybackCoordinator, PlaybackRequest};
use crate::loader::CatalogLoader;
use crate::sink::PlaybackSink;
use crate::BroadcastMessage;

/// All inputs into the core loop.
#[derive(Debug)]
pub enum CoreEvent {
    /// A command from the TUI or HTTP API.
    ClientCommand(Command),
    /// A catalog fetch finished.
    CatalogLoaded {
        generation: u64,
        result: Result<Catalog, LoadFailure>,
    },
    Shutdown,
}

pub struct TvCore<S: PlaybackSink> {
    coordinator: PlaybackCoordinator,
    sink: S,
    loader: CatalogLoader,
    state: StateStore,
    source: String,
    /// Generation of the most recently started load.
    latest_generation: u64,
    loading: bool,
    event_tx: mpsc::Sender<CoreEvent>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
}

impl<S: PlaybackSink> TvCore<S> {
    pub fn new(
        config: &Config,
        sink: S,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
        event_tx: mpsc::Sender<CoreEvent>,
    ) -> anyhow::Result<Self> {
        let loader = CatalogLoader::new(config.catalog.request_timeout())?;
        let resolver = VideoUrlResolver::new(config.player.embed_base.clone());
        Ok(Self::with_parts(
            config.catalog.source.clone(),
            PlaybackCoordinator::new(resolver),
            loader,
            sink,
            broadcast_tx,
            event_tx,
        ))
    }

    pub fn with_parts(
        source: String,
        coordinator: PlaybackCoordinator,
        loader: CatalogLoader,
        sink: S,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
        event_tx: mpsc::Sender<CoreEvent>,
    ) -> Self {
        Self {
            state: StateStore::new(source.clone()),
            coordinator,
            sink,
            loader,
            source,
            latest_generation: 0,
            loading: false,
            event_tx,
            broadcast_tx,
        }
    }

    /// Shared read side (for the HTTP server and the TUI).
    pub fn state_store(&self) -> StateStore {
        self.state.clone()
    }

    /// Run until `Shutdown` or until every sender is gone.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<CoreEvent>) -> anyhow::Result<()> {
        info!("TvCore: starting event loop (sink={})", self.sink.name());
        self.publish().await;

        while let Some(evt) = event_rx.recv().await {
            if !self.handle_event(evt).await {
                info!("TvCore: shutdown requested");
                break;
            }
        }

        self.sink.shutdown().await;
        info!("TvCore: stopped");
        Ok(())
    }

    /// Returns `false` when the loop should stop.
    async fn handle_event(&mut self, evt: CoreEvent) -> bool {
        match evt {
            CoreEvent::Shutdown => return false,
            CoreEvent::ClientCommand(cmd) => {
                info!("TvCore: command {:?}", cmd);
                self.handle_command(cmd).await;
            }
            CoreEvent::CatalogLoaded { generation, result } => {
                self.handle_loaded(generation, result).await;
            }
        }
        true
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Pick { id } => match self.coordinator.pick_by_id(&id) {
                Ok(()) => self.publish().await,
                Err(e) => {
                    warn!("TvCore: {}", e);
                    self.notify(e.to_string());
                }
            },
            Command::PickItem { item } => {
                self.coordinator.pick(item);
                self.publish().await;
            }
            Command::Confirm => match self.coordinator.confirm() {
                Ok(request) => {
                    self.publish().await;
                    self.push_to_sink(request).await;
                }
                Err(e) => debug!("TvCore: confirm ignored: {}", e),
            },
            Command::Cancel => {
                if self.coordinator.cancel() {
                    self.publish().await;
                }
            }
            Command::SetSource { uri } => {
                info!("TvCore: catalog source -> {}", uri);
                self.source = uri;
                self.start_load().await;
            }
            Command::Reload => self.start_load().await,
            Command::GetState => self.publish().await,
        }
    }

    async fn push_to_sink(&mut self, request: PlaybackRequest) {
        let PlaybackRequest { item, url } = request;
        let outcome = match self.sink.load(url.as_str()).await {
            Ok(()) => self.sink.play().await,
            Err(e) => Err(e),
        };
        let status = match outcome {
            Ok(()) if url.is_sentinel() => {
                warn!("TvCore: {:?} has no playable source; sink got {}", item.id, url);
                SinkStatus::NoSource
            }
            Ok(()) => SinkStatus::Playing,
            Err(e) => {
                error!("TvCore: sink {} failed for {}: {}", self.sink.name(), url, e);
                self.notify(e.to_string());
                SinkStatus::Error(e.to_string())
            }
        };
        self.coordinator.playback_pushed(&url, status);
        self.publish().await;
    }

    async fn start_load(&mut self) {
        self.latest_generation += 1;
        let generation = self.latest_generation;
        self.loading = true;
        self.coordinator.touch();
        self.publish().await;

        let loader = self.loader.clone();
        let source = self.source.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = loader.load(&source, generation).await;
            if event_tx
                .send(CoreEvent::CatalogLoaded { generation, result })
                .await
                .is_err()
            {
                debug!("loader: core gone before gen={} finished", generation);
            }
        });
    }

    async fn handle_loaded(&mut self, generation: u64, result: Result<Catalog, LoadFailure>) {
        if generation < self.latest_generation {
            debug!(
                "TvCore: discarding stale load gen={} (latest={})",
                generation, self.latest_generation
            );
            return;
        }
        self.loading = false;
        match result {
            Ok(catalog) => self.coordinator.apply_catalog(catalog),
            Err(failure) => {
                self.coordinator.reject_catalog(&failure);
                self.notify(failure.to_string());
            }
        }
        self.publish().await;
    }

    fn notify(&self, msg: String) {
        let _ = self.broadcast_tx.send(BroadcastMessage::Log(msg));
    }

    async fn publish(&mut self) {
        let snapshot = self.coordinator.snapshot(&self.source, self.loading);
        if self.state.publish(snapshot).await {
            let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{RecordingSink, SinkCall, SinkError};
    use std::io::Write;
    use std::time::Duration;
    use tv_proto::error::RejectReason;
    use tv_proto::protocol::{CatalogItem, PlaybackPhase};

    const LISTING: &str = r#"{"status":200,"data":{"items":[
        {"id":"a","title":"Intro","metadata":{"author":"X","source":"https://x.test/watch?v=123"}},
        {"id":"b","title":"Broken","metadata":{"source":"not-a-url"}}
    ]}}"#;

    struct Harness {
        core: TvCore<RecordingSink>,
        sink: RecordingSink,
        events: mpsc::Receiver<CoreEvent>,
        _file: tempfile::NamedTempFile,
    }

    fn harness(sink: RecordingSink) -> Harness {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LISTING.as_bytes()).unwrap();
        let (broadcast_tx, _) = broadcast::channel(64);
        let (event_tx, events) = mpsc::channel(16);
        let core = TvCore::with_parts(
            file.path().display().to_string(),
            PlaybackCoordinator::new(VideoUrlResolver::default()),
            CatalogLoader::new(Duration::from_secs(2)).unwrap(),
            sink.clone(),
            broadcast_tx,
            event_tx,
        );
        Harness {
            core,
            sink,
            events,
            _file: file,
        }
    }

    impl Harness {
        async fn command(&mut self, cmd: Command) {
            assert!(self.core.handle_event(CoreEvent::ClientCommand(cmd)).await);
        }

        /// Start a load and feed its completion back in.
        async fn reload(&mut self) {
            self.command(Command::Reload).await;
            let evt = self.events.recv().await.unwrap();
            self.core.handle_event(evt).await;
        }
    }

    #[tokio::test]
    async fn test_load_pick_confirm_pushes_once() {
        let mut h = harness(RecordingSink::new());
        h.reload().await;
        let state = h.core.state_store().get_state().await;
        assert_eq!(state.phase, PlaybackPhase::Ready);
        assert_eq!(state.catalog.len(), 2);
        assert!(!state.loading);

        h.command(Command::Pick { id: "a".into() }).await;
        let state = h.core.state_store().get_state().await;
        assert_eq!(state.phase, PlaybackPhase::Confirming);
        assert_eq!(state.pending_item.map(|i| i.title), Some("Intro".into()));

        h.command(Command::Confirm).await;
        let state = h.core.state_store().get_state().await;
        assert_eq!(state.active_item.id, "a");
        assert!(state.pending_item.is_none());
        assert_eq!(state.phase, PlaybackPhase::Ready);
        assert_eq!(state.sink_status, SinkStatus::Playing);
        assert_eq!(
            h.sink.calls().await,
            vec![
                SinkCall::Load("https://www.youtube.com/embed/123".into()),
                SinkCall::Play
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_never_touches_sink() {
        let mut h = harness(RecordingSink::new());
        h.reload().await;
        h.command(Command::Pick { id: "a".into() }).await;
        h.command(Command::Cancel).await;

        let state = h.core.state_store().get_state().await;
        assert_eq!(state.active_item.id, "item-000-000-102");
        assert!(state.pending_item.is_none());
        assert!(h.sink.calls().await.is_empty());

        // Confirm with nothing pending is ignored.
        h.command(Command::Confirm).await;
        assert!(h.sink.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_source_pushes_sentinel() {
        let mut h = harness(RecordingSink::new());
        h.reload().await;
        h.command(Command::Pick { id: "b".into() }).await;
        h.command(Command::Confirm).await;

        let state = h.core.state_store().get_state().await;
        assert_eq!(state.active_item.id, "b");
        assert_eq!(state.sink_status, SinkStatus::NoSource);
        assert_eq!(
            h.sink.loaded_urls().await,
            vec!["https://www.youtube.com/embed/".to_string()]
        );
    }

    #[tokio::test]
    async fn test_sink_failure_still_commits() {
        let mut h = harness(RecordingSink::failing(SinkError::Unavailable("gone".into())));
        h.command(Command::PickItem {
            item: CatalogItem::seeded_default(),
        })
        .await;
        h.command(Command::Confirm).await;

        let state = h.core.state_store().get_state().await;
        assert_eq!(state.phase, PlaybackPhase::Idle);
        assert!(matches!(state.sink_status, SinkStatus::Error(_)));
        assert_eq!(h.sink.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_catalog() {
        let mut h = harness(RecordingSink::new());
        h.reload().await;
        let before = h.core.state_store().catalog().await;

        h.command(Command::SetSource {
            uri: "/definitely/not/here.json".into(),
        })
        .await;
        let evt = h.events.recv().await.unwrap();
        h.core.handle_event(evt).await;

        let state = h.core.state_store().get_state().await;
        assert!(std::sync::Arc::ptr_eq(&before, &state.catalog));
        assert_eq!(state.source, "/definitely/not/here.json");
        assert!(state.last_load_error.is_some());
        assert_eq!(state.phase, PlaybackPhase::Ready);
    }

    #[tokio::test]
    async fn test_stale_load_is_discarded() {
        let mut h = harness(RecordingSink::new());
        // Two loads started; the older one finishes last.
        h.command(Command::Reload).await;
        h.command(Command::Reload).await;

        let newer = Catalog::new(vec![CatalogItem::seeded_default()], 2);
        h.core
            .handle_event(CoreEvent::CatalogLoaded {
                generation: 2,
                result: Ok(newer),
            })
            .await;
        h.core
            .handle_event(CoreEvent::CatalogLoaded {
                generation: 1,
                result: Err(LoadFailure::Rejected(RejectReason::EmptyItems)),
            })
            .await;

        let state = h.core.state_store().get_state().await;
        assert_eq!(state.catalog.generation, 2);
        assert!(state.last_load_error.is_none());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_unknown_pick_leaves_state() {
        let mut h = harness(RecordingSink::new());
        h.reload().await;
        let rev = h.core.state_store().rev().await;
        h.command(Command::Pick { id: "zzz".into() }).await;
        let state = h.core.state_store().get_state().await;
        assert_eq!(state.rev, rev);
        assert_eq!(state.phase, PlaybackPhase::Ready);
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let h = harness(RecordingSink::new());
        let (tx, rx) = mpsc::channel(4);
        let task = tokio::spawn(h.core.run(rx));
        tx.send(CoreEvent::Shutdown).await.unwrap();
        task.await.unwrap().unwrap();
    }
}
