//! End-to-end flow against an in-process catalog server.
//!
//! A mock listing endpoint is served by axum on an ephemeral port; a real
//! `TvCore` loads from it over HTTP and pushes to a `RecordingSink`.
//!
//! Run with: cargo test --test catalog_flow -- --nocapture

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, Mutex};
use tv_app::coordinator::PlaybackCoordinator;
use tv_app::core::{CoreEvent, TvCore};
use tv_app::loader::CatalogLoader;
use tv_app::sink::{RecordingSink, SinkCall};
use tv_app::BroadcastMessage;
use tv_proto::protocol::{Command, PlaybackPhase, SelectionSnapshot};
use tv_proto::resolver::{VideoUrlResolver, DEFAULT_EMBED_BASE};
use tv_proto::state::StateStore;

const LISTING: &str = r#"{"status":200,"data":{"items":[
    {"id":"a","title":"Intro","metadata":{"author":"X","source":"https://x.test/watch?v=123"}},
    {"id":"b","title":"Broken","metadata":{"author":"Y","source":"not-a-url"}}
]}}"#;

const OTHER_LISTING: &str = r#"{"status":200,"data":{"items":[
    {"id":"z","title":"Elsewhere","metadata":{"source":"https://y.test/watch?v=zzz"}}
]}}"#;

/// What the mock server answers with; swapped mid-test.
type Reply = Arc<Mutex<(StatusCode, &'static str)>>;

struct MockCatalogServer {
    base: String,
    reply: Reply,
}

impl MockCatalogServer {
    async fn start() -> Self {
        let reply: Reply = Arc::new(Mutex::new((StatusCode::OK, LISTING)));
        let app = Router::new()
            .route("/channels.json", get(serve_listing))
            .route("/other.json", get(|| async { OTHER_LISTING }))
            .with_state(reply.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base: format!("http://{}", addr),
            reply,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    async fn answer(&self, status: StatusCode, body: &'static str) {
        *self.reply.lock().await = (status, body);
    }
}

async fn serve_listing(State(reply): State<Reply>) -> (StatusCode, &'static str) {
    *reply.lock().await
}

struct Running {
    events: mpsc::Sender<CoreEvent>,
    state: StateStore,
    sink: RecordingSink,
    broadcast_rx: broadcast::Receiver<BroadcastMessage>,
}

impl Running {
    fn start(source: String) -> Self {
        let (broadcast_tx, broadcast_rx) = broadcast::channel(256);
        let (event_tx, event_rx) = mpsc::channel(64);
        let sink = RecordingSink::new();
        let core = TvCore::with_parts(
            source,
            PlaybackCoordinator::new(VideoUrlResolver::new(DEFAULT_EMBED_BASE)),
            CatalogLoader::new(Duration::from_secs(5)).unwrap(),
            sink.clone(),
            broadcast_tx,
            event_tx.clone(),
        );
        let state = core.state_store();
        tokio::spawn(core.run(event_rx));
        Self {
            events: event_tx,
            state,
            sink,
            broadcast_rx,
        }
    }

    async fn send(&self, cmd: Command) {
        self.events.send(CoreEvent::ClientCommand(cmd)).await.unwrap();
    }

    /// Wait on the broadcast stream until the published snapshot satisfies `f`.
    async fn wait_for(&mut self, f: impl Fn(&SelectionSnapshot) -> bool) -> SelectionSnapshot {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let snap = self.state.get_state().await;
                if f(&snap) {
                    return snap;
                }
                match self.broadcast_rx.recv().await {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => panic!("core stopped"),
                }
            }
        })
        .await
        .expect("timed out waiting for snapshot")
    }

    async fn wait_loaded(&mut self) -> SelectionSnapshot {
        self.wait_for(|s| !s.loading && (s.catalog.len() > 0 || s.last_load_error.is_some()))
            .await
    }
}

#[tokio::test]
async fn pick_confirm_pushes_embed_url() {
    let server = MockCatalogServer::start().await;
    let mut tv = Running::start(server.url("channels.json"));

    tv.send(Command::Reload).await;
    let snap = tv.wait_loaded().await;
    assert_eq!(snap.catalog.len(), 2);
    assert_eq!(snap.phase, PlaybackPhase::Ready);
    assert_eq!(snap.active_item.id, "item-000-000-102");

    tv.send(Command::Pick { id: "a".into() }).await;
    let snap = tv.wait_for(|s| s.phase == PlaybackPhase::Confirming).await;
    assert_eq!(snap.pending_item.as_ref().map(|i| i.title.as_str()), Some("Intro"));
    assert!(tv.sink.calls().await.is_empty());

    tv.send(Command::Confirm).await;
    let snap = tv
        .wait_for(|s| s.phase == PlaybackPhase::Ready && s.now_playing_url.is_some())
        .await;
    assert_eq!(snap.active_item.id, "a");
    assert_eq!(
        tv.sink.calls().await,
        vec![
            SinkCall::Load(format!("{}/123", DEFAULT_EMBED_BASE)),
            SinkCall::Play
        ]
    );
}

#[tokio::test]
async fn malformed_video_ref_commits_with_sentinel() {
    let server = MockCatalogServer::start().await;
    let mut tv = Running::start(server.url("channels.json"));

    tv.send(Command::Reload).await;
    tv.wait_loaded().await;

    tv.send(Command::Pick { id: "b".into() }).await;
    tv.wait_for(|s| s.phase == PlaybackPhase::Confirming).await;
    tv.send(Command::Confirm).await;
    let snap = tv.wait_for(|s| s.now_playing_url.is_some()).await;

    assert_eq!(snap.active_item.id, "b");
    assert_eq!(
        tv.sink.loaded_urls().await,
        vec![format!("{}/", DEFAULT_EMBED_BASE)]
    );
}

#[tokio::test]
async fn cancel_leaves_sink_untouched() {
    let server = MockCatalogServer::start().await;
    let mut tv = Running::start(server.url("channels.json"));

    tv.send(Command::Reload).await;
    tv.wait_loaded().await;
    tv.send(Command::Pick { id: "a".into() }).await;
    tv.wait_for(|s| s.phase == PlaybackPhase::Confirming).await;
    tv.send(Command::Cancel).await;
    let snap = tv.wait_for(|s| s.phase == PlaybackPhase::Ready).await;

    assert!(snap.pending_item.is_none());
    assert_eq!(snap.active_item.id, "item-000-000-102");
    assert!(tv.sink.calls().await.is_empty());
}

#[tokio::test]
async fn server_error_keeps_previous_catalog() {
    let server = MockCatalogServer::start().await;
    let mut tv = Running::start(server.url("channels.json"));

    tv.send(Command::Reload).await;
    let first = tv.wait_loaded().await;
    assert_eq!(first.catalog.len(), 2);

    server.answer(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
    tv.send(Command::Reload).await;
    let snap = tv
        .wait_for(|s| !s.loading && s.last_load_error.is_some())
        .await;

    assert!(snap.last_load_error.unwrap_or_default().contains("500"));
    assert_eq!(snap.catalog.len(), 2);
    assert_eq!(snap.catalog.generation, first.catalog.generation);
    assert_eq!(snap.phase, PlaybackPhase::Ready);
}

#[tokio::test]
async fn rejected_listing_keeps_previous_catalog() {
    let server = MockCatalogServer::start().await;
    let mut tv = Running::start(server.url("channels.json"));

    tv.send(Command::Reload).await;
    tv.wait_loaded().await;

    server
        .answer(StatusCode::OK, r#"{"status":404,"data":{"items":[]}}"#)
        .await;
    tv.send(Command::Reload).await;
    let snap = tv
        .wait_for(|s| !s.loading && s.last_load_error.is_some())
        .await;
    assert_eq!(snap.catalog.len(), 2);
    assert!(snap.catalog.get("a").is_some());
}

#[tokio::test]
async fn switching_source_replaces_catalog() {
    let server = MockCatalogServer::start().await;
    let mut tv = Running::start(server.url("channels.json"));

    tv.send(Command::Reload).await;
    tv.wait_loaded().await;

    let other = server.url("other.json");
    tv.send(Command::SetSource { uri: other.clone() }).await;
    let snap = tv
        .wait_for(|s| !s.loading && s.catalog.get("z").is_some())
        .await;

    assert_eq!(snap.source, other);
    assert_eq!(snap.catalog.len(), 1);
    assert!(snap.catalog.get("a").is_none());
}
