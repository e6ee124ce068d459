use crate::core::CoreEvent;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tv_proto::protocol::{CatalogItem, Command, PlaybackPhase, SinkStatus};
use tv_proto::state::StateStore;

#[derive(Clone)]
struct HttpState {
    state: StateStore,
    event_tx: mpsc::Sender<CoreEvent>,
}

#[derive(Serialize)]
struct ApiState {
    rev: u64,
    phase: PlaybackPhase,
    active_item: CatalogItem,
    pending_item: Option<CatalogItem>,
    source: String,
    now_playing_url: Option<String>,
    sink_status: SinkStatus,
    catalog_size: usize,
    catalog_generation: u64,
    loading: bool,
    last_load_error: Option<String>,
}

#[derive(Serialize)]
struct ApiCatalog {
    generation: u64,
    loaded_at: Option<chrono::DateTime<chrono::Utc>>,
    items: Vec<CatalogItem>,
}

#[derive(Deserialize)]
struct SourceBody {
    uri: String,
}

pub fn router(state: StateStore, event_tx: mpsc::Sender<CoreEvent>) -> Router {
    let app_state = HttpState { state, event_tx };
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/catalog", get(get_catalog))
        .route("/api/pick/:id", post(pick))
        .route("/api/confirm", post(confirm))
        .route("/api/cancel", post(cancel))
        .route("/api/reload", post(reload))
        .route("/api/source", post(set_source))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub fn start_server(
    bind_address: String,
    port: u16,
    state: StateStore,
    event_tx: mpsc::Sender<CoreEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(state, event_tx);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}", addr, e);
                return;
            }
        };

        info!("HTTP API server listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

async fn get_state(State(state): State<HttpState>) -> Json<ApiState> {
    let snap = state.state.get_state().await;
    Json(ApiState {
        rev: snap.rev,
        phase: snap.phase,
        active_item: snap.active_item,
        pending_item: snap.pending_item,
        source: snap.source,
        now_playing_url: snap.now_playing_url,
        sink_status: snap.sink_status,
        catalog_size: snap.catalog.len(),
        catalog_generation: snap.catalog.generation,
        loading: snap.loading,
        last_load_error: snap.last_load_error,
    })
}

async fn get_catalog(State(state): State<HttpState>) -> Json<ApiCatalog> {
    let catalog = state.state.catalog().await;
    Json(ApiCatalog {
        generation: catalog.generation,
        loaded_at: catalog.loaded_at,
        items: catalog.items.clone(),
    })
}

async fn send(state: &HttpState, cmd: Command) -> StatusCode {
    if state
        .event_tx
        .send(CoreEvent::ClientCommand(cmd))
        .await
        .is_err()
    {
        error!("HTTP API: core is gone");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    StatusCode::ACCEPTED
}

async fn pick(State(state): State<HttpState>, Path(id): Path<String>) -> StatusCode {
    info!("HTTP API: pick {}", id);
    if state.state.find_item(&id).await.is_none() {
        return StatusCode::NOT_FOUND;
    }
    send(&state, Command::Pick { id }).await
}

async fn confirm(State(state): State<HttpState>) -> StatusCode {
    info!("HTTP API: confirm");
    send(&state, Command::Confirm).await
}

async fn cancel(State(state): State<HttpState>) -> StatusCode {
    info!("HTTP API: cancel");
    send(&state, Command::Cancel).await
}

async fn reload(State(state): State<HttpState>) -> StatusCode {
    info!("HTTP API: reload");
    send(&state, Command::Reload).await
}

async fn set_source(State(state): State<HttpState>, Json(body): Json<SourceBody>) -> StatusCode {
    info!("HTTP API: source {}", body.uri);
    if body.uri.trim().is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    send(&state, Command::SetSource { uri: body.uri }).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    fn app() -> (Router, StateStore, mpsc::Receiver<CoreEvent>) {
        let store = StateStore::new("channels.json");
        let (tx, rx) = mpsc::channel(8);
        (router(store.clone(), tx), store, rx)
    }

    fn post_req(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn next_command(rx: &mut mpsc::Receiver<CoreEvent>) -> Command {
        match rx.recv().await {
            Some(CoreEvent::ClientCommand(cmd)) => cmd,
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_state_endpoint() {
        let (app, _store, _rx) = app();
        let resp = app
            .oneshot(Request::get("/api/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["active_item"]["id"], "item-000-000-102");
        assert_eq!(json["source"], "channels.json");
        assert_eq!(json["catalog_size"], 0);
        assert_eq!(json["sink_status"]["status"], "idle");
    }

    #[tokio::test]
    async fn test_commands_are_queued() {
        let (app, _store, mut rx) = app();

        let resp = app.clone().oneshot(post_req("/api/confirm")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(next_command(&mut rx).await, Command::Confirm);

        let resp = app.clone().oneshot(post_req("/api/cancel")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(next_command(&mut rx).await, Command::Cancel);

        // The seeded item is pickable before any catalog loads.
        let resp = app
            .clone()
            .oneshot(post_req("/api/pick/item-000-000-102"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(
            next_command(&mut rx).await,
            Command::Pick {
                id: "item-000-000-102".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_pick_is_404() {
        let (app, _store, mut rx) = app();
        let resp = app.oneshot(post_req("/api/pick/nope")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_set_source() {
        let (app, _store, mut rx) = app();
        let req = Request::builder()
            .method("POST")
            .uri("/api/source")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"uri":"https://tv.test/channels.json"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(
            next_command(&mut rx).await,
            Command::SetSource {
                uri: "https://tv.test/channels.json".into()
            }
        );
    }

    #[tokio::test]
    async fn test_core_gone_is_500() {
        let (app, _store, rx) = app();
        drop(rx);
        let resp = app.oneshot(post_req("/api/reload")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
