use tokio::sync::{broadcast, mpsc};
use tv_app::core::{CoreEvent, TvCore};
use tv_app::sink::ConfiguredSink;
use tv_app::{app, http, BroadcastMessage};
use tv_proto::protocol::Command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = tv_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("tv.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // RUST_LOG overrides; HTTP client internals are noisy at debug.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("tv log: {}", log_path.display());
    tracing::info!("tv starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match tv_proto::config::Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("config load failed, using defaults: {:#}", e);
            tv_proto::config::Config::default()
        }
    };

    // ── Channels: TvCore → observers, clients → TvCore ───────────────────────
    let (broadcast_tx, broadcast_rx) = broadcast::channel::<BroadcastMessage>(1024);
    let (event_tx, event_rx) = mpsc::channel::<CoreEvent>(1024);

    let sink = ConfiguredSink::from_config(&config.player);
    let core = TvCore::new(&config, sink, broadcast_tx.clone(), event_tx.clone())?;
    let state_store = core.state_store();

    if config.http.enabled {
        http::start_server(
            config.http.bind_address.clone(),
            config.http.port,
            state_store.clone(),
            event_tx.clone(),
        );
    }

    let core_task = tokio::spawn(async move {
        if let Err(e) = core.run(event_rx).await {
            tracing::error!("TvCore exited with error: {}", e);
        }
    });

    // Initial catalog load from the configured source.
    event_tx
        .send(CoreEvent::ClientCommand(Command::Reload))
        .await?;

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let result = app::App::new(log_path, event_tx.clone(), state_store)
        .run(broadcast_rx)
        .await;

    let _ = event_tx.send(CoreEvent::Shutdown).await;
    let _ = core_task.await;
    result
}
