//! Playback sinks: whatever finally renders the committed embed URL.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};
use tv_proto::config::{PlayerBackend, PlayerConfig};

use crate::mpv::{MpvDriver, MpvEvent, MpvHandle};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("player unavailable: {0}")]
    Unavailable(String),
    #[error("player rejected command: {0}")]
    Command(String),
}

/// Opaque consumer of embed URLs. `load` replaces the current media, `play`
/// starts it.
pub trait PlaybackSink: Send {
    fn name(&self) -> &'static str;
    fn load(&mut self, url: &str) -> impl Future<Output = Result<(), SinkError>> + Send;
    fn play(&mut self) -> impl Future<Output = Result<(), SinkError>> + Send;
    fn shutdown(&mut self) -> impl Future<Output = ()> + Send;
}

/// Headless sink: logs what it would play.
#[derive(Debug, Default)]
pub struct LogSink {
    loaded: Option<String>,
}

impl PlaybackSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn load(&mut self, url: &str) -> Result<(), SinkError> {
        info!("sink[log]: load {}", url);
        self.loaded = Some(url.to_string());
        Ok(())
    }

    async fn play(&mut self) -> Result<(), SinkError> {
        match &self.loaded {
            Some(url) => {
                info!("sink[log]: play {}", url);
                Ok(())
            }
            None => Err(SinkError::Command("play before load".to_string())),
        }
    }

    async fn shutdown(&mut self) {}
}

/// Drives a long-lived mpv. The process is spawned on first use and
/// respawned if it has died between commits.
pub struct MpvSink {
    driver: MpvDriver,
    handle: Option<MpvHandle>,
}

impl MpvSink {
    pub fn new(extra_args: Vec<String>) -> Self {
        Self {
            driver: MpvDriver::new(extra_args),
            handle: None,
        }
    }

    async fn ensure_connected(&mut self) -> Result<MpvHandle, SinkError> {
        if let Some(handle) = &self.handle {
            if self.driver.process_alive() {
                return Ok(handle.clone());
            }
            warn!("sink[mpv]: process gone, respawning");
            self.handle = None;
        }

        let (event_tx, event_rx) = mpsc::channel(64);
        let handle = self
            .driver
            .spawn_and_connect(event_tx)
            .await
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        tokio::spawn(log_events(event_rx));
        self.handle = Some(handle.clone());
        Ok(handle)
    }
}

async fn log_events(mut rx: mpsc::Receiver<MpvEvent>) {
    while let Some(event) = rx.recv().await {
        match event.end_reason() {
            Some("error") => warn!("sink[mpv]: playback ended with error: {}", event.raw),
            Some(reason) => debug!("sink[mpv]: end-file ({})", reason),
            None => {}
        }
    }
}

impl PlaybackSink for MpvSink {
    fn name(&self) -> &'static str {
        "mpv"
    }

    async fn load(&mut self, url: &str) -> Result<(), SinkError> {
        let handle = self.ensure_connected().await?;
        handle
            .load(url)
            .await
            .map_err(|e| SinkError::Command(e.to_string()))
    }

    async fn play(&mut self) -> Result<(), SinkError> {
        let handle = self.ensure_connected().await?;
        handle
            .play()
            .await
            .map_err(|e| SinkError::Command(e.to_string()))
    }

    async fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.quit().await;
        }
        self.driver.kill().await;
    }
}

/// Records every call; lets tests count sink updates.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
    fail_with: Option<SinkError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Load(String),
    Play,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `err` (after being recorded).
    pub fn failing(err: SinkError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::default()
        }
    }

    pub async fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().await.clone()
    }

    pub async fn loaded_urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|c| match c {
                SinkCall::Load(url) => Some(url.clone()),
                SinkCall::Play => None,
            })
            .collect()
    }

    async fn record(&self, call: SinkCall) -> Result<(), SinkError> {
        self.calls.lock().await.push(call);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl PlaybackSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn load(&mut self, url: &str) -> Result<(), SinkError> {
        self.record(SinkCall::Load(url.to_string())).await
    }

    async fn play(&mut self) -> Result<(), SinkError> {
        self.record(SinkCall::Play).await
    }

    async fn shutdown(&mut self) {}
}

/// Sink picked from `[player]` config.
pub enum ConfiguredSink {
    Mpv(MpvSink),
    Log(LogSink),
}

impl ConfiguredSink {
    pub fn from_config(config: &PlayerConfig) -> Self {
        match config.backend {
            PlayerBackend::Mpv if tv_proto::platform::find_mpv_binary().is_some() => {
                Self::Mpv(MpvSink::new(config.extra_args.clone()))
            }
            PlayerBackend::Mpv => {
                warn!("sink: mpv not found, falling back to log sink");
                Self::Log(LogSink::default())
            }
            PlayerBackend::Log => Self::Log(LogSink::default()),
        }
    }
}

impl PlaybackSink for ConfiguredSink {
    fn name(&self) -> &'static str {
        match self {
            Self::Mpv(s) => s.name(),
            Self::Log(s) => s.name(),
        }
    }

    async fn load(&mut self, url: &str) -> Result<(), SinkError> {
        match self {
            Self::Mpv(s) => s.load(url).await,
            Self::Log(s) => s.load(url).await,
        }
    }

    async fn play(&mut self) -> Result<(), SinkError> {
        match self {
            Self::Mpv(s) => s.play().await,
            Self::Log(s) => s.play().await,
        }
    }

    async fn shutdown(&mut self) {
        match self {
            Self::Mpv(s) => s.shutdown().await,
            Self::Log(s) => s.shutdown().await,
        }
    }
}
