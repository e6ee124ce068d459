//! Selection/playback state machine.
//!
//! Every transition is a plain method that mutates owned state and bumps
//! `rev`; the caller (the core loop) publishes a [`SelectionSnapshot`]
//! afterwards. Side effects are limited to what `confirm` hands back: the
//! caller pushes the returned [`PlaybackRequest`] to the sink and reports
//! the outcome through `playback_pushed`.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use tv_proto::error::LoadFailure;
use tv_proto::protocol::{Catalog, CatalogItem, PlaybackPhase, SelectionSnapshot, SinkStatus};
use tv_proto::resolver::{PlayableUrl, VideoUrlResolver};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("no item with id {0:?} in the current catalog")]
    UnknownItem(String),
    #[error("nothing is pending confirmation")]
    NothingPending,
}

/// What a commit asks of the playback sink.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    pub item: CatalogItem,
    pub url: PlayableUrl,
}

pub struct PlaybackCoordinator {
    resolver: VideoUrlResolver,
    catalog: Arc<Catalog>,
    catalog_applied: bool,
    active_item: CatalogItem,
    pending_item: Option<CatalogItem>,
    phase: PlaybackPhase,
    rev: u64,
    now_playing_url: Option<String>,
    sink_status: SinkStatus,
    last_load_error: Option<String>,
}

impl PlaybackCoordinator {
    pub fn new(resolver: VideoUrlResolver) -> Self {
        Self {
            resolver,
            catalog: Arc::new(Catalog::empty()),
            catalog_applied: false,
            active_item: CatalogItem::seeded_default(),
            pending_item: None,
            phase: PlaybackPhase::Idle,
            rev: 0,
            now_playing_url: None,
            sink_status: SinkStatus::Idle,
            last_load_error: None,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn active_item(&self) -> &CatalogItem {
        &self.active_item
    }

    pub fn pending_item(&self) -> Option<&CatalogItem> {
        self.pending_item.as_ref()
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn resolver(&self) -> &VideoUrlResolver {
        &self.resolver
    }

    /// `Ready` once any catalog has been applied, `Idle` before.
    fn resting_phase(&self) -> PlaybackPhase {
        if self.catalog_applied {
            PlaybackPhase::Ready
        } else {
            PlaybackPhase::Idle
        }
    }

    fn bump(&mut self) {
        self.rev += 1;
    }

    /// Bump `rev` for changes held outside the state machine (source,
    /// loading flag) so observers still see a new revision.
    pub fn touch(&mut self) {
        self.bump();
    }

    /// Swap in a freshly loaded catalog. A pending selection survives the
    /// swap, as does an in-flight push.
    pub fn apply_catalog(&mut self, catalog: Catalog) {
        info!(
            "coordinator: applying catalog gen={} ({} items)",
            catalog.generation,
            catalog.len()
        );
        self.catalog = Arc::new(catalog);
        self.catalog_applied = true;
        self.last_load_error = None;
        self.phase = match self.phase {
            PlaybackPhase::Confirming if self.pending_item.is_some() => PlaybackPhase::Confirming,
            PlaybackPhase::Playing => PlaybackPhase::Playing,
            _ => PlaybackPhase::Ready,
        };
        self.bump();
    }

    /// Record a failed load. The current catalog and phase are untouched.
    pub fn reject_catalog(&mut self, failure: &LoadFailure) {
        warn!("coordinator: catalog load failed, keeping previous: {}", failure);
        self.last_load_error = Some(failure.to_string());
        self.bump();
    }

    /// Open confirmation for `item`. Last write wins while confirming; the
    /// active item may be picked again.
    pub fn pick(&mut self, item: CatalogItem) {
        if let Some(prev) = &self.pending_item {
            debug!("coordinator: pending {:?} replaced by {:?}", prev.id, item.id);
        }
        debug!("coordinator: picked {:?}", item.id);
        self.pending_item = Some(item);
        self.phase = PlaybackPhase::Confirming;
        self.bump();
    }

    pub fn pick_by_id(&mut self, id: &str) -> Result<(), CoordinatorError> {
        let item = self
            .catalog
            .get(id)
            .cloned()
            .or_else(|| (self.active_item.id == id).then(|| self.active_item.clone()))
            .ok_or_else(|| CoordinatorError::UnknownItem(id.to_string()))?;
        self.pick(item);
        Ok(())
    }

    /// Commit the pending item. Resolver failures degrade to the sentinel
    /// URL; the commit itself always goes through.
    pub fn confirm(&mut self) -> Result<PlaybackRequest, CoordinatorError> {
        if self.phase != PlaybackPhase::Confirming {
            return Err(CoordinatorError::NothingPending);
        }
        let item = self.pending_item.take().ok_or(CoordinatorError::NothingPending)?;
        let url = self.resolver.resolve_or_sentinel(item.video_ref.as_deref());
        info!("coordinator: commit {:?} -> {}", item.id, url);

        self.active_item = item.clone();
        self.phase = PlaybackPhase::Playing;
        self.bump();
        Ok(PlaybackRequest { item, url })
    }

    /// Dismiss the confirmation. Returns `false` when nothing was pending.
    pub fn cancel(&mut self) -> bool {
        if self.pending_item.is_none() {
            return false;
        }
        self.pending_item = None;
        if self.phase == PlaybackPhase::Confirming {
            self.phase = self.resting_phase();
        }
        debug!("coordinator: confirmation dismissed");
        self.bump();
        true
    }

    /// The sink push for the last commit finished.
    pub fn playback_pushed(&mut self, url: &PlayableUrl, status: SinkStatus) {
        self.now_playing_url = Some(url.as_str().to_string());
        self.sink_status = status;
        if self.phase == PlaybackPhase::Playing {
            self.phase = self.resting_phase();
        }
        self.bump();
    }

    pub fn snapshot(&self, source: &str, loading: bool) -> SelectionSnapshot {
        SelectionSnapshot {
            rev: self.rev,
            phase: self.phase,
            active_item: self.active_item.clone(),
            pending_item: self.pending_item.clone(),
            catalog: Arc::clone(&self.catalog),
            source: source.to_string(),
            now_playing_url: self.now_playing_url.clone(),
            sink_status: self.sink_status.clone(),
            last_load_error: self.last_load_error.clone(),
            loading,
        }
    }
}
