//! AppState — shared read-only data passed to all components during
//! render/event. Only the App event loop writes to it.

use std::path::PathBuf;

use tv_proto::protocol::{CatalogItem, PlaybackPhase, SelectionSnapshot};

pub struct AppState {
    /// Latest snapshot published by the core.
    pub snapshot: SelectionSnapshot,
    /// Recent core notices (load failures, sink errors), newest last.
    pub logs: Vec<String>,
    pub log_path: PathBuf,
}

const MAX_LOGS: usize = 200;

impl AppState {
    pub fn new(snapshot: SelectionSnapshot, log_path: PathBuf) -> Self {
        Self {
            snapshot,
            logs: Vec::new(),
            log_path,
        }
    }

    pub fn push_log(&mut self, msg: String) {
        self.logs.push(msg);
        if self.logs.len() > MAX_LOGS {
            let excess = self.logs.len() - MAX_LOGS;
            self.logs.drain(..excess);
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.snapshot.phase
    }

    pub fn active_item(&self) -> &CatalogItem {
        &self.snapshot.active_item
    }

    pub fn pending_item(&self) -> Option<&CatalogItem> {
        self.snapshot.pending_item.as_ref()
    }

    pub fn is_confirming(&self) -> bool {
        self.snapshot.phase == PlaybackPhase::Confirming && self.snapshot.pending_item.is_some()
    }

    pub fn is_active(&self, item: &CatalogItem) -> bool {
        self.snapshot.active_item.same_item(item)
    }
}
