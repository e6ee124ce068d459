use crate::protocol::{Catalog, CatalogItem, SelectionSnapshot};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared, read-mostly copy of the latest published snapshot.
///
/// Only the core writes; the HTTP API and the terminal surface read.
#[derive(Clone)]
pub struct StateStore {
    state: Arc<RwLock<SelectionSnapshot>>,
}

impl StateStore {
    pub fn new(source: impl Into<String>) -> Self {
        let state = SelectionSnapshot {
            source: source.into(),
            ..SelectionSnapshot::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn get_state(&self) -> SelectionSnapshot {
        self.state.read().await.clone()
    }

    pub async fn rev(&self) -> u64 {
        self.state.read().await.rev
    }

    pub async fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.state.read().await.catalog)
    }

    /// Look an id up against the published catalog, falling back to the
    /// active item (which may be the seeded default before any load).
    pub async fn find_item(&self, id: &str) -> Option<CatalogItem> {
        let state = self.state.read().await;
        state
            .catalog
            .get(id)
            .cloned()
            .or_else(|| (state.active_item.id == id).then(|| state.active_item.clone()))
    }

    /// Replace the stored snapshot. Older revisions are ignored so a late
    /// writer can never roll readers back.
    pub async fn publish(&self, snapshot: SelectionSnapshot) -> bool {
        let mut state = self.state.write().await;
        if snapshot.rev < state.rev {
            return false;
        }
        *state = snapshot;
        true
    }
}
