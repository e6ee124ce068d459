use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One playable catalog entry.
///
/// `video_ref` is the raw watch-page URL exactly as the catalog source
/// delivered it; it is resolved to an embed URL only when committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CatalogItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub presenter: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_ref: Option<String>,
    #[serde(default)]
    pub timecode: Option<Timecode>,
}

impl CatalogItem {
    /// The item shown before any catalog has loaded, so the sink always has
    /// something to resolve.
    pub fn seeded_default() -> Self {
        Self {
            id: "item-000-000-102".to_string(),
            title: "Rick Astley - Never Gonna Give You Up (Official Music Video)".to_string(),
            presenter: "Rick Astley".to_string(),
            description: "The official video for \u{201c}Never Gonna Give You Up\u{201d} by Rick Astley."
                .to_string(),
            video_ref: Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()),
            timecode: Some(Timecode::Minutes(4.0)),
        }
    }

    /// Identity comparison (by `id`), as opposed to full structural equality.
    pub fn same_item(&self, other: &CatalogItem) -> bool {
        self.id == other.id
    }

    pub fn is_playable(&self) -> bool {
        self.video_ref
            .as_deref()
            .map_or(false, |r| !r.trim().is_empty())
    }
}

/// Display-only duration annotation. Sources send either a number of
/// minutes or a preformatted string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Timecode {
    Minutes(f64),
    Text(String),
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timecode::Minutes(m) if m.fract() == 0.0 => write!(f, "{} min", *m as i64),
            Timecode::Minutes(m) => write!(f, "{:.1} min", m),
            Timecode::Text(s) => f.write_str(s),
        }
    }
}

/// Ordered catalog snapshot. Never mutated after construction; a new load
/// builds a new `Catalog` and the owner swaps the `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Catalog {
    pub items: Vec<CatalogItem>,
    /// Load sequence number that produced this catalog (0 = startup empty).
    #[serde(default)]
    pub generation: u64,
    #[serde(default)]
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(items: Vec<CatalogItem>, generation: u64) -> Self {
        Self {
            items,
            generation,
            loaded_at: Some(Utc::now()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First item with the given id, in server order.
    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogItem> {
        self.items.iter()
    }
}

/// Coordinator phase.
///
/// `Playing` only lasts while a commit is being pushed to the sink; it
/// collapses back to `Ready` (or `Idle`) once the push completes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Ready,
    Confirming,
    Playing,
}

impl PlaybackPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Confirming => "confirming",
            Self::Playing => "playing",
        }
    }
}

/// Outcome of the last push to the playback sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SinkStatus {
    /// Nothing has been pushed yet this session.
    #[default]
    Idle,
    /// Sink accepted the URL and the play command.
    Playing,
    /// Sink accepted the sentinel URL: the committed item had no playable id.
    NoSource,
    /// Sink rejected the push.
    Error(String),
}

/// Read-only view of the coordinator, published after every transition.
#[derive(Debug, Clone)]
pub struct SelectionSnapshot {
    /// Monotonic revision, incremented on every published transition.
    pub rev: u64,
    pub phase: PlaybackPhase,
    pub active_item: CatalogItem,
    pub pending_item: Option<CatalogItem>,
    pub catalog: Arc<Catalog>,
    pub source: String,
    /// Last URL pushed to the sink.
    pub now_playing_url: Option<String>,
    pub sink_status: SinkStatus,
    /// Most recent load failure, cleared by the next successful load.
    pub last_load_error: Option<String>,
    /// True while a catalog fetch is outstanding.
    pub loading: bool,
}

impl Default for SelectionSnapshot {
    fn default() -> Self {
        Self {
            rev: 0,
            phase: PlaybackPhase::Idle,
            active_item: CatalogItem::seeded_default(),
            pending_item: None,
            catalog: Arc::new(Catalog::empty()),
            source: String::new(),
            now_playing_url: None,
            sink_status: SinkStatus::Idle,
            last_load_error: None,
            loading: false,
        }
    }
}

/// Signals accepted by the core, from the terminal surface or the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd")]
pub enum Command {
    /// Pick an item from the current catalog by id.
    Pick { id: String },
    /// Pick with the full payload carried by the signal.
    PickItem { item: CatalogItem },
    Confirm,
    Cancel,
    SetSource { uri: String },
    Reload,
    GetState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timecode_accepts_number_or_text() {
        let n: Timecode = serde_json::from_str("4").unwrap();
        assert_eq!(n, Timecode::Minutes(4.0));
        assert_eq!(n.to_string(), "4 min");

        let t: Timecode = serde_json::from_str("\"12:30\"").unwrap();
        assert_eq!(t.to_string(), "12:30");

        assert_eq!(Timecode::Minutes(2.5).to_string(), "2.5 min");
    }

    #[test]
    fn test_catalog_lookup_uses_first_occurrence() {
        let mut a = CatalogItem::seeded_default();
        a.id = "a".into();
        a.title = "first".into();
        let mut b = a.clone();
        b.title = "second".into();
        let catalog = Catalog::new(vec![a, b], 1);

        assert_eq!(catalog.get("a").map(|i| i.title.as_str()), Some("first"));
        assert_eq!(catalog.position("a"), Some(0));
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_command_wire_format() {
        let json = serde_json::to_string(&Command::Pick { id: "a".into() }).unwrap();
        assert_eq!(json, r#"{"cmd":"Pick","id":"a"}"#);

        let decoded: Command = serde_json::from_str(r#"{"cmd":"Confirm"}"#).unwrap();
        assert_eq!(decoded, Command::Confirm);
    }

    #[test]
    fn test_default_snapshot_is_idle_with_seeded_item() {
        let snap = SelectionSnapshot::default();
        assert_eq!(snap.phase, PlaybackPhase::Idle);
        assert_eq!(snap.active_item.id, "item-000-000-102");
        assert!(snap.active_item.is_playable());
        assert!(snap.pending_item.is_none());
        assert!(snap.catalog.is_empty());
    }
}
