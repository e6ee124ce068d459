//! Action enum — all user-initiated intents.

use tv_proto::protocol::{CatalogItem, Command};

/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Selection ────────────────────────────────────────────────────────────
    /// A channel entry was picked; carries the full item payload.
    Pick(CatalogItem),
    Confirm,
    Cancel,

    // ── Catalog ──────────────────────────────────────────────────────────────
    Reload,

    // ── UI ───────────────────────────────────────────────────────────────────
    ToggleHelp,
    CopyToClipboard(String),

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Noop,
}

impl Action {
    /// The core command this action maps to, if any.
    pub fn to_command(&self) -> Option<Command> {
        match self {
            Action::Pick(item) => Some(Command::PickItem { item: item.clone() }),
            Action::Confirm => Some(Command::Confirm),
            Action::Cancel => Some(Command::Cancel),
            Action::Reload => Some(Command::Reload),
            _ => None,
        }
    }
}
