pub mod action;
pub mod app;
pub mod app_state;
pub mod component;
pub mod components;
pub mod coordinator;
pub mod core;
pub mod http;
pub mod loader;
pub mod mpv;
pub mod sink;
pub mod theme;
pub mod widgets;

/// What `TvCore` broadcasts to its observers.
#[derive(Debug, Clone)]
pub enum BroadcastMessage {
    /// The published snapshot changed; receivers should fetch it from `StateStore`.
    StateUpdated,
    /// A notice from the core event loop (load failure, sink error, ...).
    Log(String),
}
