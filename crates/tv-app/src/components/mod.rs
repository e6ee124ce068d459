pub mod channel_entry;
pub mod channel_list;
pub mod confirm_dialog;
pub mod header;
pub mod help_overlay;
pub mod now_playing;
