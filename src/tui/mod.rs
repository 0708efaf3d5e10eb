//! Live-chat terminal UI
//!
//! Conversation list, chat pane and compose box over the conversation view
//! synchronizer, using Ratatui.

mod app;
mod backend;
mod chat;
mod compose;
mod conversations;
pub mod log_capture;
mod ui;

pub use app::run;
