//! Async backend: runs synchronizer flows off the UI loop.
//!
//! The TUI sends `BackendCommand` values; a background tokio task spawns one
//! task per command and sends the resulting `SyncEvent`s back. Responses may
//! arrive in any order; the view drops the stale ones.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::sync::{flows, ConversationApi, OutgoingMessage, SyncEvent, ViewKey};

/// Commands sent from the TUI event loop to the async backend.
#[derive(Debug)]
pub enum BackendCommand {
    LoadConversations { page: u32, page_size: u32 },
    Open { key: ViewKey },
    Poll { key: ViewKey },
    Assign { key: ViewKey, agent_id: String },
    Release { key: ViewKey },
    ToggleChatbot { key: ViewKey, disable: bool },
    Send { key: ViewKey, outgoing: OutgoingMessage },
}

/// Events produced by one completed command.
pub struct BackendResponse {
    pub events: Vec<SyncEvent>,
}

/// Handle for interacting with the backend from the TUI side.
pub struct Backend {
    cmd_tx: mpsc::UnboundedSender<BackendCommand>,
    resp_rx: mpsc::UnboundedReceiver<BackendResponse>,
}

impl Backend {
    /// Spawn the command loop against `api`.
    pub fn start(api: Arc<dyn ConversationApi>, history_page_size: u32) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();

        tokio::spawn(backend_loop(api, history_page_size, cmd_rx, resp_tx));

        Self { cmd_tx, resp_rx }
    }

    /// Send a command to the backend (non-blocking).
    pub fn send(&self, cmd: BackendCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::error!("Backend channel closed -- command dropped");
        }
    }

    /// Next completed command. Used inside `tokio::select!`.
    pub async fn recv(&mut self) -> Option<BackendResponse> {
        self.resp_rx.recv().await
    }
}

async fn run_command(
    api: &dyn ConversationApi,
    history_page_size: u32,
    cmd: BackendCommand,
) -> Vec<SyncEvent> {
    match cmd {
        BackendCommand::LoadConversations { page, page_size } => {
            vec![flows::load_conversations(api, page, page_size).await]
        }
        BackendCommand::Open { key } => flows::open(api, key, history_page_size).await,
        BackendCommand::Poll { key } => flows::poll(api, key, history_page_size).await,
        BackendCommand::Assign { key, agent_id } => {
            flows::assign_to_self(api, key, &agent_id).await
        }
        BackendCommand::Release { key } => flows::release(api, key).await,
        BackendCommand::ToggleChatbot { key, disable } => {
            flows::toggle_chatbot(api, key, disable).await
        }
        BackendCommand::Send { key, outgoing } => {
            flows::send(api, key, outgoing, history_page_size).await
        }
    }
}

async fn backend_loop(
    api: Arc<dyn ConversationApi>,
    history_page_size: u32,
    mut cmd_rx: mpsc::UnboundedReceiver<BackendCommand>,
    resp_tx: mpsc::UnboundedSender<BackendResponse>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        let api = Arc::clone(&api);
        let resp_tx = resp_tx.clone();

        // Spawn each command as a separate task so we don't block the loop.
        tokio::spawn(async move {
            tracing::debug!("Backend command: {:?}", cmd);
            let events = run_command(api.as_ref(), history_page_size, cmd).await;
            let _ = resp_tx.send(BackendResponse { events });
        });
    }
}
