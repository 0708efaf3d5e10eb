//! Conversation view synchronizer
//!
//! Keeps the conversation list and the open conversation in step with the
//! backend: wholesale list reloads, fixed-interval history polling, and
//! assignment/chatbot/send actions confirmed by a re-fetch.

pub mod compose;
pub mod flows;
pub mod view;

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::error::ApiResult;
use crate::api::{MediaFile, Page};
use crate::models::{AssignRequest, Assignment, Conversation, CurrentUser, Message};

pub use compose::{ComposeCommand, ComposeState, OutgoingMessage};
pub use view::{AssignmentState, ConversationView, Notice, NoticeLevel, SyncEvent, ViewKey};

/// Backend calls the synchronizer depends on.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    async fn conversations(&self, page: u32, page_size: u32) -> ApiResult<Page<Conversation>>;
    /// Newest first.
    async fn history(&self, contact_number: &str, page_size: u32) -> ApiResult<Vec<Message>>;
    /// `None` when the conversation has no assignment yet.
    async fn assignment(&self, contact_number: &str) -> ApiResult<Option<Assignment>>;
    async fn assign(&self, req: &AssignRequest) -> ApiResult<()>;
    async fn release(&self, contact_number: &str) -> ApiResult<()>;
    async fn toggle_chatbot(&self, contact_number: &str, disable: bool) -> ApiResult<()>;
    async fn send_text(&self, to: &str, body: &str) -> ApiResult<()>;
    async fn send_media(&self, to: &str, caption: &str, file: &MediaFile) -> ApiResult<()>;
}

/// View state plus the API it is synchronized against, driven inline.
///
/// The TUI runs the same flows on background tasks instead; this type
/// serves the CLI and tests.
pub struct Synchronizer<A: ConversationApi + ?Sized> {
    api: Arc<A>,
    view: ConversationView,
    history_page_size: u32,
}

impl<A: ConversationApi + ?Sized> Synchronizer<A> {
    pub fn new(api: Arc<A>, me: CurrentUser, history_page_size: u32) -> Self {
        Self {
            api,
            view: ConversationView::new(me),
            history_page_size,
        }
    }

    pub fn view(&self) -> &ConversationView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ConversationView {
        &mut self.view
    }

    fn apply_all(&mut self, events: Vec<SyncEvent>) {
        for event in events {
            self.view.apply(event);
        }
    }

    /// Replace the list with one page. On failure the previous list stays.
    pub async fn load_conversations(&mut self, page: u32, page_size: u32) {
        let event = flows::load_conversations(self.api.as_ref(), page, page_size).await;
        self.view.apply(event);
    }

    pub async fn open(&mut self, contact_number: &str) {
        let key = self.view.open(contact_number);
        let events = flows::open(self.api.as_ref(), key, self.history_page_size).await;
        self.apply_all(events);
    }

    pub fn close(&mut self) {
        self.view.close();
    }

    async fn ensure_open(&mut self, contact_number: &str) -> ViewKey {
        let key = self.view.key_for(contact_number);
        if self.view.is_current(&key) {
            return key;
        }
        self.open(contact_number).await;
        self.view.key_for(contact_number)
    }

    /// Timer tick: silently refresh the open conversation.
    pub async fn poll_refresh(&mut self) {
        let Some(key) = self.view.key() else {
            return;
        };
        let events = flows::poll(self.api.as_ref(), key, self.history_page_size).await;
        self.apply_all(events);
    }

    pub async fn assign_to_self(&mut self, contact_number: &str) {
        let key = self.ensure_open(contact_number).await;
        let agent_id = self.view.me().id.clone();
        let events = flows::assign_to_self(self.api.as_ref(), key, &agent_id).await;
        self.apply_all(events);
    }

    pub async fn release(&mut self, contact_number: &str) {
        let key = self.ensure_open(contact_number).await;
        let events = flows::release(self.api.as_ref(), key).await;
        self.apply_all(events);
    }

    pub async fn toggle_chatbot(&mut self, contact_number: &str, disable: bool) {
        let key = self.ensure_open(contact_number).await;
        let events = flows::toggle_chatbot(self.api.as_ref(), key, disable).await;
        self.apply_all(events);
    }

    /// Put `body`/`file` into the compose box and send it.
    ///
    /// Validation failures return `Err` without any network call; delivery
    /// failures are reported as a notice and leave the compose box intact.
    pub async fn send_message(
        &mut self,
        contact_number: &str,
        body: &str,
        file: Option<MediaFile>,
    ) -> ApiResult<()> {
        OutgoingMessage::new(body, file.clone())?;
        self.ensure_open(contact_number).await;
        if let Some(open) = self.view.current_mut() {
            open.compose.set_text(body);
            open.compose.attachment = file;
        }
        let (key, outgoing) = self.view.prepare_send()?;
        let events = flows::send(self.api.as_ref(), key, outgoing, self.history_page_size).await;
        self.apply_all(events);
        Ok(())
    }
}
