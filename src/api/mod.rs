//! REST facade over the messaging backend
//!
//! One module per backend resource. Every call goes through [`ApiClient`],
//! which attaches the session's bearer token and normalizes responses.

pub mod assignment;
pub mod auth;
pub mod campaigns;
pub mod chatbot;
pub mod client;
pub mod contacts;
pub mod envelope;
pub mod error;
pub mod templates;
pub mod whatsapp;

use async_trait::async_trait;

pub use client::ApiClient;
pub use envelope::Page;
pub use error::{ApiError, ApiResult};
pub use whatsapp::MediaFile;

use crate::models::{AssignRequest, Assignment, Conversation, Message};
use crate::sync::ConversationApi;

/// Encode a value (usually a phone number) as one path segment.
pub(crate) fn segment(value: &str) -> String {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    url::form_urlencoded::byte_serialize(compact.as_bytes()).collect()
}

#[async_trait]
impl ConversationApi for ApiClient {
    async fn conversations(&self, page: u32, page_size: u32) -> ApiResult<Page<Conversation>> {
        whatsapp::conversations(self, page, page_size).await
    }

    async fn history(&self, contact_number: &str, page_size: u32) -> ApiResult<Vec<Message>> {
        whatsapp::history(self, contact_number, 1, page_size).await
    }

    async fn assignment(&self, contact_number: &str) -> ApiResult<Option<Assignment>> {
        assignment::get(self, contact_number).await
    }

    async fn assign(&self, req: &AssignRequest) -> ApiResult<()> {
        assignment::assign(self, req).await
    }

    async fn release(&self, contact_number: &str) -> ApiResult<()> {
        assignment::release(self, contact_number).await
    }

    async fn toggle_chatbot(&self, contact_number: &str, disable: bool) -> ApiResult<()> {
        assignment::toggle_chatbot(self, contact_number, disable).await
    }

    async fn send_text(&self, to: &str, body: &str) -> ApiResult<()> {
        whatsapp::send_text(self, to, body).await
    }

    async fn send_media(&self, to: &str, caption: &str, file: &MediaFile) -> ApiResult<()> {
        whatsapp::send_media(self, to, caption, file).await
    }
}
