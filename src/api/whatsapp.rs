//! WhatsApp messaging endpoints (`/WhatsApp`)

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use super::client::ApiClient;
use super::envelope::{decode_list, decode_page, Page};
use super::error::{ApiError, ApiResult};
use super::segment;
use crate::forms::{require, Validate};
use crate::models::{Conversation, Message, TemplateSend};

/// A local file queued for a media message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub file_name: String,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>) -> ApiResult<Self> {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ApiError::validation(format!("'{}' is not a file path", path.display()))
            })?
            .to_string();
        Ok(Self { path, file_name })
    }

    /// MIME type guessed from the file extension.
    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.path)
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "3gp" => "video/3gpp",
        "mp3" => "audio/mpeg",
        "ogg" | "opus" => "audio/ogg",
        "amr" => "audio/amr",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Send a plain text message.
pub async fn send_text(client: &ApiClient, to: &str, body: &str) -> ApiResult<()> {
    require(to, "Recipient")?;
    require(body, "Message")?;
    client
        .post("WhatsApp/send", &json!({ "to": to, "body": body }))
        .await?;
    Ok(())
}

/// Send a pre-approved template by content SID.
pub async fn send_template(client: &ApiClient, send: &TemplateSend) -> ApiResult<()> {
    send.validate()?;
    client.post("WhatsApp/send-template", send).await?;
    Ok(())
}

/// Upload a file and send it, with an optional caption, as a media message.
pub async fn send_media(
    client: &ApiClient,
    to: &str,
    caption: &str,
    file: &MediaFile,
) -> ApiResult<()> {
    require(to, "Recipient")?;
    let bytes = tokio::fs::read(&file.path).await?;
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file.file_name.clone())
        .mime_str(file.content_type())?;
    let form = reqwest::multipart::Form::new()
        .text("to", to.to_string())
        .text("caption", caption.to_string())
        .part("file", part);
    client.post_multipart("WhatsApp/send-media", form).await?;
    Ok(())
}

/// Message history for one number, newest first as the backend returns it.
pub async fn history(
    client: &ApiClient,
    phone: &str,
    page: u32,
    page_size: u32,
) -> ApiResult<Vec<Message>> {
    let query = [
        ("page", page.to_string()),
        ("pageSize", page_size.to_string()),
    ];
    let path = format!("WhatsApp/history/{}", segment(phone));
    decode_list(client.get(&path, &query).await?)
}

pub async fn conversations(
    client: &ApiClient,
    page: u32,
    page_size: u32,
) -> ApiResult<Page<Conversation>> {
    let query = [
        ("page", page.to_string()),
        ("pageSize", page_size.to_string()),
    ];
    decode_page(client.get("WhatsApp/conversations", &query).await?)
}

/// Provider connectivity as reported by the backend.
pub async fn health(client: &ApiClient) -> ApiResult<Value> {
    client.get_anonymous("WhatsApp/health").await
}
