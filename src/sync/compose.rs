//! Compose box state: text being typed plus an optional attachment.
//!
//! Text and attachment survive a failed send; they are cleared only after
//! the backend confirms delivery.

use crate::api::error::{ApiError, ApiResult};
use crate::api::MediaFile;

/// A message ready to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub body: String,
    pub file: Option<MediaFile>,
}

impl OutgoingMessage {
    /// Reject a message with neither text nor attachment.
    pub fn new(body: &str, file: Option<MediaFile>) -> ApiResult<Self> {
        let body = body.trim().to_string();
        if body.is_empty() && file.is_none() {
            return Err(ApiError::validation("Type a message or attach a file"));
        }
        Ok(Self { body, file })
    }
}

/// Result of interpreting a `/command` typed into the compose box.
#[derive(Debug, PartialEq, Eq)]
pub enum ComposeCommand {
    Attached(String),
    Detached,
}

#[derive(Debug, Default)]
pub struct ComposeState {
    /// Current input text.
    pub input: String,
    /// Cursor position (character offset into `input`).
    pub cursor_pos: usize,
    pub attachment: Option<MediaFile>,
}

impl ComposeState {
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = self.char_to_byte(self.cursor_pos);
        self.input.insert(byte_pos, c);
        self.cursor_pos += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor_pos == 0 {
            return;
        }
        let end = self.char_to_byte(self.cursor_pos);
        let start = self.char_to_byte(self.cursor_pos - 1);
        self.input.drain(start..end);
        self.cursor_pos -= 1;
    }

    /// Delete the character under the cursor.
    pub fn delete(&mut self) {
        if self.cursor_pos < self.input.chars().count() {
            let start = self.char_to_byte(self.cursor_pos);
            let end = self.char_to_byte(self.cursor_pos + 1);
            self.input.drain(start..end);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor_pos = (self.cursor_pos + 1).min(self.input.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_pos = self.input.chars().count();
    }

    pub fn set_text(&mut self, text: &str) {
        self.input = text.to_string();
        self.move_end();
    }

    fn clear_text(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }

    /// Drop text and attachment. Called once a send is confirmed.
    pub fn clear(&mut self) {
        self.clear_text();
        self.attachment = None;
    }

    /// Snapshot the box as an outgoing message without clearing it.
    pub fn outgoing(&self) -> ApiResult<OutgoingMessage> {
        OutgoingMessage::new(&self.input, self.attachment.clone())
    }

    /// Interpret `/attach <path>` and `/detach`.
    ///
    /// Returns `None` when the input is an ordinary message.
    pub fn apply_command(&mut self) -> Option<ApiResult<ComposeCommand>> {
        let trimmed = self.input.trim();
        if trimmed == "/detach" {
            self.attachment = None;
            self.clear_text();
            return Some(Ok(ComposeCommand::Detached));
        }
        let path = trimmed.strip_prefix("/attach ")?.trim().to_string();
        let result = if path.is_empty() {
            Err(ApiError::validation("Usage: /attach <path>"))
        } else if !std::path::Path::new(&path).is_file() {
            Err(ApiError::validation(format!("No such file: {}", path)))
        } else {
            MediaFile::new(&path).map(|file| {
                let name = file.file_name.clone();
                self.attachment = Some(file);
                self.clear_text();
                ComposeCommand::Attached(name)
            })
        };
        Some(result)
    }

    fn char_to_byte(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_multibyte() {
        let mut c = ComposeState::default();
        for ch in "héllo".chars() {
            c.insert_char(ch);
        }
        c.move_left();
        c.move_left();
        c.backspace();
        assert_eq!(c.input, "hélo");
        c.move_home();
        c.delete();
        assert_eq!(c.input, "élo");
        c.move_end();
        assert_eq!(c.cursor_pos, 3);
        c.move_right();
        assert_eq!(c.cursor_pos, 3);
    }

    #[test]
    fn test_empty_message_is_rejected() {
        let mut c = ComposeState::default();
        c.set_text("   \n ");
        let err = c.outgoing().unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_attachment_alone_is_enough() {
        let c = ComposeState {
            attachment: Some(MediaFile::new("/tmp/photo.jpg").unwrap()),
            ..Default::default()
        };
        let out = c.outgoing().unwrap();
        assert_eq!(out.body, "");
        assert!(out.file.is_some());
    }

    #[test]
    fn test_outgoing_does_not_clear() {
        let mut c = ComposeState::default();
        c.set_text("hello");
        assert_eq!(c.outgoing().unwrap().body, "hello");
        assert_eq!(c.input, "hello");
        c.clear();
        assert!(c.input.is_empty());
        assert_eq!(c.cursor_pos, 0);
    }

    #[test]
    fn test_attach_and_detach_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let mut c = ComposeState::default();
        c.set_text(&format!("/attach {}", path.display()));
        assert_eq!(
            c.apply_command().unwrap().unwrap(),
            ComposeCommand::Attached("menu.pdf".into())
        );
        assert!(c.input.is_empty());
        assert_eq!(c.attachment.as_ref().unwrap().file_name, "menu.pdf");

        c.set_text("/detach");
        assert_eq!(c.apply_command().unwrap().unwrap(), ComposeCommand::Detached);
        assert!(c.attachment.is_none());
    }

    #[test]
    fn test_attach_missing_file_keeps_input() {
        let mut c = ComposeState::default();
        c.set_text("/attach /definitely/not/here.png");
        assert!(c.apply_command().unwrap().is_err());
        assert_eq!(c.input, "/attach /definitely/not/here.png");

        c.set_text("just text");
        assert!(c.apply_command().is_none());
    }
}
