//! In-memory view state of the live-chat screen.
//!
//! The view never mutates assignment data on its own: it only applies
//! [`SyncEvent`]s carrying backend responses. Events tagged with a stale
//! [`ViewKey`] are dropped.

use crate::api::error::{ApiError, ApiResult};
use crate::api::Page;
use crate::models::{Assignment, Conversation, CurrentUser, Message};

use super::compose::{ComposeState, OutgoingMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message for the status bar (or stderr in CLI mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Assignment of the open conversation relative to the signed-in agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentState {
    Unassigned,
    AssignedToMe,
    AssignedToOther {
        agent_id: String,
        agent_name: Option<String>,
    },
}

impl AssignmentState {
    fn classify(agent_id: Option<&str>, agent_name: Option<&str>, me: &CurrentUser) -> Self {
        match agent_id {
            None => AssignmentState::Unassigned,
            Some(id) if id == me.id => AssignmentState::AssignedToMe,
            Some(id) => AssignmentState::AssignedToOther {
                agent_id: id.to_string(),
                agent_name: agent_name.map(String::from),
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AssignmentState::Unassigned => "unassigned".to_string(),
            AssignmentState::AssignedToMe => "assigned to you".to_string(),
            AssignmentState::AssignedToOther {
                agent_id,
                agent_name,
            } => format!(
                "assigned to {}",
                agent_name.as_deref().unwrap_or(agent_id.as_str())
            ),
        }
    }
}

/// Identifies one opening of one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewKey {
    pub contact_number: String,
    pub generation: u64,
}

impl ViewKey {
    /// Key for acting on a conversation that is not on screen. Its events
    /// only produce notices.
    pub fn detached(contact_number: &str) -> Self {
        Self {
            contact_number: contact_number.to_string(),
            generation: 0,
        }
    }
}

/// Mutating action on a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Assign,
    Release,
    ToggleChatbot { disable: bool },
}

impl Action {
    fn success_text(&self) -> &'static str {
        match self {
            Action::Assign => "Conversation assigned to you",
            Action::Release => "Conversation released",
            Action::ToggleChatbot { disable: true } => "Chatbot disabled",
            Action::ToggleChatbot { disable: false } => "Chatbot enabled",
        }
    }

    fn failure_text(&self) -> &'static str {
        match self {
            Action::Assign => "Failed to assign conversation",
            Action::Release => "Failed to release conversation",
            Action::ToggleChatbot { .. } => "Failed to update chatbot",
        }
    }
}

/// Backend response routed back to the view.
#[derive(Debug)]
pub enum SyncEvent {
    Conversations(ApiResult<Page<Conversation>>),
    /// History as returned by the backend, newest first.
    History {
        key: ViewKey,
        silent: bool,
        result: ApiResult<Vec<Message>>,
    },
    /// Assignment lookups are always silent on failure.
    Assignment {
        key: ViewKey,
        result: ApiResult<Option<Assignment>>,
    },
    ActionDone {
        key: ViewKey,
        action: Action,
        result: ApiResult<()>,
    },
    Sent {
        key: ViewKey,
        result: ApiResult<()>,
    },
}

/// State of the conversation currently on screen.
#[derive(Debug)]
pub struct OpenConversation {
    pub key: ViewKey,
    /// Oldest first.
    pub messages: Vec<Message>,
    /// Last confirmed assignment; meaningful once `assignment_loaded`.
    pub assignment: Option<Assignment>,
    pub assignment_loaded: bool,
    /// Chatbot flag from the last confirmed toggle, until a list reload.
    pub chatbot_confirmed: Option<bool>,
    pub compose: ComposeState,
    pub sending: bool,
}

pub struct ConversationView {
    me: CurrentUser,
    pub conversations: Vec<Conversation>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    /// At least one list load succeeded.
    pub loaded: bool,
    open: Option<OpenConversation>,
    generation: u64,
    notices: Vec<Notice>,
    signed_out: bool,
}

impl ConversationView {
    pub fn new(me: CurrentUser) -> Self {
        Self {
            me,
            conversations: Vec::new(),
            current_page: 1,
            total_pages: 0,
            total_count: 0,
            loaded: false,
            open: None,
            generation: 0,
            notices: Vec::new(),
            signed_out: false,
        }
    }

    pub fn me(&self) -> &CurrentUser {
        &self.me
    }

    // -- navigation ---------------------------------------------------------

    /// Open a conversation, discarding any previous one and its compose box.
    pub fn open(&mut self, contact_number: &str) -> ViewKey {
        self.generation += 1;
        let key = ViewKey {
            contact_number: contact_number.to_string(),
            generation: self.generation,
        };
        self.open = Some(OpenConversation {
            key: key.clone(),
            messages: Vec::new(),
            assignment: None,
            assignment_loaded: false,
            chatbot_confirmed: None,
            compose: ComposeState::default(),
            sending: false,
        });
        key
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn current(&self) -> Option<&OpenConversation> {
        self.open.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut OpenConversation> {
        self.open.as_mut()
    }

    pub fn key(&self) -> Option<ViewKey> {
        self.open.as_ref().map(|o| o.key.clone())
    }

    /// Current key if `contact_number` is open, otherwise a detached key.
    pub fn key_for(&self, contact_number: &str) -> ViewKey {
        match &self.open {
            Some(o) if o.key.contact_number == contact_number => o.key.clone(),
            _ => ViewKey::detached(contact_number),
        }
    }

    pub fn is_current(&self, key: &ViewKey) -> bool {
        self.open.as_ref().is_some_and(|o| o.key == *key)
    }

    pub fn conversation(&self, contact_number: &str) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|c| c.contact_number == contact_number)
    }

    /// List snapshot of the open conversation.
    pub fn open_conversation(&self) -> Option<&Conversation> {
        self.open
            .as_ref()
            .and_then(|o| self.conversation(&o.key.contact_number))
    }

    // -- derived state ------------------------------------------------------

    /// Assignment state of the open conversation. A fetched assignment
    /// record wins over the list snapshot.
    pub fn assignment_state(&self) -> AssignmentState {
        let Some(open) = &self.open else {
            return AssignmentState::Unassigned;
        };
        if open.assignment_loaded {
            return match open.assignment.as_ref().filter(|a| a.is_active) {
                Some(a) => AssignmentState::classify(
                    Some(&a.agent_id),
                    a.agent_name.as_deref(),
                    &self.me,
                ),
                None => AssignmentState::Unassigned,
            };
        }
        match self.open_conversation() {
            Some(c) if c.is_assigned => AssignmentState::classify(
                c.assigned_agent_id.as_deref(),
                c.assigned_agent_name.as_deref(),
                &self.me,
            ),
            _ => AssignmentState::Unassigned,
        }
    }

    /// Only the agent holding the assignment may reply.
    pub fn can_compose(&self) -> bool {
        self.assignment_state() == AssignmentState::AssignedToMe
    }

    pub fn chatbot_disabled(&self) -> bool {
        let Some(open) = &self.open else {
            return false;
        };
        match (&open.assignment, open.assignment_loaded) {
            (Some(a), true) if a.is_active => a.disable_chatbot,
            _ => open.chatbot_confirmed.unwrap_or_else(|| {
                self.open_conversation()
                    .map(|c| c.chatbot_disabled)
                    .unwrap_or(false)
            }),
        }
    }

    /// Label of the chatbot toggle control.
    pub fn chatbot_toggle_label(&self) -> &'static str {
        chatbot_toggle_label(self.chatbot_disabled())
    }

    // -- notices ------------------------------------------------------------

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// The backend rejected the session; the UI should hand back to login.
    pub fn signed_out(&self) -> bool {
        self.signed_out
    }

    fn note_auth(&mut self, err: &ApiError) {
        if err.is_auth() {
            self.signed_out = true;
        }
    }

    // -- sending ------------------------------------------------------------

    /// Validate the compose box and mark a send in flight.
    ///
    /// Nothing is cleared here; the box is cleared when `Sent` confirms.
    pub fn prepare_send(&mut self) -> ApiResult<(ViewKey, OutgoingMessage)> {
        let result = self.try_prepare_send();
        if let Err(e) = &result {
            self.notify(Notice::error(e.to_string()));
        }
        result
    }

    fn try_prepare_send(&mut self) -> ApiResult<(ViewKey, OutgoingMessage)> {
        if !self.can_compose() {
            return Err(ApiError::validation(
                "Assign this conversation to yourself before replying",
            ));
        }
        let open = self
            .open
            .as_mut()
            .ok_or_else(|| ApiError::validation("No conversation is open"))?;
        if open.sending {
            return Err(ApiError::validation("Previous message is still sending"));
        }
        let outgoing = open.compose.outgoing()?;
        open.sending = true;
        Ok((open.key.clone(), outgoing))
    }

    // -- applying backend responses ------------------------------------------

    pub fn apply(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Conversations(result) => self.apply_conversations(result),
            SyncEvent::History {
                key,
                silent,
                result,
            } => self.apply_history(key, silent, result),
            SyncEvent::Assignment { key, result } => self.apply_assignment(key, result),
            SyncEvent::ActionDone {
                key,
                action,
                result,
            } => match result {
                Ok(()) => {
                    if let Action::ToggleChatbot { disable } = action {
                        self.confirm_chatbot(&key, disable);
                    }
                    self.notify(Notice::info(action.success_text()));
                }
                Err(e) => {
                    self.note_auth(&e);
                    self.notify(Notice::error(format!("{}: {}", action.failure_text(), e)));
                }
            },
            SyncEvent::Sent { key, result } => self.apply_sent(key, result),
        }
    }

    fn apply_conversations(&mut self, result: ApiResult<Page<Conversation>>) {
        match result {
            Ok(page) => {
                self.conversations = page.data;
                self.current_page = page.current_page.max(1);
                self.total_pages = page.total_pages;
                self.total_count = page.total_count;
                self.loaded = true;
                // Keep the open snapshot in line with the last confirmed assignment.
                if let Some(open) = self.open.as_mut() {
                    let contact = open.key.contact_number.as_str();
                    if self.conversations.iter().any(|c| c.contact_number == contact) {
                        open.chatbot_confirmed = None;
                    }
                }
                if let Some(open) = &self.open {
                    if open.assignment_loaded {
                        let contact = open.key.contact_number.clone();
                        let assignment = open.assignment.clone();
                        self.patch_snapshot(&contact, assignment.as_ref());
                    }
                }
            }
            Err(e) => {
                self.note_auth(&e);
                self.notify(Notice::error(format!("Failed to load conversations: {}", e)));
            }
        }
    }

    fn apply_history(&mut self, key: ViewKey, silent: bool, result: ApiResult<Vec<Message>>) {
        match result {
            Ok(mut messages) => {
                let Some(open) = self.open.as_mut().filter(|o| o.key == key) else {
                    tracing::debug!("Dropping history for closed view {}", key.contact_number);
                    return;
                };
                messages.reverse();
                open.messages = messages;
            }
            Err(e) => {
                self.note_auth(&e);
                if silent {
                    tracing::debug!("History refresh for {} failed: {}", key.contact_number, e);
                } else if self.is_current(&key) {
                    self.notify(Notice::error(format!("Failed to load messages: {}", e)));
                }
            }
        }
    }

    fn apply_assignment(&mut self, key: ViewKey, result: ApiResult<Option<Assignment>>) {
        match result {
            Ok(assignment) => {
                let Some(open) = self.open.as_mut().filter(|o| o.key == key) else {
                    return;
                };
                open.assignment = assignment.clone();
                open.assignment_loaded = true;
                self.patch_snapshot(&key.contact_number, assignment.as_ref());
            }
            Err(e) => {
                self.note_auth(&e);
                tracing::debug!("Assignment lookup for {} failed: {}", key.contact_number, e);
            }
        }
    }

    fn apply_sent(&mut self, key: ViewKey, result: ApiResult<()>) {
        let current = self.open.as_mut().filter(|o| o.key == key);
        match result {
            Ok(()) => {
                if let Some(open) = current {
                    open.sending = false;
                    open.compose.clear();
                }
                self.notify(Notice::info("Message sent"));
            }
            Err(e) => {
                if let Some(open) = current {
                    open.sending = false;
                }
                self.note_auth(&e);
                self.notify(Notice::error(format!("Failed to send message: {}", e)));
            }
        }
    }

    /// Record a confirmed chatbot toggle. The assignment re-fetch may come
    /// back empty, so the flag is kept on the open conversation and the list row.
    fn confirm_chatbot(&mut self, key: &ViewKey, disable: bool) {
        if let Some(c) = self
            .conversations
            .iter_mut()
            .find(|c| c.contact_number == key.contact_number)
        {
            c.chatbot_disabled = disable;
        }
        if let Some(open) = self.open.as_mut().filter(|o| &o.key == key) {
            open.chatbot_confirmed = Some(disable);
            if let Some(a) = open.assignment.as_mut() {
                a.disable_chatbot = disable;
            }
        }
    }

    fn patch_snapshot(&mut self, contact_number: &str, assignment: Option<&Assignment>) {
        if let Some(c) = self
            .conversations
            .iter_mut()
            .find(|c| c.contact_number == contact_number)
        {
            c.apply_assignment(assignment);
        }
    }
}

pub fn chatbot_toggle_label(disabled: bool) -> &'static str {
    if disabled {
        "Enable Chatbot"
    } else {
        "Disable Chatbot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    fn me() -> CurrentUser {
        CurrentUser {
            id: "7".into(),
            email: "me@example.com".into(),
            role: "Agent".into(),
            branch: None,
        }
    }

    fn conv(number: &str, agent: Option<&str>) -> Conversation {
        Conversation {
            contact_number: number.into(),
            is_assigned: agent.is_some(),
            assigned_agent_id: agent.map(String::from),
            ..Default::default()
        }
    }

    fn assignment(number: &str, agent: &str) -> Assignment {
        Assignment {
            contact_number: number.into(),
            agent_id: agent.into(),
            is_active: true,
            disable_chatbot: true,
            ..Default::default()
        }
    }

    fn msg(body: &str, ts: &str) -> Message {
        Message {
            id: None,
            direction: Direction::Inbound,
            body: body.into(),
            media_url: None,
            timestamp: ts.into(),
            is_automated_response: false,
            status: None,
        }
    }

    fn view_with(convs: Vec<Conversation>) -> ConversationView {
        let mut v = ConversationView::new(me());
        v.apply(SyncEvent::Conversations(Ok(Page::single(convs))));
        v
    }

    #[test]
    fn test_unassigned_conversation_cannot_compose() {
        let mut v = view_with(vec![conv("+1", None)]);
        v.open("+1");
        assert_eq!(v.assignment_state(), AssignmentState::Unassigned);
        assert!(!v.can_compose());
    }

    #[test]
    fn test_compose_requires_matching_agent() {
        let mut v = view_with(vec![conv("+1", Some("8")), conv("+2", Some("7"))]);
        v.open("+1");
        assert!(!v.can_compose());
        assert!(matches!(
            v.assignment_state(),
            AssignmentState::AssignedToOther { .. }
        ));
        v.open("+2");
        assert!(v.can_compose());
    }

    #[test]
    fn test_assignment_record_overrides_snapshot() {
        let mut v = view_with(vec![conv("+1", None)]);
        let key = v.open("+1");
        v.apply(SyncEvent::Assignment {
            key: key.clone(),
            result: Ok(Some(assignment("+1", "7"))),
        });
        assert!(v.can_compose());
        // Snapshot is patched with the confirmed record.
        assert!(v.conversation("+1").unwrap().is_assigned);

        // Another agent takes it; observed on the next poll.
        v.apply(SyncEvent::Assignment {
            key,
            result: Ok(Some(assignment("+1", "9"))),
        });
        assert!(!v.can_compose());
    }

    #[test]
    fn test_inactive_assignment_is_unassigned() {
        let mut v = view_with(vec![conv("+1", None)]);
        let key = v.open("+1");
        let mut a = assignment("+1", "7");
        a.is_active = false;
        v.apply(SyncEvent::Assignment {
            key,
            result: Ok(Some(a)),
        });
        assert_eq!(v.assignment_state(), AssignmentState::Unassigned);
    }

    #[test]
    fn test_history_is_reversed_for_display() {
        let mut v = view_with(vec![conv("+1", None)]);
        let key = v.open("+1");
        v.apply(SyncEvent::History {
            key,
            silent: false,
            result: Ok(vec![
                msg("third", "2024-01-01T10:02:00Z"),
                msg("second", "2024-01-01T10:01:00Z"),
                msg("first", "2024-01-01T10:00:00Z"),
            ]),
        });
        let bodies: Vec<_> = v
            .current()
            .unwrap()
            .messages
            .iter()
            .map(|m| m.body.as_str())
            .collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_stale_history_is_dropped() {
        let mut v = view_with(vec![conv("+1", None), conv("+2", None)]);
        let old = v.open("+1");
        v.open("+2");
        v.apply(SyncEvent::History {
            key: old,
            silent: false,
            result: Ok(vec![msg("late", "t")]),
        });
        assert!(v.current().unwrap().messages.is_empty());
    }

    #[test]
    fn test_reopening_same_contact_gets_new_generation() {
        let mut v = view_with(vec![conv("+1", None)]);
        let first = v.open("+1");
        v.close();
        let second = v.open("+1");
        assert_ne!(first, second);
        assert!(!v.is_current(&first));
        assert!(v.is_current(&second));
    }

    #[test]
    fn test_list_failure_is_loud_and_keeps_list() {
        let mut v = view_with(vec![conv("+1", None)]);
        v.apply(SyncEvent::Conversations(Err(ApiError::Http {
            status: 500,
            message: "boom".into(),
        })));
        assert_eq!(v.conversations.len(), 1);
        let notices = v.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[test]
    fn test_poll_failure_is_silent() {
        let mut v = view_with(vec![conv("+1", None)]);
        let key = v.open("+1");
        v.apply(SyncEvent::History {
            key: key.clone(),
            silent: true,
            result: Err(ApiError::Http {
                status: 503,
                message: "busy".into(),
            }),
        });
        v.apply(SyncEvent::Assignment {
            key,
            result: Err(ApiError::Http {
                status: 500,
                message: "x".into(),
            }),
        });
        assert!(v.drain_notices().is_empty());
    }

    #[test]
    fn test_failed_action_reports_once_and_keeps_state() {
        let mut v = view_with(vec![conv("+1", None)]);
        let key = v.open("+1");
        v.apply(SyncEvent::ActionDone {
            key,
            action: Action::Assign,
            result: Err(ApiError::Http {
                status: 409,
                message: "already assigned".into(),
            }),
        });
        assert_eq!(v.assignment_state(), AssignmentState::Unassigned);
        let notices = v.drain_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].text.contains("already assigned"));
    }

    #[test]
    fn test_prepare_send_rejects_empty_and_unassigned() {
        let mut v = view_with(vec![conv("+1", Some("7"))]);
        v.open("+1");
        assert!(matches!(v.prepare_send(), Err(ApiError::Validation(_))));
        assert!(!v.current().unwrap().sending);

        let mut v = view_with(vec![conv("+2", None)]);
        v.open("+2");
        v.current_mut().unwrap().compose.set_text("hi");
        assert!(v.prepare_send().is_err());
    }

    #[test]
    fn test_confirmed_send_clears_compose() {
        let mut v = view_with(vec![conv("+1", Some("7"))]);
        v.open("+1");
        {
            let open = v.current_mut().unwrap();
            open.compose.set_text("hello");
            open.compose.attachment = Some(crate::api::MediaFile::new("/tmp/a.png").unwrap());
        }
        let (key, out) = v.prepare_send().unwrap();
        assert_eq!(out.body, "hello");
        assert!(v.current().unwrap().sending);
        assert!(v.prepare_send().is_err());

        v.apply(SyncEvent::Sent { key, result: Ok(()) });
        let open = v.current().unwrap();
        assert!(open.compose.input.is_empty());
        assert!(open.compose.attachment.is_none());
        assert!(!open.sending);
    }

    #[test]
    fn test_failed_send_preserves_compose() {
        let mut v = view_with(vec![conv("+1", Some("7"))]);
        v.open("+1");
        v.current_mut().unwrap().compose.set_text("retry me");
        let (key, _) = v.prepare_send().unwrap();
        v.apply(SyncEvent::Sent {
            key,
            result: Err(ApiError::Http {
                status: 500,
                message: "provider down".into(),
            }),
        });
        let open = v.current().unwrap();
        assert_eq!(open.compose.input, "retry me");
        assert!(!open.sending);
    }

    #[test]
    fn test_chatbot_label_follows_confirmed_state() {
        let mut v = view_with(vec![conv("+1", Some("7"))]);
        let key = v.open("+1");
        assert_eq!(v.chatbot_toggle_label(), "Disable Chatbot");
        v.apply(SyncEvent::Assignment {
            key,
            result: Ok(Some(assignment("+1", "7"))),
        });
        assert_eq!(v.chatbot_toggle_label(), "Enable Chatbot");
    }

    #[test]
    fn test_confirmed_toggle_without_assignment_flips_label() {
        let mut v = view_with(vec![conv("+1", None)]);
        let key = v.open("+1");
        v.apply(SyncEvent::ActionDone {
            key: key.clone(),
            action: Action::ToggleChatbot { disable: true },
            result: Ok(()),
        });
        v.apply(SyncEvent::Assignment {
            key: key.clone(),
            result: Ok(None),
        });
        assert_eq!(v.chatbot_toggle_label(), "Enable Chatbot");
        assert!(v.conversation("+1").unwrap().chatbot_disabled);

        // A stale confirmation for an earlier opening changes nothing.
        let newer = v.open("+1");
        v.apply(SyncEvent::ActionDone {
            key,
            action: Action::ToggleChatbot { disable: false },
            result: Ok(()),
        });
        assert_eq!(v.current().unwrap().key, newer);
        assert!(v.current().unwrap().chatbot_confirmed.is_none());
    }

    #[test]
    fn test_list_reload_replaces_confirmed_chatbot_flag() {
        let mut v = view_with(vec![conv("+1", None)]);
        let key = v.open("+1");
        v.apply(SyncEvent::ActionDone {
            key,
            action: Action::ToggleChatbot { disable: true },
            result: Ok(()),
        });
        v.apply(SyncEvent::Conversations(Ok(Page::single(vec![conv("+1", None)]))));
        assert_eq!(v.chatbot_toggle_label(), "Disable Chatbot");
    }

    #[test]
    fn test_unauthorized_flags_sign_out() {
        let mut v = view_with(vec![]);
        v.apply(SyncEvent::Conversations(Err(ApiError::Unauthorized)));
        assert!(v.signed_out());
    }
}
