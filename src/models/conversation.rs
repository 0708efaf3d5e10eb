//! Conversation, assignment and message models

use serde::{Deserialize, Deserializer, Serialize};

use super::de;

/// Snapshot of one conversation as listed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub contact_number: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default, deserialize_with = "de::null_default")]
    pub last_message: String,
    #[serde(default)]
    pub last_message_time: Option<String>,
    #[serde(default, deserialize_with = "de::null_default")]
    pub unread_count: u32,
    #[serde(default, deserialize_with = "de::null_default")]
    pub is_assigned: bool,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub assigned_agent_id: Option<String>,
    #[serde(default)]
    pub assigned_agent_name: Option<String>,
    #[serde(default, deserialize_with = "de::null_default")]
    pub chatbot_disabled: bool,
}

impl Conversation {
    /// Contact name if known, otherwise the phone number.
    pub fn display_name(&self) -> &str {
        match self.contact_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.contact_number,
        }
    }

    /// Overwrite the assignment fields from a freshly fetched record.
    ///
    /// `None` means the backend confirmed there is no active assignment.
    pub fn apply_assignment(&mut self, assignment: Option<&Assignment>) {
        match assignment.filter(|a| a.is_active) {
            Some(a) => {
                self.is_assigned = true;
                self.assigned_agent_id = Some(a.agent_id.clone());
                self.assigned_agent_name = a.agent_name.clone();
                self.chatbot_disabled = a.disable_chatbot;
            }
            None => {
                self.is_assigned = false;
                self.assigned_agent_id = None;
                self.assigned_agent_name = None;
            }
        }
    }
}

/// Binding of a conversation to an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(default)]
    pub contact_number: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub agent_id: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default = "default_true", deserialize_with = "de::null_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "de::null_default")]
    pub disable_chatbot: bool,
    #[serde(default)]
    pub assigned_at: Option<String>,
    #[serde(default)]
    pub last_activity_at: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Message direction relative to the business number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        match s.to_ascii_lowercase().as_str() {
            "inbound" | "incoming" | "received" => Ok(Direction::Inbound),
            "outbound" | "outgoing" | "sent" => Ok(Direction::Outbound),
            other => Err(serde::de::Error::custom(format!(
                "unknown message direction: {}",
                other
            ))),
        }
    }
}

/// One WhatsApp message in a conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub id: Option<String>,
    pub direction: Direction,
    #[serde(default, deserialize_with = "de::null_default")]
    pub body: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default, deserialize_with = "de::null_default")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "de::null_default")]
    pub is_automated_response: bool,
    #[serde(default)]
    pub status: Option<String>,
}

/// Request body for `POST /ConversationAssignment/assign`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub contact_number: String,
    pub agent_id: String,
    pub disable_chatbot: bool,
    pub mark_as_read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::envelope::decode;
    use serde_json::json;

    #[test]
    fn test_conversation_tolerates_pascal_and_numeric_ids() {
        let c: Conversation = decode(json!({
            "ContactNumber": "+15550001111",
            "LastMessage": "hi",
            "UnreadCount": 2,
            "IsAssigned": true,
            "AssignedAgentId": 42,
            "AssignedAgentName": "Dana",
            "ChatbotDisabled": true
        }))
        .unwrap();
        assert_eq!(c.assigned_agent_id.as_deref(), Some("42"));
        assert_eq!(c.unread_count, 2);
        assert_eq!(c.display_name(), "+15550001111");
    }

    #[test]
    fn test_conversation_nulls() {
        let c: Conversation = decode(json!({
            "contactNumber": "1",
            "lastMessage": null,
            "assignedAgentId": null,
            "unreadCount": null
        }))
        .unwrap();
        assert_eq!(c.last_message, "");
        assert_eq!(c.assigned_agent_id, None);
        assert!(!c.is_assigned);
    }

    #[test]
    fn test_apply_assignment() {
        let mut c = Conversation {
            contact_number: "1".into(),
            ..Default::default()
        };
        let a = Assignment {
            contact_number: "1".into(),
            agent_id: "5".into(),
            is_active: true,
            disable_chatbot: true,
            ..Default::default()
        };
        c.apply_assignment(Some(&a));
        assert!(c.is_assigned);
        assert_eq!(c.assigned_agent_id.as_deref(), Some("5"));
        assert!(c.chatbot_disabled);

        c.apply_assignment(None);
        assert!(!c.is_assigned);
        assert_eq!(c.assigned_agent_id, None);
    }

    #[test]
    fn test_inactive_assignment_counts_as_none() {
        let mut c = Conversation::default();
        let a = Assignment {
            agent_id: "5".into(),
            is_active: false,
            ..Default::default()
        };
        c.apply_assignment(Some(&a));
        assert!(!c.is_assigned);
    }

    #[test]
    fn test_direction_case_insensitive() {
        let m: Message = decode(json!({
            "Direction": "Inbound",
            "Body": "hello",
            "Timestamp": "2024-01-01T00:00:00Z",
            "IsAutomatedResponse": false
        }))
        .unwrap();
        assert_eq!(m.direction, Direction::Inbound);
        assert!(serde_json::from_value::<Direction>(json!("sideways")).is_err());
    }

    #[test]
    fn test_assign_request_wire_shape() {
        let req = AssignRequest {
            contact_number: "+1".into(),
            agent_id: "9".into(),
            disable_chatbot: true,
            mark_as_read: true,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"contactNumber": "+1", "agentId": "9", "disableChatbot": true, "markAsRead": true})
        );
    }
}
