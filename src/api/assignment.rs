//! Agent-assignment endpoints (`/ConversationAssignment`)

use serde_json::json;

use super::client::ApiClient;
use super::envelope::{decode_list, decode_opt};
use super::error::ApiResult;
use super::segment;
use crate::models::{AssignRequest, Assignment};

/// Every active assignment across agents.
pub async fn active(client: &ApiClient) -> ApiResult<Vec<Assignment>> {
    decode_list(client.get("ConversationAssignment/active", &[]).await?)
}

/// Current assignment of one conversation. A 404 means "not assigned yet".
pub async fn get(client: &ApiClient, contact_number: &str) -> ApiResult<Option<Assignment>> {
    let path = format!("ConversationAssignment/{}", segment(contact_number));
    match client.get(&path, &[]).await {
        Ok(body) => Ok(decode_opt(body)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn assign(client: &ApiClient, req: &AssignRequest) -> ApiResult<()> {
    client.post("ConversationAssignment/assign", req).await?;
    Ok(())
}

pub async fn release(client: &ApiClient, contact_number: &str) -> ApiResult<()> {
    client
        .post(
            "ConversationAssignment/release",
            &json!({ "contactNumber": contact_number }),
        )
        .await?;
    Ok(())
}

pub async fn toggle_chatbot(
    client: &ApiClient,
    contact_number: &str,
    disable_chatbot: bool,
) -> ApiResult<()> {
    client
        .post(
            "ConversationAssignment/toggle-chatbot",
            &toggle_chatbot_body(contact_number, disable_chatbot),
        )
        .await?;
    Ok(())
}

pub(crate) fn toggle_chatbot_body(contact_number: &str, disable_chatbot: bool) -> serde_json::Value {
    json!({ "contactNumber": contact_number, "disableChatbot": disable_chatbot })
}

/// Assignments held by the signed-in agent.
pub async fn my_assignments(client: &ApiClient) -> ApiResult<Vec<Assignment>> {
    decode_list(client.get("ConversationAssignment/my-assignments", &[]).await?)
}

/// Record agent activity on a conversation (keeps the assignment fresh).
pub async fn update_activity(client: &ApiClient, contact_number: &str) -> ApiResult<()> {
    client
        .post(
            "ConversationAssignment/update-activity",
            &json!({ "contactNumber": contact_number }),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_chatbot_body() {
        assert_eq!(
            toggle_chatbot_body("+15550001111", true),
            json!({"contactNumber": "+15550001111", "disableChatbot": true})
        );
    }
}
