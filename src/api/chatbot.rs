//! Chatbot rule endpoints (`/Chatbot`)

use super::client::ApiClient;
use super::envelope::{decode, decode_opt, decode_page, Page};
use super::error::ApiResult;
use crate::forms::Validate;
use crate::models::{ChatbotRule, ChatbotRuleForm, ChatbotTest, ChatbotTestResult};

pub async fn list(client: &ApiClient, page: u32, page_size: u32) -> ApiResult<Page<ChatbotRule>> {
    let query = [
        ("page", page.to_string()),
        ("pageSize", page_size.to_string()),
    ];
    decode_page(client.get("Chatbot/rules", &query).await?)
}

pub async fn get(client: &ApiClient, id: u64) -> ApiResult<ChatbotRule> {
    decode(client.get(&format!("Chatbot/rules/{}", id), &[]).await?)
}

pub async fn create(client: &ApiClient, form: &ChatbotRuleForm) -> ApiResult<Option<ChatbotRule>> {
    form.validate()?;
    Ok(decode_opt(client.post("Chatbot/rules", form).await?))
}

pub async fn update(
    client: &ApiClient,
    id: u64,
    form: &ChatbotRuleForm,
) -> ApiResult<Option<ChatbotRule>> {
    form.validate()?;
    Ok(decode_opt(client.put(&format!("Chatbot/rules/{}", id), form).await?))
}

pub async fn delete(client: &ApiClient, id: u64) -> ApiResult<()> {
    client.delete(&format!("Chatbot/rules/{}", id)).await?;
    Ok(())
}

/// Flip a rule between active and inactive.
pub async fn toggle_status(client: &ApiClient, id: u64) -> ApiResult<()> {
    client
        .patch(&format!("Chatbot/rules/{}/toggle-status", id), &serde_json::json!({}))
        .await?;
    Ok(())
}

/// Dry-run the rule set against a message.
pub async fn test(client: &ApiClient, test: &ChatbotTest) -> ApiResult<ChatbotTestResult> {
    test.validate()?;
    let body = client.post("Chatbot/test", test).await?;
    Ok(decode_opt(body).unwrap_or_default())
}
