//! Broadcast campaign endpoints (`/Campaigns`)

use super::client::ApiClient;
use super::envelope::{decode, decode_opt, decode_page, Page};
use super::error::ApiResult;
use crate::forms::Validate;
use crate::models::{Campaign, CampaignForm, CampaignPreview};

pub async fn list(client: &ApiClient, page: u32, page_size: u32) -> ApiResult<Page<Campaign>> {
    let query = [
        ("page", page.to_string()),
        ("pageSize", page_size.to_string()),
    ];
    decode_page(client.get("Campaigns", &query).await?)
}

pub async fn get(client: &ApiClient, id: u64) -> ApiResult<Campaign> {
    decode(client.get(&format!("Campaigns/{}", id), &[]).await?)
}

pub async fn create(client: &ApiClient, form: &CampaignForm) -> ApiResult<Option<Campaign>> {
    form.validate()?;
    Ok(decode_opt(client.post("Campaigns", form).await?))
}

pub async fn update(
    client: &ApiClient,
    id: u64,
    form: &CampaignForm,
) -> ApiResult<Option<Campaign>> {
    form.validate()?;
    Ok(decode_opt(client.put(&format!("Campaigns/{}", id), form).await?))
}

pub async fn delete(client: &ApiClient, id: u64) -> ApiResult<()> {
    client.delete(&format!("Campaigns/{}", id)).await?;
    Ok(())
}

pub async fn launch(client: &ApiClient, id: u64) -> ApiResult<()> {
    client.post_empty(&format!("Campaigns/{}/launch", id)).await?;
    Ok(())
}

pub async fn cancel(client: &ApiClient, id: u64) -> ApiResult<()> {
    client.post_empty(&format!("Campaigns/{}/cancel", id)).await?;
    Ok(())
}

/// Audience size and rendered body as the backend would send them.
pub async fn preview(client: &ApiClient, id: u64) -> ApiResult<CampaignPreview> {
    let body = client.post_empty(&format!("Campaigns/{}/preview", id)).await?;
    Ok(decode_opt(body).unwrap_or_default())
}
