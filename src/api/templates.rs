//! Message template endpoints (`/Templates`)

use serde_json::json;

use super::client::ApiClient;
use super::envelope::{decode, decode_opt, decode_page, Page};
use super::error::ApiResult;
use crate::forms::Validate;
use crate::models::{Template, TemplateForm, TemplateTest};

pub async fn list(
    client: &ApiClient,
    page: u32,
    page_size: u32,
    search: Option<&str>,
) -> ApiResult<Page<Template>> {
    let mut query = vec![
        ("page", page.to_string()),
        ("pageSize", page_size.to_string()),
    ];
    if let Some(s) = search.filter(|s| !s.is_empty()) {
        query.push(("search", s.to_string()));
    }
    decode_page(client.get("Templates", &query).await?)
}

pub async fn get(client: &ApiClient, id: u64) -> ApiResult<Template> {
    decode(client.get(&format!("Templates/{}", id), &[]).await?)
}

pub async fn create(client: &ApiClient, form: &TemplateForm) -> ApiResult<Option<Template>> {
    form.validate()?;
    Ok(decode_opt(client.post("Templates", form).await?))
}

pub async fn update(
    client: &ApiClient,
    id: u64,
    form: &TemplateForm,
) -> ApiResult<Option<Template>> {
    form.validate()?;
    Ok(decode_opt(client.put(&format!("Templates/{}", id), form).await?))
}

pub async fn delete(client: &ApiClient, id: u64) -> ApiResult<()> {
    client.delete(&format!("Templates/{}", id)).await?;
    Ok(())
}

/// Mark a template approved or not approved for sending.
pub async fn set_approval(client: &ApiClient, id: u64, approved: bool) -> ApiResult<()> {
    client
        .patch(
            &format!("Templates/{}/approval", id),
            &json!({ "isApproved": approved }),
        )
        .await?;
    Ok(())
}

/// Send a template to a single number as a test.
pub async fn send_test(client: &ApiClient, test: &TemplateTest) -> ApiResult<()> {
    test.validate()?;
    client.post("Templates/test", test).await?;
    Ok(())
}
