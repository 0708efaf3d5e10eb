//! Contacts endpoints (`/Contacts`)

use super::client::ApiClient;
use super::envelope::{decode, decode_list, decode_opt, decode_page, Page};
use super::error::ApiResult;
use crate::forms::Validate;
use crate::models::{Contact, ContactForm, ContactQuery, ImportSummary};

pub async fn list(
    client: &ApiClient,
    page: u32,
    page_size: u32,
    filter: &ContactQuery,
) -> ApiResult<Page<Contact>> {
    let mut query = vec![
        ("page", page.to_string()),
        ("pageSize", page_size.to_string()),
    ];
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        query.push(("search", search.to_string()));
    }
    if let Some(tag) = filter.tag.as_deref().filter(|s| !s.is_empty()) {
        query.push(("tag", tag.to_string()));
    }
    if let Some(opted_in) = filter.opted_in {
        query.push(("hasOptedIn", opted_in.to_string()));
    }
    decode_page(client.get("Contacts", &query).await?)
}

pub async fn get(client: &ApiClient, id: u64) -> ApiResult<Contact> {
    decode(client.get(&format!("Contacts/{}", id), &[]).await?)
}

pub async fn create(client: &ApiClient, form: &ContactForm) -> ApiResult<Option<Contact>> {
    form.validate()?;
    Ok(decode_opt(client.post("Contacts", form).await?))
}

pub async fn update(client: &ApiClient, id: u64, form: &ContactForm) -> ApiResult<Option<Contact>> {
    form.validate()?;
    Ok(decode_opt(client.put(&format!("Contacts/{}", id), form).await?))
}

pub async fn delete(client: &ApiClient, id: u64) -> ApiResult<()> {
    client.delete(&format!("Contacts/{}", id)).await?;
    Ok(())
}

/// All tags in use, for filter pickers.
pub async fn tags(client: &ApiClient) -> ApiResult<Vec<String>> {
    decode_list(client.get("Contacts/tags", &[]).await?)
}

/// Ask the backend to create contacts from invoice records.
pub async fn import_from_invoices(client: &ApiClient) -> ApiResult<ImportSummary> {
    let body = client.post_empty("Contacts/import-from-invoices").await?;
    Ok(decode_opt(body).unwrap_or_default())
}
