//! Broadcast campaign models

use serde::{Deserialize, Serialize};

use super::de;
use crate::api::error::ApiResult;
use crate::forms::{require, Validate};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: u64,
    #[serde(default, deserialize_with = "de::null_default")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::null_default")]
    pub content_sid: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub status: String,
    #[serde(default, deserialize_with = "de::null_default")]
    pub target_tags: Vec<String>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default, deserialize_with = "de::null_default")]
    pub total_recipients: u64,
    #[serde(default, deserialize_with = "de::null_default")]
    pub sent_count: u64,
    #[serde(default, deserialize_with = "de::null_default")]
    pub delivered_count: u64,
    #[serde(default, deserialize_with = "de::null_default")]
    pub failed_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignForm {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content_sid: String,
    pub target_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
}

impl Validate for CampaignForm {
    fn validate(&self) -> ApiResult<()> {
        require(&self.name, "Campaign name")?;
        require(&self.content_sid, "Content SID")
    }
}

/// Audience preview returned by `POST /Campaigns/{id}/preview`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPreview {
    #[serde(default, alias = "recipientCount", alias = "totalRecipients")]
    pub recipients: u64,
    #[serde(default, deserialize_with = "de::null_default")]
    pub sample_numbers: Vec<String>,
    #[serde(default)]
    pub rendered_body: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::envelope::decode;
    use serde_json::json;

    #[test]
    fn test_numeric_status_is_accepted() {
        let c: Campaign = decode(json!({"Id": 3, "Name": "Spring", "Status": 2})).unwrap();
        assert_eq!(c.status, "2");
        assert_eq!(c.name, "Spring");
    }

    #[test]
    fn test_campaign_form_validation() {
        let form = CampaignForm {
            content_sid: "HX1".into(),
            ..Default::default()
        };
        assert_eq!(form.validate().unwrap_err().to_string(), "Campaign name is required");
    }
}
