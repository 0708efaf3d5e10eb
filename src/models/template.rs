//! Message template models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::de;
use crate::api::error::ApiResult;
use crate::forms::{require, Validate};

/// Pre-approved message template, referenced upstream by its content SID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: u64,
    #[serde(default, deserialize_with = "de::null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "de::null_default")]
    pub content_sid: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub variables: Option<String>,
    #[serde(default, deserialize_with = "de::null_default")]
    pub is_approved: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateForm {
    pub name: String,
    pub content_sid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Validate for TemplateForm {
    fn validate(&self) -> ApiResult<()> {
        require(&self.name, "Template name")?;
        require(&self.content_sid, "Content SID")
    }
}

/// Body for `POST /Templates/test`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateTest {
    pub content_sid: String,
    pub phone_number: String,
    pub content_variables: BTreeMap<String, String>,
}

impl Validate for TemplateTest {
    fn validate(&self) -> ApiResult<()> {
        require(&self.content_sid, "Content SID")?;
        require(&self.phone_number, "Phone number")
    }
}

/// Body for `POST /WhatsApp/send-template`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSend {
    pub to: String,
    pub content_sid: String,
    pub content_variables: BTreeMap<String, String>,
}

impl Validate for TemplateSend {
    fn validate(&self) -> ApiResult<()> {
        require(&self.to, "Recipient")?;
        require(&self.content_sid, "Content SID")
    }
}

/// Parse `key=value` pairs into template variables.
pub fn parse_variables(pairs: &[String]) -> ApiResult<BTreeMap<String, String>> {
    let mut vars = BTreeMap::new();
    for pair in pairs {
        let (k, v) = pair.split_once('=').ok_or_else(|| {
            crate::api::error::ApiError::validation(format!(
                "Template variable '{}' must look like key=value",
                pair
            ))
        })?;
        require(k, "Template variable name")?;
        vars.insert(k.trim().to_string(), v.to_string());
    }
    Ok(vars)
}
