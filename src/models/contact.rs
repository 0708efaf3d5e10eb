//! Contact models

use serde::{Deserialize, Serialize};

use super::de;
use crate::api::error::ApiResult;
use crate::forms::{require, Validate};

/// Contact record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: u64,
    pub phone_number: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "de::null_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "de::null_default")]
    pub has_opted_in: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Contact {
    pub fn opt_in_badge(&self) -> &'static str {
        if self.has_opted_in {
            "Opted In"
        } else {
            "Opted Out"
        }
    }
}

/// Create/update body for a contact.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub tags: Vec<String>,
    pub has_opted_in: bool,
}

impl Validate for ContactForm {
    fn validate(&self) -> ApiResult<()> {
        require(&self.phone_number, "Phone number")
    }
}

/// Filters for `GET /Contacts`.
#[derive(Debug, Clone, Default)]
pub struct ContactQuery {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub opted_in: Option<bool>,
}

/// Result of `POST /Contacts/import-from-invoices`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    #[serde(default, alias = "importedCount")]
    pub imported: u64,
    #[serde(default, alias = "skippedCount")]
    pub skipped: u64,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_form_requires_phone() {
        let form = ContactForm::default();
        assert!(form.validate().is_err());

        let form = ContactForm {
            phone_number: "+15551230000".into(),
            ..Default::default()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_opt_in_badge() {
        let mut c = Contact {
            has_opted_in: true,
            ..Default::default()
        };
        assert_eq!(c.opt_in_badge(), "Opted In");
        c.has_opted_in = false;
        assert_eq!(c.opt_in_badge(), "Opted Out");
    }
}
