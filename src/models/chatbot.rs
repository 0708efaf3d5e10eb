//! Chatbot auto-reply rule models

use serde::{Deserialize, Serialize};

use super::de;
use crate::api::error::ApiResult;
use crate::forms::{require, Validate};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotRule {
    pub id: u64,
    #[serde(default, deserialize_with = "de::null_default")]
    pub name: String,
    #[serde(default, alias = "triggerKeyword", deserialize_with = "de::null_default")]
    pub keyword: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub match_type: String,
    #[serde(default, alias = "responseMessage", deserialize_with = "de::null_default")]
    pub response: String,
    #[serde(default, deserialize_with = "de::null_default")]
    pub priority: i32,
    #[serde(default, deserialize_with = "de::null_default")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotRuleForm {
    pub name: String,
    pub keyword: String,
    pub match_type: String,
    pub response: String,
    pub priority: i32,
    pub is_active: bool,
}

impl Validate for ChatbotRuleForm {
    fn validate(&self) -> ApiResult<()> {
        require(&self.name, "Rule name")?;
        require(&self.keyword, "Keyword")?;
        require(&self.response, "Response")
    }
}

/// Body for the dry-run endpoint `POST /Chatbot/test`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotTest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl Validate for ChatbotTest {
    fn validate(&self) -> ApiResult<()> {
        require(&self.message, "Test message")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotTestResult {
    #[serde(default, alias = "isMatch", deserialize_with = "de::null_default")]
    pub matched: bool,
    #[serde(default)]
    pub rule_name: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::envelope::decode;
    use serde_json::json;

    #[test]
    fn test_rule_aliases() {
        let r: ChatbotRule = decode(json!({
            "Id": 1,
            "Name": "hours",
            "TriggerKeyword": "open",
            "MatchType": "Contains",
            "ResponseMessage": "We open at 9",
            "Priority": 1,
            "IsActive": true
        }))
        .unwrap();
        assert_eq!(r.keyword, "open");
        assert_eq!(r.response, "We open at 9");
    }

    #[test]
    fn test_rule_form_validation() {
        let form = ChatbotRuleForm {
            name: "hours".into(),
            keyword: "open".into(),
            ..Default::default()
        };
        assert_eq!(form.validate().unwrap_err().to_string(), "Response is required");
    }
}
