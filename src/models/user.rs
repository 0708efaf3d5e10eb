//! Signed-in user profile and auth request bodies

use serde::{Deserialize, Serialize};

use super::de;
use crate::api::error::ApiResult;
use crate::forms::{require, Validate};

/// Profile of the signed-in agent, persisted next to the access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub branch: Option<String>,
}

pub fn default_role() -> String {
    "Agent".to_string()
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> ApiResult<()> {
        require(&self.email, "Email")?;
        require(&self.password, "Password")
    }
}

/// Body for `/Auth/register` and `/Auth/initialize`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> ApiResult<()> {
        require(&self.email, "Email")?;
        require(&self.password, "Password")
    }
}

/// Login response. The token key varies between backend versions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default, alias = "accessToken", alias = "jwt")]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<LoginUser>,
}

/// Optional profile returned alongside the token.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}
