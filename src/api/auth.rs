//! Session issuance endpoints (`/Auth/*`)

use serde_json::Value;

use super::client::ApiClient;
use super::envelope::decode;
use super::error::{ApiError, ApiResult};
use crate::forms::Validate;
use crate::models::{CurrentUser, LoginRequest, LoginResponse, RegisterRequest};

/// Exchange credentials for a token and adopt it as the current session.
pub async fn login(client: &ApiClient, req: &LoginRequest) -> ApiResult<CurrentUser> {
    req.validate()?;
    let body = client.post_anonymous("Auth/login", req).await?;
    let resp: LoginResponse = decode(body)?;
    let token = resp
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Decode("login response has no token".into()))?;
    client.session().login(&token, resp.user.as_ref())
}

/// Create a staff account. Returns the server's confirmation message, if any.
pub async fn register(client: &ApiClient, req: &RegisterRequest) -> ApiResult<Option<String>> {
    req.validate()?;
    let body = client.post_anonymous("Auth/register", req).await?;
    Ok(confirmation(&body))
}

/// Bootstrap the first administrator on an empty installation.
pub async fn initialize(client: &ApiClient, req: &RegisterRequest) -> ApiResult<Option<String>> {
    req.validate()?;
    let body = client.post_anonymous("Auth/initialize", req).await?;
    Ok(confirmation(&body))
}

fn confirmation(body: &Value) -> Option<String> {
    match body {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => ["message", "Message"]
            .iter()
            .find_map(|k| body.get(*k).and_then(Value::as_str))
            .map(String::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_confirmation() {
        assert_eq!(
            confirmation(&json!({"Message": "User registered"})).as_deref(),
            Some("User registered")
        );
        assert_eq!(confirmation(&json!("ok")).as_deref(), Some("ok"));
        assert_eq!(confirmation(&Value::Null), None);
    }
}
