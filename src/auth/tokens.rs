//! Access token storage and claim decoding

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult};
use crate::models::{default_role, CurrentUser};

/// Role claim as emitted by ASP.NET identity when not mapped to `role`.
const MS_ROLE_CLAIM: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

/// Seconds of slack before `exp` at which a token is treated as expired.
const EXPIRY_SLACK_SECS: i64 = 30;

/// Stored access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    /// Unix seconds from the `exp` claim, if present
    pub expires_at: Option<i64>,
}

impl StoredToken {
    pub fn new(token: String, expires_at: Option<i64>) -> Self {
        Self { token, expires_at }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(exp) => now + EXPIRY_SLACK_SECS >= exp,
            None => false,
        }
    }
}

/// Identity claims carried in the token payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenClaims {
    pub user_id: String,
    pub email: String,
    pub role: Option<String>,
    pub branch: Option<String>,
    pub expires_at: Option<i64>,
}

impl TokenClaims {
    pub fn to_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.user_id.clone(),
            email: self.email.clone(),
            role: self.role.clone().unwrap_or_else(default_role),
            branch: self.branch.clone(),
        }
    }
}

/// First string found under any of `keys`; arrays yield their first element.
fn claim_str(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match payload.get(*k)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.first().and_then(Value::as_str).map(String::from),
        _ => None,
    })
}

/// Decode the payload segment of a JWT. The signature is not verified;
/// the backend remains the authority on token validity.
pub fn decode_claims(token: &str) -> ApiResult<TokenClaims> {
    let payload_b64 = token
        .split('.')
        .nth(1)
        .ok_or_else(|| ApiError::Decode("access token is not a JWT".into()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload_b64.trim_end_matches('='))
        .map_err(|e| ApiError::Decode(format!("access token payload: {}", e)))?;
    let payload: Value = serde_json::from_slice(&bytes)?;

    let user_id = claim_str(&payload, &["nameid", "sub", "userId"])
        .ok_or_else(|| ApiError::Decode("access token has no user id claim".into()))?;

    Ok(TokenClaims {
        user_id,
        email: claim_str(&payload, &["unique_name", "email"]).unwrap_or_default(),
        role: claim_str(&payload, &["role", MS_ROLE_CLAIM]),
        branch: claim_str(&payload, &["branch"]),
        expires_at: payload.get("exp").and_then(Value::as_i64),
    })
}

#[cfg(test)]
pub(crate) fn make_jwt(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_claims() {
        let jwt = make_jwt(&json!({
            "nameid": "17",
            "unique_name": "dana@example.com",
            "role": "Admin",
            "branch": "North",
            "exp": 1_900_000_000
        }));
        let claims = decode_claims(&jwt).unwrap();
        assert_eq!(claims.user_id, "17");
        assert_eq!(claims.email, "dana@example.com");
        assert_eq!(claims.role.as_deref(), Some("Admin"));
        assert_eq!(claims.expires_at, Some(1_900_000_000));
        assert_eq!(claims.to_user().branch.as_deref(), Some("North"));
    }

    #[test]
    fn test_decode_ms_role_claim_and_numeric_id() {
        let jwt = make_jwt(&json!({
            "nameid": 5,
            "unique_name": "x@y",
            MS_ROLE_CLAIM: ["Supervisor", "Agent"]
        }));
        let claims = decode_claims(&jwt).unwrap();
        assert_eq!(claims.user_id, "5");
        assert_eq!(claims.role.as_deref(), Some("Supervisor"));
        assert_eq!(claims.to_user().role, "Supervisor");
    }

    #[test]
    fn test_missing_role_defaults_to_agent() {
        let jwt = make_jwt(&json!({"nameid": "1"}));
        assert_eq!(decode_claims(&jwt).unwrap().to_user().role, "Agent");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode_claims("not-a-token").is_err());
        assert!(decode_claims("a.!!!.c").is_err());
        let jwt = make_jwt(&json!({"unique_name": "no-id@example.com"}));
        assert!(decode_claims(&jwt).is_err());
    }

    #[test]
    fn test_expiry() {
        let t = StoredToken::new("t".into(), Some(1_000));
        assert!(!t.is_expired_at(900));
        assert!(t.is_expired_at(980));
        assert!(t.is_expired_at(2_000));
        assert!(!StoredToken::new("t".into(), None).is_expired_at(i64::MAX - 100));
    }
}
