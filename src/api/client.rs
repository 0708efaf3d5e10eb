//! Authenticated HTTP client for the console backend
//!
//! Wraps reqwest::Client with bearer-token injection from the session
//! store. The first 401 on an authenticated call clears the session.

use std::sync::Arc;

use anyhow::Context;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::envelope::server_message;
use super::error::{ApiError, ApiResult};
use crate::auth::SessionStore;
use crate::config::Config;

pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(config: &Config, session: Arc<SessionStore>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base: config.api_base()?,
            session,
        })
    }

    /// Load config and the stored session.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::load()?;
        let session = Arc::new(SessionStore::open_default()?);
        Self::new(&config, session)
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::validation(format!("bad request path {}: {}", path, e)))
    }

    fn bearer(&self) -> ApiResult<String> {
        self.session.token().ok_or(ApiError::NotSignedIn)
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<(RequestBuilder, Url)> {
        let url = self.url(path)?;
        let token = self.bearer()?;
        let req = self.http.request(method, url.clone()).bearer_auth(token);
        Ok((req, url))
    }

    async fn execute(&self, req: RequestBuilder, url: &Url, authenticated: bool) -> ApiResult<Value> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED && authenticated {
            tracing::warn!("401 Unauthorized for {}", url);
            self.session.invalidate();
            return Err(ApiError::Unauthorized);
        }
        classify(status, &body)
    }

    /// GET with query parameters.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let (req, url) = self.request(Method::GET, path)?;
        tracing::debug!("GET {}", url);
        self.execute(req.query(query), &url, true).await
    }

    /// POST a JSON body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let (req, url) = self.request(Method::POST, path)?;
        tracing::debug!("POST {}", url);
        self.execute(req.json(body), &url, true).await
    }

    /// POST without a body (lifecycle actions such as launch/cancel).
    pub async fn post_empty(&self, path: &str) -> ApiResult<Value> {
        let (req, url) = self.request(Method::POST, path)?;
        tracing::debug!("POST {}", url);
        self.execute(req.header("Content-Length", "0"), &url, true)
            .await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let (req, url) = self.request(Method::PUT, path)?;
        tracing::debug!("PUT {}", url);
        self.execute(req.json(body), &url, true).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let (req, url) = self.request(Method::PATCH, path)?;
        tracing::debug!("PATCH {}", url);
        self.execute(req.json(body), &url, true).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<Value> {
        let (req, url) = self.request(Method::DELETE, path)?;
        tracing::debug!("DELETE {}", url);
        self.execute(req, &url, true).await
    }

    /// POST a multipart form (media uploads).
    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ApiResult<Value> {
        let (req, url) = self.request(Method::POST, path)?;
        tracing::debug!("POST (multipart) {}", url);
        self.execute(req.multipart(form), &url, true).await
    }

    /// POST without a bearer token (login, register, initialize).
    pub async fn post_anonymous<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<Value> {
        let url = self.url(path)?;
        tracing::debug!("POST (anonymous) {}", url);
        let req = self.http.post(url.clone()).json(body);
        self.execute(req, &url, false).await
    }

    /// GET without a bearer token (health probe).
    pub async fn get_anonymous(&self, path: &str) -> ApiResult<Value> {
        let url = self.url(path)?;
        tracing::debug!("GET (anonymous) {}", url);
        let req = self.http.get(url.clone());
        self.execute(req, &url, false).await
    }
}

/// Turn a status and body into a JSON value or an `ApiError::Http`.
///
/// Empty success bodies become `Value::Null`; non-JSON success bodies are
/// returned as a JSON string.
fn classify(status: StatusCode, body: &str) -> ApiResult<Value> {
    if !status.is_success() {
        let message = server_message(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() || trimmed.starts_with('<') {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        });
        return Err(ApiError::Http {
            status: status.as_u16(),
            message,
        });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_success_bodies() {
        assert_eq!(classify(StatusCode::OK, "").unwrap(), Value::Null);
        assert_eq!(classify(StatusCode::OK, r#"{"a":1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(
            classify(StatusCode::OK, "Healthy").unwrap(),
            Value::String("Healthy".into())
        );
    }

    #[test]
    fn test_classify_uses_server_message() {
        let err = classify(StatusCode::BAD_REQUEST, r#"{"Message":"Phone number is invalid"}"#)
            .unwrap_err();
        match err {
            ApiError::Http { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Phone number is invalid");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_classify_generic_message_for_html() {
        let err = classify(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    }

    #[test]
    fn test_url_join_keeps_api_prefix() {
        let config = Config {
            api_base_url: "https://host.example/api".into(),
            ..Default::default()
        };
        let client = ApiClient::new(&config, Arc::new(SessionStore::in_memory())).unwrap();
        assert_eq!(
            client.url("/Contacts/7").unwrap().as_str(),
            "https://host.example/api/Contacts/7"
        );
    }

    #[tokio::test]
    async fn test_no_token_means_no_request() {
        let config = Config {
            api_base_url: "http://127.0.0.1:9/api".into(),
            ..Default::default()
        };
        let client = ApiClient::new(&config, Arc::new(SessionStore::in_memory())).unwrap();
        let err = client.get("Contacts", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::NotSignedIn));
    }
}
