//! Session store: the single owner of the access token and user profile.
//!
//! Persisted as `session.toml` with two keys, `access_token` and `user`
//! (the profile as a JSON string). Every write goes through `login`,
//! `logout`, `invalidate` or `refresh`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::tokens::{decode_claims, StoredToken};
use crate::api::error::ApiResult;
use crate::config::Config;
use crate::models::{CurrentUser, LoginUser};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    access_token: Option<String>,
    /// JSON-serialized `CurrentUser`
    user: Option<String>,
}

#[derive(Debug, Default, Clone)]
struct SessionState {
    token: Option<StoredToken>,
    user: Option<CurrentUser>,
}

pub struct SessionStore {
    /// `None` keeps the session in memory only.
    path: Option<PathBuf>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    /// Open the session stored in the platform config directory.
    pub fn open_default() -> Result<Self> {
        Self::open(Config::config_dir()?.join("session.toml"))
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let state = read_state(&path)?;
        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Adopt a freshly issued token. The profile comes from the token
    /// claims; `hint` fills role/branch when the login response carries them.
    pub fn login(&self, token: &str, hint: Option<&LoginUser>) -> ApiResult<CurrentUser> {
        let claims = decode_claims(token)?;
        let mut user = claims.to_user();
        if let Some(hint) = hint {
            if claims.role.is_none() {
                if let Some(role) = hint.role.clone() {
                    user.role = role;
                }
            }
            if user.branch.is_none() {
                user.branch = hint.branch.clone();
            }
        }

        let state = SessionState {
            token: Some(StoredToken::new(token.to_string(), claims.expires_at)),
            user: Some(user.clone()),
        };
        *self.write() = state;
        if let Err(e) = self.persist() {
            tracing::warn!("Failed to persist session: {:#}", e);
        }
        tracing::info!("Signed in as {} ({})", user.email, user.role);
        Ok(user)
    }

    /// Clear token and profile.
    pub fn logout(&self) -> Result<()> {
        *self.write() = SessionState::default();
        self.persist()
    }

    /// Clear the session after the backend rejected the token.
    pub fn invalidate(&self) {
        let had_token = self.write().token.take().is_some();
        self.write().user = None;
        if had_token {
            tracing::warn!("Access token rejected; session cleared");
        }
        if let Err(e) = self.persist() {
            tracing::warn!("Failed to persist cleared session: {:#}", e);
        }
    }

    /// Reload from disk, picking up a login made by another process.
    pub fn refresh(&self) -> Result<()> {
        if let Some(path) = &self.path {
            let state = read_state(path)?;
            *self.write() = state;
        }
        Ok(())
    }

    /// Bearer token for the next request, if one is held and not expired.
    pub fn token(&self) -> Option<String> {
        let state = self.read();
        state
            .token
            .as_ref()
            .filter(|t| !t.is_expired())
            .map(|t| t.token.clone())
    }

    /// Raw stored token, including an expired one.
    pub fn stored_token(&self) -> Option<StoredToken> {
        self.read().token.clone()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.read().user.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token().is_some() && self.current_user().is_some()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let state = self.read().clone();
        let file = SessionFile {
            access_token: state.token.map(|t| t.token),
            user: match state.user {
                Some(u) => Some(serde_json::to_string(&u).context("Failed to serialize user")?),
                None => None,
            },
        };
        write_file(path, &file)
    }
}

fn read_state(path: &Path) -> Result<SessionState> {
    if !path.exists() {
        return Ok(SessionState::default());
    }
    let content = fs::read_to_string(path).context("Failed to read session file")?;
    let file: SessionFile = toml::from_str(&content).context("Failed to parse session file")?;

    let token = match file.access_token {
        Some(raw) => match decode_claims(&raw) {
            Ok(claims) => Some(StoredToken::new(raw, claims.expires_at)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable stored token: {}", e);
                None
            }
        },
        None => None,
    };
    let user = match file.user {
        Some(json) => serde_json::from_str(&json).ok(),
        None => None,
    };
    Ok(SessionState { token, user })
}

fn write_file(path: &Path, file: &SessionFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("Failed to create config directory")?;
    }
    let content = toml::to_string_pretty(file).context("Failed to serialize session")?;
    fs::write(path, content).context("Failed to write session file")?;

    // The file holds a bearer token
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms).context("Failed to set session permissions")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::make_jwt;
    use serde_json::json;

    fn token_for(id: &str, exp: i64) -> String {
        make_jwt(&json!({
            "nameid": id,
            "unique_name": format!("agent{}@example.com", id),
            "exp": exp
        }))
    }

    fn far_future() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_login_persists_two_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        let store = SessionStore::open(path.clone()).unwrap();
        let user = store.login(&token_for("3", far_future()), None).unwrap();
        assert_eq!(user.id, "3");
        assert_eq!(user.role, "Agent");

        let raw: SessionFile = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.access_token.is_some());
        let profile: CurrentUser = serde_json::from_str(&raw.user.unwrap()).unwrap();
        assert_eq!(profile.email, "agent3@example.com");

        let reopened = SessionStore::open(path).unwrap();
        assert!(reopened.is_signed_in());
        assert_eq!(reopened.current_user().unwrap().id, "3");
    }

    #[test]
    fn test_hint_fills_role_and_branch() {
        let store = SessionStore::in_memory();
        let hint = LoginUser {
            role: Some("Admin".into()),
            branch: Some("Lagos".into()),
        };
        let user = store.login(&token_for("1", far_future()), Some(&hint)).unwrap();
        assert_eq!(user.role, "Admin");
        assert_eq!(user.branch.as_deref(), Some("Lagos"));
    }

    #[test]
    fn test_invalidate_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        let store = SessionStore::open(path.clone()).unwrap();
        store.login(&token_for("3", far_future()), None).unwrap();
        store.invalidate();
        assert!(store.token().is_none());
        assert!(store.current_user().is_none());

        let reopened = SessionStore::open(path).unwrap();
        assert!(!reopened.is_signed_in());
    }

    #[test]
    fn test_expired_token_is_not_offered() {
        let store = SessionStore::in_memory();
        store.login(&token_for("3", 1_000), None).unwrap();
        assert!(store.token().is_none());
        assert!(store.stored_token().is_some());
        assert!(!store.is_signed_in());
    }

    #[test]
    fn test_refresh_picks_up_other_process_login() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        let a = SessionStore::open(path.clone()).unwrap();
        let b = SessionStore::open(path).unwrap();
        a.login(&token_for("8", far_future()), None).unwrap();
        assert!(!b.is_signed_in());
        b.refresh().unwrap();
        assert_eq!(b.current_user().unwrap().id, "8");
    }

    #[test]
    fn test_bad_token_is_rejected_without_touching_state() {
        let store = SessionStore::in_memory();
        store.login(&token_for("2", far_future()), None).unwrap();
        assert!(store.login("garbage", None).is_err());
        assert_eq!(store.current_user().unwrap().id, "2");
    }
}
