//! The session context shared by the gateway and the navigation guard.
//!
//! A [`Session`] owns the credential lifecycle: [`Session::begin`] after a
//! successful login, [`Session::end`] on logout or when the backend rejects
//! the token. Nothing else writes the `token` / `userInfo` entries.

pub mod storage;

pub use storage::{MemorySessionStore, SessionStore, SqliteSessionStore};

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{TOKEN_KEY, USER_INFO_KEY};

/// The user record the backend returns on login and from `/api/auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl UserInfo {
    /// Name to show in prompts and `/whoami`.
    pub fn display_name(&self) -> &str {
        self.real_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

/// Explicit session context. Cheap to share behind an `Arc`.
pub struct Session {
    store: Box<dyn SessionStore>,
    /// Serializes begin/end so a conditional end sees a stable token.
    lifecycle: Mutex<()>,
}

impl Session {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            store,
            lifecycle: Mutex::new(()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.lifecycle
            .lock()
            .map_err(|_| anyhow!("session lifecycle lock poisoned"))
    }

    /// A session backed by an in-process map.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySessionStore::new()))
    }

    /// Stored bearer token, if any.
    pub fn try_token(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(TOKEN_KEY)?
            .filter(|token| !token.is_empty()))
    }

    /// Stored bearer token. An unreadable store counts as signed out.
    pub fn token(&self) -> Option<String> {
        match self.try_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "failed to read session token");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Stored user record, if one was saved at login.
    pub fn user_info(&self) -> Result<Option<UserInfo>> {
        match self.store.get(USER_INFO_KEY)? {
            Some(json) => {
                let info = serde_json::from_str(&json).context("corrupt stored user info")?;
                Ok(Some(info))
            }
            None => Ok(None),
        }
    }

    /// Start a session: persist the token and, when present, the user record.
    pub fn begin(&self, token: &str, user_info: Option<&UserInfo>) -> Result<()> {
        let _guard = self.lock()?;
        self.store
            .set(TOKEN_KEY, token)
            .context("failed to save token")?;
        match user_info {
            Some(info) => {
                let json = serde_json::to_string(info)?;
                self.store
                    .set(USER_INFO_KEY, &json)
                    .context("failed to save user info")?;
            }
            None => self.store.remove(USER_INFO_KEY)?,
        }
        debug!("session started");
        Ok(())
    }

    /// End the session. Removing entries that do not exist is fine.
    pub fn end(&self) -> Result<()> {
        let _guard = self.lock()?;
        self.clear()
    }

    /// End the session only while it still holds `token`. Returns whether
    /// it did; a session already ended or replaced by a newer login is left
    /// alone.
    pub fn end_if_current(&self, token: &str) -> Result<bool> {
        let _guard = self.lock()?;
        if self.try_token()?.as_deref() != Some(token) {
            return Ok(false);
        }
        self.clear()?;
        Ok(true)
    }

    fn clear(&self) -> Result<()> {
        self.store
            .remove(TOKEN_KEY)
            .context("failed to remove token")?;
        self.store
            .remove(USER_INFO_KEY)
            .context("failed to remove user info")?;
        debug!("session ended");
        Ok(())
    }

    /// Short label for banners and `/whoami`.
    pub fn status_label(&self) -> String {
        if !self.is_authenticated() {
            return "not authenticated".to_string();
        }
        match self.user_info() {
            Ok(Some(info)) => format!("{} ✓", info.display_name()),
            _ => "token ✓".to_string(),
        }
    }
}
