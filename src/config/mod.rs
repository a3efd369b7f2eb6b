//! Key-value configuration storage backed by SQLite, plus resolution of the
//! effective client settings.
//!
//! Shares a database with [`SqliteSessionStore`](crate::session::SqliteSessionStore),
//! pass the same path to both.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::Mutex;
use std::time::Duration;

use crate::consts::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::gateway::UnauthorizedPolicy;

pub const KEY_BASE_URL: &str = "base_url";
pub const KEY_TIMEOUT_SECS: &str = "timeout_secs";
pub const KEY_ON_UNAUTHORIZED: &str = "on_unauthorized";

/// Persistent key-value configuration store.
pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("config connection poisoned"))
    }

    /// Get a config value by key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT value FROM config WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Set a config value (upsert).
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Remove a config key.
    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM config WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// Settings the gateway is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub on_unauthorized: UnauthorizedPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            on_unauthorized: UnauthorizedPolicy::default(),
        }
    }
}

/// Values given explicitly on the command line or via environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub on_unauthorized: Option<UnauthorizedPolicy>,
}

impl ClientSettings {
    /// Resolve settings: explicit override, then stored config, then default.
    pub fn resolve(config: &Config, overrides: &Overrides) -> Result<Self> {
        let defaults = Self::default();

        let base_url = match &overrides.base_url {
            Some(url) => url.clone(),
            None => config
                .get(KEY_BASE_URL)?
                .unwrap_or(defaults.base_url),
        };

        let timeout = match overrides.timeout_secs {
            Some(secs) => Duration::from_secs(secs),
            None => match config.get(KEY_TIMEOUT_SECS)? {
                Some(raw) => Duration::from_secs(
                    raw.parse()
                        .with_context(|| format!("invalid stored {KEY_TIMEOUT_SECS}: {raw}"))?,
                ),
                None => defaults.timeout,
            },
        };

        let on_unauthorized = match overrides.on_unauthorized {
            Some(policy) => policy,
            None => match config.get(KEY_ON_UNAUTHORIZED)? {
                Some(raw) => raw.parse()?,
                None => defaults.on_unauthorized,
            },
        };

        Ok(Self {
            base_url,
            timeout,
            on_unauthorized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_config() -> Config {
        Config::open(":memory:").unwrap()
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        let config = mem_config();
        assert!(config.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn set_overwrites_existing() {
        let config = mem_config();
        config.set(KEY_BASE_URL, "http://old:8080").unwrap();
        config.set(KEY_BASE_URL, "http://new:8080").unwrap();
        assert_eq!(config.get(KEY_BASE_URL).unwrap().unwrap(), "http://new:8080");
    }

    #[test]
    fn remove_deletes_key() {
        let config = mem_config();
        config.set(KEY_TIMEOUT_SECS, "5").unwrap();
        config.remove(KEY_TIMEOUT_SECS).unwrap();
        assert!(config.get(KEY_TIMEOUT_SECS).unwrap().is_none());
    }

    #[test]
    fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config-test.db");
        let path_str = path.to_str().unwrap();

        {
            let config = Config::open(path_str).unwrap();
            config.set(KEY_BASE_URL, "http://persisted:9000").unwrap();
        }

        {
            let config = Config::open(path_str).unwrap();
            assert_eq!(
                config.get(KEY_BASE_URL).unwrap().unwrap(),
                "http://persisted:9000"
            );
        }
    }

    #[test]
    fn resolve_uses_defaults_when_empty() {
        let settings = ClientSettings::resolve(&mem_config(), &Overrides::default()).unwrap();
        assert_eq!(settings, ClientSettings::default());
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn resolve_prefers_stored_over_default() {
        let config = mem_config();
        config.set(KEY_BASE_URL, "http://stored:1234").unwrap();
        config.set(KEY_TIMEOUT_SECS, "7").unwrap();
        config.set(KEY_ON_UNAUTHORIZED, "propagate").unwrap();

        let settings = ClientSettings::resolve(&config, &Overrides::default()).unwrap();
        assert_eq!(settings.base_url, "http://stored:1234");
        assert_eq!(settings.timeout, Duration::from_secs(7));
        assert_eq!(settings.on_unauthorized, UnauthorizedPolicy::Propagate);
    }

    #[test]
    fn resolve_prefers_override_over_stored() {
        let config = mem_config();
        config.set(KEY_BASE_URL, "http://stored:1234").unwrap();

        let overrides = Overrides {
            base_url: Some("http://flag:5678".to_string()),
            timeout_secs: Some(2),
            on_unauthorized: None,
        };
        let settings = ClientSettings::resolve(&config, &overrides).unwrap();
        assert_eq!(settings.base_url, "http://flag:5678");
        assert_eq!(settings.timeout, Duration::from_secs(2));
    }

    #[test]
    fn resolve_rejects_garbage_timeout() {
        let config = mem_config();
        config.set(KEY_TIMEOUT_SECS, "soon").unwrap();
        let err = ClientSettings::resolve(&config, &Overrides::default()).unwrap_err();
        assert!(err.to_string().contains(KEY_TIMEOUT_SECS));
    }
}
