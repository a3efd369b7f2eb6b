//! Project-wide constants.

use std::path::PathBuf;
use std::time::Duration;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Product name appended to every screen title.
pub const PRODUCT_NAME: &str = "Flowable Workflow";

/// Backend origin used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Canonical prefix every resource path lives under.
pub const API_PREFIX: &str = "/api";

/// Per-call timeout applied by the gateway.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Session store key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Session store key holding the serialized user record.
pub const USER_INFO_KEY: &str = "userInfo";

/// Envelope code that marks a successful call.
pub const SUCCESS_CODE: i64 = 200;

/// Default database path: `~/.flowdesk/flowdesk.db`.
/// Single DB for the session and config.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".flowdesk")
        .join("flowdesk.db")
}

/// Format a screen title the way every page shows it.
pub fn page_title(title: &str) -> String {
    format!("{title} - {PRODUCT_NAME}")
}
