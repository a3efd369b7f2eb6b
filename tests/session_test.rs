use std::sync::Arc;

use flowdesk::config::{ClientSettings, Config, KEY_BASE_URL, Overrides};
use flowdesk::events::EventBus;
use flowdesk::router::guard::{Guard, Navigation};
use flowdesk::router::{LOGIN_PATH, Router};
use flowdesk::session::{Session, SessionStore, SqliteSessionStore, UserInfo};

/// Helper: a database path inside a fresh temp dir.
fn temp_db() -> (String, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flowdesk.db");
    (path.to_string_lossy().into_owned(), dir)
}

fn open_session(path: &str) -> Session {
    Session::new(Box::new(SqliteSessionStore::open(path).unwrap()))
}

// ── Persistence ───────────────────────────────────────────────────

#[test]
fn session_survives_reopen() {
    let (db, _dir) = temp_db();
    let user = UserInfo {
        username: "zhangsan".to_string(),
        real_name: Some("Zhang San".to_string()),
        ..UserInfo::default()
    };
    open_session(&db).begin("persisted", Some(&user)).unwrap();

    let reopened = open_session(&db);
    assert_eq!(reopened.token().as_deref(), Some("persisted"));
    assert_eq!(reopened.user_info().unwrap(), Some(user));
}

#[test]
fn end_is_persisted() {
    let (db, _dir) = temp_db();
    open_session(&db).begin("abc", None).unwrap();
    open_session(&db).end().unwrap();
    assert!(!open_session(&db).is_authenticated());
}

#[test]
fn user_info_is_stored_as_camel_case_json() {
    let (db, _dir) = temp_db();
    let user = UserInfo {
        username: "lisi".to_string(),
        tenant_id: Some("t-1".to_string()),
        ..UserInfo::default()
    };
    open_session(&db).begin("abc", Some(&user)).unwrap();

    let raw = SqliteSessionStore::open(&db)
        .unwrap()
        .get("userInfo")
        .unwrap()
        .unwrap();
    assert!(raw.contains("\"tenantId\":\"t-1\""), "{raw}");
}

#[test]
fn config_and_session_share_a_database() {
    let (db, _dir) = temp_db();
    let config = Config::open(&db).unwrap();
    config.set(KEY_BASE_URL, "https://flow.example.com").unwrap();
    open_session(&db).begin("abc", None).unwrap();

    let settings = ClientSettings::resolve(&Config::open(&db).unwrap(), &Overrides::default()).unwrap();
    assert_eq!(settings.base_url, "https://flow.example.com");
    assert!(open_session(&db).is_authenticated());
}

// ── Guard over a persisted session ────────────────────────────────

#[test]
fn guard_sees_a_session_stored_by_an_earlier_run() {
    let (db, _dir) = temp_db();
    open_session(&db).begin("abc", None).unwrap();

    let guard = Guard::new(
        Router::default(),
        Arc::new(open_session(&db)),
        Arc::new(EventBus::default()),
    );
    assert!(matches!(
        guard.before_each("/process/definitions"),
        Navigation::Proceed { .. }
    ));
    assert!(matches!(
        guard.before_each(LOGIN_PATH),
        Navigation::Redirect { to: "/", .. }
    ));
}
