//! Pre-navigation authentication check.
//!
//! Runs once per navigation attempt, before the screen loads. Purely local:
//! it reads the session and the route table and never touches the network.

use std::sync::{Arc, RwLock};

use tracing::debug;

use super::{HOME_PATH, LOGIN_PATH, RouteMatch, Router};
use crate::consts::page_title;
use crate::events::{Event, EventBus};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    RedirectToLogin,
    RedirectToHome,
}

/// The transition table. Signed-out users may reach exempt routes and the
/// login boundary only; signed-in users are kept off the login boundary.
pub fn decide(credential_present: bool, requires_auth: bool, is_login: bool) -> Decision {
    match (credential_present, requires_auth, is_login) {
        (true, _, true) => Decision::RedirectToHome,
        (false, true, false) => Decision::RedirectToLogin,
        _ => Decision::Proceed,
    }
}

/// Outcome of one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed {
        matched: RouteMatch,
        title: String,
    },
    Redirect {
        from: String,
        to: &'static str,
    },
    NotFound {
        path: String,
    },
}

pub struct Guard {
    router: Router,
    session: Arc<Session>,
    events: Arc<EventBus>,
    title: RwLock<Option<String>>,
}

impl Guard {
    pub fn new(router: Router, session: Arc<Session>, events: Arc<EventBus>) -> Self {
        Self {
            router,
            session,
            events,
            title: RwLock::new(None),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Title of the last screen navigated to.
    pub fn current_title(&self) -> Option<String> {
        self.title.read().ok().and_then(|title| title.clone())
    }

    /// Decide whether navigating to `target` may proceed.
    pub fn before_each(&self, target: &str) -> Navigation {
        let signed_in = self.session.is_authenticated();
        let matched = self.resolve(target);

        let (requires_auth, is_login) = match &matched {
            Some(m) => (m.route.requires_auth, m.is_login()),
            // Unknown paths are protected like any other page.
            None => (true, false),
        };

        let from = super::normalize(target);
        let navigation = match decide(signed_in, requires_auth, is_login) {
            Decision::RedirectToLogin => Navigation::Redirect {
                from,
                to: LOGIN_PATH,
            },
            Decision::RedirectToHome => Navigation::Redirect {
                from,
                to: HOME_PATH,
            },
            Decision::Proceed => match matched {
                Some(matched) => {
                    let title = page_title(matched.route.title);
                    self.set_title(&title);
                    Navigation::Proceed { matched, title }
                }
                None => Navigation::NotFound { path: from },
            },
        };

        debug!(path = target, signed_in, ?navigation, "navigation guarded");
        navigation
    }

    /// Match a path, following at most one static redirect.
    fn resolve(&self, target: &str) -> Option<RouteMatch> {
        let matched = self.router.match_path(target)?;
        match matched.route.redirect {
            Some(to) => self.router.match_path(to),
            None => Some(matched),
        }
    }

    fn set_title(&self, title: &str) {
        if let Ok(mut current) = self.title.write() {
            *current = Some(title.to_string());
        }
        self.events.emit(Event::TitleChanged {
            title: title.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> (Guard, Arc<Session>, Arc<EventBus>) {
        let session = Arc::new(Session::in_memory());
        let events = Arc::new(EventBus::default());
        let guard = Guard::new(Router::default(), session.clone(), events.clone());
        (guard, session, events)
    }

    #[test]
    fn transition_table_is_exhaustive() {
        for present in [false, true] {
            for requires_auth in [false, true] {
                for is_login in [false, true] {
                    let expected = if present && is_login {
                        Decision::RedirectToHome
                    } else if !present && requires_auth && !is_login {
                        Decision::RedirectToLogin
                    } else {
                        Decision::Proceed
                    };
                    assert_eq!(
                        decide(present, requires_auth, is_login),
                        expected,
                        "({present}, {requires_auth}, {is_login})"
                    );
                }
            }
        }
    }

    #[test]
    fn signed_out_dashboard_redirects_to_login() {
        let (guard, _, _) = guard();
        assert_eq!(
            guard.before_each("/dashboard"),
            Navigation::Redirect {
                from: "/dashboard".to_string(),
                to: LOGIN_PATH
            }
        );
        assert!(guard.current_title().is_none());
    }

    #[test]
    fn signed_in_login_redirects_home() {
        let (guard, session, _) = guard();
        session.begin("abc", None).unwrap();
        assert_eq!(
            guard.before_each("/login"),
            Navigation::Redirect {
                from: "/login".to_string(),
                to: HOME_PATH
            }
        );
    }

    #[test]
    fn signed_out_login_proceeds() {
        let (guard, _, _) = guard();
        match guard.before_each("/login") {
            Navigation::Proceed { matched, title } => {
                assert!(matched.is_login());
                assert_eq!(title, "Sign in - Flowable Workflow");
            }
            other => panic!("expected proceed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn proceed_publishes_title() {
        let (guard, session, events) = guard();
        session.begin("abc", None).unwrap();
        let mut rx = events.subscribe();

        assert!(matches!(
            guard.before_each("/task/my-tasks"),
            Navigation::Proceed { .. }
        ));
        assert_eq!(
            rx.recv().await.unwrap(),
            Event::TitleChanged {
                title: "My tasks - Flowable Workflow".to_string()
            }
        );
        assert_eq!(
            guard.current_title().as_deref(),
            Some("My tasks - Flowable Workflow")
        );
    }

    #[test]
    fn static_redirect_is_followed() {
        let (guard, session, _) = guard();
        session.begin("abc", None).unwrap();
        match guard.before_each("/leave") {
            Navigation::Proceed { matched, .. } => assert_eq!(matched.route.name, "LeaveApply"),
            other => panic!("expected proceed, got {other:?}"),
        }
    }

    #[test]
    fn unknown_path_is_protected_then_not_found() {
        let (guard, session, _) = guard();
        assert!(matches!(
            guard.before_each("/secret"),
            Navigation::Redirect { to: LOGIN_PATH, .. }
        ));
        session.begin("abc", None).unwrap();
        assert_eq!(
            guard.before_each("/secret"),
            Navigation::NotFound {
                path: "/secret".to_string()
            }
        );
    }

    #[test]
    fn logout_flips_the_decision() {
        let (guard, session, _) = guard();
        session.begin("abc", None).unwrap();
        assert!(matches!(guard.before_each("/"), Navigation::Proceed { .. }));
        session.end().unwrap();
        assert!(matches!(
            guard.before_each("/"),
            Navigation::Redirect { to: LOGIN_PATH, .. }
        ));
    }
}
