//! Route table and path matching.
//!
//! Routes are a static table like the REPL command list. Every route
//! requires authentication except the login boundary. Patterns may contain
//! `:param` segments.

pub mod guard;

pub use guard::{Decision, Guard, Navigation, decide};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// The screen the REPL prints for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Home,
    Dashboard,
    LeaveApply,
    LeaveList,
    LeavePending,
    LeaveDetail,
    ProcessDesigner,
    ProcessDefinitions,
    ProcessInstances,
    ProcessTemplates,
    MyTasks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    pub title: &'static str,
    pub requires_auth: bool,
    /// Static redirect applied before the guard runs.
    pub redirect: Option<&'static str>,
    pub screen: Option<Screen>,
}

const fn page(path: &'static str, name: &'static str, title: &'static str, screen: Screen) -> Route {
    Route {
        path,
        name,
        title,
        requires_auth: true,
        redirect: None,
        screen: Some(screen),
    }
}

const fn redirect(path: &'static str, name: &'static str, to: &'static str) -> Route {
    Route {
        path,
        name,
        title: "",
        requires_auth: true,
        redirect: Some(to),
        screen: None,
    }
}

pub const ROUTES: &[Route] = &[
    Route {
        path: LOGIN_PATH,
        name: "Login",
        title: "Sign in",
        requires_auth: false,
        redirect: None,
        screen: Some(Screen::Login),
    },
    page(HOME_PATH, "Home", "Home", Screen::Home),
    page("/dashboard", "Dashboard", "Workbench", Screen::Dashboard),
    redirect("/leave", "Leave", "/leave/apply"),
    page("/leave/apply", "LeaveApply", "Leave request", Screen::LeaveApply),
    page("/leave/list", "LeaveList", "My leave", Screen::LeaveList),
    page("/leave/pending", "LeavePending", "Pending approval", Screen::LeavePending),
    page("/leave/detail/:id", "LeaveDetail", "Leave details", Screen::LeaveDetail),
    redirect("/process", "Process", "/process/designer"),
    page("/process/designer", "ProcessDesigner", "Process designer", Screen::ProcessDesigner),
    page(
        "/process/definitions",
        "ProcessDefinitions",
        "Process definitions",
        Screen::ProcessDefinitions,
    ),
    page(
        "/process/instances",
        "ProcessInstances",
        "Process instances",
        Screen::ProcessInstances,
    ),
    page(
        "/process/templates",
        "ProcessTemplates",
        "Process templates",
        Screen::ProcessTemplates,
    ),
    redirect("/task", "Task", "/task/my-tasks"),
    page("/task/my-tasks", "MyTasks", "My tasks", Screen::MyTasks),
];

/// A route matched against a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: &'static Route,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_login(&self) -> bool {
        self.route.path == LOGIN_PATH
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Router {
    routes: &'static [Route],
}

impl Router {
    pub fn new(routes: &'static [Route]) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &'static [Route] {
        self.routes
    }

    /// Find the route for a path. Query strings, fragments and trailing
    /// slashes are ignored.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let path = normalize(path);
        let segments = split(&path);

        self.routes.iter().find_map(|route| {
            let pattern = split(route.path);
            if pattern.len() != segments.len() {
                return None;
            }
            let mut params = Vec::new();
            for (want, got) in pattern.iter().zip(&segments) {
                match want.strip_prefix(':') {
                    Some(name) => params.push((name.to_string(), got.to_string())),
                    None if want == got => {}
                    None => return None,
                }
            }
            Some(RouteMatch {
                route,
                path: path.clone(),
                params,
            })
        })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(ROUTES)
    }
}

/// `/leave/list/?x=1#top` → `/leave/list`
pub fn normalize(path: &str) -> String {
    let path = path.trim();
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        HOME_PATH.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_login_route_and_it_is_exempt() {
        let logins: Vec<_> = ROUTES.iter().filter(|r| r.path == LOGIN_PATH).collect();
        assert_eq!(logins.len(), 1);
        assert!(!logins[0].requires_auth);
    }

    #[test]
    fn every_other_route_requires_auth() {
        for route in ROUTES.iter().filter(|r| r.path != LOGIN_PATH) {
            assert!(route.requires_auth, "{} should require auth", route.path);
        }
    }

    #[test]
    fn no_duplicate_paths_or_names() {
        let mut paths = Vec::new();
        let mut names = Vec::new();
        for route in ROUTES {
            assert!(!paths.contains(&route.path), "duplicate path: {}", route.path);
            assert!(!names.contains(&route.name), "duplicate name: {}", route.name);
            paths.push(route.path);
            names.push(route.name);
        }
    }

    #[test]
    fn redirects_point_at_real_pages() {
        let router = Router::default();
        for route in ROUTES {
            if let Some(target) = route.redirect {
                let matched = router.match_path(target).expect("redirect target exists");
                assert!(matched.route.screen.is_some());
            }
        }
    }

    #[test]
    fn pages_have_titles() {
        for route in ROUTES.iter().filter(|r| r.screen.is_some()) {
            assert!(!route.title.is_empty(), "{} has no title", route.path);
        }
    }

    #[test]
    fn matches_static_path() {
        let matched = Router::default().match_path("/dashboard").unwrap();
        assert_eq!(matched.route.name, "Dashboard");
        assert!(matched.params.is_empty());
    }

    #[test]
    fn matches_root() {
        let matched = Router::default().match_path("/").unwrap();
        assert_eq!(matched.route.name, "Home");
        assert_eq!(Router::default().match_path("").unwrap().route.name, "Home");
    }

    #[test]
    fn captures_params() {
        let matched = Router::default().match_path("/leave/detail/77").unwrap();
        assert_eq!(matched.route.name, "LeaveDetail");
        assert_eq!(matched.param("id"), Some("77"));
        assert_eq!(matched.param("missing"), None);
    }

    #[test]
    fn ignores_query_and_trailing_slash() {
        let matched = Router::default().match_path("/task/my-tasks/?page=2").unwrap();
        assert_eq!(matched.route.name, "MyTasks");
        assert_eq!(matched.path, "/task/my-tasks");
    }

    #[test]
    fn unknown_path_does_not_match() {
        assert!(Router::default().match_path("/nowhere").is_none());
        assert!(Router::default().match_path("/leave/detail").is_none());
    }

    #[test]
    fn normalize_adds_leading_slash() {
        assert_eq!(normalize("dashboard"), "/dashboard");
        assert_eq!(normalize("  /login/ "), "/login");
    }
}
