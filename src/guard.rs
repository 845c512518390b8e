//! Named routes and the access guards in front of them.
//!
//! Every CLI command resolves to a [`Route`] and passes [`check`] before it
//! touches the API.

use std::fmt;

use tracing::debug;

use crate::store::AuthStore;

/// Roles a route can demand beyond being signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Superuser,
}

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only signed-out users, like the login page.
    Guest,
    /// Anyone.
    Public,
    Authenticated,
    /// Signed-in users holding every listed role.
    Role(&'static [Role]),
}

const SUPERUSER: &[Role] = &[Role::Superuser];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Callback,
    Unauthorized,
    Dashboard,
    Projects,
    ProjectDetail(i64),
    Sprints,
    SprintDetail(i64),
    Issues,
    IssueDetail(i64),
    Kanban,
    Teams,
    TeamDetail(i64),
    Servers,
    ServerDetail(i64),
    Services,
    ServiceDetail(i64),
    Deployments,
    DeploymentDetail(i64),
    Profile,
    Settings,
    NotFound,
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::Callback => "callback",
            Route::Unauthorized => "unauthorized",
            Route::Dashboard => "dashboard",
            Route::Projects => "projects",
            Route::ProjectDetail(_) => "project-detail",
            Route::Sprints => "sprints",
            Route::SprintDetail(_) => "sprint-detail",
            Route::Issues => "issues",
            Route::IssueDetail(_) => "issue-detail",
            Route::Kanban => "kanban",
            Route::Teams => "teams",
            Route::TeamDetail(_) => "team-detail",
            Route::Servers => "servers",
            Route::ServerDetail(_) => "server-detail",
            Route::Services => "services",
            Route::ServiceDetail(_) => "service-detail",
            Route::Deployments => "deployments",
            Route::DeploymentDetail(_) => "deployment-detail",
            Route::Profile => "profile",
            Route::Settings => "settings",
            Route::NotFound => "not-found",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Callback => "/auth/callback".to_string(),
            Route::Unauthorized => "/unauthorized".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::Projects => "/projects".to_string(),
            Route::ProjectDetail(id) => format!("/projects/{}", id),
            Route::Sprints => "/sprints".to_string(),
            Route::SprintDetail(id) => format!("/sprints/{}", id),
            Route::Issues => "/issues".to_string(),
            Route::IssueDetail(id) => format!("/issues/{}", id),
            Route::Kanban => "/kanban".to_string(),
            Route::Teams => "/teams".to_string(),
            Route::TeamDetail(id) => format!("/teams/{}", id),
            Route::Servers => "/servers".to_string(),
            Route::ServerDetail(id) => format!("/servers/{}", id),
            Route::Services => "/services".to_string(),
            Route::ServiceDetail(id) => format!("/services/{}", id),
            Route::Deployments => "/deployments".to_string(),
            Route::DeploymentDetail(id) => format!("/deployments/{}", id),
            Route::Profile => "/profile".to_string(),
            Route::Settings => "/settings".to_string(),
            Route::NotFound => "/404".to_string(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Login => Access::Guest,
            Route::Callback | Route::Unauthorized | Route::NotFound => Access::Public,
            Route::TeamDetail(_) | Route::Settings => Access::Role(SUPERUSER),
            _ => Access::Authenticated,
        }
    }

    /// Resolve a path to its route. Unknown paths map to [`Route::NotFound`].
    pub fn from_path(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] | ["dashboard"] => Route::Dashboard,
            ["login"] => Route::Login,
            ["auth", "callback"] => Route::Callback,
            ["unauthorized"] => Route::Unauthorized,
            ["projects"] => Route::Projects,
            ["sprints"] => Route::Sprints,
            ["issues"] => Route::Issues,
            ["kanban"] => Route::Kanban,
            ["teams"] => Route::Teams,
            ["servers"] => Route::Servers,
            ["services"] => Route::Services,
            ["deployments"] => Route::Deployments,
            ["profile"] => Route::Profile,
            ["settings"] => Route::Settings,
            [collection, id] => match id.parse::<i64>() {
                Ok(id) => match *collection {
                    "projects" => Route::ProjectDetail(id),
                    "sprints" => Route::SprintDetail(id),
                    "issues" => Route::IssueDetail(id),
                    "teams" => Route::TeamDetail(id),
                    "servers" => Route::ServerDetail(id),
                    "services" => Route::ServiceDetail(id),
                    "deployments" => Route::DeploymentDetail(id),
                    _ => Route::NotFound,
                },
                Err(_) => Route::NotFound,
            },
            _ => Route::NotFound,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// What a guard decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    /// Go to `to` instead. `redirect` is where to return after logging in.
    Redirect { to: Route, redirect: Option<String> },
}

impl Navigation {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Navigation::Allow)
    }

    fn to_login(target: &Route) -> Self {
        Navigation::Redirect {
            to: Route::Login,
            redirect: Some(target.path()),
        }
    }
}

/// Require a signed-in user whose token the server still accepts.
pub async fn auth_guard(auth: &mut AuthStore, target: &Route) -> Navigation {
    if !auth.is_initialized() {
        if let Err(e) = auth.init() {
            debug!("Could not restore session: {}", e);
        }
    }

    if !auth.is_authenticated() {
        return Navigation::to_login(target);
    }

    if !auth.verify().await {
        debug!("Stored token rejected, redirecting to login");
        auth.clear();
        return Navigation::to_login(target);
    }

    Navigation::Allow
}

/// Keep signed-in users away from the login pages.
pub fn guest_guard(auth: &AuthStore) -> Navigation {
    if auth.is_authenticated() {
        Navigation::Redirect {
            to: Route::Dashboard,
            redirect: None,
        }
    } else {
        Navigation::Allow
    }
}

/// Require every role in `roles`.
pub fn role_guard(auth: &AuthStore, target: &Route, roles: &[Role]) -> Navigation {
    if !auth.is_authenticated() {
        return Navigation::to_login(target);
    }

    let missing = roles.iter().any(|role| match role {
        Role::Superuser => !auth.is_superuser(),
    });
    if missing {
        return Navigation::Redirect {
            to: Route::Unauthorized,
            redirect: None,
        };
    }

    Navigation::Allow
}

/// Run whichever guards `target` needs.
pub async fn check(auth: &mut AuthStore, target: &Route) -> Navigation {
    match target.access() {
        Access::Public => Navigation::Allow,
        Access::Guest => {
            if !auth.is_initialized() {
                if let Err(e) = auth.init() {
                    debug!("Could not restore session: {}", e);
                }
            }
            guest_guard(auth)
        }
        Access::Authenticated => auth_guard(auth, target).await,
        Access::Role(roles) => match auth_guard(auth, target).await {
            Navigation::Allow => role_guard(auth, target, roles),
            redirect => redirect,
        },
    }
}
