//! Role-based page access: the permission table, the decision function and
//! the guard that wraps pages.

pub mod guard;
pub mod permissions;

use serde::Serialize;
use std::collections::BTreeSet;

use crate::session::Session;
use crate::types::{PageId, Role};

pub use guard::{AccessGuard, Guarded, Navigator, Page, RedirectLatch, RenderContext};
pub use permissions::{AccessRule, PermissionError, PermissionTable, UnconfiguredPolicy};

pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";

/// Outcome of evaluating a page against the current session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "path", rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    RedirectToLogin,
    RedirectToPrevious(String),
    RedirectToDefault(String),
    /// Waiting on session hydration or the user's role
    Pending,
}

impl AccessDecision {
    /// Where the decision sends the user, if anywhere
    pub fn redirect_target<'a>(&'a self, routes: &'a GuardRoutes) -> Option<&'a str> {
        match self {
            AccessDecision::RedirectToLogin => Some(routes.login_path.as_str()),
            AccessDecision::RedirectToPrevious(path) | AccessDecision::RedirectToDefault(path) => {
                Some(path.as_str())
            }
            AccessDecision::Allow | AccessDecision::Pending => None,
        }
    }
}

/// What a wrapped page declares it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredAccess {
    /// Typed page, resolved through the permission table
    Page(PageId),
    /// Page key for pages outside the typed set
    Key(String),
    /// Explicit roles; an empty set means any authenticated user
    Roles(BTreeSet<Role>),
}

impl RequiredAccess {
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        RequiredAccess::Roles(roles.into_iter().collect())
    }

    pub fn resolve(&self, table: &PermissionTable) -> AccessRule {
        match self {
            RequiredAccess::Page(page) => table.rule_for(*page),
            RequiredAccess::Key(key) => table.rule_for_key(key),
            RequiredAccess::Roles(roles) => AccessRule::roles(roles.iter().copied()),
        }
    }
}

impl From<PageId> for RequiredAccess {
    fn from(page: PageId) -> Self {
        RequiredAccess::Page(page)
    }
}

/// Fixed destinations the guard redirects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRoutes {
    pub login_path: String,
    pub default_path: String,
}

impl Default for GuardRoutes {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            default_path: DEFAULT_LANDING_PATH.to_string(),
        }
    }
}

/// Pure access decision; rules are checked in order and the first match wins
pub fn decide(
    rule: &AccessRule,
    session: &Session,
    current_path: &str,
    previous_path: Option<&str>,
    routes: &GuardRoutes,
) -> AccessDecision {
    if !session.has_hydrated {
        return AccessDecision::Pending;
    }

    if !session.is_authenticated {
        if current_path == routes.login_path {
            return AccessDecision::Pending;
        }
        return AccessDecision::RedirectToLogin;
    }

    let Some(role) = session.role() else {
        return AccessDecision::Pending;
    };

    if rule.permits(role) {
        return AccessDecision::Allow;
    }

    match previous_path {
        Some(previous) if previous != current_path => {
            AccessDecision::RedirectToPrevious(previous.to_string())
        }
        _ => AccessDecision::RedirectToDefault(routes.default_path.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionUser;

    fn user_with(role: Option<Role>) -> SessionUser {
        SessionUser {
            id: "u-1".to_string(),
            name: "Lucía".to_string(),
            email: None,
            role,
        }
    }

    fn logged_in(role: Role) -> Session {
        Session {
            user: Some(user_with(Some(role))),
            is_authenticated: true,
            has_hydrated: true,
        }
    }

    fn admins() -> AccessRule {
        AccessRule::roles([Role::Admin, Role::SuperAdmin])
    }

    #[test]
    fn test_not_hydrated_is_always_pending() {
        let routes = GuardRoutes::default();
        let sessions = [
            Session::default(),
            Session { has_hydrated: false, ..logged_in(Role::Admin) },
            Session { has_hydrated: false, ..logged_in(Role::User) },
        ];

        for session in &sessions {
            for path in ["/login", "/dashboard", "/administracion/choferes"] {
                for rule in [AccessRule::AnyAuthenticated, admins(), AccessRule::Nobody] {
                    assert_eq!(
                        decide(&rule, session, path, Some("/reportes"), &routes),
                        AccessDecision::Pending
                    );
                }
            }
        }
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        let routes = GuardRoutes::default();
        let session = Session { has_hydrated: true, ..Session::default() };

        let decision = decide(&AccessRule::AnyAuthenticated, &session, "/envios", None, &routes);
        assert_eq!(decision, AccessDecision::RedirectToLogin);
        assert_eq!(decision.redirect_target(&routes), Some("/login"));
    }

    #[test]
    fn test_unauthenticated_on_login_page_does_not_loop() {
        let routes = GuardRoutes::default();
        let session = Session { has_hydrated: true, ..Session::default() };

        assert_eq!(
            decide(&admins(), &session, "/login", Some("/envios"), &routes),
            AccessDecision::Pending
        );
    }

    #[test]
    fn test_missing_role_is_pending() {
        let routes = GuardRoutes::default();
        let session = Session {
            user: Some(user_with(None)),
            is_authenticated: true,
            has_hydrated: true,
        };
        assert_eq!(
            decide(&AccessRule::AnyAuthenticated, &session, "/dashboard", None, &routes),
            AccessDecision::Pending
        );

        // Authenticated flag set but no user record at all
        let bare = Session { user: None, ..session };
        assert_eq!(
            decide(&admins(), &bare, "/dashboard", None, &routes),
            AccessDecision::Pending
        );
    }

    #[test]
    fn test_open_access_allows_every_role() {
        let routes = GuardRoutes::default();
        let open = RequiredAccess::Roles(BTreeSet::new()).resolve(&PermissionTable::default());

        for role in Role::ALL {
            assert_eq!(
                decide(&open, &logged_in(role), "/tracking", None, &routes),
                AccessDecision::Allow
            );
        }
    }

    #[test]
    fn test_role_match() {
        let routes = GuardRoutes::default();
        let rule = admins();

        assert_eq!(
            decide(&rule, &logged_in(Role::Admin), "/administracion/choferes", None, &routes),
            AccessDecision::Allow
        );
        assert_ne!(
            decide(&rule, &logged_in(Role::Driver), "/administracion/choferes", None, &routes),
            AccessDecision::Allow
        );
    }

    #[test]
    fn test_mismatch_prefers_previous_path() {
        let routes = GuardRoutes::default();
        let decision = decide(
            &admins(),
            &logged_in(Role::User),
            "/admin/users",
            Some("/reports"),
            &routes,
        );
        assert_eq!(decision, AccessDecision::RedirectToPrevious("/reports".to_string()));
    }

    #[test]
    fn test_mismatch_falls_back_to_dashboard() {
        let routes = GuardRoutes::default();
        let session = logged_in(Role::User);

        assert_eq!(
            decide(&admins(), &session, "/admin/users", None, &routes),
            AccessDecision::RedirectToDefault("/dashboard".to_string())
        );
        assert_eq!(
            decide(&admins(), &session, "/admin/users", Some("/admin/users"), &routes),
            AccessDecision::RedirectToDefault("/dashboard".to_string())
        );
    }

    #[test]
    fn test_driver_bounced_from_choferes_back_to_dashboard() {
        use crate::history::NavigationHistory;

        let routes = GuardRoutes::default();
        let table = PermissionTable::default();
        let rule = RequiredAccess::Key("administracion.choferes".to_string()).resolve(&table);

        let mut history = NavigationHistory::default();
        history.record("/dashboard");
        history.record("/administracion/choferes");

        let decision = decide(
            &rule,
            &logged_in(Role::Driver),
            "/administracion/choferes",
            history.previous(),
            &routes,
        );
        assert_eq!(decision, AccessDecision::RedirectToPrevious("/dashboard".to_string()));
    }

    #[test]
    fn test_nobody_rule_denies_superadmin() {
        let routes = GuardRoutes::default();
        assert_eq!(
            decide(&AccessRule::Nobody, &logged_in(Role::SuperAdmin), "/x", None, &routes),
            AccessDecision::RedirectToDefault("/dashboard".to_string())
        );
    }

    #[test]
    fn test_custom_routes() {
        let routes = GuardRoutes {
            login_path: "/ingresar".to_string(),
            default_path: "/inicio".to_string(),
        };
        let anonymous = Session { has_hydrated: true, ..Session::default() };

        assert_eq!(
            decide(&admins(), &anonymous, "/ingresar", None, &routes),
            AccessDecision::Pending
        );
        assert_eq!(
            decide(&admins(), &logged_in(Role::Driver), "/envios", None, &routes),
            AccessDecision::RedirectToDefault("/inicio".to_string())
        );
    }
}
