//! The navigation guard.

use tracing::{debug, instrument};
use url::form_urlencoded;

use mindoro_core::Role;

use super::table::{ResolvedRoute, RouteTable};
use super::{DASHBOARD, LANDING, LOGIN};
use crate::auth::AuthState;
use crate::error::add_breadcrumb;
use crate::store::Store;

/// Where a refused navigation goes instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Route name.
    pub name: String,
    /// Route path, `/` if the name is not in the table.
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Redirect {
    fn to_named(table: &RouteTable, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: table.path_for(name).unwrap_or("/").to_string(),
            query: Vec::new(),
        }
    }

    #[must_use]
    fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Path with the query encoded, e.g. `/auth/login?redirect=%2Fadmin%2Fdashboard`.
    #[must_use]
    pub fn to_url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish();
        format!("{}?{query}", self.path)
    }
}

/// Outcome of the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Redirect(Redirect),
}

impl NavigationDecision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Name of the redirect target, if redirected.
    #[must_use]
    pub fn redirect_name(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Redirect(redirect) => Some(&redirect.name),
        }
    }
}

/// Decide whether the current session may navigate to `to`.
///
/// In priority order:
/// 1. Owners and employees going to the landing page are sent to the
///    dashboard.
/// 2. If any matched record requires auth: without a role, go to login with
///    `redirect=<full path>`; with a role some matched record excludes, go
///    to login; otherwise allow.
/// 3. Otherwise allow. Unmatched paths are allowed.
#[must_use]
pub fn guard(table: &RouteTable, to: &ResolvedRoute, auth: &AuthState) -> NavigationDecision {
    let role = auth.account_type();

    if to.name.as_deref() == Some(LANDING) && role.is_some_and(Role::is_privileged) {
        return NavigationDecision::Redirect(Redirect::to_named(table, DASHBOARD));
    }

    if !to.matched.iter().any(|record| record.meta.requires_auth) {
        return NavigationDecision::Allow;
    }

    let Some(role) = role else {
        return NavigationDecision::Redirect(
            Redirect::to_named(table, LOGIN).with_query("redirect", &to.full_path),
        );
    };

    if to.matched.iter().any(|record| record.meta.excludes(role)) {
        return NavigationDecision::Redirect(Redirect::to_named(table, LOGIN));
    }

    NavigationDecision::Allow
}

/// A resolved navigation and the guard's decision on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub route: ResolvedRoute,
    pub decision: NavigationDecision,
}

/// Runs the guard for navigations against a store.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    table: RouteTable,
}

impl Navigator {
    #[must_use]
    pub const fn new(table: RouteTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub const fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Resolve `target`, re-initialize auth from the snapshot, and decide.
    #[instrument(skip(self, store))]
    pub fn navigate(&self, store: &mut Store, target: &str) -> Navigation {
        let route = self.table.resolve(target);
        store.initialize();
        let decision = guard(&self.table, &route, &store.state().auth);

        match &decision {
            NavigationDecision::Allow => {
                debug!(path = %route.full_path, "Navigation allowed");
                add_breadcrumb("navigation", "Navigated", &[("to", route.full_path.as_str())]);
            }
            NavigationDecision::Redirect(redirect) => {
                let url = redirect.to_url();
                debug!(path = %route.full_path, redirect = %url, "Navigation redirected");
                add_breadcrumb(
                    "navigation",
                    "Redirected",
                    &[("to", route.full_path.as_str()), ("redirect", url.as_str())],
                );
            }
        }

        Navigation { route, decision }
    }
}
