//! Client routes and the role-based navigation guard.
//!
//! # Architecture
//!
//! - [`RouteTable`] holds nested [`RouteRecord`]s and resolves a target path
//!   into a [`ResolvedRoute`] (matched record chain, params, query)
//! - [`guard`] decides from the resolved route and the auth state whether to
//!   allow the navigation or redirect
//! - [`Navigator`] ties both to a [`crate::Store`]: it re-initializes auth
//!   from the snapshot before every decision

mod guard;
mod table;

pub use guard::{Navigation, NavigationDecision, Navigator, Redirect, guard};
pub use table::{MatchedRecord, ResolvedRoute, RouteMeta, RouteRecord, RouteTable};

/// Name of the storefront landing route.
pub const LANDING: &str = "landing";
/// Name of the login route.
pub const LOGIN: &str = "login";
/// Name of the admin dashboard route.
pub const DASHBOARD: &str = "dashboard";
