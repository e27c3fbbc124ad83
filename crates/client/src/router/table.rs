//! Route records and path resolution.

use std::collections::BTreeMap;

use url::form_urlencoded;

use mindoro_core::Role;

use super::{DASHBOARD, LANDING, LOGIN};

/// Access rules attached to a route record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    /// Roles allowed through; `None` means any authenticated role.
    pub allowed_roles: Option<Vec<Role>>,
}

impl RouteMeta {
    /// Whether `role` is excluded by this record's role list.
    #[must_use]
    pub fn excludes(&self, role: Role) -> bool {
        self.allowed_roles
            .as_ref()
            .is_some_and(|roles| !roles.contains(&role))
    }
}

/// A route definition. Child paths without a leading `/` are relative to the
/// parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub path: String,
    pub name: Option<String>,
    pub meta: RouteMeta,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn requires_auth(mut self) -> Self {
        self.meta.requires_auth = true;
        self
    }

    #[must_use]
    pub fn allowed_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.meta.allowed_roles = Some(roles.into_iter().collect());
        self
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }
}

/// One record on the matched chain of a resolved route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRecord {
    /// Absolute path pattern, e.g. `/admin/pos/:sessionId`.
    pub path: String,
    pub name: Option<String>,
    pub meta: RouteMeta,
}

/// A target path resolved against the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// Path without query or fragment.
    pub path: String,
    /// Path and query, as navigated to.
    pub full_path: String,
    /// Name of the matched leaf record.
    pub name: Option<String>,
    pub params: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    /// Matched records, outermost first. Empty if nothing matched.
    pub matched: Vec<MatchedRecord>,
}

impl ResolvedRoute {
    /// Whether any record matched.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        !self.matched.is_empty()
    }

    /// Query value for `key`, if present.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A flattened record: its segments and the chain of records leading to it.
#[derive(Debug, Clone)]
struct CompiledRoute {
    segments: Vec<Segment>,
    chain: Vec<MatchedRecord>,
}

/// The application's route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
    names: BTreeMap<String, String>,
}

impl RouteTable {
    /// Build a table from top-level records.
    #[must_use]
    pub fn new(records: impl IntoIterator<Item = RouteRecord>) -> Self {
        let mut table = Self {
            routes: Vec::new(),
            names: BTreeMap::new(),
        };
        for record in records {
            table.flatten(&record, "", &[]);
        }
        table
    }

    /// Children are emitted before their parent so that the most specific
    /// record wins on equal paths.
    fn flatten(&mut self, record: &RouteRecord, parent_path: &str, parents: &[MatchedRecord]) {
        let path = join_path(parent_path, &record.path);
        let matched = MatchedRecord {
            path: path.clone(),
            name: record.name.clone(),
            meta: record.meta.clone(),
        };
        let mut chain = parents.to_vec();
        chain.push(matched);

        for child in &record.children {
            self.flatten(child, &path, &chain);
        }

        if let Some(name) = &record.name {
            self.names.entry(name.clone()).or_insert_with(|| path.clone());
        }
        self.routes.push(CompiledRoute {
            segments: parse_segments(&path),
            chain,
        });
    }

    /// The routes of the Mindoro Auto Parts client.
    #[must_use]
    pub fn default_routes() -> Self {
        let privileged = [Role::Owner, Role::Employee];
        let admin_children = [
            ("dashboard", DASHBOARD),
            ("inventory", "Manage Inventory"),
            ("pos/:sessionId", "POS"),
            ("payment", "Payment"),
            ("session", "Session"),
            ("addAccount", "Add Account"),
            ("addAccountVerify", "Add Account Verify"),
            ("addAccountInfo", "Add Account Info"),
            ("onlineCustomer", "Online Customer"),
            ("reports", "Reports"),
        ]
        .map(|(path, name)| RouteRecord::new(path).named(name));

        Self::new([
            RouteRecord::new("/").children([RouteRecord::new("/").named(LANDING)]),
            RouteRecord::new("/").children([
                RouteRecord::new("/orderTracker")
                    .named("orderTracker")
                    .requires_auth()
                    .allowed_roles([Role::Customer]),
                RouteRecord::new("/editProfile")
                    .named("Edit Profile")
                    .requires_auth(),
                RouteRecord::new("/viewProfile")
                    .named("View Profile")
                    .requires_auth(),
            ]),
            RouteRecord::new("/admin")
                .requires_auth()
                .allowed_roles(privileged)
                .children(admin_children),
            RouteRecord::new("/auth/login").named(LOGIN),
            RouteRecord::new("/auth/register").named("register"),
            RouteRecord::new("/auth/verifyEmail").named("verifyEmail"),
        ])
    }

    /// Absolute path of the named route (params left as placeholders).
    #[must_use]
    pub fn path_for(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    /// Resolve a target such as `/admin/pos/S1?tab=cart#top`.
    #[must_use]
    pub fn resolve(&self, target: &str) -> ResolvedRoute {
        let without_fragment = target.split_once('#').map_or(target, |(before, _)| before);
        let (raw_path, raw_query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));

        let path = if raw_path.starts_with('/') {
            raw_path.to_string()
        } else {
            format!("/{raw_path}")
        };
        let query: Vec<(String, String)> = form_urlencoded::parse(raw_query.as_bytes())
            .into_owned()
            .collect();
        let full_path = if raw_query.is_empty() {
            path.clone()
        } else {
            format!("{path}?{raw_query}")
        };

        let target_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let found = self
            .routes
            .iter()
            .find_map(|route| match_segments(&route.segments, &target_segments).map(|p| (route, p)));

        let (name, params, matched) = match found {
            Some((route, params)) => (
                route.chain.last().and_then(|leaf| leaf.name.clone()),
                params,
                route.chain.clone(),
            ),
            None => (None, BTreeMap::new(), Vec::new()),
        };

        ResolvedRoute {
            path,
            full_path,
            name,
            params,
            query,
            matched,
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::default_routes()
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        child.to_string()
    } else if child.is_empty() {
        parent.to_string()
    } else {
        format!("{}/{child}", parent.trim_end_matches('/'))
    }
}

fn parse_segments(path: &str) -> Vec<Segment> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.strip_prefix(':').map_or_else(
                || Segment::Literal(s.to_string()),
                |param| Segment::Param(param.to_string()),
            )
        })
        .collect()
}

fn match_segments(pattern: &[Segment], target: &[&str]) -> Option<BTreeMap<String, String>> {
    if pattern.len() != target.len() {
        return None;
    }
    let mut params = BTreeMap::new();
    for (segment, value) in pattern.iter().zip(target) {
        match segment {
            Segment::Literal(literal) if literal.eq_ignore_ascii_case(value) => {}
            Segment::Literal(_) => return None,
            Segment::Param(name) => {
                params.insert(name.clone(), (*value).to_string());
            }
        }
    }
    Some(params)
}
