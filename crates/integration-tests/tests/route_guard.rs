//! Integration tests for navigation through the route guard.

use mindoro_client::router::{DASHBOARD, LOGIN, NavigationDecision, Navigator};
use mindoro_client::storage::{DurableStorage, StorageScope};
use mindoro_integration_tests::{fresh_store, logged_in_store, reopen};

fn navigator() -> Navigator {
    Navigator::default()
}

#[test]
fn test_anonymous_visitor_is_sent_to_login_with_redirect() {
    let mut store = fresh_store();

    let nav = navigator().navigate(&mut store, "/admin/dashboard");

    let NavigationDecision::Redirect(redirect) = nav.decision else {
        panic!("expected a redirect, got {:?}", nav.decision);
    };
    assert_eq!(redirect.name, LOGIN);
    assert_eq!(redirect.path, "/auth/login");
    assert_eq!(
        redirect.query,
        vec![("redirect".to_string(), "/admin/dashboard".to_string())]
    );
    assert_eq!(redirect.to_url(), "/auth/login?redirect=%2Fadmin%2Fdashboard");
}

#[test]
fn test_redirect_keeps_query_of_target() {
    let mut store = fresh_store();

    let nav = navigator().navigate(&mut store, "/admin/pos/S1?tab=cart#receipt");

    let NavigationDecision::Redirect(redirect) = nav.decision else {
        panic!("expected a redirect");
    };
    assert_eq!(
        redirect.query,
        vec![("redirect".to_string(), "/admin/pos/S1?tab=cart".to_string())]
    );
}

#[test]
fn test_customer_is_kept_out_of_admin() {
    let mut store = logged_in_store("Customer", "c-1");

    let nav = navigator().navigate(&mut store, "/admin/inventory");

    let NavigationDecision::Redirect(redirect) = nav.decision else {
        panic!("expected a redirect");
    };
    assert_eq!(redirect.name, LOGIN);
    assert!(redirect.query.is_empty());
}

#[test]
fn test_staff_reach_admin_routes() {
    for role in ["Owner", "Employee"] {
        let mut store = logged_in_store(role, "staff-1");
        let nav = navigator().navigate(&mut store, "/admin/pos/S42");
        assert!(nav.decision.is_allowed(), "{role} should reach the register");
        assert_eq!(nav.route.name.as_deref(), Some("POS"));
        assert_eq!(nav.route.params.get("sessionId").map(String::as_str), Some("S42"));
    }
}

#[test]
fn test_staff_landing_goes_to_dashboard() {
    let mut store = logged_in_store("Employee", "e-1");

    let nav = navigator().navigate(&mut store, "/");

    assert_eq!(nav.decision.redirect_name(), Some(DASHBOARD));
    let NavigationDecision::Redirect(redirect) = nav.decision else {
        panic!("expected a redirect");
    };
    assert_eq!(redirect.to_url(), "/admin/dashboard");
}

#[test]
fn test_customer_landing_is_allowed() {
    let mut store = logged_in_store("Customer", "c-1");
    assert!(navigator().navigate(&mut store, "/").decision.is_allowed());
}

#[test]
fn test_staff_may_open_public_pages() {
    let mut store = logged_in_store("Owner", "o-1");
    assert!(navigator().navigate(&mut store, "/auth/login").decision.is_allowed());
}

#[test]
fn test_order_tracker_is_customer_only() {
    let mut customer = logged_in_store("Customer", "c-1");
    assert!(navigator().navigate(&mut customer, "/orderTracker").decision.is_allowed());

    let mut owner = logged_in_store("Owner", "o-1");
    assert_eq!(
        navigator().navigate(&mut owner, "/orderTracker").decision.redirect_name(),
        Some(LOGIN)
    );
}

#[test]
fn test_profile_pages_accept_any_role() {
    for role in ["Owner", "Employee", "Customer"] {
        let mut store = logged_in_store(role, "u-1");
        assert!(navigator().navigate(&mut store, "/editProfile").decision.is_allowed());
        assert!(navigator().navigate(&mut store, "/viewProfile").decision.is_allowed());
    }
}

#[test]
fn test_unknown_path_is_allowed() {
    let mut store = fresh_store();
    let nav = navigator().navigate(&mut store, "/no/such/page");
    assert!(!nav.route.is_matched());
    assert!(nav.decision.is_allowed());
}

#[test]
fn test_paths_match_case_insensitively() {
    let mut store = fresh_store();
    let nav = navigator().navigate(&mut store, "/ADMIN/Dashboard");
    assert_eq!(nav.decision.redirect_name(), Some(LOGIN));
}

#[test]
fn test_navigation_picks_up_session_from_storage() {
    // A session written by another store instance is seen on the next
    // navigation without an explicit hydrate.
    let storage = logged_in_store("Owner", "o-1").teardown();
    let mut store = mindoro_client::Store::new(storage, mindoro_client::StoreOptions::default());
    assert!(!store.is_authenticated());

    let nav = navigator().navigate(&mut store, "/admin/reports");

    assert!(nav.decision.is_allowed());
    assert!(store.is_authenticated());
}

#[test]
fn test_logout_locks_admin_again() {
    let storage = logged_in_store("Owner", "o-1").teardown();
    let mut store = reopen(storage);
    assert!(navigator().navigate(&mut store, "/admin/session").decision.is_allowed());

    store.logout();

    assert_eq!(
        navigator().navigate(&mut store, "/admin/session").decision.redirect_name(),
        Some(LOGIN)
    );
}

#[test]
fn test_corrupt_snapshot_navigates_as_anonymous() {
    let mut storage = DurableStorage::in_memory();
    storage
        .scope_mut(StorageScope::Persistent)
        .set("my-app-store", "{not json")
        .unwrap();
    let mut store = reopen(storage);

    let nav = navigator().navigate(&mut store, "/admin/dashboard");

    assert_eq!(nav.decision.redirect_name(), Some(LOGIN));
    assert!(
        store
            .storage()
            .scope(StorageScope::Persistent)
            .get("my-app-store")
            .unwrap()
            .is_none()
    );
}
