//! Route guard command.

use mindoro_client::router::{NavigationDecision, Navigator};

use super::Context;

pub fn run(ctx: &mut Context, path: &str) {
    let navigation = Navigator::default().navigate(&mut ctx.store, path);
    let route = &navigation.route;

    match &navigation.decision {
        NavigationDecision::Allow => tracing::info!(
            path = %route.full_path,
            name = route.name.as_deref().unwrap_or("-"),
            "Allowed"
        ),
        NavigationDecision::Redirect(redirect) => tracing::info!(
            path = %route.full_path,
            redirect = %redirect.to_url(),
            "Redirected to {}",
            redirect.name
        ),
    }
}
