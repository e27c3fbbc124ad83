//! Session commands.

use mindoro_client::ClientError;
use mindoro_client::api::RegistrationForm;
use mindoro_client::auth::SessionToken;

use super::Context;

/// Log in with a session token, or exchange an identity-provider token.
///
/// # Errors
///
/// Returns `ClientError` if the token cannot be decoded or the backend
/// refuses the login.
pub async fn login(
    ctx: &mut Context,
    token: Option<String>,
    id_token: Option<String>,
    fcm_token: Option<&str>,
) -> Result<(), ClientError> {
    let claims = match (token, id_token) {
        (Some(token), _) => {
            if let Some(fcm_token) = fcm_token {
                ctx.store.set_fcm_token(Some(fcm_token.to_string()));
            }
            ctx.store.login_with_token(SessionToken::new(token))?
        }
        (None, Some(id_token)) => {
            ctx.store
                .login_remote(&ctx.api, &id_token, fcm_token)
                .await?
        }
        (None, None) => {
            return Err(ClientError::Rejected(
                "Either --token or --id-token is required.".to_string(),
            ));
        }
    };

    tracing::info!(
        user_id = %claims.user_id,
        role = %claims.role,
        expires_at = ?claims.expires_at(),
        "Logged in"
    );
    Ok(())
}

/// Register a customer account. The new account still has to log in.
///
/// # Errors
///
/// Returns `ClientError` if the backend refuses the registration.
pub async fn register(ctx: &Context, form: &RegistrationForm) -> Result<(), ClientError> {
    let created = ctx.store.register_customer(&ctx.api, form).await?;
    tracing::info!(email = form.email.as_str(), account = %created, "Registered");
    Ok(())
}

pub fn logout(ctx: &mut Context) {
    ctx.store.logout();
}

pub fn whoami(ctx: &Context) {
    let auth = &ctx.store.state().auth;
    match (auth.user_id(), auth.account_type()) {
        (Some(user_id), Some(role)) => {
            tracing::info!(user_id = %user_id, role = %role, "Authenticated");
        }
        _ => tracing::info!("Not logged in"),
    }
}
