//! Register session commands.

use mindoro_client::ClientError;
use mindoro_client::pos::StartSessionField;
use mindoro_core::SessionId;

use super::Context;

/// Fill in the opening form and start a session.
///
/// # Errors
///
/// Returns `ClientError::Pos` if the session could not be started.
pub async fn start(ctx: &mut Context, initial_cash: String, notes: String) -> Result<(), ClientError> {
    ctx.store
        .set_start_field(StartSessionField::InitialCash, initial_cash);
    ctx.store.set_start_field(StartSessionField::Notes, notes);

    let started = ctx.store.start_session(&ctx.api).await?;
    tracing::info!(
        session_id = %started.session_id,
        order_id = %started.order_id,
        "{}",
        ctx.store.state().pos.success_message
    );
    Ok(())
}

pub fn status(ctx: &Context) {
    let pos = &ctx.store.state().pos;
    tracing::info!(
        status = ?pos.status,
        session_id = pos.current_session_id.as_ref().map_or("-", |id| id.as_str()),
        order_id = pos.current_order_id.as_ref().map_or("-", |id| id.as_str()),
        success = pos.success_message.as_str(),
        error = pos.error_message.as_str(),
        "Register"
    );
}

/// List register sessions.
///
/// # Errors
///
/// Returns `ClientError::Pos` if the request fails.
pub async fn sessions(ctx: &mut Context) -> Result<(), ClientError> {
    let count = ctx.store.fetch_sessions(&ctx.api).await?;
    for session in &ctx.store.state().pos.sessions {
        tracing::info!(session = %session, "Session");
    }
    tracing::info!(count, "Sessions loaded");
    Ok(())
}

/// Show one register session.
///
/// # Errors
///
/// Returns `ClientError::Pos` if the request fails.
pub async fn details(ctx: &mut Context, session_id: String) -> Result<(), ClientError> {
    let session_id = SessionId::new(session_id);
    ctx.store.load_session_details(&ctx.api, &session_id).await?;
    if let Some(details) = &ctx.store.state().pos.session_details {
        let pretty = serde_json::to_string_pretty(details).unwrap_or_else(|_| details.to_string());
        tracing::info!("Session {session_id}:\n{pretty}");
    }
    Ok(())
}

/// Open a new order in a register session.
///
/// # Errors
///
/// Returns `ClientError::Pos` if the request fails.
pub async fn new_order(ctx: &mut Context, session_id: String) -> Result<(), ClientError> {
    let order_id = ctx
        .store
        .add_order(&ctx.api, &SessionId::new(session_id))
        .await?;
    tracing::info!(order_id = %order_id, "Order opened");
    Ok(())
}

pub fn reset(ctx: &mut Context) {
    ctx.store.reset_pos();
    tracing::info!("Register state reset");
}
