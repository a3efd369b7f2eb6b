use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use super::{LoginRequest, LoginResponse};
use crate::gateway::{Gateway, GatewayError, RequestDescriptor};
use crate::session::UserInfo;

/// Sign in and start the session with the returned token.
///
/// This is the shared logic used by both the CLI `flowdesk login`
/// subcommand and the `/login` REPL command.
pub async fn login(gateway: &Gateway, username: &str, password: &str) -> Result<LoginResponse> {
    let request = RequestDescriptor::post("/api/auth/login")
        .json_from(&LoginRequest { username, password })?;
    let response: LoginResponse = gateway
        .send_json(request)
        .await
        .context("login failed")?;
    gateway
        .session()
        .begin(&response.token, response.user_info.as_ref())
        .context("failed to save session")?;
    info!(username, "signed in");
    Ok(response)
}

/// Notify the backend, then tear the session down locally no matter what
/// the backend said.
pub async fn logout(gateway: &Gateway) -> Result<()> {
    if gateway.session().is_authenticated()
        && let Err(e) = gateway.send(RequestDescriptor::post("/api/auth/logout")).await
    {
        warn!(error = %e, "backend logout failed, clearing local session anyway");
    }
    gateway.session().end()
}

pub async fn register(gateway: &Gateway, user: &Value) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::post("/api/auth/register").json(user.clone()))
        .await?
        .into_json()
}

pub async fn current_user(gateway: &Gateway) -> Result<UserInfo, GatewayError> {
    gateway.send_json(RequestDescriptor::get("/api/auth/me")).await
}
