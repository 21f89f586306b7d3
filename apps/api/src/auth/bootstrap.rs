use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use nerostack_core::{AppError, UserIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::dto::BootstrapRequest;
use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_CREATED_AT_KEY, SESSION_USER_KEY};

pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let principal = state
        .principal_service
        .find_active_by_username(payload.username.as_str())
        .await?;

    let identity = UserIdentity::new(
        principal.user_id.to_string(),
        principal.display_name.clone(),
        Some(principal.email.clone()),
    );

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    info!(user_id = %principal.user_id, username = %principal.username, "session bootstrapped");
    Ok(StatusCode::NO_CONTENT)
}
