use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use nerostack_core::{AppError, UserIdentity};
use tower_sessions::Session;
use url::Url;

use crate::auth::SESSION_USER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        verify_same_origin(request.headers(), state.frontend_url.as_str())?;
    }

    Ok(next.run(request).await)
}

fn verify_same_origin(headers: &HeaderMap, allowed_origin: &str) -> Result<(), AppError> {
    if headers.get("sec-fetch-site") == Some(&HeaderValue::from_static("cross-site")) {
        return Err(AppError::Unauthorized("cross-site request blocked".to_owned()));
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if !same_origin(origin, allowed_origin) && !same_origin(referer, allowed_origin) {
        return Err(AppError::Unauthorized("origin validation failed".to_owned()));
    }

    Ok(())
}

/// Compares scheme, host and port. Unparseable values never match.
fn same_origin(candidate: &str, allowed_origin: &str) -> bool {
    match (Url::parse(candidate), Url::parse(allowed_origin)) {
        (Ok(candidate), Ok(allowed)) => {
            candidate.origin().is_tuple() && candidate.origin() == allowed.origin()
        }
        _ => false,
    }
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
