use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::{DependencyHealthResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

mod checks;

use checks::{check_document_backend, check_postgres, check_text_generation};

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn detailed_health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<DetailedHealthResponse>) {
    let (database, document_backend, text_generation) = tokio::join!(
        check_postgres(&state.postgres_pool),
        check_document_backend(&state),
        check_text_generation(&state),
    );

    let (status, http_status) = overall_status(&database, &document_backend, &text_generation);

    (
        http_status,
        Json(DetailedHealthResponse {
            status,
            database,
            document_backend,
            text_generation,
        }),
    )
}

fn overall_status(
    database: &DependencyHealthResponse,
    document_backend: &DependencyHealthResponse,
    text_generation: &DependencyHealthResponse,
) -> (&'static str, StatusCode) {
    if !database.is_ok() {
        return ("unhealthy", StatusCode::SERVICE_UNAVAILABLE);
    }

    if document_backend.is_ok() && text_generation.is_ok() {
        ("ok", StatusCode::OK)
    } else {
        ("degraded", StatusCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::overall_status;
    use crate::dto::DependencyHealthResponse;

    #[test]
    fn database_failure_is_unhealthy() {
        let (status, http_status) = overall_status(
            &DependencyHealthResponse::error("connection refused".to_owned()),
            &DependencyHealthResponse::ok(),
            &DependencyHealthResponse::ok(),
        );
        assert_eq!(status, "unhealthy");
        assert_eq!(http_status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn provider_failure_only_degrades() {
        let (status, http_status) = overall_status(
            &DependencyHealthResponse::ok(),
            &DependencyHealthResponse::ok(),
            &DependencyHealthResponse::error("unreachable".to_owned()),
        );
        assert_eq!(status, "degraded");
        assert_eq!(http_status, StatusCode::OK);
    }
}
