use sqlx::PgPool;

use crate::dto::DependencyHealthResponse;
use crate::state::AppState;

pub(super) async fn check_postgres(pool: &PgPool) -> DependencyHealthResponse {
    let check = sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await;

    match check {
        Ok(_) => DependencyHealthResponse::ok(),
        Err(error) => DependencyHealthResponse::error(format!("postgres check failed: {error}")),
    }
}

pub(super) async fn check_document_backend(state: &AppState) -> DependencyHealthResponse {
    match state.content_provider.check_health().await {
        Ok(()) => DependencyHealthResponse::ok(),
        Err(error) => DependencyHealthResponse::error(error.to_string()),
    }
}

pub(super) async fn check_text_generation(state: &AppState) -> DependencyHealthResponse {
    let status = state.document_analysis_service.text_generation_status().await;
    if status.available {
        DependencyHealthResponse::ok()
    } else {
        DependencyHealthResponse::error(format!(
            "text generation provider unavailable (model '{}')",
            status.current_model
        ))
    }
}
