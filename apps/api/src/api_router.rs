use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use nerostack_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;

pub fn build_router(
    app_state: AppState,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let cors_layer = cors::build_cors_layer(app_state.frontend_url.as_str())?;

    let access_routes = Router::new()
        .route(
            "/api/access",
            get(handlers::access::list_access_windows_handler)
                .post(handlers::access::create_access_window_handler),
        )
        .route(
            "/api/access/my-accesses",
            get(handlers::access::my_access_windows_handler),
        )
        .route(
            "/api/access/dashboard",
            get(handlers::access::access_dashboard_handler),
        )
        .route(
            "/api/access/check/{document_id}",
            get(handlers::access::check_access_handler),
        )
        .route(
            "/api/access/{window_id}",
            get(handlers::access::get_access_window_handler)
                .put(handlers::access::update_access_window_handler)
                .patch(handlers::access::update_access_window_handler)
                .delete(handlers::access::delete_access_window_handler),
        )
        .route(
            "/api/access/{window_id}/revoke",
            post(handlers::access::revoke_access_window_handler),
        );

    let user_routes = Router::new()
        .route(
            "/api/users",
            get(handlers::users::list_principals_handler)
                .post(handlers::users::create_principal_handler),
        )
        .route(
            "/api/users/{user_id}",
            get(handlers::users::get_principal_handler)
                .put(handlers::users::update_principal_handler)
                .patch(handlers::users::update_principal_handler)
                .delete(handlers::users::delete_principal_handler),
        )
        .route(
            "/api/users/{user_id}/activate",
            post(handlers::users::activate_principal_handler),
        )
        .route(
            "/api/users/{user_id}/deactivate",
            post(handlers::users::deactivate_principal_handler),
        );

    let document_routes = Router::new()
        .route(
            "/api/documents/accessible",
            get(handlers::documents::accessible_documents_handler),
        )
        .route(
            "/api/documents/{document_id}/content",
            get(handlers::documents::document_content_handler),
        );

    let analysis_routes = Router::new()
        .route(
            "/api/ai/analyze/{document_id}",
            post(handlers::analysis::analyze_document_handler),
        )
        .route(
            "/api/ai/summary/{document_id}",
            post(handlers::analysis::summary_handler),
        )
        .route(
            "/api/ai/keywords/{document_id}",
            post(handlers::analysis::keywords_handler),
        )
        .route(
            "/api/ai/ask/{document_id}",
            post(handlers::analysis::ask_question_handler),
        )
        .route(
            "/api/ai/history",
            get(handlers::analysis::analysis_history_handler),
        )
        .route(
            "/api/ai/analysis/{analysis_id}",
            get(handlers::analysis::get_analysis_handler),
        )
        .route(
            "/api/ai/status",
            get(handlers::analysis::text_generation_status_handler),
        )
        .route("/api/ai/models", get(handlers::analysis::list_models_handler));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .merge(access_routes)
        .merge(user_routes)
        .merge(document_routes)
        .merge(analysis_routes)
        .route_layer(from_fn(middleware::require_auth));

    Ok(Router::new()
        .route("/api/health", get(handlers::health::health_handler))
        .route(
            "/api/health/detailed",
            get(handlers::health::detailed_health_handler),
        )
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
