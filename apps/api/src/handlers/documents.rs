use axum::Json;
use axum::extract::{Extension, Path, State};

use nerostack_core::UserIdentity;
use nerostack_domain::DocumentId;

use crate::dto::{AccessibleDocumentsResponse, DocumentContentResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn accessible_documents_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<AccessibleDocumentsResponse>> {
    let scope = state
        .access_decision_service
        .accessible_documents(&user)
        .await?;

    Ok(Json(AccessibleDocumentsResponse::from(scope)))
}

pub async fn document_content_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(document_id): Path<i64>,
) -> ApiResult<Json<DocumentContentResponse>> {
    let content = state
        .document_analysis_service
        .document_content(&user, DocumentId::new(document_id))
        .await?;

    Ok(Json(DocumentContentResponse {
        document_id,
        length: content.chars().count(),
        content,
    }))
}
