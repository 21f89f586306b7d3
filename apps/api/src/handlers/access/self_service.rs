use super::*;

#[derive(Debug, serde::Deserialize)]
pub struct MyAccessWindowsParams {
    pub valid_only: Option<bool>,
}

pub async fn my_access_windows_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<MyAccessWindowsParams>,
) -> ApiResult<Json<Vec<AccessWindowResponse>>> {
    let windows = state
        .access_decision_service
        .my_windows(&user, params.valid_only.unwrap_or(false))
        .await?;

    Ok(Json(AccessWindowResponse::list(&windows, Utc::now())))
}

pub async fn access_dashboard_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<AccessDashboardResponse>> {
    let dashboard = state.access_decision_service.access_dashboard(&user).await?;

    Ok(Json(AccessDashboardResponse::at(&dashboard, Utc::now())))
}

pub async fn check_access_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(document_id): Path<i64>,
) -> ApiResult<Json<AccessDecisionResponse>> {
    let document_id = DocumentId::new(document_id);
    let decision = state
        .access_decision_service
        .check_access(&user, document_id)
        .await?;

    Ok(Json(AccessDecisionResponse::new(document_id, decision)))
}
