use super::*;

#[derive(Debug, serde::Deserialize)]
pub struct AccessWindowListParams {
    pub principal_id: Option<String>,
    pub document_id: Option<i64>,
    pub is_enabled: Option<bool>,
    pub currently_valid: Option<bool>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn list_access_windows_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<AccessWindowListParams>,
) -> ApiResult<Json<Vec<AccessWindowResponse>>> {
    let defaults = AccessWindowListQuery::default();
    let principal_id = params
        .principal_id
        .as_deref()
        .map(UserId::parse)
        .transpose()?;

    let windows = state
        .access_administration_service
        .list_windows(
            &user,
            AccessWindowListQuery {
                principal_id,
                document_id: params.document_id.map(DocumentId::new),
                is_enabled: params.is_enabled,
                currently_valid: params.currently_valid.unwrap_or(false),
                limit: page_limit(params.limit, defaults.limit),
                offset: params.offset.unwrap_or(0),
            },
        )
        .await?;

    Ok(Json(AccessWindowResponse::list(&windows, Utc::now())))
}

pub async fn create_access_window_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateAccessWindowRequest>,
) -> ApiResult<(StatusCode, Json<AccessWindowResponse>)> {
    let window = state
        .access_administration_service
        .create_window(&user, CreateAccessWindowInput::try_from(payload)?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccessWindowResponse::at(&window, Utc::now())),
    ))
}

pub async fn get_access_window_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(window_id): Path<String>,
) -> ApiResult<Json<AccessWindowResponse>> {
    let window = state
        .access_administration_service
        .get_window(&user, AccessWindowId::parse(window_id.as_str())?)
        .await?;

    Ok(Json(AccessWindowResponse::at(&window, Utc::now())))
}

pub async fn update_access_window_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(window_id): Path<String>,
    Json(payload): Json<UpdateAccessWindowRequest>,
) -> ApiResult<Json<AccessWindowResponse>> {
    let window = state
        .access_administration_service
        .update_window(
            &user,
            AccessWindowId::parse(window_id.as_str())?,
            AccessWindowChanges::try_from(payload)?,
        )
        .await?;

    Ok(Json(AccessWindowResponse::at(&window, Utc::now())))
}

pub async fn revoke_access_window_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(window_id): Path<String>,
) -> ApiResult<Json<AccessWindowResponse>> {
    let window = state
        .access_administration_service
        .revoke_window(&user, AccessWindowId::parse(window_id.as_str())?)
        .await?;

    Ok(Json(AccessWindowResponse::at(&window, Utc::now())))
}

pub async fn delete_access_window_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(window_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .access_administration_service
        .delete_window(&user, AccessWindowId::parse(window_id.as_str())?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
