use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use nerostack_application::{CreatePrincipalInput, PrincipalFilter};
use nerostack_core::UserIdentity;
use nerostack_domain::{PrincipalChanges, PrincipalRole, UserId};

use crate::dto::{
    CreatePrincipalRequest, UpdatePrincipalRequest, UserIdentityResponse, page_limit,
};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct PrincipalListParams {
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn list_principals_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<PrincipalListParams>,
) -> ApiResult<Json<Vec<UserIdentityResponse>>> {
    let defaults = PrincipalFilter::default();
    let role = params
        .role
        .as_deref()
        .map(str::parse::<PrincipalRole>)
        .transpose()?;

    let principals = state
        .principal_administration_service
        .list_principals(
            &user,
            PrincipalFilter {
                role,
                is_active: params.is_active,
                search: params.search,
                limit: page_limit(params.limit, defaults.limit),
                offset: params.offset.unwrap_or(0),
            },
        )
        .await?;

    Ok(Json(
        principals
            .into_iter()
            .map(UserIdentityResponse::from)
            .collect(),
    ))
}

pub async fn create_principal_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreatePrincipalRequest>,
) -> ApiResult<(StatusCode, Json<UserIdentityResponse>)> {
    let principal = state
        .principal_administration_service
        .create_principal(&user, CreatePrincipalInput::try_from(payload)?)
        .await?;

    Ok((StatusCode::CREATED, Json(UserIdentityResponse::from(principal))))
}

pub async fn get_principal_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let principal = state
        .principal_administration_service
        .get_principal(&user, UserId::parse(user_id.as_str())?)
        .await?;

    Ok(Json(UserIdentityResponse::from(principal)))
}

pub async fn update_principal_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdatePrincipalRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let principal = state
        .principal_administration_service
        .update_principal(
            &user,
            UserId::parse(user_id.as_str())?,
            PrincipalChanges::try_from(payload)?,
        )
        .await?;

    Ok(Json(UserIdentityResponse::from(principal)))
}

pub async fn activate_principal_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let principal = state
        .principal_administration_service
        .activate_principal(&user, UserId::parse(user_id.as_str())?)
        .await?;

    Ok(Json(UserIdentityResponse::from(principal)))
}

pub async fn deactivate_principal_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let principal = state
        .principal_administration_service
        .deactivate_principal(&user, UserId::parse(user_id.as_str())?)
        .await?;

    Ok(Json(UserIdentityResponse::from(principal)))
}

pub async fn delete_principal_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .principal_administration_service
        .delete_principal(&user, UserId::parse(user_id.as_str())?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
