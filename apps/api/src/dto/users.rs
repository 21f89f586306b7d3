use nerostack_application::CreatePrincipalInput;
use nerostack_core::AppError;
use nerostack_domain::{PrincipalChanges, PrincipalRole};
use serde::Deserialize;
use ts_rs::TS;

use super::common::deserialize_present;

/// Incoming payload for creating a principal.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-principal-request.ts"
)]
pub struct CreatePrincipalRequest {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub content_token: Option<String>,
}

/// Incoming payload for a partial principal update.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-principal-request.ts"
)]
pub struct UpdatePrincipalRequest {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    /// Absent keeps the token; `null` or a blank string removes it.
    #[serde(default, deserialize_with = "deserialize_present")]
    #[ts(optional)]
    pub content_token: Option<Option<String>>,
}

impl TryFrom<CreatePrincipalRequest> for CreatePrincipalInput {
    type Error = AppError;

    fn try_from(value: CreatePrincipalRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            username: value.username,
            email: value.email,
            display_name: value.display_name,
            role: value
                .role
                .as_deref()
                .map(str::parse::<PrincipalRole>)
                .transpose()?,
            content_token: value.content_token,
        })
    }
}

impl TryFrom<UpdatePrincipalRequest> for PrincipalChanges {
    type Error = AppError;

    fn try_from(value: UpdatePrincipalRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: value.email,
            display_name: value.display_name,
            role: value
                .role
                .as_deref()
                .map(str::parse::<PrincipalRole>)
                .transpose()?,
            is_active: value.is_active,
            content_token: value.content_token.map(|token| {
                token
                    .map(|token| token.trim().to_owned())
                    .filter(|token| !token.is_empty())
            }),
        })
    }
}
