use nerostack_domain::Principal;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

/// Largest page size any listing endpoint returns.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Resolves a requested page size into `1..=MAX_PAGE_LIMIT`.
#[must_use]
pub fn page_limit(requested: Option<usize>, default: usize) -> usize {
    requested.unwrap_or(default).clamp(1, MAX_PAGE_LIMIT)
}

/// Maps a present field to `Some`, so `null` arrives as `Some(None)` and an
/// absent field keeps its `#[serde(default)]` of `None`.
pub(super) fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Liveness response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Reachability of one dependency.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/dependency-health-response.ts"
)]
pub struct DependencyHealthResponse {
    pub status: &'static str,
    pub detail: Option<String>,
}

impl DependencyHealthResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok",
            detail: None,
        }
    }

    #[must_use]
    pub fn error(detail: String) -> Self {
        Self {
            status: "error",
            detail: Some(detail),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Dependency check response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/detailed-health-response.ts"
)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub database: DependencyHealthResponse,
    pub document_backend: DependencyHealthResponse,
    pub text_generation: DependencyHealthResponse,
}

/// Incoming payload for session bootstrap.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bootstrap-request.ts"
)]
pub struct BootstrapRequest {
    pub username: String,
    pub token: String,
}

/// API representation of the authenticated principal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
}

impl From<Principal> for UserIdentityResponse {
    fn from(value: Principal) -> Self {
        Self {
            subject: value.user_id.to_string(),
            username: value.username,
            display_name: value.display_name,
            email: value.email,
            role: value.role.as_str().to_owned(),
            is_active: value.is_active,
        }
    }
}
