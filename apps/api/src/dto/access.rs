use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::deserialize_present;

mod conversions;

/// Incoming payload for granting an access window.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-access-window-request.ts"
)]
pub struct CreateAccessWindowRequest {
    pub principal_id: String,
    pub document_id: Option<i64>,
    pub cabinet_id: Option<i64>,
    pub start_at: String,
    pub end_at: String,
    pub access_level: Option<String>,
    pub reason: Option<String>,
}

/// Incoming payload for a partial access window update.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-access-window-request.ts"
)]
pub struct UpdateAccessWindowRequest {
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub access_level: Option<String>,
    pub is_enabled: Option<bool>,
    /// Absent keeps the reason; `null` or a blank string clears it.
    #[serde(default, deserialize_with = "deserialize_present")]
    #[ts(optional)]
    pub reason: Option<Option<String>>,
}

/// API representation of an access window and its derived state.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-window-response.ts"
)]
pub struct AccessWindowResponse {
    pub window_id: String,
    pub principal_id: String,
    pub document_id: Option<i64>,
    pub cabinet_id: Option<i64>,
    pub start_at: String,
    pub end_at: String,
    pub access_level: String,
    pub is_enabled: bool,
    pub reason: Option<String>,
    pub granted_by: String,
    pub created_at: String,
    pub updated_at: String,
    pub status: String,
    pub is_valid: bool,
    pub is_expired: bool,
    pub is_pending: bool,
    pub seconds_remaining: i64,
}

/// API representation of an authorization decision.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-decision-response.ts"
)]
pub struct AccessDecisionResponse {
    pub document_id: i64,
    pub allowed: bool,
    pub reason: String,
    pub access_level: Option<String>,
    pub expires_at: Option<String>,
    pub seconds_remaining: Option<i64>,
    pub window_id: Option<String>,
    pub denial_detail: Option<String>,
}

/// Window counts per dashboard bucket.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-dashboard-counts-response.ts"
)]
pub struct AccessDashboardCountsResponse {
    pub active: usize,
    pub pending: usize,
    pub expired: usize,
    pub revoked: usize,
    pub total: usize,
}

/// The caller's windows bucketed by lifecycle status.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-dashboard-response.ts"
)]
pub struct AccessDashboardResponse {
    pub active: Vec<AccessWindowResponse>,
    pub pending: Vec<AccessWindowResponse>,
    pub expired: Vec<AccessWindowResponse>,
    pub revoked: Vec<AccessWindowResponse>,
    pub counts: AccessDashboardCountsResponse,
}

/// Documents the caller may open right now.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/accessible-documents-response.ts"
)]
pub struct AccessibleDocumentsResponse {
    pub all: bool,
    pub document_ids: Vec<i64>,
}
