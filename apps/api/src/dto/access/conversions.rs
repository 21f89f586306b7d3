use chrono::{DateTime, Utc};
use nerostack_application::{
    AccessDashboard, AccessDecision, CreateAccessWindowInput, DocumentScope,
};
use nerostack_core::{AppError, AppResult};
use nerostack_domain::{
    AccessLevel, AccessWindow, AccessWindowChanges, CabinetId, DocumentId, UserId,
};

use super::{
    AccessDashboardCountsResponse, AccessDashboardResponse, AccessDecisionResponse,
    AccessWindowResponse, AccessibleDocumentsResponse, CreateAccessWindowRequest,
    UpdateAccessWindowRequest,
};

fn parse_timestamp(field: &str, value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| {
            AppError::Validation(format!("{field} must be an RFC 3339 timestamp: {error}"))
        })
}

impl TryFrom<CreateAccessWindowRequest> for CreateAccessWindowInput {
    type Error = AppError;

    fn try_from(value: CreateAccessWindowRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            principal_id: UserId::parse(value.principal_id.as_str())?,
            document_id: value.document_id.map(DocumentId::new),
            cabinet_id: value.cabinet_id.map(CabinetId::new),
            start_at: parse_timestamp("start_at", value.start_at.as_str())?,
            end_at: parse_timestamp("end_at", value.end_at.as_str())?,
            access_level: value
                .access_level
                .as_deref()
                .map(str::parse::<AccessLevel>)
                .transpose()?
                .unwrap_or_default(),
            reason: value.reason,
        })
    }
}

impl TryFrom<UpdateAccessWindowRequest> for AccessWindowChanges {
    type Error = AppError;

    fn try_from(value: UpdateAccessWindowRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            start_at: value
                .start_at
                .as_deref()
                .map(|start_at| parse_timestamp("start_at", start_at))
                .transpose()?,
            end_at: value
                .end_at
                .as_deref()
                .map(|end_at| parse_timestamp("end_at", end_at))
                .transpose()?,
            access_level: value
                .access_level
                .as_deref()
                .map(str::parse::<AccessLevel>)
                .transpose()?,
            is_enabled: value.is_enabled,
            reason: value.reason.map(|reason| {
                reason
                    .map(|reason| reason.trim().to_owned())
                    .filter(|reason| !reason.is_empty())
            }),
        })
    }
}

impl AccessWindowResponse {
    /// Renders a window with its state derived at `now`.
    #[must_use]
    pub fn at(window: &AccessWindow, now: DateTime<Utc>) -> Self {
        let evaluation = window.evaluate(now);
        Self {
            window_id: window.id().to_string(),
            principal_id: window.principal_id().to_string(),
            document_id: window.document_id().map(|document_id| document_id.value()),
            cabinet_id: window.cabinet_id().map(|cabinet_id| cabinet_id.value()),
            start_at: window.start_at().to_rfc3339(),
            end_at: window.end_at().to_rfc3339(),
            access_level: window.access_level().as_str().to_owned(),
            is_enabled: window.is_enabled(),
            reason: window.reason().map(str::to_owned),
            granted_by: window.granted_by().to_string(),
            created_at: window.created_at().to_rfc3339(),
            updated_at: window.updated_at().to_rfc3339(),
            status: window.status_at(now).as_str().to_owned(),
            is_valid: evaluation.is_valid,
            is_expired: evaluation.is_expired,
            is_pending: evaluation.is_pending,
            seconds_remaining: evaluation.seconds_remaining,
        }
    }

    /// Renders a list of windows against one shared instant.
    #[must_use]
    pub fn list(windows: &[AccessWindow], now: DateTime<Utc>) -> Vec<Self> {
        windows.iter().map(|window| Self::at(window, now)).collect()
    }
}

impl AccessDecisionResponse {
    #[must_use]
    pub fn new(document_id: DocumentId, decision: AccessDecision) -> Self {
        Self {
            document_id: document_id.value(),
            allowed: decision.allowed,
            reason: decision.reason.as_str().to_owned(),
            access_level: decision
                .access_level
                .map(|access_level| access_level.as_str().to_owned()),
            expires_at: decision.expires_at.map(|expires_at| expires_at.to_rfc3339()),
            seconds_remaining: decision.seconds_remaining,
            window_id: decision.window_id.map(|window_id| window_id.to_string()),
            denial_detail: decision
                .denial_detail
                .map(|denial_detail| denial_detail.as_str().to_owned()),
        }
    }
}

impl AccessDashboardResponse {
    #[must_use]
    pub fn at(dashboard: &AccessDashboard, now: DateTime<Utc>) -> Self {
        Self {
            counts: AccessDashboardCountsResponse {
                active: dashboard.active.len(),
                pending: dashboard.pending.len(),
                expired: dashboard.expired.len(),
                revoked: dashboard.revoked.len(),
                total: dashboard.total(),
            },
            active: AccessWindowResponse::list(&dashboard.active, now),
            pending: AccessWindowResponse::list(&dashboard.pending, now),
            expired: AccessWindowResponse::list(&dashboard.expired, now),
            revoked: AccessWindowResponse::list(&dashboard.revoked, now),
        }
    }
}

impl From<DocumentScope> for AccessibleDocumentsResponse {
    fn from(value: DocumentScope) -> Self {
        match value {
            DocumentScope::All => Self {
                all: true,
                document_ids: Vec::new(),
            },
            DocumentScope::Only(documents) => Self {
                all: false,
                document_ids: documents
                    .into_iter()
                    .map(|document_id| document_id.value())
                    .collect(),
            },
        }
    }
}
