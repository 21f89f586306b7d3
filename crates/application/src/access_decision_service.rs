use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use nerostack_core::{AppError, AppResult, UserIdentity};
use nerostack_domain::{
    AccessLevel, AccessWindow, AccessWindowId, AuditAction, DocumentId, Principal, UserId,
    WindowStatus,
};
use serde::{Deserialize, Serialize};

use crate::{AccessWindowFilter, AccessWindowRepository, AuditEvent, AuditRepository, PrincipalRepository};

mod views;

pub use views::AccessDashboard;

/// Why a decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecisionReason {
    /// Elevated principal; windows were not consulted.
    Admin,
    /// A currently valid access window matched.
    TemporaryAccess,
    /// Nothing matched.
    NoAccess,
}

impl AccessDecisionReason {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::TemporaryAccess => "temporary_access",
            Self::NoAccess => "no_access",
        }
    }
}

/// Refinement of a `no_access` decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialDetail {
    /// No window covers the document at all.
    NoGrant,
    /// A covering window has not started yet.
    GrantPending,
    /// A covering window is over.
    GrantExpired,
    /// A covering window was revoked.
    GrantRevoked,
}

impl DenialDetail {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoGrant => "no_grant",
            Self::GrantPending => "grant_pending",
            Self::GrantExpired => "grant_expired",
            Self::GrantRevoked => "grant_revoked",
        }
    }
}

/// Outcome of one authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Whether access is permitted.
    pub allowed: bool,
    /// Basis of the decision.
    pub reason: AccessDecisionReason,
    /// Granted level, when allowed.
    pub access_level: Option<AccessLevel>,
    /// End of the matched window.
    pub expires_at: Option<DateTime<Utc>>,
    /// Seconds left on the matched window.
    pub seconds_remaining: Option<i64>,
    /// Matched window.
    pub window_id: Option<AccessWindowId>,
    /// Present on denials only.
    pub denial_detail: Option<DenialDetail>,
}

impl AccessDecision {
    fn admin() -> Self {
        Self {
            allowed: true,
            reason: AccessDecisionReason::Admin,
            access_level: Some(AccessLevel::Admin),
            expires_at: None,
            seconds_remaining: None,
            window_id: None,
            denial_detail: None,
        }
    }

    fn through_window(window: &AccessWindow, now: DateTime<Utc>) -> Self {
        Self {
            allowed: true,
            reason: AccessDecisionReason::TemporaryAccess,
            access_level: Some(window.access_level()),
            expires_at: Some(window.end_at()),
            seconds_remaining: Some(window.seconds_remaining_at(now)),
            window_id: Some(window.id()),
            denial_detail: None,
        }
    }

    fn denied(detail: DenialDetail) -> Self {
        Self {
            allowed: false,
            reason: AccessDecisionReason::NoAccess,
            access_level: None,
            expires_at: None,
            seconds_remaining: None,
            window_id: None,
            denial_detail: Some(detail),
        }
    }
}

/// Result of the list-style decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentScope {
    /// Every document is permitted.
    All,
    /// Only the listed documents are permitted.
    Only(BTreeSet<DocumentId>),
}

impl DocumentScope {
    /// Returns whether the scope includes `document_id`.
    #[must_use]
    pub fn permits(&self, document_id: DocumentId) -> bool {
        match self {
            Self::All => true,
            Self::Only(documents) => documents.contains(&document_id),
        }
    }
}

/// Picks the window that satisfies a request, if any.
///
/// Global grants win over document-scoped ones; within a class the latest
/// `created_at` wins, then the greatest id.
#[must_use]
pub fn select_window(
    windows: &[AccessWindow],
    document_id: DocumentId,
    now: DateTime<Utc>,
) -> Option<&AccessWindow> {
    let newest = |window: &&AccessWindow| (window.created_at(), window.id());
    let valid = || windows.iter().filter(|window| window.is_valid_at(now));

    valid()
        .filter(|window| window.is_global())
        .max_by_key(newest)
        .or_else(|| {
            valid()
                .filter(|window| window.document_id() == Some(document_id))
                .max_by_key(newest)
        })
}

/// Decides whether `principal` may access `document_id` given its windows.
#[must_use]
pub fn decide_access(
    principal: &Principal,
    windows: &[AccessWindow],
    document_id: DocumentId,
    now: DateTime<Utc>,
) -> AccessDecision {
    if principal.is_admin() {
        return AccessDecision::admin();
    }

    let own_windows: Vec<AccessWindow> = windows
        .iter()
        .filter(|window| window.principal_id() == principal.user_id)
        .cloned()
        .collect();

    match select_window(&own_windows, document_id, now) {
        Some(window) => AccessDecision::through_window(window, now),
        None => AccessDecision::denied(denial_detail(&own_windows, document_id, now)),
    }
}

fn denial_detail(windows: &[AccessWindow], document_id: DocumentId, now: DateTime<Utc>) -> DenialDetail {
    let statuses: Vec<WindowStatus> = windows
        .iter()
        .filter(|window| window.covers(document_id))
        .map(|window| window.status_at(now))
        .collect();

    if statuses.contains(&WindowStatus::Pending) {
        DenialDetail::GrantPending
    } else if statuses.contains(&WindowStatus::Expired) {
        DenialDetail::GrantExpired
    } else if statuses.contains(&WindowStatus::Revoked) {
        DenialDetail::GrantRevoked
    } else {
        DenialDetail::NoGrant
    }
}

/// Computes the set of documents `principal` may access.
#[must_use]
pub fn accessible_scope(
    principal: &Principal,
    windows: &[AccessWindow],
    now: DateTime<Utc>,
) -> DocumentScope {
    if principal.is_admin() {
        return DocumentScope::All;
    }

    let mut documents = BTreeSet::new();
    for window in windows
        .iter()
        .filter(|window| window.principal_id() == principal.user_id && window.is_valid_at(now))
    {
        match window.document_id() {
            None => return DocumentScope::All,
            Some(document_id) => {
                documents.insert(document_id);
            }
        }
    }

    DocumentScope::Only(documents)
}

/// Application service answering "may this principal access this document now?".
#[derive(Clone)]
pub struct AccessDecisionService {
    principal_repository: Arc<dyn PrincipalRepository>,
    window_repository: Arc<dyn AccessWindowRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AccessDecisionService {
    /// Creates a new decision service.
    #[must_use]
    pub fn new(
        principal_repository: Arc<dyn PrincipalRepository>,
        window_repository: Arc<dyn AccessWindowRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            principal_repository,
            window_repository,
            audit_repository,
        }
    }

    /// Resolves the session identity against the principal directory.
    ///
    /// Unknown principals are `Unauthorized`; deactivated ones are `Forbidden`.
    pub async fn resolve_principal(&self, actor: &UserIdentity) -> AppResult<Principal> {
        let user_id = UserId::parse(actor.subject()).map_err(|_| {
            AppError::Unauthorized(format!("subject '{}' is not a known principal", actor.subject()))
        })?;

        let principal = self
            .principal_repository
            .find_principal(user_id)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized(format!("subject '{}' is not a known principal", actor.subject()))
            })?;

        if !principal.is_active {
            return Err(AppError::Forbidden(format!(
                "principal '{}' is deactivated",
                principal.username
            )));
        }

        Ok(principal)
    }

    /// Ensures the actor is an elevated principal.
    pub async fn require_admin(&self, actor: &UserIdentity) -> AppResult<Principal> {
        let principal = self.resolve_principal(actor).await?;
        if !principal.is_admin() {
            return Err(AppError::Forbidden(format!(
                "principal '{}' requires the admin role",
                principal.username
            )));
        }

        Ok(principal)
    }

    async fn windows_for(&self, principal: &Principal) -> AppResult<Vec<AccessWindow>> {
        self.window_repository
            .list_windows(AccessWindowFilter {
                principal_id: Some(principal.user_id),
                ..AccessWindowFilter::default()
            })
            .await
    }

    /// Decides access for an already resolved principal.
    pub async fn authorize(
        &self,
        principal: &Principal,
        document_id: DocumentId,
    ) -> AppResult<AccessDecision> {
        if principal.is_admin() {
            return Ok(AccessDecision::admin());
        }

        let windows = self.windows_for(principal).await?;
        Ok(decide_access(principal, &windows, document_id, Utc::now()))
    }

    /// Resolves the actor and returns the decision without enforcing it.
    pub async fn check_access(
        &self,
        actor: &UserIdentity,
        document_id: DocumentId,
    ) -> AppResult<AccessDecision> {
        let principal = self.resolve_principal(actor).await?;
        self.authorize(&principal, document_id).await
    }

    /// Enforces access for a gated document operation.
    ///
    /// Denials become `Forbidden` carrying the reason code; permits through a
    /// window are audited as `access_window.used`.
    pub async fn require_document_access(
        &self,
        actor: &UserIdentity,
        document_id: DocumentId,
    ) -> AppResult<(Principal, AccessDecision)> {
        let principal = self.resolve_principal(actor).await?;
        let decision = self.authorize(&principal, document_id).await?;

        if !decision.allowed {
            let detail = decision.denial_detail.unwrap_or(DenialDetail::NoGrant);
            return Err(AppError::Forbidden(format!(
                "{}: principal '{}' may not access document '{document_id}' ({})",
                decision.reason.as_str(),
                principal.username,
                detail.as_str()
            )));
        }

        if let Some(window_id) = decision.window_id {
            self.audit_repository
                .append_event(AuditEvent {
                    subject: actor.subject().to_owned(),
                    action: AuditAction::AccessWindowUsed,
                    resource_type: "access_window".to_owned(),
                    resource_id: window_id.to_string(),
                    detail: Some(format!("accessed document '{document_id}'")),
                })
                .await?;
        }

        Ok((principal, decision))
    }

    /// Returns the documents the actor may access right now.
    pub async fn accessible_documents(&self, actor: &UserIdentity) -> AppResult<DocumentScope> {
        let principal = self.resolve_principal(actor).await?;
        if principal.is_admin() {
            return Ok(DocumentScope::All);
        }

        let windows = self.windows_for(&principal).await?;
        Ok(accessible_scope(&principal, &windows, Utc::now()))
    }
}

#[cfg(test)]
mod tests;
