use std::sync::Arc;

use chrono::{DateTime, Utc};
use nerostack_core::{AppError, AppResult, UserIdentity};
use nerostack_domain::{
    AccessLevel, AccessWindow, AccessWindowChanges, AccessWindowGrant, AccessWindowId,
    AuditAction, CabinetId, DocumentId, UserId,
};
use tracing::info;

use crate::{
    AccessDecisionService, AccessWindowFilter, AccessWindowRepository, AuditEvent,
    AuditRepository, PrincipalRepository,
};

/// Input payload for granting an access window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccessWindowInput {
    /// Principal receiving access.
    pub principal_id: UserId,
    /// Target document; `None` grants every document.
    pub document_id: Option<DocumentId>,
    /// Advisory cabinet scope.
    pub cabinet_id: Option<CabinetId>,
    /// Start of the interval.
    pub start_at: DateTime<Utc>,
    /// End of the interval.
    pub end_at: DateTime<Utc>,
    /// Granted level.
    pub access_level: AccessLevel,
    /// Optional justification.
    pub reason: Option<String>,
}

/// Query parameters for administrative window listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessWindowListQuery {
    /// Restricts to one principal.
    pub principal_id: Option<UserId>,
    /// Restricts to one document.
    pub document_id: Option<DocumentId>,
    /// Restricts to one kill-switch value.
    pub is_enabled: Option<bool>,
    /// Keeps only windows valid right now.
    pub currently_valid: bool,
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped.
    pub offset: usize,
}

impl Default for AccessWindowListQuery {
    fn default() -> Self {
        Self {
            principal_id: None,
            document_id: None,
            is_enabled: None,
            currently_valid: false,
            limit: 100,
            offset: 0,
        }
    }
}

/// Application service for elevated access window administration.
#[derive(Clone)]
pub struct AccessAdministrationService {
    access_decision_service: AccessDecisionService,
    principal_repository: Arc<dyn PrincipalRepository>,
    window_repository: Arc<dyn AccessWindowRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AccessAdministrationService {
    /// Creates a new administration service.
    #[must_use]
    pub fn new(
        access_decision_service: AccessDecisionService,
        principal_repository: Arc<dyn PrincipalRepository>,
        window_repository: Arc<dyn AccessWindowRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            access_decision_service,
            principal_repository,
            window_repository,
            audit_repository,
        }
    }

    async fn audit(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        window_id: AccessWindowId,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action,
                resource_type: "access_window".to_owned(),
                resource_id: window_id.to_string(),
                detail: Some(detail),
            })
            .await
    }

    async fn load_window(&self, window_id: AccessWindowId) -> AppResult<AccessWindow> {
        self.window_repository
            .find_window(window_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("access window '{window_id}' not found")))
    }

    /// Grants a new access window to an existing principal.
    pub async fn create_window(
        &self,
        actor: &UserIdentity,
        input: CreateAccessWindowInput,
    ) -> AppResult<AccessWindow> {
        let admin = self.access_decision_service.require_admin(actor).await?;

        let target = self
            .principal_repository
            .find_principal(input.principal_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("principal '{}' not found", input.principal_id))
            })?;

        let window = AccessWindow::grant(
            AccessWindowId::new(),
            AccessWindowGrant {
                principal_id: target.user_id,
                document_id: input.document_id,
                cabinet_id: input.cabinet_id,
                start_at: input.start_at,
                end_at: input.end_at,
                access_level: input.access_level,
                reason: input.reason,
                granted_by: admin.user_id,
            },
            Utc::now(),
        )?;
        let window = self.window_repository.create_window(window).await?;

        let scope = window
            .document_id()
            .map(|document_id| format!("document '{document_id}'"))
            .unwrap_or_else(|| "all documents".to_owned());
        self.audit(
            actor,
            AuditAction::AccessWindowCreated,
            window.id(),
            format!(
                "granted '{}' {} access to {scope} until '{}'",
                target.username,
                window.access_level().as_str(),
                window.end_at().to_rfc3339()
            ),
        )
        .await?;

        info!(
            window_id = %window.id(),
            principal = %target.username,
            granted_by = %admin.username,
            "access window granted"
        );

        Ok(window)
    }

    /// Returns one window.
    pub async fn get_window(
        &self,
        actor: &UserIdentity,
        window_id: AccessWindowId,
    ) -> AppResult<AccessWindow> {
        self.access_decision_service.require_admin(actor).await?;
        self.load_window(window_id).await
    }

    /// Applies a partial update after re-validating the effective bounds.
    pub async fn update_window(
        &self,
        actor: &UserIdentity,
        window_id: AccessWindowId,
        changes: AccessWindowChanges,
    ) -> AppResult<AccessWindow> {
        self.access_decision_service.require_admin(actor).await?;

        if changes.is_empty() {
            return Err(AppError::Validation(
                "access window update must change at least one field".to_owned(),
            ));
        }

        let window = self
            .window_repository
            .update_window(window_id, changes, Utc::now())
            .await?;

        self.audit(
            actor,
            AuditAction::AccessWindowUpdated,
            window.id(),
            format!(
                "window now spans '{}'..'{}' at level '{}' (enabled: {})",
                window.start_at().to_rfc3339(),
                window.end_at().to_rfc3339(),
                window.access_level().as_str(),
                window.is_enabled()
            ),
        )
        .await?;

        info!(window_id = %window.id(), "access window updated");
        Ok(window)
    }

    /// Disables a window without deleting it. Revoking twice is a no-op.
    pub async fn revoke_window(
        &self,
        actor: &UserIdentity,
        window_id: AccessWindowId,
    ) -> AppResult<AccessWindow> {
        self.access_decision_service.require_admin(actor).await?;

        let Some(window) = self
            .window_repository
            .revoke_window(window_id, Utc::now())
            .await?
        else {
            return self.load_window(window_id).await;
        };

        self.audit(
            actor,
            AuditAction::AccessWindowRevoked,
            window.id(),
            "revoked access window".to_owned(),
        )
        .await?;

        info!(window_id = %window.id(), "access window revoked");
        Ok(window)
    }

    /// Removes a window permanently. Audit entries about it are kept.
    pub async fn delete_window(
        &self,
        actor: &UserIdentity,
        window_id: AccessWindowId,
    ) -> AppResult<()> {
        self.access_decision_service.require_admin(actor).await?;

        let window = self.load_window(window_id).await?;
        self.window_repository.delete_window(window_id).await?;
        self.audit(
            actor,
            AuditAction::AccessWindowDeleted,
            window_id,
            format!("deleted access window of principal '{}'", window.principal_id()),
        )
        .await?;

        info!(window_id = %window_id, "access window deleted");
        Ok(())
    }

    /// Lists windows with storage filters plus the evaluator-backed validity filter.
    pub async fn list_windows(
        &self,
        actor: &UserIdentity,
        query: AccessWindowListQuery,
    ) -> AppResult<Vec<AccessWindow>> {
        self.access_decision_service.require_admin(actor).await?;

        let windows = self
            .window_repository
            .list_windows(AccessWindowFilter {
                principal_id: query.principal_id,
                document_id: query.document_id,
                is_enabled: query.is_enabled,
            })
            .await?;

        let now = Utc::now();
        Ok(windows
            .into_iter()
            .filter(|window| !query.currently_valid || window.is_valid_at(now))
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }
}
