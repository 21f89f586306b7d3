use std::sync::Arc;

use nerostack_core::{AppError, AppResult, UserIdentity};
use nerostack_domain::{
    AuditAction, Principal, PrincipalChanges, PrincipalRole, UserId, normalize_display_name,
    normalize_email, normalize_username,
};
use tracing::info;

use crate::{
    AccessDecisionService, AuditEvent, AuditRepository, PrincipalFilter, PrincipalRepository,
};

/// Input payload for creating a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrincipalInput {
    /// Unique login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Human-friendly name; defaults to the username.
    pub display_name: Option<String>,
    /// Privilege level; defaults to [`PrincipalRole::User`].
    pub role: Option<PrincipalRole>,
    /// Credential forwarded to the document backend.
    pub content_token: Option<String>,
}

/// Application service for administering the principal directory.
///
/// Every operation requires an active admin actor. An admin can neither
/// delete, deactivate nor demote their own account.
#[derive(Clone)]
pub struct PrincipalAdministrationService {
    access_decision_service: AccessDecisionService,
    principal_repository: Arc<dyn PrincipalRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl PrincipalAdministrationService {
    /// Creates a new principal administration service.
    #[must_use]
    pub fn new(
        access_decision_service: AccessDecisionService,
        principal_repository: Arc<dyn PrincipalRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            access_decision_service,
            principal_repository,
            audit_repository,
        }
    }

    async fn audit(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        user_id: UserId,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action,
                resource_type: "principal".to_owned(),
                resource_id: user_id.to_string(),
                detail: Some(detail),
            })
            .await
    }

    /// Lists principals, newest first.
    pub async fn list_principals(
        &self,
        actor: &UserIdentity,
        filter: PrincipalFilter,
    ) -> AppResult<Vec<Principal>> {
        self.access_decision_service.require_admin(actor).await?;

        let search = filter
            .search
            .map(|search| search.trim().to_owned())
            .filter(|search| !search.is_empty());
        self.principal_repository
            .list_principals(PrincipalFilter { search, ..filter })
            .await
    }

    /// Returns one principal.
    pub async fn get_principal(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
    ) -> AppResult<Principal> {
        self.access_decision_service.require_admin(actor).await?;
        self.principal_repository
            .find_principal(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("principal '{user_id}' not found")))
    }

    /// Creates an active principal.
    pub async fn create_principal(
        &self,
        actor: &UserIdentity,
        input: CreatePrincipalInput,
    ) -> AppResult<Principal> {
        let admin = self.access_decision_service.require_admin(actor).await?;

        let username = normalize_username(input.username.as_str())?;
        let email = normalize_email(input.email.as_str())?;
        let display_name = match input.display_name.as_deref() {
            Some(display_name) if !display_name.trim().is_empty() => {
                normalize_display_name(display_name)?
            }
            _ => username.clone(),
        };

        let principal = self
            .principal_repository
            .create_principal(Principal {
                user_id: UserId::new(),
                username,
                email,
                display_name,
                role: input.role.unwrap_or(PrincipalRole::User),
                is_active: true,
                content_token: input
                    .content_token
                    .map(|token| token.trim().to_owned())
                    .filter(|token| !token.is_empty()),
            })
            .await?;

        self.audit(
            actor,
            AuditAction::PrincipalCreated,
            principal.user_id,
            format!(
                "created {} principal '{}'",
                principal.role.as_str(),
                principal.username
            ),
        )
        .await?;

        info!(
            user_id = %principal.user_id,
            username = %principal.username,
            created_by = %admin.username,
            "principal created"
        );
        Ok(principal)
    }

    /// Applies a partial update.
    pub async fn update_principal(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        changes: PrincipalChanges,
    ) -> AppResult<Principal> {
        let admin = self.access_decision_service.require_admin(actor).await?;

        if changes.is_empty() {
            return Err(AppError::Validation(
                "principal update must change at least one field".to_owned(),
            ));
        }

        if admin.user_id == user_id {
            if changes.is_active == Some(false) {
                return Err(AppError::Validation(
                    "administrators cannot deactivate their own account".to_owned(),
                ));
            }
            if changes.role == Some(PrincipalRole::User) {
                return Err(AppError::Validation(
                    "administrators cannot remove their own admin role".to_owned(),
                ));
            }
        }

        let principal = self
            .principal_repository
            .update_principal(user_id, changes)
            .await?;

        self.audit(
            actor,
            AuditAction::PrincipalUpdated,
            principal.user_id,
            format!(
                "principal '{}' is now {} (active: {})",
                principal.username,
                principal.role.as_str(),
                principal.is_active
            ),
        )
        .await?;

        info!(user_id = %principal.user_id, updated_by = %admin.username, "principal updated");
        Ok(principal)
    }

    /// Re-enables a deactivated account.
    pub async fn activate_principal(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
    ) -> AppResult<Principal> {
        self.update_principal(
            actor,
            user_id,
            PrincipalChanges {
                is_active: Some(true),
                ..PrincipalChanges::default()
            },
        )
        .await
    }

    /// Blocks an account without deleting it.
    pub async fn deactivate_principal(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
    ) -> AppResult<Principal> {
        self.update_principal(
            actor,
            user_id,
            PrincipalChanges {
                is_active: Some(false),
                ..PrincipalChanges::default()
            },
        )
        .await
    }

    /// Removes a principal permanently.
    pub async fn delete_principal(&self, actor: &UserIdentity, user_id: UserId) -> AppResult<()> {
        let admin = self.access_decision_service.require_admin(actor).await?;
        if admin.user_id == user_id {
            return Err(AppError::Validation(
                "administrators cannot delete their own account".to_owned(),
            ));
        }

        let principal = self
            .principal_repository
            .find_principal(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("principal '{user_id}' not found")))?;
        self.principal_repository.delete_principal(user_id).await?;

        self.audit(
            actor,
            AuditAction::PrincipalDeleted,
            user_id,
            format!("deleted principal '{}'", principal.username),
        )
        .await?;

        info!(user_id = %user_id, deleted_by = %admin.username, "principal deleted");
        Ok(())
    }
}
