use std::sync::Arc;

use nerostack_core::{AppError, AppResult};
use nerostack_domain::{Principal, PrincipalRole, UserId};
use tracing::info;

use crate::PrincipalRepository;

/// Default admin account created by the explicit seeding step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: String,
}

/// Outcome of the seeding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSeedOutcome {
    /// A new admin principal was inserted.
    Created(UserId),
    /// A principal with that username already existed and was left untouched.
    AlreadyPresent(UserId),
}

/// Application service for principal directory lookups used by the identity layer.
#[derive(Clone)]
pub struct PrincipalService {
    repository: Arc<dyn PrincipalRepository>,
}

impl PrincipalService {
    /// Creates a new principal service.
    #[must_use]
    pub fn new(repository: Arc<dyn PrincipalRepository>) -> Self {
        Self { repository }
    }

    /// Resolves an active principal by username for session bootstrap.
    pub async fn find_active_by_username(&self, username: &str) -> AppResult<Principal> {
        let principal = self
            .repository
            .find_principal_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_owned()))?;

        if !principal.is_active {
            return Err(AppError::Forbidden(format!(
                "principal '{}' is deactivated",
                principal.username
            )));
        }

        Ok(principal)
    }

    /// Creates the default admin principal when absent. Never modifies an existing one.
    pub async fn seed_admin(&self, seed: AdminSeed) -> AppResult<AdminSeedOutcome> {
        let username = seed.username.trim();
        if username.is_empty() {
            return Err(AppError::Validation(
                "seed admin username must not be empty".to_owned(),
            ));
        }

        if let Some(existing) = self.repository.find_principal_by_username(username).await? {
            return Ok(AdminSeedOutcome::AlreadyPresent(existing.user_id));
        }

        let principal = self
            .repository
            .create_principal(Principal {
                user_id: UserId::new(),
                username: username.to_owned(),
                email: seed.email,
                display_name: "Administrator".to_owned(),
                role: PrincipalRole::Admin,
                is_active: true,
                content_token: None,
            })
            .await?;

        info!(user_id = %principal.user_id, username = %principal.username, "seeded admin principal");
        Ok(AdminSeedOutcome::Created(principal.user_id))
    }
}
