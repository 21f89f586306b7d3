use async_trait::async_trait;
use nerostack_core::AppResult;
use nerostack_domain::{Principal, PrincipalChanges, PrincipalRole, UserId};

/// Storage-level filters for principal listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalFilter {
    /// Restricts to one role.
    pub role: Option<PrincipalRole>,
    /// Restricts to one account state.
    pub is_active: Option<bool>,
    /// Case-insensitive substring of the username or email.
    pub search: Option<String>,
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped.
    pub offset: usize,
}

impl Default for PrincipalFilter {
    fn default() -> Self {
        Self {
            role: None,
            is_active: None,
            search: None,
            limit: 20,
            offset: 0,
        }
    }
}

/// Repository port for the principal directory.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Finds one principal by identifier.
    async fn find_principal(&self, user_id: UserId) -> AppResult<Option<Principal>>;

    /// Finds one principal by unique username.
    async fn find_principal_by_username(&self, username: &str) -> AppResult<Option<Principal>>;

    /// Inserts a principal. Fails with `Conflict` when the username or email is taken.
    async fn create_principal(&self, principal: Principal) -> AppResult<Principal>;

    /// Lists principals matching the filter, newest first.
    async fn list_principals(&self, filter: PrincipalFilter) -> AppResult<Vec<Principal>>;

    /// Applies a partial update atomically against the stored row.
    ///
    /// Fails with `NotFound` for an unknown principal and `Conflict` when the
    /// new email is taken.
    async fn update_principal(
        &self,
        user_id: UserId,
        changes: PrincipalChanges,
    ) -> AppResult<Principal>;

    /// Removes a principal together with the windows granted to it.
    ///
    /// Fails with `NotFound` for an unknown principal and `Conflict` while
    /// windows it granted to others still reference it.
    async fn delete_principal(&self, user_id: UserId) -> AppResult<()>;
}
