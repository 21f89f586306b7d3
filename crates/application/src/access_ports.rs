use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nerostack_core::AppResult;
use nerostack_domain::{AccessWindow, AccessWindowChanges, AccessWindowId, DocumentId, UserId};

/// Storage-level filters for access window listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessWindowFilter {
    /// Restricts to one principal.
    pub principal_id: Option<UserId>,
    /// Restricts to windows scoped to one document.
    pub document_id: Option<DocumentId>,
    /// Restricts to one kill-switch value.
    pub is_enabled: Option<bool>,
}

/// Repository port for access window persistence.
#[async_trait]
pub trait AccessWindowRepository: Send + Sync {
    /// Persists a newly granted window.
    async fn create_window(&self, window: AccessWindow) -> AppResult<AccessWindow>;

    /// Finds one window by identifier.
    async fn find_window(&self, window_id: AccessWindowId) -> AppResult<Option<AccessWindow>>;

    /// Applies a partial update against the current stored row.
    ///
    /// Reading, validating and writing happen atomically, so a concurrent
    /// revocation is either seen by the update or applied after it.
    /// Fails with `NotFound` when the window does not exist.
    async fn update_window(
        &self,
        window_id: AccessWindowId,
        changes: AccessWindowChanges,
        now: DateTime<Utc>,
    ) -> AppResult<AccessWindow>;

    /// Disables an enabled window in one step.
    ///
    /// Returns `None` when the window is missing or already disabled.
    async fn revoke_window(
        &self,
        window_id: AccessWindowId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AccessWindow>>;

    /// Removes a window. Fails with `NotFound` when it does not exist.
    async fn delete_window(&self, window_id: AccessWindowId) -> AppResult<()>;

    /// Lists windows matching the filter, newest first.
    async fn list_windows(&self, filter: AccessWindowFilter) -> AppResult<Vec<AccessWindow>>;
}
