//! PostgreSQL-backed access window repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use nerostack_application::{AccessWindowFilter, AccessWindowRepository};
use nerostack_core::{AppError, AppResult};
use nerostack_domain::{
    AccessLevel, AccessWindow, AccessWindowChanges, AccessWindowId, AccessWindowRecord, CabinetId,
    DocumentId, UserId,
};

/// PostgreSQL implementation of the access window repository port.
#[derive(Clone)]
pub struct PostgresAccessWindowRepository {
    pool: PgPool,
}

impl PostgresAccessWindowRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AccessWindowRow {
    id: uuid::Uuid,
    principal_id: uuid::Uuid,
    document_id: Option<i64>,
    cabinet_id: Option<i64>,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    access_level: String,
    is_enabled: bool,
    reason: Option<String>,
    granted_by: uuid::Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccessWindowRow> for AccessWindow {
    type Error = AppError;

    fn try_from(row: AccessWindowRow) -> Result<Self, Self::Error> {
        Ok(Self::from_record(AccessWindowRecord {
            id: AccessWindowId::from_uuid(row.id),
            principal_id: UserId::from_uuid(row.principal_id),
            document_id: row.document_id.map(DocumentId::new),
            cabinet_id: row.cabinet_id.map(CabinetId::new),
            start_at: row.start_at,
            end_at: row.end_at,
            access_level: row.access_level.parse::<AccessLevel>()?,
            is_enabled: row.is_enabled,
            reason: row.reason,
            granted_by: UserId::from_uuid(row.granted_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

fn window_write_error(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error {
        match database_error.code().as_deref() {
            Some("23514") => {
                return AppError::Validation(
                    "access window start_at must be before end_at".to_owned(),
                );
            }
            Some("23503") => {
                return AppError::NotFound("referenced principal does not exist".to_owned());
            }
            _ => {}
        }
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}

#[async_trait]
impl AccessWindowRepository for PostgresAccessWindowRepository {
    async fn create_window(&self, window: AccessWindow) -> AppResult<AccessWindow> {
        let row = sqlx::query_as::<_, AccessWindowRow>(
            r#"
            INSERT INTO access_windows (
                id,
                principal_id,
                document_id,
                cabinet_id,
                start_at,
                end_at,
                access_level,
                is_enabled,
                reason,
                granted_by,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING
                id, principal_id, document_id, cabinet_id, start_at, end_at,
                access_level, is_enabled, reason, granted_by, created_at, updated_at
            "#,
        )
        .bind(window.id().as_uuid())
        .bind(window.principal_id().as_uuid())
        .bind(window.document_id().map(|document_id| document_id.value()))
        .bind(window.cabinet_id().map(|cabinet_id| cabinet_id.value()))
        .bind(window.start_at())
        .bind(window.end_at())
        .bind(window.access_level().as_str())
        .bind(window.is_enabled())
        .bind(window.reason())
        .bind(window.granted_by().as_uuid())
        .bind(window.created_at())
        .bind(window.updated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| window_write_error(error, "create access window"))?;

        AccessWindow::try_from(row)
    }

    async fn find_window(&self, window_id: AccessWindowId) -> AppResult<Option<AccessWindow>> {
        sqlx::query_as::<_, AccessWindowRow>(
            r#"
            SELECT
                id, principal_id, document_id, cabinet_id, start_at, end_at,
                access_level, is_enabled, reason, granted_by, created_at, updated_at
            FROM access_windows
            WHERE id = $1
            "#,
        )
        .bind(window_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find access window: {error}")))?
        .map(AccessWindow::try_from)
        .transpose()
    }

    async fn update_window(
        &self,
        window_id: AccessWindowId,
        changes: AccessWindowChanges,
        now: DateTime<Utc>,
    ) -> AppResult<AccessWindow> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start update transaction for access window '{window_id}': {error}"
            ))
        })?;

        let mut window = sqlx::query_as::<_, AccessWindowRow>(
            r#"
            SELECT
                id, principal_id, document_id, cabinet_id, start_at, end_at,
                access_level, is_enabled, reason, granted_by, created_at, updated_at
            FROM access_windows
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(window_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock access window: {error}")))?
        .map(AccessWindow::try_from)
        .transpose()?
        .ok_or_else(|| AppError::NotFound(format!("access window '{window_id}' not found")))?;

        window.apply_changes(changes, now)?;

        let row = sqlx::query_as::<_, AccessWindowRow>(
            r#"
            UPDATE access_windows
            SET start_at = $2,
                end_at = $3,
                access_level = $4,
                is_enabled = $5,
                reason = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING
                id, principal_id, document_id, cabinet_id, start_at, end_at,
                access_level, is_enabled, reason, granted_by, created_at, updated_at
            "#,
        )
        .bind(window.id().as_uuid())
        .bind(window.start_at())
        .bind(window.end_at())
        .bind(window.access_level().as_str())
        .bind(window.is_enabled())
        .bind(window.reason())
        .bind(window.updated_at())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| window_write_error(error, "update access window"))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit update transaction for access window '{window_id}': {error}"
            ))
        })?;

        AccessWindow::try_from(row)
    }

    async fn revoke_window(
        &self,
        window_id: AccessWindowId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AccessWindow>> {
        sqlx::query_as::<_, AccessWindowRow>(
            r#"
            UPDATE access_windows
            SET is_enabled = FALSE,
                updated_at = $2
            WHERE id = $1 AND is_enabled = TRUE
            RETURNING
                id, principal_id, document_id, cabinet_id, start_at, end_at,
                access_level, is_enabled, reason, granted_by, created_at, updated_at
            "#,
        )
        .bind(window_id.as_uuid())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke access window: {error}")))?
        .map(AccessWindow::try_from)
        .transpose()
    }

    async fn delete_window(&self, window_id: AccessWindowId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM access_windows WHERE id = $1")
            .bind(window_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete access window: {error}"))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "access window '{window_id}' not found"
            )));
        }

        Ok(())
    }

    async fn list_windows(&self, filter: AccessWindowFilter) -> AppResult<Vec<AccessWindow>> {
        let rows = sqlx::query_as::<_, AccessWindowRow>(
            r#"
            SELECT
                id, principal_id, document_id, cabinet_id, start_at, end_at,
                access_level, is_enabled, reason, granted_by, created_at, updated_at
            FROM access_windows
            WHERE ($1::UUID IS NULL OR principal_id = $1)
              AND ($2::BIGINT IS NULL OR document_id = $2)
              AND ($3::BOOLEAN IS NULL OR is_enabled = $3)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(filter.principal_id.map(|principal_id| principal_id.as_uuid()))
        .bind(filter.document_id.map(|document_id| document_id.value()))
        .bind(filter.is_enabled)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list access windows: {error}")))?;

        rows.into_iter().map(AccessWindow::try_from).collect()
    }
}
