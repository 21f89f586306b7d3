//! PostgreSQL-backed principal directory.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use nerostack_application::{PrincipalFilter, PrincipalRepository};
use nerostack_core::{AppError, AppResult};
use nerostack_domain::{Principal, PrincipalChanges, PrincipalRole, UserId};

/// PostgreSQL implementation of the principal repository port.
#[derive(Clone)]
pub struct PostgresPrincipalRepository {
    pool: PgPool,
}

impl PostgresPrincipalRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: uuid::Uuid,
    username: String,
    email: String,
    display_name: String,
    role: String,
    is_active: bool,
    content_token: Option<String>,
}

impl TryFrom<PrincipalRow> for Principal {
    type Error = AppError;

    fn try_from(row: PrincipalRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            display_name: row.display_name,
            role: row.role.parse::<PrincipalRole>()?,
            is_active: row.is_active,
            content_token: row.content_token,
        })
    }
}

#[async_trait]
impl PrincipalRepository for PostgresPrincipalRepository {
    async fn find_principal(&self, user_id: UserId) -> AppResult<Option<Principal>> {
        sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, username, email, display_name, role, is_active, content_token
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find principal: {error}")))?
        .map(Principal::try_from)
        .transpose()
    }

    async fn find_principal_by_username(&self, username: &str) -> AppResult<Option<Principal>> {
        sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, username, email, display_name, role, is_active, content_token
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find principal by username: {error}"))
        })?
        .map(Principal::try_from)
        .transpose()
    }

    async fn create_principal(&self, principal: Principal) -> AppResult<Principal> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, display_name, role, is_active, content_token)
            VALUES ($1, $2, LOWER($3), $4, $5, $6, $7)
            "#,
        )
        .bind(principal.user_id.as_uuid())
        .bind(principal.username.as_str())
        .bind(principal.email.as_str())
        .bind(principal.display_name.as_str())
        .bind(principal.role.as_str())
        .bind(principal.is_active)
        .bind(principal.content_token.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| principal_conflict_or_internal(error, &principal.username))?;

        Ok(principal)
    }

    async fn list_principals(&self, filter: PrincipalFilter) -> AppResult<Vec<Principal>> {
        let rows = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, username, email, display_name, role, is_active, content_token
            FROM users
            WHERE ($1::TEXT IS NULL OR role = $1)
              AND ($2::BOOLEAN IS NULL OR is_active = $2)
              AND (
                  $3::TEXT IS NULL
                  OR username ILIKE '%' || $3 || '%'
                  OR email ILIKE '%' || $3 || '%'
              )
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            OFFSET $5
            "#,
        )
        .bind(filter.role.map(|role| role.as_str()))
        .bind(filter.is_active)
        .bind(filter.search.as_deref())
        .bind(i64::try_from(filter.limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(filter.offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list principals: {error}")))?;

        rows.into_iter().map(Principal::try_from).collect()
    }

    async fn update_principal(
        &self,
        user_id: UserId,
        changes: PrincipalChanges,
    ) -> AppResult<Principal> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start update transaction for principal '{user_id}': {error}"
            ))
        })?;

        let mut principal = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, username, email, display_name, role, is_active, content_token
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock principal: {error}")))?
        .map(Principal::try_from)
        .transpose()?
        .ok_or_else(|| AppError::NotFound(format!("principal '{user_id}' not found")))?;

        principal.apply_changes(changes)?;

        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            UPDATE users
            SET email = LOWER($2),
                display_name = $3,
                role = $4,
                is_active = $5,
                content_token = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING id, username, email, display_name, role, is_active, content_token
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(principal.email.as_str())
        .bind(principal.display_name.as_str())
        .bind(principal.role.as_str())
        .bind(principal.is_active)
        .bind(principal.content_token.as_deref())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| principal_conflict_or_internal(error, &principal.username))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit update transaction for principal '{user_id}': {error}"
            ))
        })?;

        Principal::try_from(row)
    }

    async fn delete_principal(&self, user_id: UserId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                if let sqlx::Error::Database(ref database_error) = error
                    && database_error.code().as_deref() == Some("23503")
                {
                    return AppError::Conflict(format!(
                        "principal '{user_id}' still owns access windows granted to others"
                    ));
                }

                AppError::Internal(format!("failed to delete principal: {error}"))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("principal '{user_id}' not found")));
        }

        Ok(())
    }
}

fn principal_conflict_or_internal(error: sqlx::Error, username: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "a principal with username '{username}' or the same email already exists"
        ));
    }

    AppError::Internal(format!("failed to write principal: {error}"))
}
