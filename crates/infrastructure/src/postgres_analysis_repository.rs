//! PostgreSQL-backed analysis cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use nerostack_application::{AnalysisHistoryQuery, AnalysisRepository};
use nerostack_core::{AppError, AppResult};
use nerostack_domain::{
    AnalysisId, AnalysisLanguage, AnalysisRecord, AnalysisRecordParts, AnalysisStatus, DocumentId,
    UserId,
};

/// Error message stored on in-flight records superseded after going stale.
pub const ABANDONED_ANALYSIS_MESSAGE: &str = "abandoned";

/// PostgreSQL implementation of the analysis repository port.
#[derive(Clone)]
pub struct PostgresAnalysisRepository {
    pool: PgPool,
}

impl PostgresAnalysisRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AnalysisRow {
    id: uuid::Uuid,
    document_id: i64,
    document_version: Option<String>,
    language: String,
    principal_id: uuid::Uuid,
    summary: Option<String>,
    keywords: Vec<String>,
    key_points: Vec<String>,
    model_used: Option<String>,
    status: String,
    error_message: Option<String>,
    processing_seconds: Option<f64>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<AnalysisRow> for AnalysisRecord {
    type Error = AppError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        Ok(Self::from_parts(AnalysisRecordParts {
            id: AnalysisId::from_uuid(row.id),
            document_id: DocumentId::new(row.document_id),
            document_version: row.document_version,
            language: row.language.parse::<AnalysisLanguage>()?,
            principal_id: UserId::from_uuid(row.principal_id),
            summary: row.summary,
            keywords: row.keywords,
            key_points: row.key_points,
            model_used: row.model_used,
            status: row.status.parse::<AnalysisStatus>()?,
            error_message: row.error_message,
            processing_seconds: row.processing_seconds,
            created_at: row.created_at,
            completed_at: row.completed_at,
        }))
    }
}

mod transitions;

#[async_trait]
impl AnalysisRepository for PostgresAnalysisRepository {
    async fn create_pending(
        &self,
        record: AnalysisRecord,
        stale_before: DateTime<Utc>,
    ) -> AppResult<AnalysisRecord> {
        self.create_pending_impl(record, stale_before).await
    }

    async fn find_latest_completed(
        &self,
        document_id: DocumentId,
        language: AnalysisLanguage,
        document_version: Option<&str>,
    ) -> AppResult<Option<AnalysisRecord>> {
        sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT
                id, document_id, document_version, language, principal_id, summary, keywords,
                key_points, model_used, status, error_message, processing_seconds,
                created_at, completed_at
            FROM document_analyses
            WHERE document_id = $1
              AND language = $2
              AND status = 'completed'
              AND ($3::TEXT IS NULL OR document_version = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(document_id.value())
        .bind(language.as_str())
        .bind(document_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read analysis cache: {error}")))?
        .map(AnalysisRecord::try_from)
        .transpose()
    }

    async fn save_transition(&self, record: &AnalysisRecord) -> AppResult<()> {
        self.save_transition_impl(record).await
    }

    async fn find_analysis(&self, analysis_id: AnalysisId) -> AppResult<Option<AnalysisRecord>> {
        sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT
                id, document_id, document_version, language, principal_id, summary, keywords,
                key_points, model_used, status, error_message, processing_seconds,
                created_at, completed_at
            FROM document_analyses
            WHERE id = $1
            "#,
        )
        .bind(analysis_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find analysis: {error}")))?
        .map(AnalysisRecord::try_from)
        .transpose()
    }

    async fn list_for_principal(
        &self,
        principal_id: UserId,
        query: AnalysisHistoryQuery,
    ) -> AppResult<Vec<AnalysisRecord>> {
        let limit = i64::try_from(query.limit).map_err(|error| {
            AppError::Validation(format!("invalid analysis history limit: {error}"))
        })?;
        let offset = i64::try_from(query.offset).map_err(|error| {
            AppError::Validation(format!("invalid analysis history offset: {error}"))
        })?;

        let rows = sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT
                id, document_id, document_version, language, principal_id, summary, keywords,
                key_points, model_used, status, error_message, processing_seconds,
                created_at, completed_at
            FROM document_analyses
            WHERE principal_id = $1
              AND ($2::BIGINT IS NULL OR document_id = $2)
              AND ($3::TEXT IS NULL OR status = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(principal_id.as_uuid())
        .bind(query.document_id.map(|document_id| document_id.value()))
        .bind(query.status.map(|status| status.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list analysis history: {error}"))
        })?;

        rows.into_iter().map(AnalysisRecord::try_from).collect()
    }
}
