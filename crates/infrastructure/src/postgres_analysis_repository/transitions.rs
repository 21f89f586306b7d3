use super::*;

impl PostgresAnalysisRepository {
    pub(super) async fn create_pending_impl(
        &self,
        record: AnalysisRecord,
        stale_before: DateTime<Utc>,
    ) -> AppResult<AnalysisRecord> {
        if record.status() != AnalysisStatus::Pending {
            return Err(AppError::Validation(format!(
                "new analysis records must be pending, got '{}'",
                record.status().as_str()
            )));
        }

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start analysis transaction: {error}"))
        })?;

        let abandoned = sqlx::query(
            r#"
            UPDATE document_analyses
            SET status = 'failed',
                error_message = $3,
                completed_at = now()
            WHERE document_id = $1
              AND status IN ('pending', 'processing')
              AND created_at < $2
            "#,
        )
        .bind(record.document_id().value())
        .bind(stale_before)
        .bind(ABANDONED_ANALYSIS_MESSAGE)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to abandon stale analyses: {error}"))
        })?;

        if abandoned.rows_affected() > 0 {
            tracing::warn!(
                document_id = %record.document_id(),
                abandoned = abandoned.rows_affected(),
                "failed stale in-flight analyses"
            );
        }

        sqlx::query(
            r#"
            INSERT INTO document_analyses (
                id,
                document_id,
                document_version,
                language,
                principal_id,
                model_used,
                status,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(record.document_id().value())
        .bind(record.document_version())
        .bind(record.language().as_str())
        .bind(record.principal_id().as_uuid())
        .bind(record.model_used())
        .bind(record.created_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(ref database_error) = error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!(
                    "an analysis of document '{}' is already in progress",
                    record.document_id()
                ));
            }

            AppError::Internal(format!("failed to create pending analysis: {error}"))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit analysis transaction: {error}"))
        })?;

        Ok(record)
    }

    pub(super) async fn save_transition_impl(&self, record: &AnalysisRecord) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE document_analyses
            SET status = $2,
                summary = $3,
                keywords = $4,
                key_points = $5,
                error_message = $6,
                processing_seconds = $7,
                completed_at = $8
            WHERE id = $1
              AND status IN ('pending', 'processing')
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(record.status().as_str())
        .bind(record.summary())
        .bind(record.keywords())
        .bind(record.key_points())
        .bind(record.error_message())
        .bind(record.processing_seconds())
        .bind(record.completed_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist analysis transition: {error}"))
        })?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        match self.find_analysis(record.id()).await? {
            Some(stored) => Err(AppError::Conflict(format!(
                "analysis '{}' is already '{}'",
                record.id(),
                stored.status().as_str()
            ))),
            None => Err(AppError::NotFound(format!(
                "analysis '{}' not found",
                record.id()
            ))),
        }
    }
}
