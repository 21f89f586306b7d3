use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use nerostack_core::{AppError, AppResult, UserIdentity};
use nerostack_domain::{
    AnalysisId, AnalysisLanguage, AnalysisOutcome, AnalysisRecord, AuditAction, DocumentId,
    Principal,
};
use tracing::{error, info, warn};

use crate::{
    AccessDecisionService, AnalysisHistoryQuery, AnalysisRepository, AuditEvent,
    AuditRepository, DocumentContentProvider, GenerationRequest, TextGenerationProvider,
};

mod prompts;

pub use prompts::{
    FALLBACK_SUMMARY_CHARS, ParsedAnalysis, TRUNCATION_MARKER, excerpt, parse_analysis_response,
    parse_keywords,
};

/// Default keyword count for keyword extraction.
pub const DEFAULT_KEYWORD_COUNT: usize = 10;

/// Upper bound for keyword extraction.
pub const MAX_KEYWORD_COUNT: usize = 50;

/// Tunables of the analysis workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSettings {
    /// Fixed timeout for one generation call.
    pub generation_timeout: Duration,
    /// Excerpt budget in characters.
    pub content_max_chars: usize,
    /// In-flight records older than this are failed as abandoned.
    pub stale_after: Duration,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(120),
            content_max_chars: 15_000,
            stale_after: Duration::from_secs(600),
        }
    }
}

/// Options of one analysis request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeDocumentInput {
    /// Output language.
    pub language: AnalysisLanguage,
    /// Skips the cache lookup.
    pub force_refresh: bool,
    /// Cache-invalidation key.
    pub document_version: Option<String>,
}

/// Result of an analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeDocumentResult {
    /// Completed record.
    pub record: AnalysisRecord,
    /// Whether the record came from the cache.
    pub cached: bool,
}

/// Reachability report of the text-generation provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextGenerationStatus {
    /// Whether the provider answered.
    pub available: bool,
    /// Configured model.
    pub current_model: String,
    /// Installed models, empty when unavailable.
    pub available_models: Vec<String>,
}

/// Application service for gated, cached document analysis.
#[derive(Clone)]
pub struct DocumentAnalysisService {
    access_decision_service: AccessDecisionService,
    analysis_repository: Arc<dyn AnalysisRepository>,
    content_provider: Arc<dyn DocumentContentProvider>,
    text_generator: Arc<dyn TextGenerationProvider>,
    audit_repository: Arc<dyn AuditRepository>,
    settings: AnalysisSettings,
}

impl DocumentAnalysisService {
    /// Creates a new analysis service.
    #[must_use]
    pub fn new(
        access_decision_service: AccessDecisionService,
        analysis_repository: Arc<dyn AnalysisRepository>,
        content_provider: Arc<dyn DocumentContentProvider>,
        text_generator: Arc<dyn TextGenerationProvider>,
        audit_repository: Arc<dyn AuditRepository>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            access_decision_service,
            analysis_repository,
            content_provider,
            text_generator,
            audit_repository,
            settings,
        }
    }

    /// Returns the freshest completed analysis for a document in one language,
    /// restricted to one version when given.
    pub async fn get_cached(
        &self,
        document_id: DocumentId,
        language: AnalysisLanguage,
        document_version: Option<&str>,
    ) -> AppResult<Option<AnalysisRecord>> {
        self.analysis_repository
            .find_latest_completed(document_id, language, document_version)
            .await
    }

    /// Returns the full extracted text of a document the actor may access.
    pub async fn document_content(
        &self,
        actor: &UserIdentity,
        document_id: DocumentId,
    ) -> AppResult<String> {
        let (principal, _) = self
            .access_decision_service
            .require_document_access(actor, document_id)
            .await?;
        self.fetch_content(&principal, document_id).await
    }

    /// Runs or reuses a full analysis of one document.
    ///
    /// Once the `pending` record exists, the rest of the lifecycle runs on a
    /// detached task: dropping the returned future does not strand the record
    /// in a non-terminal state.
    pub async fn analyze_document(
        &self,
        actor: &UserIdentity,
        document_id: DocumentId,
        input: AnalyzeDocumentInput,
    ) -> AppResult<AnalyzeDocumentResult> {
        let (principal, _) = self
            .access_decision_service
            .require_document_access(actor, document_id)
            .await?;

        if !input.force_refresh {
            let cached = self
                .get_cached(document_id, input.language, input.document_version.as_deref())
                .await?;
            if let Some(record) = cached {
                return Ok(AnalyzeDocumentResult {
                    record,
                    cached: true,
                });
            }
        }

        let content = self.document_excerpt(&principal, document_id).await?;
        self.require_text_generator().await?;

        let now = Utc::now();
        let stale_before = now
            - chrono::Duration::from_std(self.settings.stale_after)
                .map_err(|error| AppError::Internal(format!("invalid stale threshold: {error}")))?;
        let record = self
            .analysis_repository
            .create_pending(
                AnalysisRecord::pending(
                    AnalysisId::new(),
                    document_id,
                    input.document_version,
                    input.language,
                    principal.user_id,
                    Some(self.text_generator.model_name().to_owned()),
                    now,
                ),
                stale_before,
            )
            .await?;

        let worker = self.clone();
        let actor = actor.clone();
        let record = tokio::spawn(async move {
            worker
                .run_analysis(&actor, record, content, input.language)
                .await
        })
        .await
        .map_err(|join_error| {
            AppError::Internal(format!(
                "analysis task for document '{document_id}' did not finish: {join_error}"
            ))
        })??;

        Ok(AnalyzeDocumentResult {
            record,
            cached: false,
        })
    }

    async fn run_analysis(
        &self,
        actor: &UserIdentity,
        mut record: AnalysisRecord,
        content: String,
        language: AnalysisLanguage,
    ) -> AppResult<AnalysisRecord> {
        let document_id = record.document_id();

        record.begin_processing()?;
        if let Err(storage_error) = self.analysis_repository.save_transition(&record).await {
            self.record_failure(actor, &mut record, &storage_error).await;
            return Err(storage_error);
        }

        let started_at = Instant::now();
        let reply = self
            .generate(prompts::analysis_request(&content, language))
            .await;
        let processing_seconds = started_at.elapsed().as_secs_f64();

        let reply = match reply {
            Ok(reply) => reply,
            Err(generation_error) => {
                self.record_failure(actor, &mut record, &generation_error).await;
                return Err(generation_error);
            }
        };

        let parsed = parse_analysis_response(&reply);
        if !parsed.structured {
            warn!(
                analysis_id = %record.id(),
                document_id = %document_id,
                "text generation reply was not valid JSON; keeping raw summary"
            );
        }

        let mut completed = record.clone();
        completed.complete(
            AnalysisOutcome {
                summary: parsed.summary,
                keywords: parsed.keywords,
                key_points: parsed.key_points,
                processing_seconds,
            },
            Utc::now(),
        )?;
        if let Err(storage_error) = self.analysis_repository.save_transition(&completed).await {
            self.record_failure(actor, &mut record, &storage_error).await;
            return Err(storage_error);
        }

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action: AuditAction::DocumentAnalysisCompleted,
                resource_type: "document_analysis".to_owned(),
                resource_id: completed.id().to_string(),
                detail: Some(format!(
                    "analysed document '{document_id}' in {processing_seconds:.2}s ({})",
                    language.as_str()
                )),
            })
            .await?;

        info!(
            analysis_id = %completed.id(),
            document_id = %document_id,
            language = language.as_str(),
            processing_seconds,
            "document analysis completed"
        );

        Ok(completed)
    }

    /// Generates an uncached summary.
    pub async fn summarize(
        &self,
        actor: &UserIdentity,
        document_id: DocumentId,
        language: AnalysisLanguage,
    ) -> AppResult<String> {
        let content = self.gated_excerpt(actor, document_id).await?;
        let reply = self
            .generate(prompts::summary_request(&content, language))
            .await?;
        Ok(reply.trim().to_owned())
    }

    /// Extracts up to `count` keywords without caching.
    pub async fn extract_keywords(
        &self,
        actor: &UserIdentity,
        document_id: DocumentId,
        count: usize,
        language: AnalysisLanguage,
    ) -> AppResult<Vec<String>> {
        if count == 0 || count > MAX_KEYWORD_COUNT {
            return Err(AppError::Validation(format!(
                "keyword count must be between 1 and {MAX_KEYWORD_COUNT}"
            )));
        }

        let content = self.gated_excerpt(actor, document_id).await?;
        let reply = self
            .generate(prompts::keywords_request(&content, count, language))
            .await?;
        Ok(parse_keywords(&reply, count))
    }

    /// Answers a free-text question about one document.
    pub async fn ask_question(
        &self,
        actor: &UserIdentity,
        document_id: DocumentId,
        question: &str,
        language: AnalysisLanguage,
    ) -> AppResult<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("question must not be empty".to_owned()));
        }

        let content = self.gated_excerpt(actor, document_id).await?;
        let reply = self
            .generate(prompts::question_request(&content, question, language))
            .await?;
        Ok(reply.trim().to_owned())
    }

    /// Lists the actor's own analysis records, newest first.
    pub async fn history(
        &self,
        actor: &UserIdentity,
        query: AnalysisHistoryQuery,
    ) -> AppResult<Vec<AnalysisRecord>> {
        let principal = self.access_decision_service.resolve_principal(actor).await?;
        self.analysis_repository
            .list_for_principal(principal.user_id, query)
            .await
    }

    /// Returns one of the actor's own analysis records.
    pub async fn get_analysis(
        &self,
        actor: &UserIdentity,
        analysis_id: AnalysisId,
    ) -> AppResult<AnalysisRecord> {
        let principal = self.access_decision_service.resolve_principal(actor).await?;
        self.analysis_repository
            .find_analysis(analysis_id)
            .await?
            .filter(|record| record.principal_id() == principal.user_id)
            .ok_or_else(|| AppError::NotFound(format!("analysis '{analysis_id}' not found")))
    }

    /// Reports provider reachability and installed models.
    pub async fn text_generation_status(&self) -> TextGenerationStatus {
        let available = self.text_generator.is_available().await;
        let available_models = if available {
            self.text_generator.list_models().await.unwrap_or_else(|list_error| {
                warn!(error = %list_error, "failed to list text generation models");
                Vec::new()
            })
        } else {
            Vec::new()
        };

        TextGenerationStatus {
            available,
            current_model: self.text_generator.model_name().to_owned(),
            available_models,
        }
    }

    /// Lists installed models, failing when the provider is unreachable.
    pub async fn list_models(&self) -> AppResult<Vec<String>> {
        self.require_text_generator().await?;
        self.text_generator.list_models().await
    }

    async fn gated_excerpt(&self, actor: &UserIdentity, document_id: DocumentId) -> AppResult<String> {
        let (principal, _) = self
            .access_decision_service
            .require_document_access(actor, document_id)
            .await?;
        let content = self.document_excerpt(&principal, document_id).await?;
        self.require_text_generator().await?;
        Ok(content)
    }

    async fn fetch_content(
        &self,
        principal: &Principal,
        document_id: DocumentId,
    ) -> AppResult<String> {
        self.content_provider
            .fetch_document_content(document_id, principal.content_token.as_deref())
            .await?
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "content of document '{document_id}' is not available yet"
                ))
            })
    }

    async fn document_excerpt(
        &self,
        principal: &Principal,
        document_id: DocumentId,
    ) -> AppResult<String> {
        let content = self.fetch_content(principal, document_id).await?;
        Ok(excerpt(&content, self.settings.content_max_chars))
    }

    async fn require_text_generator(&self) -> AppResult<()> {
        if self.text_generator.is_available().await {
            return Ok(());
        }

        warn!("text generation provider is unreachable");
        Err(AppError::ServiceUnavailable(
            "text generation provider is unreachable".to_owned(),
        ))
    }

    async fn generate(&self, request: GenerationRequest) -> AppResult<String> {
        let reply = tokio::time::timeout(
            self.settings.generation_timeout,
            self.text_generator.generate(request),
        )
        .await
        .map_err(|_| {
            AppError::ServiceUnavailable(format!(
                "text generation timed out after {}s",
                self.settings.generation_timeout.as_secs()
            ))
        })?
        .map_err(|generation_error| match generation_error {
            AppError::ServiceUnavailable(message) => AppError::ServiceUnavailable(message),
            other => AppError::ServiceUnavailable(format!("text generation failed: {other}")),
        })?;

        if reply.trim().is_empty() {
            return Err(AppError::ServiceUnavailable(
                "text generation provider returned an empty reply".to_owned(),
            ));
        }

        Ok(reply)
    }

    async fn record_failure(
        &self,
        actor: &UserIdentity,
        record: &mut AnalysisRecord,
        cause: &AppError,
    ) {
        let message = match cause {
            AppError::ServiceUnavailable(message) => message.clone(),
            other => other.to_string(),
        };

        warn!(
            analysis_id = %record.id(),
            document_id = %record.document_id(),
            error = %message,
            "document analysis failed"
        );

        if let Err(transition_error) = record.fail(message.clone(), Utc::now()) {
            error!(analysis_id = %record.id(), error = %transition_error, "failed to mark analysis as failed");
            return;
        }

        if let Err(storage_error) = self.analysis_repository.save_transition(record).await {
            error!(analysis_id = %record.id(), error = %storage_error, "failed to persist analysis failure");
            return;
        }

        if let Err(audit_error) = self
            .audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action: AuditAction::DocumentAnalysisFailed,
                resource_type: "document_analysis".to_owned(),
                resource_id: record.id().to_string(),
                detail: Some(message),
            })
            .await
        {
            error!(analysis_id = %record.id(), error = %audit_error, "failed to audit analysis failure");
        }
    }
}

#[cfg(test)]
mod tests;
