use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nerostack_core::AppResult;
use nerostack_domain::{
    AnalysisId, AnalysisLanguage, AnalysisRecord, AnalysisStatus, DocumentId, UserId,
};

/// Filters for a principal's analysis history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisHistoryQuery {
    /// Restricts to one document.
    pub document_id: Option<DocumentId>,
    /// Restricts to one status.
    pub status: Option<AnalysisStatus>,
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped.
    pub offset: usize,
}

impl Default for AnalysisHistoryQuery {
    fn default() -> Self {
        Self {
            document_id: None,
            status: None,
            limit: 20,
            offset: 0,
        }
    }
}

/// Repository port for the analysis cache.
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    /// Inserts a `pending` record.
    ///
    /// In-flight records for the same document created before `stale_before`
    /// are failed as abandoned first. A remaining in-flight record yields
    /// `Conflict`.
    async fn create_pending(
        &self,
        record: AnalysisRecord,
        stale_before: DateTime<Utc>,
    ) -> AppResult<AnalysisRecord>;

    /// Returns the newest `completed` record for the document in `language`,
    /// restricted to one version when given.
    async fn find_latest_completed(
        &self,
        document_id: DocumentId,
        language: AnalysisLanguage,
        document_version: Option<&str>,
    ) -> AppResult<Option<AnalysisRecord>>;

    /// Persists a status transition. Fails with `Conflict` when the stored
    /// record is already terminal.
    async fn save_transition(&self, record: &AnalysisRecord) -> AppResult<()>;

    /// Finds one record by identifier.
    async fn find_analysis(&self, analysis_id: AnalysisId) -> AppResult<Option<AnalysisRecord>>;

    /// Lists one principal's records, newest first.
    async fn list_for_principal(
        &self,
        principal_id: UserId,
        query: AnalysisHistoryQuery,
    ) -> AppResult<Vec<AnalysisRecord>>;
}

/// Port for the external document-management backend.
#[async_trait]
pub trait DocumentContentProvider: Send + Sync {
    /// Returns the extracted text of a document, or `None` while it is not available yet.
    ///
    /// Backend outages and rejected credentials are `ServiceUnavailable`.
    async fn fetch_document_content(
        &self,
        document_id: DocumentId,
        content_token: Option<&str>,
    ) -> AppResult<Option<String>>;

    /// Probes backend reachability.
    async fn check_health(&self) -> AppResult<()>;
}

/// Prompt sent to the text-generation provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// User prompt.
    pub prompt: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
}

/// Port for the external text-generation provider.
#[async_trait]
pub trait TextGenerationProvider: Send + Sync {
    /// Generates free text for the request.
    async fn generate(&self, request: GenerationRequest) -> AppResult<String>;

    /// Returns whether the provider answers at all.
    async fn is_available(&self) -> bool;

    /// Lists models installed on the provider.
    async fn list_models(&self) -> AppResult<Vec<String>>;

    /// Returns the configured model name.
    fn model_name(&self) -> &str;
}
