//! Cached outcomes of document text analysis.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use nerostack_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DocumentId, UserId};

/// Stable identifier of an analysis record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisId(Uuid);

impl AnalysisId {
    /// Creates a new random analysis identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an analysis identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses an analysis identifier from its transport representation.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid analysis id '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnalysisId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle status of an analysis record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Created, generation not dispatched yet.
    Pending,
    /// Generation dispatched.
    Processing,
    /// Outcome stored. Terminal.
    Completed,
    /// Error stored. Terminal.
    Failed,
}

impl AnalysisStatus {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns whether no further transition is allowed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl FromStr for AnalysisStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(AppError::Validation(format!(
                "unknown analysis status '{value}'"
            ))),
        }
    }
}

/// Language of the generated analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisLanguage {
    /// French prompts and output.
    #[default]
    Fr,
    /// English prompts and output.
    En,
}

impl AnalysisLanguage {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fr => "fr",
            Self::En => "en",
        }
    }
}

impl FromStr for AnalysisLanguage {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fr" => Ok(Self::Fr),
            "en" => Ok(Self::En),
            _ => Err(AppError::Validation(format!(
                "unsupported analysis language '{value}'"
            ))),
        }
    }
}

/// Structured result of one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Free-text summary.
    pub summary: String,
    /// Ordered keywords.
    pub keywords: Vec<String>,
    /// Ordered key points.
    pub key_points: Vec<String>,
    /// Wall-clock duration of the generation call.
    pub processing_seconds: f64,
}

/// Stored representation used to rehydrate a record.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecordParts {
    /// Stable identifier.
    pub id: AnalysisId,
    /// Analysed document.
    pub document_id: DocumentId,
    /// Cache-invalidation key.
    pub document_version: Option<String>,
    /// Output language, part of the cache key.
    pub language: AnalysisLanguage,
    /// Requester.
    pub principal_id: UserId,
    /// Stored summary.
    pub summary: Option<String>,
    /// Stored keywords.
    pub keywords: Vec<String>,
    /// Stored key points.
    pub key_points: Vec<String>,
    /// Generation model.
    pub model_used: Option<String>,
    /// Lifecycle status.
    pub status: AnalysisStatus,
    /// Failure detail.
    pub error_message: Option<String>,
    /// Generation duration.
    pub processing_seconds: Option<f64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Terminal transition timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Analysis cache entry and its state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    id: AnalysisId,
    document_id: DocumentId,
    document_version: Option<String>,
    language: AnalysisLanguage,
    principal_id: UserId,
    summary: Option<String>,
    keywords: Vec<String>,
    key_points: Vec<String>,
    model_used: Option<String>,
    status: AnalysisStatus,
    error_message: Option<String>,
    processing_seconds: Option<f64>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl AnalysisRecord {
    /// Creates a new `pending` record.
    #[must_use]
    pub fn pending(
        id: AnalysisId,
        document_id: DocumentId,
        document_version: Option<String>,
        language: AnalysisLanguage,
        principal_id: UserId,
        model_used: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            document_id,
            document_version,
            language,
            principal_id,
            summary: None,
            keywords: Vec::new(),
            key_points: Vec::new(),
            model_used,
            status: AnalysisStatus::Pending,
            error_message: None,
            processing_seconds: None,
            created_at: now,
            completed_at: None,
        }
    }

    /// Rehydrates a stored record.
    #[must_use]
    pub fn from_parts(parts: AnalysisRecordParts) -> Self {
        Self {
            id: parts.id,
            document_id: parts.document_id,
            document_version: parts.document_version,
            language: parts.language,
            principal_id: parts.principal_id,
            summary: parts.summary,
            keywords: parts.keywords,
            key_points: parts.key_points,
            model_used: parts.model_used,
            status: parts.status,
            error_message: parts.error_message,
            processing_seconds: parts.processing_seconds,
            created_at: parts.created_at,
            completed_at: parts.completed_at,
        }
    }

    fn transition_error(&self, target: AnalysisStatus) -> AppError {
        AppError::Conflict(format!(
            "analysis '{}' cannot move from '{}' to '{}'",
            self.id,
            self.status.as_str(),
            target.as_str()
        ))
    }

    /// `pending -> processing`.
    pub fn begin_processing(&mut self) -> AppResult<()> {
        if self.status != AnalysisStatus::Pending {
            return Err(self.transition_error(AnalysisStatus::Processing));
        }

        self.status = AnalysisStatus::Processing;
        Ok(())
    }

    /// `processing -> completed`.
    pub fn complete(&mut self, outcome: AnalysisOutcome, now: DateTime<Utc>) -> AppResult<()> {
        if self.status != AnalysisStatus::Processing {
            return Err(self.transition_error(AnalysisStatus::Completed));
        }

        self.summary = Some(outcome.summary);
        self.keywords = outcome.keywords;
        self.key_points = outcome.key_points;
        self.processing_seconds = Some(outcome.processing_seconds);
        self.status = AnalysisStatus::Completed;
        self.completed_at = Some(now);
        Ok(())
    }

    /// `pending | processing -> failed`.
    pub fn fail(&mut self, error_message: impl Into<String>, now: DateTime<Utc>) -> AppResult<()> {
        if self.status.is_terminal() {
            return Err(self.transition_error(AnalysisStatus::Failed));
        }

        self.error_message = Some(error_message.into());
        self.status = AnalysisStatus::Failed;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> AnalysisId {
        self.id
    }

    /// Returns the analysed document.
    #[must_use]
    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    /// Returns the cache-invalidation key.
    #[must_use]
    pub fn document_version(&self) -> Option<&str> {
        self.document_version.as_deref()
    }

    /// Returns the output language.
    #[must_use]
    pub fn language(&self) -> AnalysisLanguage {
        self.language
    }

    /// Returns the requester.
    #[must_use]
    pub fn principal_id(&self) -> UserId {
        self.principal_id
    }

    /// Returns the stored summary.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Returns the stored keywords.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns the stored key points.
    #[must_use]
    pub fn key_points(&self) -> &[String] {
        &self.key_points
    }

    /// Returns the generation model.
    #[must_use]
    pub fn model_used(&self) -> Option<&str> {
        self.model_used.as_deref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    /// Returns the failure detail.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the generation duration.
    #[must_use]
    pub fn processing_seconds(&self) -> Option<f64> {
        self.processing_seconds
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the terminal transition timestamp.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}
