//! Time-bounded, optionally document-scoped access grants.
//!
//! An [`AccessWindow`] grants one principal access to one document (or, when
//! `document_id` is absent, to every document) between `start_at` and
//! `end_at`, independently of the document backend's own permission model.
//! [`AccessWindow::is_valid_at`] is the single predicate every other component
//! uses to decide whether a window currently counts.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use nerostack_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserId;

/// Maximum length of the free-text grant justification.
pub const ACCESS_WINDOW_REASON_MAX_LENGTH: usize = 500;

/// Stable identifier of an access window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccessWindowId(Uuid);

impl AccessWindowId {
    /// Creates a new random window identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a window identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a window identifier from its transport representation.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid access window id '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AccessWindowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccessWindowId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a document in the document-management backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(i64);

impl DocumentId {
    /// Wraps a backend document identifier.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw backend identifier.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a cabinet (document folder) in the document-management backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CabinetId(i64);

impl CabinetId {
    /// Wraps a backend cabinet identifier.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw backend identifier.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Access level carried by a window.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Read-only access.
    #[default]
    Read,
    /// Read and write access.
    Write,
    /// Full access.
    Admin,
}

impl AccessLevel {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for AccessLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!(
                "unknown access level '{value}'"
            ))),
        }
    }
}

/// Lifecycle bucket of a window at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    /// Enabled and inside its interval.
    Active,
    /// Enabled, interval not started yet.
    Pending,
    /// Enabled, interval over (or degenerate).
    Expired,
    /// Disabled through the kill-switch.
    Revoked,
}

impl WindowStatus {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

/// Derived, non-persisted state of a window at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEvaluation {
    /// `now > end_at`, or the interval is degenerate.
    pub is_expired: bool,
    /// `now < start_at` on a well-formed interval.
    pub is_pending: bool,
    /// `is_enabled && start_at <= now <= end_at` on a well-formed interval.
    pub is_valid: bool,
    /// Whole seconds until `end_at`, never negative.
    pub seconds_remaining: i64,
}

/// Rejects intervals that do not satisfy `start_at < end_at`.
pub fn validate_window_bounds(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> AppResult<()> {
    if start_at >= end_at {
        return Err(AppError::Validation(format!(
            "access window start_at '{}' must be before end_at '{}'",
            start_at.to_rfc3339(),
            end_at.to_rfc3339()
        )));
    }

    Ok(())
}

fn validate_reason(reason: Option<&str>) -> AppResult<()> {
    if reason.is_some_and(|reason| reason.chars().count() > ACCESS_WINDOW_REASON_MAX_LENGTH) {
        return Err(AppError::Validation(format!(
            "access window reason must not exceed {ACCESS_WINDOW_REASON_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Caller-supplied fields of a new grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessWindowGrant {
    /// Principal receiving access.
    pub principal_id: UserId,
    /// Target document; `None` grants every document.
    pub document_id: Option<DocumentId>,
    /// Advisory cabinet scope.
    pub cabinet_id: Option<CabinetId>,
    /// Start of the active interval.
    pub start_at: DateTime<Utc>,
    /// End of the active interval.
    pub end_at: DateTime<Utc>,
    /// Granted level.
    pub access_level: AccessLevel,
    /// Optional justification.
    pub reason: Option<String>,
    /// Elevated principal creating the grant.
    pub granted_by: UserId,
}

/// Partial update of a window. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessWindowChanges {
    /// New start of the interval.
    pub start_at: Option<DateTime<Utc>>,
    /// New end of the interval.
    pub end_at: Option<DateTime<Utc>>,
    /// New access level.
    pub access_level: Option<AccessLevel>,
    /// New kill-switch value.
    pub is_enabled: Option<bool>,
    /// New justification. `Some(None)` clears the stored one.
    pub reason: Option<Option<String>>,
}

impl AccessWindowChanges {
    /// Returns whether the update carries no field at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start_at.is_none()
            && self.end_at.is_none()
            && self.access_level.is_none()
            && self.is_enabled.is_none()
            && self.reason.is_none()
    }
}

/// Time-bounded permission grant record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessWindow {
    id: AccessWindowId,
    principal_id: UserId,
    document_id: Option<DocumentId>,
    cabinet_id: Option<CabinetId>,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    access_level: AccessLevel,
    is_enabled: bool,
    reason: Option<String>,
    granted_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored representation used to rehydrate a window without re-validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessWindowRecord {
    /// Stable identifier.
    pub id: AccessWindowId,
    /// Principal receiving access.
    pub principal_id: UserId,
    /// Target document.
    pub document_id: Option<DocumentId>,
    /// Advisory cabinet scope.
    pub cabinet_id: Option<CabinetId>,
    /// Start of the interval.
    pub start_at: DateTime<Utc>,
    /// End of the interval.
    pub end_at: DateTime<Utc>,
    /// Granted level.
    pub access_level: AccessLevel,
    /// Kill-switch.
    pub is_enabled: bool,
    /// Optional justification.
    pub reason: Option<String>,
    /// Creator.
    pub granted_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl AccessWindow {
    /// Creates a new enabled window after validating bounds and reason.
    pub fn grant(id: AccessWindowId, grant: AccessWindowGrant, now: DateTime<Utc>) -> AppResult<Self> {
        validate_window_bounds(grant.start_at, grant.end_at)?;
        validate_reason(grant.reason.as_deref())?;

        Ok(Self {
            id,
            principal_id: grant.principal_id,
            document_id: grant.document_id,
            cabinet_id: grant.cabinet_id,
            start_at: grant.start_at,
            end_at: grant.end_at,
            access_level: grant.access_level,
            is_enabled: true,
            reason: grant.reason,
            granted_by: grant.granted_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates a stored window. Bounds are not re-validated.
    #[must_use]
    pub fn from_record(record: AccessWindowRecord) -> Self {
        Self {
            id: record.id,
            principal_id: record.principal_id,
            document_id: record.document_id,
            cabinet_id: record.cabinet_id,
            start_at: record.start_at,
            end_at: record.end_at,
            access_level: record.access_level,
            is_enabled: record.is_enabled,
            reason: record.reason,
            granted_by: record.granted_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Applies a partial update.
    ///
    /// The effective bounds (new value if supplied, else current) are validated
    /// before any field changes, so a rejected update leaves the window intact.
    pub fn apply_changes(&mut self, changes: AccessWindowChanges, now: DateTime<Utc>) -> AppResult<()> {
        let start_at = changes.start_at.unwrap_or(self.start_at);
        let end_at = changes.end_at.unwrap_or(self.end_at);
        validate_window_bounds(start_at, end_at)?;
        validate_reason(changes.reason.as_ref().and_then(Option::as_deref))?;

        self.start_at = start_at;
        self.end_at = end_at;
        if let Some(access_level) = changes.access_level {
            self.access_level = access_level;
        }
        if let Some(is_enabled) = changes.is_enabled {
            self.is_enabled = is_enabled;
        }
        if let Some(reason) = changes.reason {
            self.reason = reason;
        }
        self.updated_at = now;

        Ok(())
    }

    /// Flips the kill-switch off. Returns `false` when already revoked.
    pub fn revoke(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_enabled {
            return false;
        }

        self.is_enabled = false;
        self.updated_at = now;
        true
    }

    fn has_well_formed_bounds(&self) -> bool {
        self.start_at < self.end_at
    }

    /// Returns whether the interval is over at `now`.
    ///
    /// Degenerate intervals (`start_at >= end_at`) always count as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.has_well_formed_bounds() || now > self.end_at
    }

    /// Returns whether the interval has not started yet at `now`.
    #[must_use]
    pub fn is_pending_at(&self, now: DateTime<Utc>) -> bool {
        self.has_well_formed_bounds() && now < self.start_at
    }

    /// Returns whether the window grants access at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_enabled
            && self.has_well_formed_bounds()
            && self.start_at <= now
            && now <= self.end_at
    }

    /// Returns whole seconds left until `end_at`, or zero.
    #[must_use]
    pub fn seconds_remaining_at(&self, now: DateTime<Utc>) -> i64 {
        if self.is_expired_at(now) {
            return 0;
        }

        (self.end_at - now).num_seconds().max(0)
    }

    /// Computes every derived flag at `now`.
    #[must_use]
    pub fn evaluate(&self, now: DateTime<Utc>) -> WindowEvaluation {
        WindowEvaluation {
            is_expired: self.is_expired_at(now),
            is_pending: self.is_pending_at(now),
            is_valid: self.is_valid_at(now),
            seconds_remaining: self.seconds_remaining_at(now),
        }
    }

    /// Buckets the window for dashboards. Revocation takes precedence.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> WindowStatus {
        if !self.is_enabled {
            WindowStatus::Revoked
        } else if self.is_expired_at(now) {
            WindowStatus::Expired
        } else if self.is_pending_at(now) {
            WindowStatus::Pending
        } else {
            WindowStatus::Active
        }
    }

    /// Returns whether the window covers every document.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.document_id.is_none()
    }

    /// Returns whether the window covers `document_id`.
    #[must_use]
    pub fn covers(&self, document_id: DocumentId) -> bool {
        self.document_id.is_none_or(|scoped| scoped == document_id)
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> AccessWindowId {
        self.id
    }

    /// Returns the principal receiving access.
    #[must_use]
    pub fn principal_id(&self) -> UserId {
        self.principal_id
    }

    /// Returns the target document, if scoped.
    #[must_use]
    pub fn document_id(&self) -> Option<DocumentId> {
        self.document_id
    }

    /// Returns the advisory cabinet scope.
    #[must_use]
    pub fn cabinet_id(&self) -> Option<CabinetId> {
        self.cabinet_id
    }

    /// Returns the interval start.
    #[must_use]
    pub fn start_at(&self) -> DateTime<Utc> {
        self.start_at
    }

    /// Returns the interval end.
    #[must_use]
    pub fn end_at(&self) -> DateTime<Utc> {
        self.end_at
    }

    /// Returns the granted level.
    #[must_use]
    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    /// Returns the kill-switch value.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// Returns the justification.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the creator.
    #[must_use]
    pub fn granted_by(&self) -> UserId {
        self.granted_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last modification timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
