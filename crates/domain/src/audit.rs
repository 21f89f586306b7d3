use std::str::FromStr;

use nerostack_core::AppError;
use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when an access window is granted.
    AccessWindowCreated,
    /// Emitted when an access window is modified.
    AccessWindowUpdated,
    /// Emitted when an access window kill-switch is flipped off.
    AccessWindowRevoked,
    /// Emitted when an access window is removed.
    AccessWindowDeleted,
    /// Emitted when a window is the basis of an allowed document access.
    AccessWindowUsed,
    /// Emitted when a document analysis completes.
    DocumentAnalysisCompleted,
    /// Emitted when a document analysis fails.
    DocumentAnalysisFailed,
    /// Emitted when an administrator creates a principal.
    PrincipalCreated,
    /// Emitted when an administrator changes a principal.
    PrincipalUpdated,
    /// Emitted when an administrator removes a principal.
    PrincipalDeleted,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessWindowCreated => "access_window.created",
            Self::AccessWindowUpdated => "access_window.updated",
            Self::AccessWindowRevoked => "access_window.revoked",
            Self::AccessWindowDeleted => "access_window.deleted",
            Self::AccessWindowUsed => "access_window.used",
            Self::DocumentAnalysisCompleted => "document_analysis.completed",
            Self::DocumentAnalysisFailed => "document_analysis.failed",
            Self::PrincipalCreated => "principal.created",
            Self::PrincipalUpdated => "principal.updated",
            Self::PrincipalDeleted => "principal.deleted",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "access_window.created" => Ok(Self::AccessWindowCreated),
            "access_window.updated" => Ok(Self::AccessWindowUpdated),
            "access_window.revoked" => Ok(Self::AccessWindowRevoked),
            "access_window.deleted" => Ok(Self::AccessWindowDeleted),
            "access_window.used" => Ok(Self::AccessWindowUsed),
            "document_analysis.completed" => Ok(Self::DocumentAnalysisCompleted),
            "document_analysis.failed" => Ok(Self::DocumentAnalysisFailed),
            "principal.created" => Ok(Self::PrincipalCreated),
            "principal.updated" => Ok(Self::PrincipalUpdated),
            "principal.deleted" => Ok(Self::PrincipalDeleted),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::AuditAction;

    #[test]
    fn audit_action_parses_its_storage_value() {
        let action = AuditAction::AccessWindowUsed;
        let restored = AuditAction::from_str(action.as_str());
        assert!(matches!(restored, Ok(AuditAction::AccessWindowUsed)));
    }

    #[test]
    fn unknown_audit_action_is_rejected() {
        assert!(AuditAction::from_str("security.role.created").is_err());
    }
}
