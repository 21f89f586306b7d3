//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access_window;
mod analysis;
mod audit;
mod principal;

pub use access_window::{
    ACCESS_WINDOW_REASON_MAX_LENGTH, AccessLevel, AccessWindow, AccessWindowChanges,
    AccessWindowGrant, AccessWindowId, AccessWindowRecord, CabinetId, DocumentId,
    WindowEvaluation, WindowStatus, validate_window_bounds,
};
pub use analysis::{
    AnalysisId, AnalysisLanguage, AnalysisOutcome, AnalysisRecord, AnalysisRecordParts,
    AnalysisStatus,
};
pub use audit::AuditAction;
pub use principal::{
    DISPLAY_NAME_MAX_LENGTH, EMAIL_MAX_LENGTH, Principal, PrincipalChanges, PrincipalRole,
    USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH, UserId, normalize_display_name, normalize_email,
    normalize_username,
};
