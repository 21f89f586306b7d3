//! Application services and ports.

#![forbid(unsafe_code)]

mod access_admin_service;
mod access_decision_service;
mod access_ports;
mod analysis_ports;
mod audit_ports;
mod document_analysis_service;
mod principal_admin_service;
mod principal_ports;
mod principal_service;

#[cfg(test)]
mod test_fakes;

pub use access_admin_service::{
    AccessAdministrationService, AccessWindowListQuery, CreateAccessWindowInput,
};
pub use access_decision_service::{
    AccessDashboard, AccessDecision, AccessDecisionReason, AccessDecisionService, DenialDetail,
    DocumentScope, accessible_scope, decide_access, select_window,
};
pub use access_ports::{AccessWindowFilter, AccessWindowRepository};
pub use analysis_ports::{
    AnalysisHistoryQuery, AnalysisRepository, DocumentContentProvider, GenerationRequest,
    TextGenerationProvider,
};
pub use audit_ports::{AuditEvent, AuditRepository};
pub use document_analysis_service::{
    AnalysisSettings, AnalyzeDocumentInput, AnalyzeDocumentResult, DEFAULT_KEYWORD_COUNT,
    DocumentAnalysisService, FALLBACK_SUMMARY_CHARS, MAX_KEYWORD_COUNT, ParsedAnalysis,
    TRUNCATION_MARKER, TextGenerationStatus, excerpt, parse_analysis_response, parse_keywords,
};
pub use principal_admin_service::{CreatePrincipalInput, PrincipalAdministrationService};
pub use principal_ports::{PrincipalFilter, PrincipalRepository};
pub use principal_service::{AdminSeed, AdminSeedOutcome, PrincipalService};
