use std::sync::Arc;

use nerostack_application::{
    AccessAdministrationService, AccessDecisionService, DocumentAnalysisService,
    DocumentContentProvider, PrincipalAdministrationService, PrincipalService,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_decision_service: AccessDecisionService,
    pub access_administration_service: AccessAdministrationService,
    pub document_analysis_service: DocumentAnalysisService,
    pub principal_service: PrincipalService,
    pub principal_administration_service: PrincipalAdministrationService,
    pub content_provider: Arc<dyn DocumentContentProvider>,
    pub postgres_pool: PgPool,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
