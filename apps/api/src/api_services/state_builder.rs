use std::sync::Arc;
use std::time::Duration;

use nerostack_application::{
    AccessAdministrationService, AccessDecisionService, AdminSeedOutcome, AnalysisRepository,
    AccessWindowRepository, AuditRepository, DocumentAnalysisService, DocumentContentProvider,
    PrincipalAdministrationService, PrincipalRepository, PrincipalService,
    TextGenerationProvider,
};
use nerostack_core::AppError;
use nerostack_infrastructure::{
    MayanCredentials, MayanDocumentContentProvider, OllamaTextGenerationProvider,
    PostgresAccessWindowRepository, PostgresAnalysisRepository, PostgresAuditRepository,
    PostgresPrincipalRepository,
};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

const PROVIDER_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

struct RepositorySet {
    principal_repository: Arc<dyn PrincipalRepository>,
    window_repository: Arc<dyn AccessWindowRepository>,
    analysis_repository: Arc<dyn AnalysisRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

fn build_repository_set(pool: &PgPool) -> RepositorySet {
    RepositorySet {
        principal_repository: Arc::new(PostgresPrincipalRepository::new(pool.clone())),
        window_repository: Arc::new(PostgresAccessWindowRepository::new(pool.clone())),
        analysis_repository: Arc::new(PostgresAnalysisRepository::new(pool.clone())),
        audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
    }
}

fn build_http_client() -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .connect_timeout(PROVIDER_CONNECT_TIMEOUT)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))
}

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let repositories = build_repository_set(&pool);
    let http_client = build_http_client()?;

    let content_provider: Arc<dyn DocumentContentProvider> =
        Arc::new(MayanDocumentContentProvider::new(
            http_client.clone(),
            config.mayan.url.clone(),
            MayanCredentials {
                username: config.mayan.admin_user.clone(),
                password: config.mayan.admin_password.clone(),
            },
        ));
    let text_generator: Arc<dyn TextGenerationProvider> =
        Arc::new(OllamaTextGenerationProvider::new(
            http_client,
            config.ollama.url.clone(),
            config.ollama.model.clone(),
        ));

    let access_decision_service = AccessDecisionService::new(
        repositories.principal_repository.clone(),
        repositories.window_repository.clone(),
        repositories.audit_repository.clone(),
    );

    Ok(AppState {
        access_administration_service: AccessAdministrationService::new(
            access_decision_service.clone(),
            repositories.principal_repository.clone(),
            repositories.window_repository,
            repositories.audit_repository.clone(),
        ),
        document_analysis_service: DocumentAnalysisService::new(
            access_decision_service.clone(),
            repositories.analysis_repository,
            content_provider.clone(),
            text_generator,
            repositories.audit_repository.clone(),
            config.analysis,
        ),
        principal_administration_service: PrincipalAdministrationService::new(
            access_decision_service.clone(),
            repositories.principal_repository.clone(),
            repositories.audit_repository,
        ),
        access_decision_service,
        principal_service: PrincipalService::new(repositories.principal_repository),
        content_provider,
        postgres_pool: pool,
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
    })
}

pub async fn seed_admin(pool: &PgPool, config: &ApiConfig) -> Result<(), AppError> {
    let service = PrincipalService::new(Arc::new(PostgresPrincipalRepository::new(pool.clone())));

    match service.seed_admin(config.admin_seed.clone()).await? {
        AdminSeedOutcome::Created(user_id) => {
            info!(%user_id, username = %config.admin_seed.username, "default admin created");
        }
        AdminSeedOutcome::AlreadyPresent(user_id) => {
            info!(%user_id, username = %config.admin_seed.username, "default admin already present");
        }
    }

    Ok(())
}
