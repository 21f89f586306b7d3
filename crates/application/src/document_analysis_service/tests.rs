use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;
use nerostack_core::{AppError, AppResult};
use nerostack_domain::{
    AnalysisId, AnalysisLanguage, AnalysisRecord, AnalysisStatus, AuditAction, DocumentId,
    Principal, PrincipalRole,
};

use crate::test_fakes::{
    FakeAccessWindowRepository, FakeAnalysisRepository, FakeAuditRepository, FakeContentProvider,
    FakePrincipalRepository, FakeTextGenerator, identity_for, principal,
};
use crate::{AccessDecisionService, AnalysisHistoryQuery, AnalysisRepository};

use super::{AnalysisSettings, AnalyzeDocumentInput, DocumentAnalysisService};

const STRUCTURED_REPLY: &str =
    r#"{"summary": "Supplier contract", "keywords": ["supplier"], "key_points": ["renewal"]}"#;

struct Fixture {
    service: DocumentAnalysisService,
    analyses: Arc<FakeAnalysisRepository>,
    generator: Arc<FakeTextGenerator>,
    audit: Arc<FakeAuditRepository>,
    admin: Principal,
    alice: Principal,
}

fn fixture_with(content: Option<&str>, generator: FakeTextGenerator, settings: AnalysisSettings) -> Fixture {
    let admin = principal("root", PrincipalRole::Admin);
    let alice = principal("alice", PrincipalRole::User);
    let principals = Arc::new(FakePrincipalRepository::with(vec![admin.clone(), alice.clone()]));
    let windows = Arc::new(FakeAccessWindowRepository::default());
    let audit = Arc::new(FakeAuditRepository::default());
    let analyses = Arc::new(FakeAnalysisRepository::default());
    let generator = Arc::new(generator);
    let decisions = AccessDecisionService::new(principals, windows, audit.clone());
    let service = DocumentAnalysisService::new(
        decisions,
        analyses.clone(),
        Arc::new(FakeContentProvider::with(content)),
        generator.clone(),
        audit.clone(),
        settings,
    );

    Fixture {
        service,
        analyses,
        generator,
        audit,
        admin,
        alice,
    }
}

fn fixture(content: Option<&str>, replies: Vec<AppResult<String>>) -> Fixture {
    fixture_with(content, FakeTextGenerator::replying(replies), AnalysisSettings::default())
}

#[tokio::test]
async fn analysis_completes_and_is_served_from_cache_afterwards() {
    let fixture = fixture(Some("contract body"), vec![Ok(STRUCTURED_REPLY.to_owned())]);
    let admin = identity_for(&fixture.admin);

    let first = fixture
        .service
        .analyze_document(&admin, DocumentId::new(4), AnalyzeDocumentInput::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!first.cached);
    assert_eq!(first.record.status(), AnalysisStatus::Completed);
    assert_eq!(first.record.summary(), Some("Supplier contract"));
    assert_eq!(first.record.model_used(), Some("llama3.2"));

    let second = fixture
        .service
        .analyze_document(&admin, DocumentId::new(4), AnalyzeDocumentInput::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(second.cached);
    assert_eq!(second.record.id(), first.record.id());
    assert_eq!(fixture.generator.requests.lock().await.len(), 1);
}

#[tokio::test]
async fn cache_round_trip_returns_completed_summary() {
    let fixture = fixture(None, Vec::new());
    let pending = AnalysisRecord::pending(
        AnalysisId::new(),
        DocumentId::new(11),
        None,
        AnalysisLanguage::Fr,
        fixture.admin.user_id,
        None,
        Utc::now(),
    );
    let mut record = fixture
        .analyses
        .create_pending(pending, Utc::now() - chrono::Duration::minutes(10))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(record.begin_processing().is_ok());
    assert!(
        record
            .complete(
                nerostack_domain::AnalysisOutcome {
                    summary: "X".to_owned(),
                    keywords: Vec::new(),
                    key_points: Vec::new(),
                    processing_seconds: 0.1,
                },
                Utc::now(),
            )
            .is_ok()
    );
    assert!(fixture.analyses.save_transition(&record).await.is_ok());

    let cached = fixture
        .service
        .get_cached(DocumentId::new(11), AnalysisLanguage::Fr, None)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(cached.as_ref().and_then(|record| record.summary()), Some("X"));

    let english = fixture
        .service
        .get_cached(DocumentId::new(11), AnalysisLanguage::En, None)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(english.is_none());
}

#[tokio::test]
async fn cached_analysis_is_not_reused_for_another_language() {
    let fixture = fixture(
        Some("body"),
        vec![Ok(STRUCTURED_REPLY.to_owned()), Ok(STRUCTURED_REPLY.to_owned())],
    );
    let admin = identity_for(&fixture.admin);

    let french = fixture
        .service
        .analyze_document(&admin, DocumentId::new(4), AnalyzeDocumentInput::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(french.record.language(), AnalysisLanguage::Fr);

    let english = fixture
        .service
        .analyze_document(
            &admin,
            DocumentId::new(4),
            AnalyzeDocumentInput {
                language: AnalysisLanguage::En,
                ..AnalyzeDocumentInput::default()
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!english.cached);
    assert_eq!(english.record.language(), AnalysisLanguage::En);
    assert_ne!(english.record.id(), french.record.id());

    let requests = fixture.generator.requests.lock().await;
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn version_mismatch_misses_the_cache() {
    let fixture = fixture(
        Some("body"),
        vec![Ok(STRUCTURED_REPLY.to_owned()), Ok(STRUCTURED_REPLY.to_owned())],
    );
    let admin = identity_for(&fixture.admin);
    let versioned = |version: &str| AnalyzeDocumentInput {
        document_version: Some(version.to_owned()),
        ..AnalyzeDocumentInput::default()
    };

    assert!(
        fixture
            .service
            .analyze_document(&admin, DocumentId::new(4), versioned("1"))
            .await
            .is_ok()
    );
    let second = fixture
        .service
        .analyze_document(&admin, DocumentId::new(4), versioned("2"))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!second.cached);
}

#[tokio::test]
async fn force_refresh_creates_a_new_record() {
    let fixture = fixture(
        Some("body"),
        vec![Ok(STRUCTURED_REPLY.to_owned()), Ok(STRUCTURED_REPLY.to_owned())],
    );
    let admin = identity_for(&fixture.admin);

    assert!(
        fixture
            .service
            .analyze_document(&admin, DocumentId::new(4), AnalyzeDocumentInput::default())
            .await
            .is_ok()
    );
    let refreshed = fixture
        .service
        .analyze_document(
            &admin,
            DocumentId::new(4),
            AnalyzeDocumentInput {
                force_refresh: true,
                ..AnalyzeDocumentInput::default()
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(!refreshed.cached);
    assert_eq!(fixture.analyses.records.lock().await.len(), 2);
}

#[tokio::test]
async fn denied_principal_never_reaches_providers() {
    let fixture = fixture(Some("body"), vec![Ok(STRUCTURED_REPLY.to_owned())]);

    let result = fixture
        .service
        .analyze_document(
            &identity_for(&fixture.alice),
            DocumentId::new(4),
            AnalyzeDocumentInput::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(fixture.generator.requests.lock().await.is_empty());
    assert!(fixture.analyses.records.lock().await.is_empty());
}

#[tokio::test]
async fn missing_content_is_not_found_and_creates_no_record() {
    let fixture = fixture(None, vec![Ok(STRUCTURED_REPLY.to_owned())]);

    let result = fixture
        .service
        .analyze_document(
            &identity_for(&fixture.admin),
            DocumentId::new(4),
            AnalyzeDocumentInput::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(fixture.analyses.records.lock().await.is_empty());
}

#[tokio::test]
async fn document_content_is_gated_and_untruncated() {
    let long_body = "a".repeat(20_000);
    let fixture = fixture(Some(long_body.as_str()), Vec::new());

    let content = fixture
        .service
        .document_content(&identity_for(&fixture.admin), DocumentId::new(4))
        .await
        .unwrap_or_default();
    assert_eq!(content.len(), 20_000);

    let denied = fixture
        .service
        .document_content(&identity_for(&fixture.alice), DocumentId::new(4))
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn blank_document_content_is_not_found() {
    let fixture = fixture(Some("   "), Vec::new());

    let result = fixture
        .service
        .document_content(&identity_for(&fixture.admin), DocumentId::new(4))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn unreachable_generator_is_service_unavailable() {
    let mut generator = FakeTextGenerator::replying(Vec::new());
    generator.available = false;
    let fixture = fixture_with(Some("body"), generator, AnalysisSettings::default());

    let result = fixture
        .service
        .analyze_document(
            &identity_for(&fixture.admin),
            DocumentId::new(4),
            AnalyzeDocumentInput::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::ServiceUnavailable(_))));
    assert!(fixture.analyses.records.lock().await.is_empty());
}

#[tokio::test]
async fn generation_failure_marks_record_failed() {
    let fixture = fixture(
        Some("body"),
        vec![Err(AppError::ServiceUnavailable("connection reset".to_owned()))],
    );

    let result = fixture
        .service
        .analyze_document(
            &identity_for(&fixture.admin),
            DocumentId::new(4),
            AnalyzeDocumentInput::default(),
        )
        .await;
    assert!(matches!(result, Err(AppError::ServiceUnavailable(_))));

    let records = fixture.analyses.records.lock().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status(), AnalysisStatus::Failed);
    assert_eq!(records[0].error_message(), Some("connection reset"));
    assert!(records[0].completed_at().is_some());

    let events = fixture.audit.events.lock().await;
    assert!(events.iter().any(|event| event.action == AuditAction::DocumentAnalysisFailed));
}

#[tokio::test]
async fn generation_timeout_marks_record_failed() {
    let mut generator = FakeTextGenerator::replying(vec![Ok(STRUCTURED_REPLY.to_owned())]);
    generator.delay = Some(Duration::from_millis(200));
    let fixture = fixture_with(
        Some("body"),
        generator,
        AnalysisSettings {
            generation_timeout: Duration::from_millis(10),
            ..AnalysisSettings::default()
        },
    );

    let result = fixture
        .service
        .analyze_document(
            &identity_for(&fixture.admin),
            DocumentId::new(4),
            AnalyzeDocumentInput::default(),
        )
        .await;
    assert!(matches!(result, Err(AppError::ServiceUnavailable(message)) if message.contains("timed out")));

    let records = fixture.analyses.records.lock().await;
    assert_eq!(records[0].status(), AnalysisStatus::Failed);
}

#[tokio::test]
async fn malformed_reply_is_kept_as_summary() {
    let fixture = fixture(Some("body"), vec![Ok("The model ignored the format.".to_owned())]);

    let result = fixture
        .service
        .analyze_document(
            &identity_for(&fixture.admin),
            DocumentId::new(4),
            AnalyzeDocumentInput::default(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(result.record.summary(), Some("The model ignored the format."));
    assert!(result.record.keywords().is_empty());
}

#[tokio::test]
async fn in_flight_analysis_conflicts() {
    let fixture = fixture(Some("body"), vec![Ok(STRUCTURED_REPLY.to_owned())]);
    let in_flight = AnalysisRecord::pending(
        AnalysisId::new(),
        DocumentId::new(4),
        None,
        AnalysisLanguage::Fr,
        fixture.admin.user_id,
        None,
        Utc::now(),
    );
    fixture.analyses.records.lock().await.push(in_flight);

    let result = fixture
        .service
        .analyze_document(
            &identity_for(&fixture.admin),
            DocumentId::new(4),
            AnalyzeDocumentInput::default(),
        )
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn stale_in_flight_analysis_is_abandoned() {
    let fixture = fixture(Some("body"), vec![Ok(STRUCTURED_REPLY.to_owned())]);
    let stale = AnalysisRecord::pending(
        AnalysisId::new(),
        DocumentId::new(4),
        None,
        AnalysisLanguage::Fr,
        fixture.admin.user_id,
        None,
        Utc::now() - chrono::Duration::hours(1),
    );
    let stale_id = stale.id();
    fixture.analyses.records.lock().await.push(stale);

    let result = fixture
        .service
        .analyze_document(
            &identity_for(&fixture.admin),
            DocumentId::new(4),
            AnalyzeDocumentInput::default(),
        )
        .await;
    assert!(result.is_ok());

    let records = fixture.analyses.records.lock().await;
    let abandoned = records.iter().find(|record| record.id() == stale_id);
    assert!(abandoned.is_some_and(|record| record.status() == AnalysisStatus::Failed));
}

#[tokio::test]
async fn keywords_are_capped_and_count_is_validated() {
    let fixture = fixture(Some("body"), vec![Ok("alpha, beta, gamma, delta".to_owned())]);
    let admin = identity_for(&fixture.admin);

    let keywords = fixture
        .service
        .extract_keywords(&admin, DocumentId::new(4), 2, AnalysisLanguage::En)
        .await
        .unwrap_or_default();
    assert_eq!(keywords, vec!["alpha", "beta"]);

    let invalid = fixture
        .service
        .extract_keywords(&admin, DocumentId::new(4), 51, AnalysisLanguage::En)
        .await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn empty_question_is_rejected() {
    let fixture = fixture(Some("body"), Vec::new());

    let result = fixture
        .service
        .ask_question(
            &identity_for(&fixture.admin),
            DocumentId::new(4),
            "   ",
            AnalysisLanguage::Fr,
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn history_only_exposes_own_records() {
    let fixture = fixture(Some("body"), vec![Ok(STRUCTURED_REPLY.to_owned())]);
    let admin = identity_for(&fixture.admin);
    let analysed = fixture
        .service
        .analyze_document(&admin, DocumentId::new(4), AnalyzeDocumentInput::default())
        .await
        .unwrap_or_else(|_| unreachable!());

    let own = fixture
        .service
        .history(&admin, AnalysisHistoryQuery::default())
        .await
        .unwrap_or_default();
    assert_eq!(own.len(), 1);

    let alice = identity_for(&fixture.alice);
    let others = fixture
        .service
        .history(&alice, AnalysisHistoryQuery::default())
        .await
        .unwrap_or_default();
    assert!(others.is_empty());

    let foreign = fixture.service.get_analysis(&alice, analysed.record.id()).await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn status_reports_models_when_available() {
    let fixture = fixture(None, Vec::new());
    let status = fixture.service.text_generation_status().await;

    assert!(status.available);
    assert_eq!(status.current_model, "llama3.2");
    assert_eq!(status.available_models, vec!["llama3.2:latest".to_owned()]);
}

#[tokio::test]
async fn dropped_request_still_finishes_the_record() {
    let mut generator = FakeTextGenerator::replying(vec![Ok(STRUCTURED_REPLY.to_owned())]);
    generator.delay = Some(Duration::from_millis(200));
    let fixture = fixture_with(Some("body"), generator, AnalysisSettings::default());
    let admin = identity_for(&fixture.admin);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        fixture
            .service
            .analyze_document(&admin, DocumentId::new(4), AnalyzeDocumentInput::default()),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;
    {
        let records = fixture.analyses.records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status(), AnalysisStatus::Completed);
    }

    let retry = fixture
        .service
        .analyze_document(&admin, DocumentId::new(4), AnalyzeDocumentInput::default())
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    assert!(retry.cached);
}

#[tokio::test]
async fn storage_failure_on_completion_leaves_record_failed() {
    let fixture = fixture(Some("body"), vec![Ok(STRUCTURED_REPLY.to_owned())]);
    fixture.analyses.reject_completion.store(true, Ordering::SeqCst);

    let result = fixture
        .service
        .analyze_document(
            &identity_for(&fixture.admin),
            DocumentId::new(4),
            AnalyzeDocumentInput::default(),
        )
        .await;
    assert!(matches!(result, Err(AppError::Internal(_))));

    let records = fixture.analyses.records.lock().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status(), AnalysisStatus::Failed);
    assert!(records[0].completed_at().is_some());
}
