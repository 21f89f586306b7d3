use std::sync::Arc;

use chrono::{Duration, Utc};
use nerostack_core::AppError;
use nerostack_domain::{AuditAction, DocumentId, PrincipalRole};

use crate::test_fakes::{
    FakeAccessWindowRepository, FakeAuditRepository, FakePrincipalRepository, identity_for,
    principal, stored_window,
};

use super::{
    AccessDecisionReason, AccessDecisionService, DenialDetail, DocumentScope, accessible_scope,
    decide_access,
};

fn service(
    principals: Vec<nerostack_domain::Principal>,
    windows: Vec<nerostack_domain::AccessWindow>,
) -> (AccessDecisionService, Arc<FakeAuditRepository>) {
    let audit = Arc::new(FakeAuditRepository::default());
    let service = AccessDecisionService::new(
        Arc::new(FakePrincipalRepository::with(principals)),
        Arc::new(FakeAccessWindowRepository::with(windows)),
        audit.clone(),
    );
    (service, audit)
}

#[test]
fn admin_is_allowed_without_any_window() {
    let admin = principal("root", PrincipalRole::Admin);
    let decision = decide_access(&admin, &[], DocumentId::new(1), Utc::now());

    assert!(decision.allowed);
    assert_eq!(decision.reason, AccessDecisionReason::Admin);
}

#[test]
fn global_window_grants_unrelated_document() {
    let now = Utc::now();
    let alice = principal("alice", PrincipalRole::User);
    let window = stored_window(
        alice.user_id,
        None,
        now - Duration::hours(1),
        now + Duration::hours(1),
        true,
        now - Duration::hours(1),
    );

    let decision = decide_access(&alice, &[window], DocumentId::new(999), now);

    assert!(decision.allowed);
    assert_eq!(decision.reason, AccessDecisionReason::TemporaryAccess);
    assert!(decision.seconds_remaining.is_some_and(|seconds| seconds > 3_500));
}

#[test]
fn document_window_does_not_leak_to_other_documents() {
    let now = Utc::now();
    let alice = principal("alice", PrincipalRole::User);
    let window = stored_window(
        alice.user_id,
        Some(1),
        now - Duration::hours(1),
        now + Duration::hours(1),
        true,
        now,
    );

    assert!(decide_access(&alice, std::slice::from_ref(&window), DocumentId::new(1), now).allowed);
    let denied = decide_access(&alice, &[window], DocumentId::new(2), now);
    assert!(!denied.allowed);
    assert_eq!(denied.reason, AccessDecisionReason::NoAccess);
    assert_eq!(denied.denial_detail, Some(DenialDetail::NoGrant));
}

#[test]
fn expired_and_revoked_windows_are_reported_on_denial() {
    let now = Utc::now();
    let alice = principal("alice", PrincipalRole::User);
    let expired = stored_window(
        alice.user_id,
        Some(5),
        now - Duration::hours(2),
        now - Duration::hours(1),
        true,
        now - Duration::hours(2),
    );
    let revoked = stored_window(
        alice.user_id,
        Some(6),
        now - Duration::hours(1),
        now + Duration::hours(1),
        false,
        now - Duration::hours(1),
    );

    let expired_decision = decide_access(&alice, std::slice::from_ref(&expired), DocumentId::new(5), now);
    assert_eq!(expired_decision.denial_detail, Some(DenialDetail::GrantExpired));

    let revoked_decision = decide_access(&alice, &[expired, revoked], DocumentId::new(6), now);
    assert!(!revoked_decision.allowed);
    assert_eq!(revoked_decision.denial_detail, Some(DenialDetail::GrantRevoked));
}

#[test]
fn pending_grant_outranks_expired_and_revoked_on_denial() {
    let now = Utc::now();
    let alice = principal("alice", PrincipalRole::User);
    let expired = stored_window(
        alice.user_id,
        Some(9),
        now - Duration::hours(3),
        now - Duration::hours(2),
        true,
        now - Duration::hours(3),
    );
    let revoked = stored_window(
        alice.user_id,
        None,
        now - Duration::hours(1),
        now + Duration::hours(1),
        false,
        now - Duration::hours(1),
    );
    let pending = stored_window(
        alice.user_id,
        Some(9),
        now + Duration::hours(1),
        now + Duration::hours(2),
        true,
        now - Duration::minutes(5),
    );

    let decision = decide_access(&alice, &[expired.clone(), revoked.clone(), pending], DocumentId::new(9), now);
    assert!(!decision.allowed);
    assert_eq!(decision.reason, AccessDecisionReason::NoAccess);
    assert_eq!(decision.denial_detail, Some(DenialDetail::GrantPending));

    let without_pending = decide_access(&alice, &[expired, revoked], DocumentId::new(9), now);
    assert_eq!(without_pending.denial_detail, Some(DenialDetail::GrantExpired));
}

#[test]
fn global_window_wins_over_newer_document_window() {
    let now = Utc::now();
    let alice = principal("alice", PrincipalRole::User);
    let global = stored_window(
        alice.user_id,
        None,
        now - Duration::hours(1),
        now + Duration::hours(1),
        true,
        now - Duration::hours(3),
    );
    let scoped = stored_window(
        alice.user_id,
        Some(3),
        now - Duration::hours(1),
        now + Duration::hours(8),
        true,
        now - Duration::minutes(5),
    );

    let decision = decide_access(&alice, &[scoped, global.clone()], DocumentId::new(3), now);
    assert_eq!(decision.window_id, Some(global.id()));
}

#[test]
fn newest_document_window_wins_within_class() {
    let now = Utc::now();
    let alice = principal("alice", PrincipalRole::User);
    let older = stored_window(
        alice.user_id,
        Some(3),
        now - Duration::hours(1),
        now + Duration::hours(1),
        true,
        now - Duration::hours(2),
    );
    let newer = stored_window(
        alice.user_id,
        Some(3),
        now - Duration::hours(1),
        now + Duration::hours(1),
        true,
        now - Duration::minutes(1),
    );

    let decision = decide_access(&alice, &[newer.clone(), older], DocumentId::new(3), now);
    assert_eq!(decision.window_id, Some(newer.id()));
}

#[test]
fn other_principals_windows_are_ignored() {
    let now = Utc::now();
    let alice = principal("alice", PrincipalRole::User);
    let bob = principal("bob", PrincipalRole::User);
    let window = stored_window(
        bob.user_id,
        None,
        now - Duration::hours(1),
        now + Duration::hours(1),
        true,
        now,
    );

    assert!(!decide_access(&alice, &[window], DocumentId::new(1), now).allowed);
}

#[test]
fn accessible_scope_short_circuits_on_global_window() {
    let now = Utc::now();
    let alice = principal("alice", PrincipalRole::User);
    let scoped = stored_window(
        alice.user_id,
        Some(4),
        now - Duration::hours(1),
        now + Duration::hours(1),
        true,
        now,
    );
    let pending = stored_window(
        alice.user_id,
        Some(9),
        now + Duration::hours(1),
        now + Duration::hours(2),
        true,
        now,
    );

    let scope = accessible_scope(&alice, &[scoped.clone(), pending.clone()], now);
    assert!(scope.permits(DocumentId::new(4)));
    assert!(!scope.permits(DocumentId::new(9)));

    let global = stored_window(
        alice.user_id,
        None,
        now - Duration::hours(1),
        now + Duration::hours(1),
        true,
        now,
    );
    assert_eq!(accessible_scope(&alice, &[scoped, pending, global], now), DocumentScope::All);
}

#[tokio::test]
async fn require_document_access_audits_window_use() {
    let now = Utc::now();
    let alice = principal("alice", PrincipalRole::User);
    let window = stored_window(
        alice.user_id,
        Some(12),
        now - Duration::hours(1),
        now + Duration::hours(1),
        true,
        now,
    );
    let (service, audit) = service(vec![alice.clone()], vec![window.clone()]);

    let result = service
        .require_document_access(&identity_for(&alice), DocumentId::new(12))
        .await;
    assert!(result.is_ok());

    let events = audit.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::AccessWindowUsed);
    assert_eq!(events[0].resource_id, window.id().to_string());
}

#[tokio::test]
async fn require_document_access_denies_with_reason_code() {
    let alice = principal("alice", PrincipalRole::User);
    let (service, audit) = service(vec![alice.clone()], Vec::new());

    let result = service
        .require_document_access(&identity_for(&alice), DocumentId::new(12))
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(message)) if message.starts_with("no_access")));
    assert!(audit.events.lock().await.is_empty());
}

#[tokio::test]
async fn unknown_subject_is_unauthorized() {
    let ghost = principal("ghost", PrincipalRole::User);
    let (service, _) = service(Vec::new(), Vec::new());

    let result = service.check_access(&identity_for(&ghost), DocumentId::new(1)).await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn deactivated_principal_is_forbidden() {
    let mut alice = principal("alice", PrincipalRole::Admin);
    alice.is_active = false;
    let (service, _) = service(vec![alice.clone()], Vec::new());

    let result = service.check_access(&identity_for(&alice), DocumentId::new(1)).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn dashboard_buckets_each_window_once() {
    let now = Utc::now();
    let alice = principal("alice", PrincipalRole::User);
    let windows = vec![
        stored_window(alice.user_id, Some(1), now - Duration::hours(1), now + Duration::hours(1), true, now),
        stored_window(alice.user_id, Some(2), now + Duration::hours(1), now + Duration::hours(2), true, now),
        stored_window(alice.user_id, Some(3), now - Duration::hours(2), now - Duration::hours(1), true, now),
        stored_window(alice.user_id, Some(4), now - Duration::hours(2), now - Duration::hours(1), false, now),
    ];
    let (service, _) = service(vec![alice.clone()], windows);

    let dashboard = service
        .access_dashboard(&identity_for(&alice))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(dashboard.active.len(), 1);
    assert_eq!(dashboard.pending.len(), 1);
    assert_eq!(dashboard.expired.len(), 1);
    assert_eq!(dashboard.revoked.len(), 1);
    assert_eq!(dashboard.total(), 4);

    let valid = service
        .my_windows(&identity_for(&alice), true)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(valid.len(), 1);
}
