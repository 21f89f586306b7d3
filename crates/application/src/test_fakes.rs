use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use nerostack_core::{AppError, AppResult, UserIdentity};
use nerostack_domain::{
    AccessLevel, AccessWindow, AccessWindowChanges, AccessWindowId, AccessWindowRecord,
    AnalysisId, AnalysisLanguage, AnalysisRecord, AnalysisStatus, DocumentId, Principal,
    PrincipalChanges, PrincipalRole, UserId,
};

use crate::{
    AccessWindowFilter, AccessWindowRepository, AnalysisHistoryQuery, AnalysisRepository,
    AuditEvent, AuditRepository, DocumentContentProvider, GenerationRequest, PrincipalFilter,
    PrincipalRepository, TextGenerationProvider,
};

pub(crate) fn principal(username: &str, role: PrincipalRole) -> Principal {
    Principal {
        user_id: UserId::new(),
        username: username.to_owned(),
        email: format!("{username}@nerostack.test"),
        display_name: username.to_owned(),
        role,
        is_active: true,
        content_token: None,
    }
}

pub(crate) fn identity_for(principal: &Principal) -> UserIdentity {
    UserIdentity::new(
        principal.user_id.to_string(),
        principal.display_name.clone(),
        Some(principal.email.clone()),
    )
}

pub(crate) fn stored_window(
    principal_id: UserId,
    document_id: Option<i64>,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    is_enabled: bool,
    created_at: DateTime<Utc>,
) -> AccessWindow {
    AccessWindow::from_record(AccessWindowRecord {
        id: AccessWindowId::new(),
        principal_id,
        document_id: document_id.map(DocumentId::new),
        cabinet_id: None,
        start_at,
        end_at,
        access_level: AccessLevel::Read,
        is_enabled,
        reason: None,
        granted_by: UserId::new(),
        created_at,
        updated_at: created_at,
    })
}

#[derive(Default)]
pub(crate) struct FakePrincipalRepository {
    pub(crate) principals: Mutex<Vec<Principal>>,
}

impl FakePrincipalRepository {
    pub(crate) fn with(principals: Vec<Principal>) -> Self {
        Self {
            principals: Mutex::new(principals),
        }
    }
}

#[async_trait]
impl PrincipalRepository for FakePrincipalRepository {
    async fn find_principal(&self, user_id: UserId) -> AppResult<Option<Principal>> {
        Ok(self
            .principals
            .lock()
            .await
            .iter()
            .find(|principal| principal.user_id == user_id)
            .cloned())
    }

    async fn find_principal_by_username(&self, username: &str) -> AppResult<Option<Principal>> {
        Ok(self
            .principals
            .lock()
            .await
            .iter()
            .find(|principal| principal.username == username)
            .cloned())
    }

    async fn create_principal(&self, principal: Principal) -> AppResult<Principal> {
        let mut principals = self.principals.lock().await;
        if principals
            .iter()
            .any(|existing| existing.username == principal.username)
        {
            return Err(AppError::Conflict(format!(
                "username '{}' already exists",
                principal.username
            )));
        }

        principals.push(principal.clone());
        Ok(principal)
    }

    async fn list_principals(&self, filter: PrincipalFilter) -> AppResult<Vec<Principal>> {
        let search = filter.search.as_deref().map(str::to_lowercase);
        Ok(self
            .principals
            .lock()
            .await
            .iter()
            .rev()
            .filter(|principal| {
                filter.role.is_none_or(|role| principal.role == role)
                    && filter
                        .is_active
                        .is_none_or(|is_active| principal.is_active == is_active)
                    && search.as_deref().is_none_or(|search| {
                        principal.username.to_lowercase().contains(search)
                            || principal.email.to_lowercase().contains(search)
                    })
            })
            .skip(filter.offset)
            .take(filter.limit)
            .cloned()
            .collect())
    }

    async fn update_principal(
        &self,
        user_id: UserId,
        changes: PrincipalChanges,
    ) -> AppResult<Principal> {
        let mut principals = self.principals.lock().await;
        if let Some(email) = changes.email.as_deref()
            && principals.iter().any(|existing| {
                existing.user_id != user_id && existing.email.eq_ignore_ascii_case(email.trim())
            })
        {
            return Err(AppError::Conflict(format!("email '{email}' already exists")));
        }

        let stored = principals
            .iter_mut()
            .find(|stored| stored.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("principal '{user_id}' not found")))?;
        stored.apply_changes(changes)?;
        Ok(stored.clone())
    }

    async fn delete_principal(&self, user_id: UserId) -> AppResult<()> {
        let mut principals = self.principals.lock().await;
        let before = principals.len();
        principals.retain(|principal| principal.user_id != user_id);
        if principals.len() == before {
            return Err(AppError::NotFound(format!("principal '{user_id}' not found")));
        }

        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAccessWindowRepository {
    pub(crate) windows: Mutex<Vec<AccessWindow>>,
}

impl FakeAccessWindowRepository {
    pub(crate) fn with(windows: Vec<AccessWindow>) -> Self {
        Self {
            windows: Mutex::new(windows),
        }
    }
}

#[async_trait]
impl AccessWindowRepository for FakeAccessWindowRepository {
    async fn create_window(&self, window: AccessWindow) -> AppResult<AccessWindow> {
        self.windows.lock().await.push(window.clone());
        Ok(window)
    }

    async fn find_window(&self, window_id: AccessWindowId) -> AppResult<Option<AccessWindow>> {
        Ok(self
            .windows
            .lock()
            .await
            .iter()
            .find(|window| window.id() == window_id)
            .cloned())
    }

    async fn update_window(
        &self,
        window_id: AccessWindowId,
        changes: AccessWindowChanges,
        now: DateTime<Utc>,
    ) -> AppResult<AccessWindow> {
        let mut windows = self.windows.lock().await;
        let stored = windows
            .iter_mut()
            .find(|stored| stored.id() == window_id)
            .ok_or_else(|| AppError::NotFound(format!("access window '{window_id}' not found")))?;
        stored.apply_changes(changes, now)?;
        Ok(stored.clone())
    }

    async fn revoke_window(
        &self,
        window_id: AccessWindowId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AccessWindow>> {
        let mut windows = self.windows.lock().await;
        Ok(windows
            .iter_mut()
            .find(|stored| stored.id() == window_id)
            .filter(|stored| stored.is_enabled())
            .map(|stored| {
                stored.revoke(now);
                stored.clone()
            }))
    }

    async fn delete_window(&self, window_id: AccessWindowId) -> AppResult<()> {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|window| window.id() != window_id);
        if windows.len() == before {
            return Err(AppError::NotFound(format!(
                "access window '{window_id}' not found"
            )));
        }

        Ok(())
    }

    async fn list_windows(&self, filter: AccessWindowFilter) -> AppResult<Vec<AccessWindow>> {
        let mut windows: Vec<AccessWindow> = self
            .windows
            .lock()
            .await
            .iter()
            .filter(|window| {
                filter
                    .principal_id
                    .is_none_or(|principal_id| window.principal_id() == principal_id)
                    && filter
                        .document_id
                        .is_none_or(|document_id| window.document_id() == Some(document_id))
                    && filter
                        .is_enabled
                        .is_none_or(|is_enabled| window.is_enabled() == is_enabled)
            })
            .cloned()
            .collect();
        windows.sort_by_key(|window| std::cmp::Reverse(window.created_at()));
        Ok(windows)
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAnalysisRepository {
    pub(crate) records: Mutex<Vec<AnalysisRecord>>,
    pub(crate) reject_completion: AtomicBool,
}

#[async_trait]
impl AnalysisRepository for FakeAnalysisRepository {
    async fn create_pending(
        &self,
        record: AnalysisRecord,
        stale_before: DateTime<Utc>,
    ) -> AppResult<AnalysisRecord> {
        let mut records = self.records.lock().await;
        for stored in records.iter_mut().filter(|stored| {
            stored.document_id() == record.document_id()
                && !stored.status().is_terminal()
                && stored.created_at() < stale_before
        }) {
            stored.fail("abandoned", Utc::now())?;
        }

        if records.iter().any(|stored| {
            stored.document_id() == record.document_id() && !stored.status().is_terminal()
        }) {
            return Err(AppError::Conflict(format!(
                "an analysis of document '{}' is already in progress",
                record.document_id()
            )));
        }

        records.push(record.clone());
        Ok(record)
    }

    async fn find_latest_completed(
        &self,
        document_id: DocumentId,
        language: AnalysisLanguage,
        document_version: Option<&str>,
    ) -> AppResult<Option<AnalysisRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| {
                record.document_id() == document_id
                    && record.language() == language
                    && record.status() == AnalysisStatus::Completed
                    && document_version.is_none_or(|version| record.document_version() == Some(version))
            })
            .max_by_key(|record| record.created_at())
            .cloned())
    }

    async fn save_transition(&self, record: &AnalysisRecord) -> AppResult<()> {
        if record.status() == AnalysisStatus::Completed
            && self.reject_completion.load(Ordering::SeqCst)
        {
            return Err(AppError::Internal("storage unavailable".to_owned()));
        }

        let mut records = self.records.lock().await;
        let stored = records
            .iter_mut()
            .find(|stored| stored.id() == record.id())
            .ok_or_else(|| AppError::NotFound(format!("analysis '{}' not found", record.id())))?;
        if stored.status().is_terminal() {
            return Err(AppError::Conflict(format!(
                "analysis '{}' is already final",
                record.id()
            )));
        }

        *stored = record.clone();
        Ok(())
    }

    async fn find_analysis(&self, analysis_id: AnalysisId) -> AppResult<Option<AnalysisRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|record| record.id() == analysis_id)
            .cloned())
    }

    async fn list_for_principal(
        &self,
        principal_id: UserId,
        query: AnalysisHistoryQuery,
    ) -> AppResult<Vec<AnalysisRecord>> {
        let mut records: Vec<AnalysisRecord> = self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| {
                record.principal_id() == principal_id
                    && query
                        .document_id
                        .is_none_or(|document_id| record.document_id() == document_id)
                    && query.status.is_none_or(|status| record.status() == status)
            })
            .cloned()
            .collect();
        records.sort_by_key(|record| std::cmp::Reverse(record.created_at()));
        Ok(records
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }
}

pub(crate) struct FakeContentProvider {
    pub(crate) content: Option<String>,
    pub(crate) requested_tokens: Mutex<Vec<Option<String>>>,
}

impl FakeContentProvider {
    pub(crate) fn with(content: Option<&str>) -> Self {
        Self {
            content: content.map(str::to_owned),
            requested_tokens: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DocumentContentProvider for FakeContentProvider {
    async fn fetch_document_content(
        &self,
        _document_id: DocumentId,
        content_token: Option<&str>,
    ) -> AppResult<Option<String>> {
        self.requested_tokens
            .lock()
            .await
            .push(content_token.map(str::to_owned));
        Ok(self.content.clone())
    }

    async fn check_health(&self) -> AppResult<()> {
        Ok(())
    }
}

pub(crate) struct FakeTextGenerator {
    pub(crate) available: bool,
    pub(crate) delay: Option<Duration>,
    pub(crate) responses: Mutex<VecDeque<AppResult<String>>>,
    pub(crate) requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeTextGenerator {
    pub(crate) fn replying(responses: Vec<AppResult<String>>) -> Self {
        Self {
            available: true,
            delay: None,
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerationProvider for FakeTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> AppResult<String> {
        self.requests.lock().await.push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(AppError::ServiceUnavailable("no scripted reply".to_owned())))
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn list_models(&self) -> AppResult<Vec<String>> {
        Ok(vec!["llama3.2:latest".to_owned()])
    }

    fn model_name(&self) -> &str {
        "llama3.2"
    }
}
