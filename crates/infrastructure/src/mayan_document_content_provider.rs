//! Mayan EDMS REST adapter for document text.

use std::time::Duration;

use async_trait::async_trait;
use nerostack_application::DocumentContentProvider;
use nerostack_core::{AppError, AppResult};
use nerostack_domain::DocumentId;
use serde::Deserialize;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_PAGE_LISTINGS: usize = 200;

/// Fallback basic credential used when the principal carries no provider token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MayanCredentials {
    /// Administrative username.
    pub username: String,
    /// Administrative password.
    pub password: String,
}

/// Reads OCR text of the latest document version from Mayan EDMS.
pub struct MayanDocumentContentProvider {
    http_client: reqwest::Client,
    base_url: String,
    credentials: MayanCredentials,
}

impl MayanDocumentContentProvider {
    /// Creates a provider for the given base URL, e.g. `http://mayan:8000`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        credentials: MayanCredentials,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            credentials,
        }
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/v4{endpoint}", self.base_url)
    }

    async fn get_json<T>(&self, url: String, content_token: Option<&str>) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let builder = self.http_client.get(url.as_str()).timeout(REQUEST_TIMEOUT);
        let builder = match content_token {
            Some(token) => builder.header("Authorization", format!("Token {token}")),
            None => builder.basic_auth(
                self.credentials.username.as_str(),
                Some(self.credentials.password.as_str()),
            ),
        };

        let response = builder.send().await.map_err(|error| {
            AppError::ServiceUnavailable(format!("document backend request failed: {error}"))
        })?;

        if !resource_exists(response.status(), url.as_str())? {
            return Ok(None);
        }

        response.json::<T>().await.map(Some).map_err(|error| {
            AppError::ServiceUnavailable(format!(
                "document backend returned an unreadable payload: {error}"
            ))
        })
    }

    /// Collects page ids across every listing of a paginated endpoint.
    async fn list_page_ids(
        &self,
        endpoint: &str,
        content_token: Option<&str>,
    ) -> AppResult<Option<Vec<i64>>> {
        let first_url = self.api_url(endpoint);
        let mut next_url = Some(first_url.clone());
        let mut page_ids = Vec::new();
        let mut listings = 0;

        while let Some(url) = next_url.take() {
            if listings == MAX_PAGE_LISTINGS {
                tracing::warn!(endpoint, listings, "stopped following document page listings");
                break;
            }
            listings += 1;

            let Some(listing) = self
                .get_json::<Paginated<ResourceId>>(url, content_token)
                .await?
            else {
                return Ok(None);
            };

            page_ids.extend(listing.results.iter().map(|page| page.id));
            next_url = next_listing_query(listing.next.as_deref())
                .map(|query| format!("{first_url}?{query}"));
        }

        Ok(Some(page_ids))
    }
}

/// Maps a backend status to `true` (payload follows) or `false` (404).
///
/// Authentication failures and server errors surface as `ServiceUnavailable`.
fn resource_exists(status: reqwest::StatusCode, url: &str) -> AppResult<bool> {
    if status.is_success() {
        return Ok(true);
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(false);
    }

    tracing::warn!(url, status = %status, "document backend returned non-success status");
    let message =
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            format!("document backend rejected the credentials ({status})")
        } else {
            format!("document backend returned {status}")
        };
    Err(AppError::ServiceUnavailable(message))
}

/// Extracts the query string of a listing's `next` link.
///
/// Only the query is kept so that follow-up requests stay on the configured
/// base URL whatever host the backend advertises.
fn next_listing_query(next: Option<&str>) -> Option<String> {
    let next = reqwest::Url::parse(next?).ok()?;
    next.query()
        .filter(|query| !query.is_empty())
        .map(str::to_owned)
}

#[derive(Debug, Deserialize)]
struct Paginated<T> {
    #[serde(default)]
    next: Option<String>,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct PageOcr {
    #[serde(default)]
    content: Option<String>,
}

fn latest_version_id(versions: &Paginated<ResourceId>) -> Option<i64> {
    versions.results.first().map(|version| version.id)
}

fn join_page_content(pages: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    let parts: Vec<String> = pages
        .into_iter()
        .flatten()
        .filter(|content| !content.trim().is_empty())
        .collect();

    (!parts.is_empty()).then(|| parts.join("\n\n"))
}

#[async_trait]
impl DocumentContentProvider for MayanDocumentContentProvider {
    async fn fetch_document_content(
        &self,
        document_id: DocumentId,
        content_token: Option<&str>,
    ) -> AppResult<Option<String>> {
        let versions_url = self.api_url(&format!("/documents/{document_id}/versions/"));
        let Some(versions) = self
            .get_json::<Paginated<ResourceId>>(versions_url, content_token)
            .await?
        else {
            return Ok(None);
        };
        let Some(version_id) = latest_version_id(&versions) else {
            return Ok(None);
        };

        let pages_endpoint = format!("/documents/{document_id}/versions/{version_id}/pages/");
        let Some(page_ids) = self
            .list_page_ids(pages_endpoint.as_str(), content_token)
            .await?
        else {
            return Ok(None);
        };

        let mut page_texts = Vec::with_capacity(page_ids.len());
        for page_id in page_ids {
            let ocr_endpoint =
                format!("/documents/{document_id}/versions/{version_id}/pages/{page_id}/ocr/");
            let ocr = self
                .get_json::<PageOcr>(self.api_url(ocr_endpoint.as_str()), content_token)
                .await?;
            page_texts.push(ocr.and_then(|ocr| ocr.content));
        }

        Ok(join_page_content(page_texts))
    }

    async fn check_health(&self) -> AppResult<()> {
        let response = self
            .http_client
            .get(self.api_url("/"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|error| {
                AppError::ServiceUnavailable(format!("document backend unreachable: {error}"))
            })?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(());
        }

        Err(AppError::ServiceUnavailable(format!(
            "document backend health check returned {status}"
        )))
    }
}
