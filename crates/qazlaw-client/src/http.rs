//! HTTP client for zan.gov.kz.

use std::time::Duration;

use async_trait::async_trait;
use qazlaw_core::{ActTypeCode, Document, Language, SearchPage, VersionInfo};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{ApiError, DocumentRequest, SearchQuery, Transport};

pub const DEFAULT_BASE_URL: &str = "https://zan.gov.kz/api";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Connection settings for [`ZanClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://zan.gov.kz/api` (no trailing slash needed).
    pub base_url: String,
    /// Per-request timeout. Large codes take a long time to download.
    pub timeout: Duration,
    /// Extra attempts after the first one for connection errors, timeouts, 429 and 5xx.
    pub max_retries: u32,
    /// Base delay, doubled on every retry.
    pub retry_delay: Duration,
    /// The portal's certificate chain does not always validate.
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            accept_invalid_certs: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody<'a> {
    page: u32,
    limit: u32,
    sort_by: SortBy,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    act_types: &'a [ActTypeCode],
}

#[derive(Serialize)]
struct SortBy {
    desc: bool,
    field: &'static str,
}

impl<'a> SearchBody<'a> {
    fn from_query(query: &'a SearchQuery) -> Self {
        Self {
            page: query.page,
            limit: query.page_size,
            sort_by: SortBy {
                desc: false,
                field: "stateAgencyApprovalDate",
            },
            act_types: &query.act_types,
        }
    }
}

/// reqwest-backed [`Transport`] for the zan.gov.kz document API.
pub struct ZanClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl ZanClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        headers.insert(
            REFERER,
            HeaderValue::from_static("https://zan.gov.kz/client/"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, retrying transient failures with exponential backoff.
    async fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response, ApiError> {
        let mut attempt = 0;
        loop {
            let retry_in = self.retry_delay.saturating_mul(2_u32.saturating_pow(attempt));
            match build().send().await {
                Ok(resp) if is_retryable(resp.status()) && attempt < self.max_retries => {
                    warn!(
                        url = %resp.url(),
                        status = resp.status().as_u16(),
                        attempt,
                        "transient response; retrying"
                    );
                }
                Ok(resp) => return Ok(resp),
                Err(err) if (err.is_timeout() || err.is_connect()) && attempt < self.max_retries => {
                    warn!(error = %err, attempt, "request failed; retrying");
                }
                Err(err) => return Err(err.into()),
            }
            tokio::time::sleep(retry_in).await;
            attempt += 1;
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

async fn check(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

#[async_trait]
impl Transport for ZanClient {
    async fn search_documents(&self, query: &SearchQuery) -> Result<SearchPage, ApiError> {
        let url = self.url("/documents/search");
        let body = SearchBody::from_query(query);

        debug!(page = query.page, "searching documents");
        let resp = self.send(|| self.client.post(&url).json(&body)).await?;
        let bytes = check(resp).await?.bytes().await?;
        let page: SearchPage = serde_json::from_slice(&bytes)?;
        for summary in &page.documents {
            summary.validate()?;
        }
        Ok(page)
    }

    async fn get_document(&self, request: &DocumentRequest) -> Result<Option<Document>, ApiError> {
        let url = self.url(&request.path());
        let page = request.page.to_string();

        debug!(url = %url, page = request.page, "fetching document");
        let resp = self
            .send(|| {
                let cache_buster = chrono::Utc::now().timestamp_millis().to_string();
                self.client.get(&url).query(&[
                    ("withHtml", "false"),
                    ("page", page.as_str()),
                    ("r", cache_buster.as_str()),
                ])
            })
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = check(resp).await?.bytes().await?;
        let document: Document = serde_json::from_slice(&bytes)?;
        Ok(Some(document.normalize()?))
    }

    async fn get_document_versions(
        &self,
        id: &str,
        language: Language,
    ) -> Result<Vec<VersionInfo>, ApiError> {
        let url = self.url(&format!("/documents/{id}/{language}/versions"));

        debug!(url = %url, "fetching version history");
        let resp = self.send(|| self.client.get(&url)).await?;
        let bytes = check(resp).await?.bytes().await?;
        let versions: Vec<VersionInfo> = serde_json::from_slice(&bytes)?;
        Ok(versions)
    }
}
