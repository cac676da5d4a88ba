//! In-memory [`Transport`] and document builders for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use qazlaw_client::{ApiError, DocumentRequest, SearchQuery, Transport};
use qazlaw_core::{
    BilingualText, ChangeCause, Document, Language, SearchActMetadata, SearchPage, VersionInfo,
};
use serde_json::json;

type DocKey = (String, Language, Option<NaiveDate>, u32);

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn summary(code: &str) -> SearchActMetadata {
    serde_json::from_value(json!({
        "id": code,
        "code": code,
        "actTypes": ["ЗАК"],
        "status": "exe",
        "stateAgencyApprovalDate": "2015-01-01"
    }))
    .unwrap()
}

/// A one-page document of `code` at `version_date`.
pub fn document(code: &str, language: Language, version_date: NaiveDate) -> Document {
    let document: Document = serde_json::from_value(json!({
        "id": code,
        "code": code,
        "ngr": format!("ngr-{code}"),
        "language": language,
        "version": {
            "id": format!("{code}-{language}-{version_date}"),
            "language": language,
            "versionDate": version_date
        },
        "metadata": {
            "title": {"rus": format!("Закон {code}"), "kaz": format!("Заң {code}")},
            "requisites": {"rus": format!("Закон № {code}"), "kaz": format!("Заң № {code}")},
            "stateAgencyDocNumber": "1-V",
            "status": "exe",
            "registryNumber": code,
            "actTypes": ["ЗАК"],
            "stateAgencyApprovalDate": "2015-01-01"
        },
        "actualVersion": true,
        "versionsCount": 1,
        "versionDate": version_date,
        "pagesCount": 1,
        "initialPublicationDate": 2015,
        "content": [{"text": format!("{code} {language} {version_date}")}]
    }))
    .unwrap();
    document.normalize().unwrap()
}

pub fn with_cause(mut document: Document, cause_code: &str) -> Document {
    document.version.cause = Some(ChangeCause {
        code: cause_code.to_string(),
        document: cause_code.to_string(),
        title: BilingualText::default(),
        requisites: BilingualText::default(),
    });
    document
}

pub fn version_info(document: &Document) -> VersionInfo {
    VersionInfo {
        id: document.version.id.clone(),
        language: document.language,
        version_date: document.version_date,
        cause: document.version.cause.clone(),
    }
}

#[derive(Default)]
pub struct FakeTransport {
    catalog: Vec<SearchActMetadata>,
    documents: HashMap<DocKey, Document>,
    versions: HashMap<(String, Language), Vec<VersionInfo>>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    slow: HashMap<String, Duration>,
    fail_search_from: Option<u32>,
    delay: Duration,
    document_calls: Mutex<Vec<String>>,
    search_calls: Mutex<Vec<u32>>,
    active: Mutex<HashMap<String, usize>>,
    max_active: Mutex<usize>,
}

/// Marks one act as fetching for as long as it lives.
struct Fetching<'a> {
    transport: &'a FakeTransport,
    code: String,
}

impl Drop for Fetching<'_> {
    fn drop(&mut self) {
        let mut active = self.transport.active.lock().unwrap();
        if let Some(count) = active.get_mut(&self.code) {
            *count -= 1;
            if *count == 0 {
                active.remove(&self.code);
            }
        }
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every successful document fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn catalog(&mut self, code: &str) {
        self.catalog.push(summary(code));
    }

    /// Serve `document` as the current version of its act.
    pub fn latest(&mut self, document: Document) {
        self.page(document, None, 1);
    }

    /// List `document` in its act's history and serve it at its version date.
    pub fn version(&mut self, document: Document) {
        let code = document.id.clone();
        self.list_version(&code, version_info(&document));
        let version_date = document.version_date;
        self.page(document, Some(version_date), 1);
    }

    /// List a version without serving its document.
    pub fn list_version(&mut self, code: &str, info: VersionInfo) {
        self.versions
            .entry((code.to_string(), info.language))
            .or_default()
            .push(info);
    }

    pub fn page(&mut self, document: Document, date: Option<NaiveDate>, page: u32) {
        let key = (document.id.clone(), document.language, date, page);
        self.documents.insert(key, document);
    }

    /// Every request for `code` fails with a 500.
    pub fn fail(&mut self, code: &str) {
        self.failing.insert(code.to_string());
    }

    /// Every document request for `code` panics.
    pub fn panic_on(&mut self, code: &str) {
        self.panicking.insert(code.to_string());
    }

    /// Hold every document request for `code` for `delay`, failing ones included.
    pub fn slow(&mut self, code: &str, delay: Duration) {
        self.slow.insert(code.to_string(), delay);
    }

    pub fn fail_search_from(&mut self, page: u32) {
        self.fail_search_from = Some(page);
    }

    /// Catalog entry plus a single version in both languages.
    pub fn bilingual_act(&mut self, code: &str) {
        let version_date = date(2020, 1, 1);
        for language in Language::ALL {
            let doc = document(code, language, version_date);
            self.latest(doc.clone());
            self.version(doc);
        }
        self.catalog(code);
    }

    pub fn document_calls(&self, code: &str) -> usize {
        self.document_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| *id == code)
            .count()
    }

    pub fn search_calls(&self) -> Vec<u32> {
        self.search_calls.lock().unwrap().clone()
    }

    /// Most distinct acts seen fetching a delayed document at the same time.
    pub fn max_active_acts(&self) -> usize {
        *self.max_active.lock().unwrap()
    }

    fn fetching(&self, code: &str) -> Fetching<'_> {
        let mut active = self.active.lock().unwrap();
        *active.entry(code.to_string()).or_default() += 1;
        let mut max = self.max_active.lock().unwrap();
        *max = (*max).max(active.len());
        Fetching {
            transport: self,
            code: code.to_string(),
        }
    }
}

fn server_error(code: &str) -> ApiError {
    ApiError::Server {
        status: 500,
        body: format!("{code} unavailable"),
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn search_documents(&self, query: &SearchQuery) -> Result<SearchPage, ApiError> {
        self.search_calls.lock().unwrap().push(query.page);
        if self.fail_search_from.is_some_and(|from| query.page >= from) {
            return Err(server_error("search"));
        }
        let size = query.page_size.max(1) as usize;
        let skip = (query.page.saturating_sub(1) as usize) * size;
        Ok(SearchPage {
            page: query.page,
            page_count: self.catalog.len().div_ceil(size) as u32,
            documents_found: self.catalog.len() as u64,
            documents: self.catalog.iter().skip(skip).take(size).cloned().collect(),
        })
    }

    async fn get_document(&self, request: &DocumentRequest) -> Result<Option<Document>, ApiError> {
        self.document_calls.lock().unwrap().push(request.id.clone());
        if let Some(delay) = self.slow.get(&request.id) {
            tokio::time::sleep(*delay).await;
        }
        if self.panicking.contains(&request.id) {
            panic!("{} blew up", request.id);
        }
        if self.failing.contains(&request.id) {
            return Err(server_error(&request.id));
        }
        if !self.delay.is_zero() {
            let _fetching = self.fetching(&request.id);
            tokio::time::sleep(self.delay).await;
        }
        let key = (request.id.clone(), request.language, request.date, request.page);
        Ok(self.documents.get(&key).cloned())
    }

    async fn get_document_versions(
        &self,
        id: &str,
        language: Language,
    ) -> Result<Vec<VersionInfo>, ApiError> {
        if self.failing.contains(id) {
            return Err(server_error(id));
        }
        Ok(self
            .versions
            .get(&(id.to_string(), language))
            .cloned()
            .unwrap_or_default())
    }
}
