//! Client layer for the zan.gov.kz legislative documents API.
//!
//! [`Transport`] is the seam the ingestion pipeline consumes; the reqwest-backed
//! [`ZanClient`] implementing it is gated behind the `http` feature.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{ClientConfig, ZanClient};

use async_trait::async_trait;
use chrono::NaiveDate;
use qazlaw_core::{ActTypeCode, Document, DocumentError, Language, SearchPage, VersionInfo};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid payload: {0}")]
    Invalid(#[from] DocumentError),
}

impl ApiError {
    /// True when the response arrived but its payload is malformed.
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Json(_) | ApiError::Invalid(_))
    }
}

/// Parameters of one catalog search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub page: u32,
    pub page_size: u32,
    /// Restrict to these act types; empty means no filter.
    pub act_types: Vec<ActTypeCode>,
}

/// Address of one page of one document, optionally at a historical version date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRequest {
    pub id: String,
    pub language: Language,
    pub date: Option<NaiveDate>,
    pub page: u32,
}

impl DocumentRequest {
    /// First page of the current version.
    pub fn latest(id: impl Into<String>, language: Language) -> Self {
        Self {
            id: id.into(),
            language,
            date: None,
            page: 1,
        }
    }

    /// First page of the version effective at `date`.
    pub fn at(id: impl Into<String>, language: Language, date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::latest(id, language)
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Resource path relative to the API base, e.g. `/documents/Z9/rus/01.01.2024`.
    pub fn path(&self) -> String {
        let mut path = format!("/documents/{}/{}", self.id, self.language);
        if let Some(date) = self.date {
            path.push_str(&format!("/{}", date.format("%d.%m.%Y")));
        }
        path
    }
}

/// Stateless access to the document API.
///
/// "Not found" on a document is an expected outcome and is returned as `Ok(None)`;
/// every other non-success response is an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn search_documents(&self, query: &SearchQuery) -> Result<SearchPage, ApiError>;

    async fn get_document(&self, request: &DocumentRequest) -> Result<Option<Document>, ApiError>;

    async fn get_document_versions(
        &self,
        id: &str,
        language: Language,
    ) -> Result<Vec<VersionInfo>, ApiError>;
}
