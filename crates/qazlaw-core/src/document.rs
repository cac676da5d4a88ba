//! Wire types for zan.gov.kz API responses.
//!
//! Field names follow the API's camelCase JSON. Unknown fields are ignored;
//! identity invariants the API is expected to uphold are checked by
//! [`Document::normalize`] and [`SearchActMetadata::validate`] right after parsing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::{ActStatus, ActTypeCode, Language};

/// Placeholders the registry uses instead of a document number ("without number").
const NO_NUMBER_PLACEHOLDERS: &[&str] = &["б/н", "н/ж"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("document identity diverges: id={id} code={code} registry_number={registry_number}")]
    IdentityDiverges {
        id: String,
        code: String,
        registry_number: String,
    },
    #[error("search entry identity diverges: id={id} code={code}")]
    SearchIdentityDiverges { id: String, code: String },
    #[error("page {page} content kind differs from page 1")]
    ContentKindMismatch { page: u32 },
}

/// Text published in both Kazakh and Russian.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilingualText {
    #[serde(default)]
    pub kaz: String,
    #[serde(default)]
    pub rus: String,
}

/// One page of the document catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub page: u32,
    pub page_count: u32,
    pub documents_found: u64,
    #[serde(rename = "list")]
    pub documents: Vec<SearchActMetadata>,
}

/// Act summary as listed by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchActMetadata {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub act_types: Vec<ActTypeCode>,
    #[serde(default)]
    pub requisites: BilingualText,
    #[serde(default)]
    pub summary: BilingualText,
    pub status: ActStatus,
    pub state_agency_approval_date: NaiveDate,
    #[serde(default, deserialize_with = "de::flex_date")]
    pub initial_publication_date: Option<NaiveDate>,
    #[serde(default)]
    pub action_date: Option<NaiveDate>,
    #[serde(default)]
    pub judiciary_doc_number: Option<String>,
}

impl SearchActMetadata {
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.id != self.code {
            return Err(DocumentError::SearchIdentityDiverges {
                id: self.id.clone(),
                code: self.code.clone(),
            });
        }
        Ok(())
    }
}

/// Registry metadata attached to every document and version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActMetadata {
    pub title: BilingualText,
    pub requisites: BilingualText,
    #[serde(default)]
    pub state_agency_doc_number: String,
    #[serde(default)]
    pub judicial_authority: String,
    #[serde(default)]
    pub judiciary_doc_number: String,
    #[serde(default)]
    pub developing_state_agency: String,
    #[serde(default, deserialize_with = "de::empty_as_none")]
    pub status: Option<ActStatus>,
    #[serde(default)]
    pub registry_number: String,
    #[serde(default)]
    pub legal_validity: String,
    #[serde(default)]
    pub act_types: Vec<ActTypeCode>,
    #[serde(default)]
    pub approval_place: String,
    pub state_agency_approval_date: NaiveDate,
    #[serde(default)]
    pub judiciary_approval_date: Option<NaiveDate>,
    #[serde(default)]
    pub action_date: Option<NaiveDate>,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
}

impl ActMetadata {
    fn normalize(&mut self) {
        if NO_NUMBER_PLACEHOLDERS.contains(&self.state_agency_doc_number.as_str()) {
            self.state_agency_doc_number.clear();
        }
    }
}

/// The act whose amendment produced a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeCause {
    /// Registry code of the causing act. Authoritative when it disagrees with `document`.
    pub code: String,
    #[serde(default)]
    pub document: String,
    #[serde(default)]
    pub title: BilingualText,
    #[serde(default)]
    pub requisites: BilingualText,
}

/// Version block embedded in a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVersion {
    pub id: String,
    pub language: Language,
    pub version_date: NaiveDate,
    #[serde(default)]
    pub changes: Option<Vec<String>>,
    #[serde(default)]
    pub cause: Option<ChangeCause>,
    #[serde(default)]
    pub imported: Option<bool>,
}

/// Document body: either a flat list of structural elements or an HTML string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentContent {
    Elements(Vec<serde_json::Value>),
    Html(String),
}

impl Default for DocumentContent {
    fn default() -> Self {
        DocumentContent::Elements(Vec::new())
    }
}

impl DocumentContent {
    /// Append the content of a following page. Both pages must be the same kind.
    pub fn append(&mut self, next: DocumentContent, page: u32) -> Result<(), DocumentError> {
        match (self, next) {
            (DocumentContent::Elements(head), DocumentContent::Elements(tail)) => {
                head.extend(tail);
                Ok(())
            }
            (DocumentContent::Html(head), DocumentContent::Html(tail)) => {
                head.push_str(&tail);
                Ok(())
            }
            _ => Err(DocumentError::ContentKindMismatch { page }),
        }
    }

    /// Serialized form stored in `act_version.content`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A complete document (one language, one version, one page of content).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub code: String,
    pub ngr: String,
    pub language: Language,
    pub version: DocumentVersion,
    pub metadata: ActMetadata,
    pub actual_version: bool,
    pub versions_count: u32,
    pub version_date: NaiveDate,
    #[serde(default)]
    pub has_signature: bool,
    #[serde(default)]
    pub imported: bool,
    #[serde(default)]
    pub content: Option<DocumentContent>,
    #[serde(default, deserialize_with = "de::flex_date")]
    pub initial_publication_date: Option<NaiveDate>,
    pub pages_count: u32,
    #[serde(default)]
    pub temporary_revoked: Option<bool>,
}

impl Document {
    /// Apply registry defaults and check that the three identifiers agree.
    ///
    /// An empty registry number defaults to the document code.
    pub fn normalize(mut self) -> Result<Self, DocumentError> {
        self.metadata.normalize();
        if self.metadata.registry_number.is_empty() {
            self.metadata.registry_number = self.code.clone();
        }
        if self.id != self.code || self.code != self.metadata.registry_number {
            return Err(DocumentError::IdentityDiverges {
                id: self.id,
                code: self.code,
                registry_number: self.metadata.registry_number,
            });
        }
        Ok(self)
    }

    /// Take the body out of the document, leaving `None` behind.
    pub fn take_content(&mut self) -> DocumentContent {
        self.content.take().unwrap_or_default()
    }
}

/// Entry of a document's version history listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub id: String,
    pub language: Language,
    pub version_date: NaiveDate,
    #[serde(default)]
    pub cause: Option<ChangeCause>,
}

mod de {
    use std::fmt::Display;
    use std::str::FromStr;

    use chrono::NaiveDate;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Year(i32),
        Text(String),
    }

    /// Dates that arrive either as `YYYY-MM-DD` or as a bare year.
    pub fn flex_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawDate>::deserialize(deserializer)? {
            None => Ok(None),
            Some(RawDate::Year(year)) => NaiveDate::from_ymd_opt(year, 1, 1)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid year {year}"))),
            Some(RawDate::Text(text)) if text.is_empty() => Ok(None),
            Some(RawDate::Text(text)) => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .map(Some)
                .map_err(D::Error::custom),
        }
    }

    pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(text) if text.is_empty() => Ok(None),
            Some(text) => text.parse().map(Some).map_err(D::Error::custom),
        }
    }
}
