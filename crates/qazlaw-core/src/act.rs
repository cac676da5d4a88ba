//! Canonical corpus records produced by ingestion and written to storage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::{ActStatus, ActTypeCode, Language};

/// A legal enactment, reconciled across its Russian and Kazakh documents.
///
/// `code` is the registry code and is unique across the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Act {
    pub code: String,
    /// State-agency document number as printed in the Russian text (e.g. `356-V`).
    pub sa_doc_number_ru: String,
    /// Same number in the Kazakh text; often differs in suffix (`23` vs `23-I`).
    pub sa_doc_number_kz: String,
    pub ju_doc_number: String,
    pub ngr: String,
    pub status: Option<ActStatus>,
    pub registry_number: String,
    pub sa_approval_date: NaiveDate,
    pub ju_approval_date: Option<NaiveDate>,
    pub action_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub initial_pub_date: Option<NaiveDate>,
    /// Russian title.
    pub title: String,
    /// Russian requisites line.
    pub requisite: String,
    /// Sorted, deduplicated.
    pub types: Vec<ActTypeCode>,
}

/// One dated revision of an act's content in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActVersion {
    pub date: NaiveDate,
    pub language: Language,
    pub is_actual: bool,
    /// Upstream version identifier; differs between languages of the same date.
    pub version_id: String,
    /// Serialized document body (JSON element list or JSON-encoded HTML string).
    pub content: String,
    /// Code of the act whose amendment produced this version. Resolved to an id later.
    pub cause_act_code: Option<String>,
}

impl ActVersion {
    /// Identity of a version within its act.
    pub fn key(&self) -> (Language, NaiveDate) {
        (self.language, self.date)
    }
}

/// An act together with every version that will be persisted for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledAct {
    pub act: Act,
    pub versions: Vec<ActVersion>,
}
