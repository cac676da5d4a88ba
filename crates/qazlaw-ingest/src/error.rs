use chrono::NaiveDate;
use qazlaw_client::ApiError;
use qazlaw_core::{ActTypeCode, DocumentError, Language};
use qazlaw_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    #[error("invalid document: {0}")]
    Document(#[from] DocumentError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The Russian and Kazakh documents of one act disagree on a field that must match.
    #[error("{code}: {field} diverges between languages (rus={rus}, kaz={kaz})")]
    Conflict {
        code: String,
        field: &'static str,
        rus: String,
        kaz: String,
    },

    /// A version listed in the history could not be fetched at its date.
    #[error("{code}: listed version {language}/{date} not found")]
    MissingVersion {
        code: String,
        language: Language,
        date: NaiveDate,
    },

    #[error("{code}: page {page} of version {language}/{date} not found")]
    MissingPage {
        code: String,
        language: Language,
        date: NaiveDate,
        page: u32,
    },

    #[error("act type {0} is not registered")]
    UnknownActType(ActTypeCode),

    #[error("content serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("worker storage session is gone")]
    SessionLost,
}

/// Coarse classification used by the coordinator's failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bilingual metadata could not be reconciled. Only the act fails.
    Conflict,
    /// Network failure or unexpected HTTP status.
    Transport,
    /// The API answered with data that violates the expected shape or identity rules.
    Validation,
    Storage,
    Internal,
}

impl ErrorKind {
    /// Whether an act failing with this kind stops new submissions.
    pub fn stops_run(self, keep_going: bool) -> bool {
        match self {
            ErrorKind::Conflict => false,
            ErrorKind::Transport => !keep_going,
            ErrorKind::Validation | ErrorKind::Storage | ErrorKind::Internal => true,
        }
    }
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Api(err) if err.is_validation() => ErrorKind::Validation,
            IngestError::Api(_) => ErrorKind::Transport,
            IngestError::Document(_)
            | IngestError::MissingVersion { .. }
            | IngestError::MissingPage { .. } => ErrorKind::Validation,
            IngestError::Conflict { .. } => ErrorKind::Conflict,
            IngestError::Store(_) | IngestError::UnknownActType(_) => ErrorKind::Storage,
            IngestError::Json(_) | IngestError::Join(_) | IngestError::SessionLost => {
                ErrorKind::Internal
            }
        }
    }
}
