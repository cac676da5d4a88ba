//! Storage layer: DuckDB tables for acts, act types and act versions.

mod duck;
mod error;
pub mod schema;

pub use duck::{
    ActTypeRow, ActWriter, CorpusStats, DuckStore, StoreSession, StoredAct, VersionSummary,
};
pub use error::StoreError;
