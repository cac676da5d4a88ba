//! Ingestion pipeline for the zan.gov.kz act corpus.
//!
//! The [`CatalogWalker`] feeds act summaries to the [`Coordinator`], which runs
//! each act through resolution ([`resolver`]), version assembly ([`assembler`])
//! and a single storage transaction on a bounded pool of workers. Cause links
//! between acts are upgraded from codes to ids afterwards by [`link_causes`].

pub mod assembler;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod linker;
pub mod registry;
pub mod resolver;
pub mod walker;
pub mod worker;

#[cfg(test)]
mod fixtures;

pub use config::{IngestConfig, TROUBLED_CODES};
pub use coordinator::{Coordinator, RunReport, RunStatus};
pub use error::{ErrorKind, IngestError};
pub use linker::{LinkReport, link_causes};
pub use registry::ActTypeRegistry;
pub use resolver::ResolvedAct;
pub use walker::{CatalogEntry, CatalogWalker};
pub use worker::{ActOutcome, SkipReason, WorkerContext};
