//! Per-worker state and the end-to-end processing of one act.

use qazlaw_client::Transport;
use qazlaw_core::SearchActMetadata;
use qazlaw_store::{StoreError, StoreSession};
use tracing::debug;

use crate::{ActTypeRegistry, IngestConfig, IngestError, assembler, resolver};

/// Why an act was not ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Excluded,
    AlreadyIngested,
    /// Neither language edition exists.
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActOutcome {
    Persisted { act_id: i64, versions: usize },
    Skipped(SkipReason),
}

/// Storage session and act type registry owned by one worker slot.
///
/// The coordinator hands a context to each task together with its act and
/// gets it back with the result.
pub struct WorkerContext {
    id: usize,
    session: Option<StoreSession>,
    registry: ActTypeRegistry,
}

impl WorkerContext {
    pub fn new(id: usize, session: StoreSession) -> Result<Self, IngestError> {
        let registry = ActTypeRegistry::load(&session)?;
        debug!(worker = id, act_types = registry.len(), "worker context ready");
        Ok(Self {
            id,
            session: Some(session),
            registry,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Run a storage call on the blocking pool, lending it this worker's session.
    async fn with_session<T, F>(&mut self, f: F) -> Result<T, IngestError>
    where
        F: FnOnce(&mut StoreSession) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let mut session = self.session.take().ok_or(IngestError::SessionLost)?;
        let (session, result) = tokio::task::spawn_blocking(move || {
            let result = f(&mut session);
            (session, result)
        })
        .await?;
        self.session = Some(session);
        Ok(result?)
    }

    /// Take one catalog entry from summary to committed act.
    pub async fn process(
        &mut self,
        transport: &dyn Transport,
        summary: &SearchActMetadata,
        config: &IngestConfig,
    ) -> Result<ActOutcome, IngestError> {
        let code = summary.code.clone();
        if config.is_excluded(&code) {
            return Ok(ActOutcome::Skipped(SkipReason::Excluded));
        }

        let lookup = code.clone();
        if self
            .with_session(move |session| session.find_act_id(&lookup))
            .await?
            .is_some()
        {
            return Ok(ActOutcome::Skipped(SkipReason::AlreadyIngested));
        }

        let Some(resolved) = resolver::resolve(transport, &summary.id).await? else {
            return Ok(ActOutcome::Skipped(SkipReason::NotFound));
        };
        debug!(code = %code, worker = self.id, languages = resolved.documents.len(), "act resolved");
        let assembled = assembler::assemble(transport, resolved).await?;
        let type_ids = self.registry.ids_for(&assembled.act.types)?;
        let versions = assembled.versions.len();
        debug!(code = %code, worker = self.id, versions, "act assembled");

        let act_id = self
            .with_session(move |session| session.persist_act(&assembled, &type_ids))
            .await?;
        Ok(ActOutcome::Persisted { act_id, versions })
    }
}

#[cfg(test)]
mod tests {
    use qazlaw_core::ActTypeCode;
    use qazlaw_store::DuckStore;

    use super::*;
    use crate::fixtures::{FakeTransport, summary};

    fn seeded_store() -> DuckStore {
        let store = DuckStore::open().unwrap();
        store.init_schema(false).unwrap();
        store.seed_act_types(ActTypeCode::ALL).unwrap();
        store
    }

    #[tokio::test]
    async fn persists_then_skips_on_second_pass() {
        let store = seeded_store();
        let mut transport = FakeTransport::new();
        transport.bilingual_act("K1");
        let config = IngestConfig::default();
        let mut ctx = WorkerContext::new(0, store.session().unwrap()).unwrap();

        let first = ctx.process(&transport, &summary("K1"), &config).await.unwrap();
        assert!(matches!(first, ActOutcome::Persisted { versions: 2, .. }));

        let second = ctx.process(&transport, &summary("K1"), &config).await.unwrap();
        assert_eq!(second, ActOutcome::Skipped(SkipReason::AlreadyIngested));

        let stored = store.find_act("K1").unwrap().unwrap();
        assert_eq!(stored.act.types, vec![ActTypeCode::Zak]);
        assert_eq!(store.stats().unwrap().versions, 2);
    }

    #[tokio::test]
    async fn excluded_codes_are_never_fetched() {
        let store = seeded_store();
        let mut transport = FakeTransport::new();
        transport.bilingual_act("2574");
        let mut ctx = WorkerContext::new(0, store.session().unwrap()).unwrap();

        let outcome = ctx
            .process(&transport, &summary("2574"), &IngestConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome, ActOutcome::Skipped(SkipReason::Excluded));
        assert_eq!(transport.document_calls("2574"), 0);
    }

    #[tokio::test]
    async fn absent_act_is_skipped() {
        let store = seeded_store();
        let transport = FakeTransport::new();
        let mut ctx = WorkerContext::new(0, store.session().unwrap()).unwrap();

        let outcome = ctx
            .process(&transport, &summary("K404"), &IngestConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome, ActOutcome::Skipped(SkipReason::NotFound));
        assert_eq!(store.stats().unwrap().acts, 0);
    }

    #[tokio::test]
    async fn unseeded_registry_fails_before_writing() {
        let store = DuckStore::open().unwrap();
        store.init_schema(false).unwrap();
        let mut transport = FakeTransport::new();
        transport.bilingual_act("K1");
        let mut ctx = WorkerContext::new(0, store.session().unwrap()).unwrap();

        let err = ctx
            .process(&transport, &summary("K1"), &IngestConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::UnknownActType(ActTypeCode::Zak)));
        assert_eq!(store.stats().unwrap().acts, 0);
    }
}
